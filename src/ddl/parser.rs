//! Recursive-descent grammar shared by both dialects.
//!
//! Statements are recognised by their leading keywords; anything else is
//! skipped to the next `;`. A `CREATE TABLE` body is cut at its matching
//! close paren and split into elements on depth-0 commas. Each element is
//! parsed on its own, so a malformed element costs only itself.

use super::lexer::{Token, render_tokens};
use super::{Dialect, mysql, postgres};
use crate::schema::{Column, ForeignKey, Index, NO_ACTION, Table, TableMap};

static EOF: Token = Token::Eof;

/// Referenced column assumed when a reference omits its column list.
const DEFAULT_REF_COLUMN: &str = "id";

/// Position over a token slice.
pub struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn current(&self) -> &'a Token {
        self.peek(0)
    }

    pub fn peek(&self, offset: usize) -> &'a Token {
        self.tokens.get(self.pos + offset).unwrap_or(&EOF)
    }

    pub fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len() || *self.current() == Token::Eof
    }

    pub fn at_keyword(&self, keyword: &str) -> bool {
        self.current().is_keyword(keyword)
    }

    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume a keyword sequence only if all of it is present.
    pub fn eat_keywords(&mut self, keywords: &[&str]) -> bool {
        let present = keywords
            .iter()
            .enumerate()
            .all(|(i, kw)| self.peek(i).is_keyword(kw));
        if present {
            self.advance_by(keywords.len());
        }
        present
    }

    pub fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn name(&mut self) -> Option<String> {
        let name = self.current().name()?.to_string();
        self.advance();
        Some(name)
    }

    /// Dotted name such as `public.users`, one entry per part.
    pub fn qualified_name(&mut self) -> Option<Vec<String>> {
        let mut parts = vec![self.name()?];
        while *self.current() == Token::Dot && self.peek(1).name().is_some() {
            self.advance();
            parts.extend(self.name());
        }
        Some(parts)
    }

    pub fn rest(&self) -> &'a [Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    /// Index of the paren closing the one at the cursor. Unbalanced input
    /// and statement boundaries yield `None`.
    fn matching_paren(&self) -> Option<usize> {
        if *self.current() != Token::LParen {
            return None;
        }
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(self.pos) {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                Token::Semicolon | Token::Eof => return None,
                _ => {}
            }
        }
        None
    }

    /// Skip a parenthesised group at the cursor, if any.
    pub fn skip_group(&mut self) {
        match self.matching_paren() {
            Some(end) => self.seek(end + 1),
            None if *self.current() == Token::LParen => self.seek(self.statement_end()),
            None => {}
        }
    }

    /// Render the parenthesised group at the cursor and move past it.
    fn take_group(&mut self) -> String {
        let start = self.pos;
        let end = self.matching_paren().map(|e| e + 1).unwrap_or_else(|| self.statement_end());
        self.seek(end);
        render_tokens(&self.tokens[start..end])
    }

    fn statement_end(&self) -> usize {
        self.tokens
            .iter()
            .enumerate()
            .skip(self.pos)
            .find(|(_, t)| matches!(t, Token::Semicolon | Token::Eof))
            .map(|(i, _)| i)
            .unwrap_or(self.tokens.len())
    }

    /// Skip past the next `;`.
    pub fn skip_statement(&mut self) {
        self.seek(self.statement_end());
        self.eat(&Token::Semicolon);
    }

    /// `(a, b(10) DESC, ...)` yields the leading name of each item.
    pub fn column_list(&mut self) -> Option<Vec<String>> {
        let end = self.matching_paren()?;
        let inner = &self.tokens[self.pos + 1..end];
        self.seek(end + 1);

        let columns: Vec<String> = split_top_level(inner)
            .into_iter()
            .filter_map(|item| item.iter().find_map(Token::name).map(str::to_string))
            .collect();
        if columns.is_empty() { None } else { Some(columns) }
    }
}

/// Split on commas outside any parentheses, dropping empty segments.
pub fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            Token::Comma if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

/// One element of a table body or of an `ALTER TABLE ... ADD`.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Column {
        column: Column,
        unique: bool,
        reference: Option<Reference>,
    },
    PrimaryKey(Vec<String>),
    ForeignKeys(Vec<ForeignKey>),
    Index(Index),
    Skipped,
}

/// Target of a `REFERENCES` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub table: String,
    pub columns: Vec<String>,
    pub on_delete: String,
    pub on_update: String,
}

impl Reference {
    fn foreign_keys(&self, columns: &[String], constraint: Option<&str>) -> Vec<ForeignKey> {
        let ref_columns: Vec<&str> = if self.columns.is_empty() {
            vec![DEFAULT_REF_COLUMN; columns.len()]
        } else {
            self.columns.iter().map(String::as_str).collect()
        };

        columns
            .iter()
            .zip(ref_columns)
            .map(|(column, ref_column)| ForeignKey {
                constraint_name: constraint.map(str::to_string),
                on_delete: self.on_delete.clone(),
                on_update: self.on_update.clone(),
                ..ForeignKey::new(column.as_str(), self.table.as_str(), ref_column)
            })
            .collect()
    }
}

const TYPE_TERMINATORS: &[&str] = &[
    "NOT",
    "NULL",
    "DEFAULT",
    "PRIMARY",
    "UNIQUE",
    "REFERENCES",
    "CHECK",
    "CONSTRAINT",
    "COLLATE",
    "AUTO_INCREMENT",
    "COMMENT",
    "GENERATED",
    "ON",
    "AS",
    "CHARSET",
];

const CONSTRAINT_KEYWORDS: &[&str] = &["PRIMARY", "FOREIGN", "UNIQUE", "CHECK", "EXCLUDE"];

fn ends_type(cur: &Cursor<'_>) -> bool {
    let token = cur.current();
    TYPE_TERMINATORS.iter().any(|kw| token.is_keyword(kw))
        || (token.is_keyword("CHARACTER") && cur.peek(1).is_keyword("SET"))
}

/// Column type, keeping source case and attaching type arguments:
/// `VARCHAR(255)`, `numeric(10,2)`, `timestamp(6) without time zone`,
/// `INT UNSIGNED`, `text[]`.
fn parse_type(cur: &mut Cursor<'_>) -> Option<String> {
    let mut ty = String::new();
    loop {
        match cur.current() {
            Token::Word(word) if !ends_type(cur) => {
                if !ty.is_empty() {
                    ty.push(' ');
                }
                ty.push_str(word);
                cur.advance();
            }
            Token::Ident(name) if ty.is_empty() => {
                ty.push_str(name);
                cur.advance();
            }
            Token::Dot if !ty.is_empty() && cur.peek(1).name().is_some() => {
                cur.advance();
                ty.push('.');
                ty.extend(cur.name());
            }
            Token::LParen if !ty.is_empty() => {
                let start = cur.pos;
                let end = cur.matching_paren()?;
                for token in &cur.tokens[start..=end] {
                    ty.push_str(&token.render());
                }
                cur.seek(end + 1);
            }
            Token::Other('[') if !ty.is_empty() => {
                cur.advance();
                while matches!(cur.current(), Token::Num(_)) {
                    cur.advance();
                }
                cur.eat(&Token::Other(']'));
                ty.push_str("[]");
            }
            _ => break,
        }
    }
    if ty.is_empty() { None } else { Some(ty) }
}

/// `DEFAULT` expression: string literals unquoted, function calls kept,
/// trailing `::type` casts dropped.
pub fn parse_default(cur: &mut Cursor<'_>) -> String {
    let value = match cur.current() {
        Token::Str(s) | Token::Ident(s) | Token::Num(s) => {
            cur.advance();
            s.clone()
        }
        // b'0', x'1F', E'\n', N'text'
        Token::Word(prefix)
            if is_literal_prefix(prefix) && matches!(cur.peek(1), Token::Str(_)) =>
        {
            let value = match cur.peek(1) {
                Token::Str(s) => s.clone(),
                _ => String::new(),
            };
            cur.advance_by(2);
            value
        }
        Token::Word(word) => {
            cur.advance();
            let mut value = word.clone();
            if *cur.current() == Token::LParen {
                value.push_str(&cur.take_group());
            }
            value
        }
        Token::LParen => cur.take_group(),
        _ => return String::new(),
    };

    while *cur.current() == Token::Other(':') && *cur.peek(1) == Token::Other(':') {
        cur.advance_by(2);
        parse_type(cur);
    }
    value
}

fn is_literal_prefix(word: &str) -> bool {
    matches!(word, "b" | "B" | "x" | "X" | "e" | "E" | "n" | "N")
}

/// Length in tokens of the referential action at `offset`, with its text.
fn referential_action(cur: &Cursor<'_>, offset: usize) -> Option<(String, usize)> {
    let token = cur.peek(offset);
    let next = cur.peek(offset + 1);
    if token.is_keyword("CASCADE") || token.is_keyword("RESTRICT") {
        Some((token.render().to_uppercase(), 1))
    } else if token.is_keyword("SET") && (next.is_keyword("NULL") || next.is_keyword("DEFAULT")) {
        Some((format!("SET {}", next.render().to_uppercase()), 2))
    } else if token.is_keyword("NO") && next.is_keyword("ACTION") {
        Some((NO_ACTION.to_string(), 2))
    } else {
        None
    }
}

/// `REFERENCES` target, cursor positioned after the keyword.
fn parse_reference(cur: &mut Cursor<'_>) -> Option<Reference> {
    let table = cur.qualified_name()?.pop()?;
    let columns = if *cur.current() == Token::LParen {
        cur.column_list().unwrap_or_default()
    } else {
        Vec::new()
    };

    let mut reference = Reference {
        table,
        columns,
        on_delete: NO_ACTION.to_string(),
        on_update: NO_ACTION.to_string(),
    };

    loop {
        if cur.eat_keyword("MATCH") {
            cur.advance();
        } else if cur.at_keyword("ON")
            && (cur.peek(1).is_keyword("DELETE") || cur.peek(1).is_keyword("UPDATE"))
        {
            let Some((action, len)) = referential_action(cur, 2) else {
                break;
            };
            if cur.peek(1).is_keyword("DELETE") {
                reference.on_delete = action;
            } else {
                reference.on_update = action;
            }
            cur.advance_by(2 + len);
        } else {
            break;
        }
    }
    Some(reference)
}

/// Columns of an element that needs a name for an index.
fn looks_like_index(cur: &Cursor<'_>) -> bool {
    match cur.peek(1) {
        Token::LParen => true,
        token if token.is_keyword("USING") => true,
        token if token.name().is_some() => match cur.peek(2) {
            Token::LParen => !matches!(cur.peek(3), Token::Num(_)),
            next => next.is_keyword("USING"),
        },
        _ => false,
    }
}

fn parse_index_tail(
    cur: &mut Cursor<'_>,
    is_unique: bool,
    mut index_type: Option<String>,
    name: Option<String>,
    table: &str,
    dialect: Dialect,
) -> Option<Element> {
    let mut name = name;
    if !cur.at_keyword("USING") && cur.current().name().is_some() {
        name = cur.name();
    }
    if cur.eat_keyword("USING") {
        index_type = cur.name().map(|t| t.to_uppercase());
    }
    let columns = cur.column_list()?;
    if cur.eat_keyword("USING") {
        index_type = cur.name().map(|t| t.to_uppercase());
    }

    let name = name.unwrap_or_else(|| dialect.implicit_index_name(table, &columns, is_unique));
    let mut index = Index::new(name, columns, is_unique);
    index.index_type = index_type;
    Some(Element::Index(index))
}

fn parse_column(cur: &mut Cursor<'_>) -> Option<Element> {
    let name = cur.name()?;
    let data_type = parse_type(cur)?;
    let mut column = Column::new(name, data_type);
    column.auto_increment = is_serial_type(&column.data_type);

    let mut unique = false;
    let mut reference = None;

    while !cur.at_end() {
        if cur.eat_keywords(&["NOT", "NULL"]) {
            column.nullable = false;
        } else if cur.eat_keyword("NULL") {
            column.nullable = true;
        } else if cur.eat_keywords(&["PRIMARY", "KEY"]) {
            column.is_primary_key = true;
        } else if cur.eat_keyword("AUTO_INCREMENT") {
            column.auto_increment = true;
        } else if cur.eat_keyword("DEFAULT") {
            let default = parse_default(cur);
            if is_sequence_default(&default) {
                column.auto_increment = true;
            }
            if !default.is_empty() {
                column.default = Some(default);
            }
        } else if cur.eat_keyword("COMMENT") {
            if let Token::Str(comment) = cur.current() {
                column.comment = Some(comment.clone());
                cur.advance();
            }
        } else if cur.eat_keyword("UNIQUE") {
            cur.eat_keyword("KEY");
            unique = true;
        } else if cur.eat_keyword("REFERENCES") {
            reference = parse_reference(cur);
        } else if cur.eat_keyword("COLLATE") || cur.eat_keywords(&["CHARACTER", "SET"]) || cur.eat_keyword("CHARSET") {
            cur.advance();
        } else if cur.eat_keywords(&["ON", "UPDATE"]) {
            cur.advance();
            cur.skip_group();
        } else if cur.eat_keyword("GENERATED") {
            cur.eat_keyword("ALWAYS");
            cur.eat_keywords(&["BY", "DEFAULT"]);
            if cur.eat_keywords(&["AS", "IDENTITY"]) {
                column.auto_increment = true;
            }
            cur.eat_keyword("AS");
            cur.skip_group();
        } else if cur.eat_keyword("AS") || cur.eat_keyword("CHECK") {
            cur.skip_group();
        } else if cur.eat_keyword("CONSTRAINT") {
            if !CONSTRAINT_KEYWORDS.iter().any(|kw| cur.at_keyword(kw)) {
                cur.advance();
            }
        } else if *cur.current() == Token::LParen {
            cur.skip_group();
        } else {
            cur.advance();
        }
    }

    Some(Element::Column {
        column,
        unique,
        reference,
    })
}

fn is_serial_type(data_type: &str) -> bool {
    matches!(
        data_type.to_lowercase().as_str(),
        "serial" | "bigserial" | "smallserial" | "serial2" | "serial4" | "serial8"
    )
}

fn is_sequence_default(default: &str) -> bool {
    default.to_lowercase().starts_with("nextval(")
}

/// Classify and parse one element by its leading keyword.
pub fn parse_element(tokens: &[Token], table: &str, dialect: Dialect) -> Option<Element> {
    let mut cur = Cursor::new(tokens);

    let mut constraint = None;
    if cur.eat_keyword("CONSTRAINT") && !CONSTRAINT_KEYWORDS.iter().any(|kw| cur.at_keyword(kw)) {
        constraint = cur.name();
    }

    if cur.eat_keywords(&["PRIMARY", "KEY"]) {
        if cur.eat_keyword("USING") {
            cur.advance();
        }
        return cur.column_list().map(Element::PrimaryKey);
    }

    if cur.eat_keywords(&["FOREIGN", "KEY"]) {
        if cur.current().name().is_some() {
            cur.advance();
        }
        let columns = cur.column_list()?;
        if !cur.eat_keyword("REFERENCES") {
            return None;
        }
        let reference = parse_reference(&mut cur)?;
        return Some(Element::ForeignKeys(
            reference.foreign_keys(&columns, constraint.as_deref()),
        ));
    }

    if cur.eat_keyword("UNIQUE") {
        if !cur.eat_keyword("KEY") {
            cur.eat_keyword("INDEX");
        }
        return parse_index_tail(&mut cur, true, None, constraint, table, dialect);
    }

    if (cur.at_keyword("KEY") || cur.at_keyword("INDEX")) && looks_like_index(&cur) {
        cur.advance();
        return parse_index_tail(&mut cur, false, None, constraint, table, dialect);
    }

    for kind in ["FULLTEXT", "SPATIAL"] {
        if cur.eat_keyword(kind) {
            if !cur.eat_keyword("KEY") {
                cur.eat_keyword("INDEX");
            }
            return parse_index_tail(&mut cur, false, Some(kind.to_string()), constraint, table, dialect);
        }
    }

    if ["CHECK", "EXCLUDE", "LIKE"].iter().any(|kw| cur.at_keyword(kw)) {
        return Some(Element::Skipped);
    }

    if constraint.is_some() {
        return None;
    }

    parse_column(&mut cur)
}

/// Apply parsed elements: columns first, then keys and indexes, so that
/// constraint order within a body does not matter.
pub fn apply_elements(table: &mut Table, elements: Vec<Element>, dialect: Dialect) {
    let mut primary = Vec::new();
    let mut foreign = Vec::new();
    let mut indexes = Vec::new();

    for element in elements {
        match element {
            Element::Column {
                column,
                unique,
                reference,
            } => {
                let name = vec![column.name.clone()];
                if unique {
                    let index_name = dialect.implicit_index_name(&table.name, &name, true);
                    indexes.push(Index::new(index_name, name.clone(), true));
                }
                if let Some(reference) = reference {
                    foreign.extend(reference.foreign_keys(&name, None));
                }
                table.add_column(column);
            }
            Element::PrimaryKey(columns) => primary.extend(columns),
            Element::ForeignKeys(fks) => foreign.extend(fks),
            Element::Index(index) => indexes.push(index),
            Element::Skipped => {}
        }
    }

    if !primary.is_empty() {
        table.mark_primary_keys(&primary);
    }
    for fk in foreign {
        table.add_foreign_key(fk);
    }
    for index in indexes {
        table.add_index(index);
    }
}

/// Statement-level parser producing the table map of one dump.
pub struct Parser<'a> {
    cur: Cursor<'a>,
    tokens: &'a [Token],
    dialect: Dialect,
    database: String,
    tables: TableMap,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], dialect: Dialect, database: &str) -> Self {
        Self {
            cur: Cursor::new(tokens),
            tokens,
            dialect,
            database: database.to_string(),
            tables: TableMap::new(),
        }
    }

    pub fn parse(mut self) -> TableMap {
        while !self.cur.at_end() {
            if self.cur.at_keyword("CREATE") {
                self.parse_create();
            } else if self.cur.at_keyword("ALTER") {
                self.parse_alter();
            } else if self.cur.at_keyword("COMMENT") && self.dialect == Dialect::PostgreSql {
                postgres::parse_comment_on(&mut self.cur, &mut self.tables);
            } else {
                self.cur.skip_statement();
            }
        }
        self.tables
    }

    fn parse_create(&mut self) {
        self.cur.advance();
        self.cur.eat_keywords(&["OR", "REPLACE"]);
        while ["TEMPORARY", "TEMP", "UNLOGGED", "GLOBAL", "LOCAL"]
            .iter()
            .any(|kw| self.cur.eat_keyword(kw))
        {}

        if self.cur.eat_keyword("TABLE") {
            self.parse_create_table();
        } else if ["UNIQUE", "FULLTEXT", "SPATIAL", "INDEX"]
            .iter()
            .any(|kw| self.cur.at_keyword(kw))
        {
            self.parse_create_index();
        } else {
            self.cur.skip_statement();
        }
    }

    fn parse_create_table(&mut self) {
        self.cur.eat_keywords(&["IF", "NOT", "EXISTS"]);

        let Some(name) = self.cur.qualified_name().and_then(|mut parts| parts.pop()) else {
            self.cur.skip_statement();
            return;
        };

        let Some(close) = self.cur.matching_paren() else {
            tracing::debug!(table = %name, "CREATE TABLE without a closed column list, skipped");
            self.cur.skip_statement();
            return;
        };
        let body = &self.tokens[self.cur.pos + 1..close];
        self.cur.seek(close + 1);

        let mut table = self.dialect.new_table(&name, &self.database);
        match self.dialect {
            Dialect::MySql => mysql::parse_table_options(&mut self.cur, &mut table),
            Dialect::PostgreSql => {
                if !postgres::at_statement_end(&mut self.cur) {
                    tracing::debug!(table = %name, "Column list not followed by ';', table discarded");
                    self.cur.skip_statement();
                    return;
                }
            }
        }

        let elements = split_top_level(body)
            .into_iter()
            .filter_map(|tokens| {
                let element = parse_element(tokens, &name, self.dialect);
                if element.is_none() {
                    tracing::debug!(table = %name, element = %render_tokens(tokens), "Skipping unrecognised table element");
                }
                element
            })
            .collect();
        apply_elements(&mut table, elements, self.dialect);

        tracing::debug!(
            table = %table.name,
            columns = table.columns.len(),
            foreign_keys = table.foreign_keys.len(),
            "Parsed table"
        );
        self.tables.insert(table);
    }

    fn parse_alter(&mut self) {
        self.cur.advance();
        if !self.cur.eat_keyword("TABLE") {
            self.cur.skip_statement();
            return;
        }
        self.cur.eat_keywords(&["IF", "EXISTS"]);
        self.cur.eat_keyword("ONLY");

        let Some(name) = self.cur.qualified_name().and_then(|mut parts| parts.pop()) else {
            self.cur.skip_statement();
            return;
        };

        let start = self.cur.pos;
        let end = self.cur.statement_end();
        let actions = &self.tokens[start..end];
        self.cur.skip_statement();

        let mut elements = Vec::new();
        let mut defaults = Vec::new();
        for action in split_top_level(actions) {
            let mut cur = Cursor::new(action);
            if cur.eat_keyword("ADD") {
                cur.eat_keyword("COLUMN");
                cur.eat_keywords(&["IF", "NOT", "EXISTS"]);
                elements.extend(parse_element(cur.rest(), &name, self.dialect));
            } else if cur.eat_keyword("ALTER") {
                cur.eat_keyword("COLUMN");
                if let Some(column) = cur.name() {
                    if cur.eat_keywords(&["SET", "DEFAULT"]) {
                        defaults.push((column, parse_default(&mut cur)));
                    }
                }
            }
        }

        if elements.is_empty() && defaults.is_empty() {
            return;
        }

        let Some(table) = self.tables.get_mut(&name) else {
            tracing::warn!(table = %name, "ALTER TABLE references a table not defined in this dump, ignored");
            return;
        };

        apply_elements(table, elements, self.dialect);
        for (column, default) in defaults {
            if let Some(column) = table.get_column_mut(&column) {
                if is_sequence_default(&default) {
                    column.auto_increment = true;
                }
                column.default = Some(default);
            }
        }
    }

    fn parse_create_index(&mut self) {
        let is_unique = self.cur.eat_keyword("UNIQUE");
        let mut index_type = ["FULLTEXT", "SPATIAL"]
            .into_iter()
            .find(|kw| self.cur.eat_keyword(kw))
            .map(str::to_string);

        if !self.cur.eat_keyword("INDEX") {
            self.cur.skip_statement();
            return;
        }
        self.cur.eat_keyword("CONCURRENTLY");
        self.cur.eat_keywords(&["IF", "NOT", "EXISTS"]);

        let index_name = if self.cur.at_keyword("ON") { None } else { self.cur.name() };
        if self.cur.eat_keyword("USING") {
            index_type = self.cur.name().map(|t| t.to_uppercase());
        }
        if !self.cur.eat_keyword("ON") {
            self.cur.skip_statement();
            return;
        }
        self.cur.eat_keyword("ONLY");

        let Some(table_name) = self.cur.qualified_name().and_then(|mut parts| parts.pop()) else {
            self.cur.skip_statement();
            return;
        };
        if self.cur.eat_keyword("USING") {
            index_type = self.cur.name().map(|t| t.to_uppercase());
        }
        let columns = self.cur.column_list();
        self.cur.skip_statement();

        let Some(columns) = columns else {
            return;
        };
        let Some(table) = self.tables.get_mut(&table_name) else {
            tracing::warn!(table = %table_name, "CREATE INDEX references a table not defined in this dump, ignored");
            return;
        };

        let name = index_name
            .unwrap_or_else(|| self.dialect.implicit_index_name(&table_name, &columns, is_unique));
        let mut index = Index::new(name, columns, is_unique);
        index.index_type = index_type;
        table.add_index(index);
    }
}
