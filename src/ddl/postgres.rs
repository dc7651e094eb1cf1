//! PostgreSQL-specific grammar: statement termination after the column list
//! and `COMMENT ON` statements.

use super::lexer::Token;
use super::parser::Cursor;
use crate::schema::TableMap;

/// A PostgreSQL column list must be followed directly by `;`.
pub fn at_statement_end(cur: &mut Cursor<'_>) -> bool {
    cur.eat(&Token::Semicolon)
}

enum CommentTarget {
    Table,
    Column,
}

/// `COMMENT ON TABLE t IS '...'` and `COMMENT ON COLUMN t.c IS '...'`.
/// `IS NULL` clears the comment.
pub fn parse_comment_on(cur: &mut Cursor<'_>, tables: &mut TableMap) {
    cur.advance();
    if !cur.eat_keyword("ON") {
        cur.skip_statement();
        return;
    }

    let target = if cur.eat_keyword("TABLE") {
        CommentTarget::Table
    } else if cur.eat_keyword("COLUMN") {
        CommentTarget::Column
    } else {
        cur.skip_statement();
        return;
    };

    let Some(mut path) = cur.qualified_name() else {
        cur.skip_statement();
        return;
    };
    if !cur.eat_keyword("IS") {
        cur.skip_statement();
        return;
    }
    let comment = match cur.current() {
        Token::Str(text) => Some(text.clone()),
        token if token.is_keyword("NULL") => None,
        _ => {
            cur.skip_statement();
            return;
        }
    };
    cur.skip_statement();

    match target {
        CommentTarget::Table => {
            let Some(name) = path.pop() else { return };
            match tables.get_mut(&name) {
                Some(table) => table.comment = comment,
                None => tracing::warn!(table = %name, "COMMENT ON unknown table, ignored"),
            }
        }
        CommentTarget::Column => {
            let (Some(column), Some(table)) = (path.pop(), path.pop()) else {
                return;
            };
            match tables.get_mut(&table).and_then(|t| t.get_column_mut(&column)) {
                Some(col) => col.comment = comment,
                None => tracing::warn!(table = %table, column = %column, "COMMENT ON unknown column, ignored"),
            }
        }
    }
}
