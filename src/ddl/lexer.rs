//! SQL lexer shared by both dialects.
//!
//! Keywords are not distinguished at this level: bare words come out as
//! [`Token::Word`] and the grammar compares them case-insensitively. Quoted
//! identifiers are never keywords.

use super::Dialect;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Bare word, possibly a keyword
    Word(String),
    /// Backtick- or double-quoted identifier
    Ident(String),
    /// Single-quoted string literal, unescaped
    Str(String),
    Num(String),

    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    Eq,
    Other(char),

    Eof,
}

impl Token {
    /// Case-insensitive keyword match on bare words.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    /// Name carried by a word or quoted identifier.
    pub fn name(&self) -> Option<&str> {
        match self {
            Token::Word(s) | Token::Ident(s) => Some(s),
            _ => None,
        }
    }

    /// Source-like rendering, used to rebuild expressions.
    pub fn render(&self) -> String {
        match self {
            Token::Word(s) | Token::Num(s) => s.clone(),
            Token::Ident(s) => format!("\"{}\"", s),
            Token::Str(s) => format!("'{}'", s.replace('\'', "''")),
            Token::LParen => "(".to_string(),
            Token::RParen => ")".to_string(),
            Token::Comma => ",".to_string(),
            Token::Semicolon => ";".to_string(),
            Token::Dot => ".".to_string(),
            Token::Eq => "=".to_string(),
            Token::Other(c) => c.to_string(),
            Token::Eof => String::new(),
        }
    }

    fn is_wordish(&self) -> bool {
        matches!(self, Token::Word(_) | Token::Ident(_) | Token::Str(_) | Token::Num(_))
    }
}

/// Render a token run back into expression text.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for token in tokens {
        if let Some(prev) = prev {
            let spaced = (prev.is_wordish() && token.is_wordish())
                || matches!(prev, Token::Other(c) if !matches!(c, ':' | '[' | ']'))
                || matches!(token, Token::Other(c) if !matches!(c, ':' | '[' | ']'))
                || matches!(prev, Token::Comma);
            if spaced {
                out.push(' ');
            }
        }
        out.push_str(&token.render());
        prev = Some(token);
    }
    out
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    current_char: Option<char>,
    dialect: Dialect,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, dialect: Dialect) -> Self {
        let mut chars = input.chars().peekable();
        let current_char = chars.next();
        Self {
            chars,
            current_char,
            dialect,
        }
    }

    fn advance(&mut self) {
        self.current_char = self.chars.next();
    }

    fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        // positioned on the '*' of "/*"
        self.advance();
        while let Some(c) = self.current_char {
            self.advance();
            if c == '*' && self.current_char == Some('/') {
                self.advance();
                break;
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    fn read_quoted_identifier(&mut self, quote: char) -> String {
        self.advance();
        let mut ident = String::new();
        while let Some(c) = self.current_char {
            if c == quote {
                if self.peek() == Some(&quote) {
                    ident.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    break;
                }
            } else {
                ident.push(c);
                self.advance();
            }
        }
        ident
    }

    fn read_string(&mut self) -> String {
        self.advance();
        let backslash_escapes = self.dialect == Dialect::MySql;
        let mut s = String::new();
        while let Some(c) = self.current_char {
            if c == '\'' {
                if self.peek() == Some(&'\'') {
                    s.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    break;
                }
            } else if c == '\\' && backslash_escapes {
                self.advance();
                if let Some(escaped) = self.current_char {
                    match escaped {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        'r' => s.push('\r'),
                        '0' => {}
                        _ => s.push(escaped),
                    }
                    self.advance();
                }
            } else {
                s.push(c);
                self.advance();
            }
        }
        s
    }

    /// `$tag$ ... $tag$` bodies become one string token. A `$` that does not
    /// open a quote yields a word such as `$1`.
    fn read_dollar_quoted(&mut self) -> Token {
        self.advance();
        let mut tag = String::new();
        while let Some(c) = self.current_char {
            if c.is_alphanumeric() || c == '_' {
                tag.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.current_char != Some('$') {
            return Token::Word(format!("${}", tag));
        }
        self.advance();

        let delimiter = format!("${}$", tag);
        let mut body = String::new();
        while let Some(c) = self.current_char {
            body.push(c);
            self.advance();
            if body.ends_with(&delimiter) {
                body.truncate(body.len() - delimiter.len());
                break;
            }
        }
        Token::Str(body)
    }

    /// Digits, optionally negative and with one decimal point. A run that
    /// continues into letters is a word (`2fa_enabled`).
    fn read_number(&mut self) -> Token {
        let mut num = String::new();
        let mut has_dot = false;

        if self.current_char == Some('-') {
            num.push('-');
            self.advance();
        }

        while let Some(c) = self.current_char {
            if c.is_ascii_digit() {
                num.push(c);
                self.advance();
            } else if c == '.' && !has_dot && self.peek().is_some_and(|n| n.is_ascii_digit()) {
                has_dot = true;
                num.push(c);
                self.advance();
            } else if (c.is_alphabetic() || c == '_') && !has_dot && !num.starts_with('-') {
                num.push_str(&self.read_word());
                return Token::Word(num);
            } else {
                break;
            }
        }
        Token::Num(num)
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();

            match self.current_char {
                None => return Token::Eof,

                Some('-') => {
                    if self.peek() == Some(&'-') {
                        self.skip_line_comment();
                        continue;
                    } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        return self.read_number();
                    }
                    self.advance();
                    return Token::Other('-');
                }

                Some('/') => {
                    self.advance();
                    if self.current_char == Some('*') {
                        self.skip_block_comment();
                        continue;
                    }
                    return Token::Other('/');
                }

                Some('#') if self.dialect == Dialect::MySql => {
                    self.skip_line_comment();
                    continue;
                }

                Some('(') => {
                    self.advance();
                    return Token::LParen;
                }
                Some(')') => {
                    self.advance();
                    return Token::RParen;
                }
                Some(',') => {
                    self.advance();
                    return Token::Comma;
                }
                Some(';') => {
                    self.advance();
                    return Token::Semicolon;
                }
                Some('.') => {
                    self.advance();
                    return Token::Dot;
                }
                Some('=') => {
                    self.advance();
                    return Token::Eq;
                }

                Some('$') if self.dialect == Dialect::PostgreSql => return self.read_dollar_quoted(),

                Some('"') => return Token::Ident(self.read_quoted_identifier('"')),
                Some('`') => return Token::Ident(self.read_quoted_identifier('`')),
                Some('\'') => return Token::Str(self.read_string()),

                Some(c) if c.is_ascii_digit() => return self.read_number(),
                Some(c) if c.is_alphabetic() || c == '_' => return Token::Word(self.read_word()),

                Some(c) => {
                    self.advance();
                    return Token::Other(c);
                }
            }
        }
    }

    /// Collect all tokens, terminated by [`Token::Eof`].
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(sql: &str, dialect: Dialect) -> Vec<Token> {
        Lexer::new(sql, dialect).tokenize()
    }

    #[test]
    fn test_simple_create_table() {
        let tokens = lex("CREATE TABLE users (id INT);", Dialect::MySql);

        assert!(tokens[0].is_keyword("create"));
        assert!(tokens[1].is_keyword("TABLE"));
        assert_eq!(tokens[2], Token::Word("users".to_string()));
        assert_eq!(tokens[3], Token::LParen);
        assert_eq!(tokens[5], Token::Word("INT".to_string()));
        assert_eq!(tokens[6], Token::RParen);
        assert_eq!(tokens[7], Token::Semicolon);
        assert_eq!(tokens[8], Token::Eof);
    }

    #[test]
    fn test_quoted_identifiers_are_not_keywords() {
        let tokens = lex(r#"CREATE TABLE "User Table" (`key` INT);"#, Dialect::MySql);

        assert_eq!(tokens[2], Token::Ident("User Table".to_string()));
        assert_eq!(tokens[4], Token::Ident("key".to_string()));
        assert!(!tokens[4].is_keyword("KEY"));
    }

    #[test]
    fn test_comments_stripped() {
        let tokens = lex("-- header\nCREATE /* block */ TABLE t;", Dialect::PostgreSql);
        assert!(tokens[0].is_keyword("CREATE"));
        assert!(tokens[1].is_keyword("TABLE"));

        let tokens = lex("# mysql note\nCREATE TABLE t;", Dialect::MySql);
        assert!(tokens[0].is_keyword("CREATE"));
    }

    #[test]
    fn test_strings_and_numbers() {
        let tokens = lex(r"DEFAULT 'it''s' 'a\'b' -1.5 2fa", Dialect::MySql);
        assert_eq!(tokens[1], Token::Str("it's".to_string()));
        assert_eq!(tokens[2], Token::Str("a'b".to_string()));
        assert_eq!(tokens[3], Token::Num("-1.5".to_string()));
        assert_eq!(tokens[4], Token::Word("2fa".to_string()));
    }

    #[test]
    fn test_dollar_quoted_body() {
        let tokens = lex(
            "CREATE FUNCTION f() RETURNS int AS $fn$ BEGIN; CREATE TABLE x (a int); END $fn$;",
            Dialect::PostgreSql,
        );
        assert!(tokens.contains(&Token::Str(" BEGIN; CREATE TABLE x (a int); END ".to_string())));
        assert_eq!(tokens.iter().filter(|t| **t == Token::Semicolon).count(), 1);
    }

    #[test]
    fn test_render_tokens() {
        let tokens = lex("nextval('users_id_seq'::regclass)", Dialect::PostgreSql);
        let end = tokens.len() - 1;
        assert_eq!(render_tokens(&tokens[..end]), "nextval('users_id_seq'::regclass)");
    }
}
