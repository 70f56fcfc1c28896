//! Lexer and recursive-descent parser for the query dialect (§4.6).
//!
//! ```text
//! query        ::= ["SELECT" "*" "FROM" "documents"] where? order? limit? offset?
//! where        ::= "WHERE" predicate ("AND" predicate)*
//! predicate    ::= ident op literal
//!                | ident "IS" ["NOT"] "NULL"
//!                | ident "LIKE" string
//! op           ::= "=" | "!=" | "<>" | ">" | ">=" | "<" | "<="
//! literal      ::= string | number | "true" | "false"
//! order        ::= "ORDER" "BY" orderKey ("ASC" | "DESC")?
//! orderKey     ::= "createdutc" | "lastupdateutc" | "name"
//! limit        ::= "LIMIT" integer
//! offset       ::= "OFFSET" integer
//! ```

use crate::query::{Condition, Filter, OrderDirection, OrderKey, SearchQuery};

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    UnexpectedToken { found: String, pos: usize },
    UnexpectedEof,
    InvalidNumber(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::UnexpectedToken { found, pos } => {
                write!(f, "unexpected token {found:?} at position {pos}")
            }
            ParseError::UnexpectedEof => write!(f, "unexpected end of query"),
            ParseError::InvalidNumber(s) => write!(f, "invalid number literal: {s}"),
        }
    }
}

impl std::error::Error for ParseError {}

// -- Lexer -------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    String(String),
    Number(String),
    /// `=`, `!=`, `<>`, `>`, `>=`, `<`, `<=`
    Op(String),
    LParen,
    RParen,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

struct Lexer<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(c) = self.peek_char() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    pos: start,
                });
                break;
            };

            let kind = match c {
                '(' => {
                    self.bump();
                    TokenKind::LParen
                }
                ')' => {
                    self.bump();
                    TokenKind::RParen
                }
                '\'' | '"' => self.lex_string(c)?,
                '*' => {
                    self.bump();
                    TokenKind::Op("*".into())
                }
                '=' => {
                    self.bump();
                    TokenKind::Op("=".into())
                }
                '!' => {
                    self.bump();
                    if self.peek_char() == Some('=') {
                        self.bump();
                        TokenKind::Op("!=".into())
                    } else {
                        return Err(ParseError::UnexpectedToken {
                            found: "!".into(),
                            pos: start,
                        });
                    }
                }
                '<' => {
                    self.bump();
                    match self.peek_char() {
                        Some('=') => {
                            self.bump();
                            TokenKind::Op("<=".into())
                        }
                        Some('>') => {
                            self.bump();
                            TokenKind::Op("<>".into())
                        }
                        _ => TokenKind::Op("<".into()),
                    }
                }
                '>' => {
                    self.bump();
                    if self.peek_char() == Some('=') {
                        self.bump();
                        TokenKind::Op(">=".into())
                    } else {
                        TokenKind::Op(">".into())
                    }
                }
                c if c.is_ascii_digit() || (c == '-' && self.peek_is_digit_after_sign()) => {
                    self.lex_number()
                }
                c if is_ident_start(c) => self.lex_ident(),
                other => {
                    return Err(ParseError::UnexpectedToken {
                        found: other.to_string(),
                        pos: start,
                    })
                }
            };

            tokens.push(Token { kind, pos: start });
        }
        Ok(tokens)
    }

    fn peek_is_digit_after_sign(&self) -> bool {
        self.chars.get(self.pos + 1).is_some_and(|c| c.is_ascii_digit())
    }

    fn lex_string(&mut self, quote: char) -> Result<TokenKind, ParseError> {
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => break,
                Some(c) => s.push(c),
                None => return Err(ParseError::UnexpectedEof),
            }
        }
        Ok(TokenKind::String(s))
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.bump();
        }
        while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek_char() == Some('.') {
            self.bump();
            while matches!(self.peek_char(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        let s: String = self.chars[start..self.pos].iter().collect();
        TokenKind::Number(s)
    }

    fn lex_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while matches!(self.peek_char(), Some(c) if is_ident_continue(c)) {
            self.bump();
        }
        let s: String = self.chars[start..self.pos].iter().collect();
        TokenKind::Ident(s)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '$'
}

// -- Parser ------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn ident_matches(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(s) if s.eq_ignore_ascii_case(word))
    }

    fn expect_ident(&mut self, word: &str) -> Result<(), ParseError> {
        if self.ident_matches(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> ParseError {
        let tok = self.peek();
        ParseError::UnexpectedToken {
            found: describe(&tok.kind),
            pos: tok.pos,
        }
    }

    fn take_ident(&mut self) -> Result<String, ParseError> {
        match self.advance().kind {
            TokenKind::Ident(s) => Ok(s),
            other => Err(ParseError::UnexpectedToken {
                found: describe(&other),
                pos: self.tokens[self.pos.saturating_sub(1)].pos,
            }),
        }
    }

    fn parse(mut self) -> Result<SearchQuery, ParseError> {
        // Optional `SELECT * FROM documents`.
        if self.ident_matches("select") {
            self.advance();
            while !self.ident_matches("from") && !self.at_eof() {
                self.advance();
            }
            self.expect_ident("from")?;
            self.expect_ident("documents")?;
        }

        let mut query = SearchQuery::for_collection(String::new());

        if self.ident_matches("where") {
            self.advance();
            query.filters.push(self.parse_predicate()?);
            while self.ident_matches("and") {
                self.advance();
                query.filters.push(self.parse_predicate()?);
            }
        }

        if self.ident_matches("order") {
            self.advance();
            self.expect_ident("by")?;
            let key_name = self.take_ident()?;
            query.order_by = match key_name.to_ascii_lowercase().as_str() {
                "createdutc" => OrderKey::CreatedUtc,
                "lastupdateutc" => OrderKey::LastUpdateUtc,
                "name" => OrderKey::Name,
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        found: key_name,
                        pos: self.tokens[self.pos.saturating_sub(1)].pos,
                    })
                }
            };
            query.order_dir = OrderDirection::default_for(query.order_by);
            if self.ident_matches("asc") {
                self.advance();
                query.order_dir = OrderDirection::Asc;
            } else if self.ident_matches("desc") {
                self.advance();
                query.order_dir = OrderDirection::Desc;
            }
        }

        if self.ident_matches("limit") {
            self.advance();
            query.max_results = self.take_integer()?;
        }

        if self.ident_matches("offset") {
            self.advance();
            query.skip = self.take_integer()?;
        }

        if !self.at_eof() {
            return Err(self.unexpected());
        }

        Ok(query)
    }

    fn take_integer(&mut self) -> Result<i64, ParseError> {
        match self.advance().kind {
            TokenKind::Number(s) => s
                .parse::<i64>()
                .map_err(|_| ParseError::InvalidNumber(s)),
            other => Err(ParseError::UnexpectedToken {
                found: describe(&other),
                pos: self.tokens[self.pos.saturating_sub(1)].pos,
            }),
        }
    }

    fn parse_predicate(&mut self) -> Result<Filter, ParseError> {
        let field = self.take_ident()?;

        if self.ident_matches("is") {
            self.advance();
            let mut negated = false;
            if self.ident_matches("not") {
                self.advance();
                negated = true;
            }
            self.expect_ident("null")?;
            return Ok(Filter {
                field,
                condition: if negated {
                    Condition::IsNotNull
                } else {
                    Condition::IsNull
                },
                value: None,
            });
        }

        if self.ident_matches("like") {
            self.advance();
            let pattern = self.take_string()?;
            let (condition, value) = classify_like(&pattern);
            return Ok(Filter {
                field,
                condition,
                value: Some(value),
            });
        }

        let op_tok = self.advance();
        let op = match op_tok.kind {
            TokenKind::Op(s) => s,
            other => {
                return Err(ParseError::UnexpectedToken {
                    found: describe(&other),
                    pos: op_tok.pos,
                })
            }
        };
        let condition = match op.as_str() {
            "=" => Condition::Eq,
            "!=" | "<>" => Condition::Ne,
            ">" => Condition::Gt,
            ">=" => Condition::Gte,
            "<" => Condition::Lt,
            "<=" => Condition::Lte,
            _ => unreachable!("lexer only emits the operators above"),
        };

        let value = self.take_literal()?;
        Ok(Filter {
            field,
            condition,
            value: Some(value),
        })
    }

    fn take_string(&mut self) -> Result<String, ParseError> {
        match self.advance().kind {
            TokenKind::String(s) => Ok(s),
            other => Err(ParseError::UnexpectedToken {
                found: describe(&other),
                pos: self.tokens[self.pos.saturating_sub(1)].pos,
            }),
        }
    }

    fn take_literal(&mut self) -> Result<String, ParseError> {
        match self.advance().kind {
            TokenKind::String(s) => Ok(s),
            TokenKind::Number(s) => Ok(s),
            TokenKind::Ident(s) if s.eq_ignore_ascii_case("true") => Ok("true".into()),
            TokenKind::Ident(s) if s.eq_ignore_ascii_case("false") => Ok("false".into()),
            other => Err(ParseError::UnexpectedToken {
                found: describe(&other),
                pos: self.tokens[self.pos.saturating_sub(1)].pos,
            }),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(s) => s.clone(),
        TokenKind::String(s) => format!("'{s}'"),
        TokenKind::Number(s) => s.clone(),
        TokenKind::Op(s) => s.clone(),
        TokenKind::LParen => "(".into(),
        TokenKind::RParen => ")".into(),
        TokenKind::Eof => "<eof>".into(),
    }
}

/// Classifies a `LIKE` pattern per §4.6: `%` is a wildcard at either end
/// (or both, or neither).
fn classify_like(pattern: &str) -> (Condition, String) {
    let leading = pattern.starts_with('%');
    let trailing = pattern.ends_with('%') && pattern.len() > 1;
    match (leading, trailing) {
        (true, true) => (Condition::Contains, pattern[1..pattern.len() - 1].to_string()),
        (false, true) => (Condition::StartsWith, pattern[..pattern.len() - 1].to_string()),
        (true, false) => (Condition::EndsWith, pattern[1..].to_string()),
        (false, false) => (Condition::Eq, pattern.to_string()),
    }
}

/// Parses a query-dialect string into a [`SearchQuery`]. The returned
/// query's `collection_id` is empty; callers set it explicitly, since the
/// grammar has no collection clause (it is supplied out of band, §4.7).
pub fn parse(sql: &str) -> Result<SearchQuery, ParseError> {
    let tokens = Lexer::new(sql).tokenize()?;
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_where() {
        let q = parse("WHERE age > 18").unwrap();
        assert_eq!(q.filters.len(), 1);
        assert_eq!(q.filters[0].field, "age");
        assert_eq!(q.filters[0].condition, Condition::Gt);
        assert_eq!(q.filters[0].value.as_deref(), Some("18"));
    }

    #[test]
    fn parses_and_composition() {
        let q = parse("WHERE Category = 'Category_2' AND IsActive = 'true'").unwrap();
        assert_eq!(q.filters.len(), 2);
        assert_eq!(q.filters[0].field, "Category");
        assert_eq!(q.filters[1].field, "IsActive");
    }

    #[test]
    fn parses_is_null_and_is_not_null() {
        let q = parse("WHERE email IS NULL").unwrap();
        assert_eq!(q.filters[0].condition, Condition::IsNull);

        let q = parse("WHERE email IS NOT NULL").unwrap();
        assert_eq!(q.filters[0].condition, Condition::IsNotNull);
    }

    #[test]
    fn like_classification() {
        assert_eq!(
            parse("WHERE name LIKE '%bob%'").unwrap().filters[0].condition,
            Condition::Contains
        );
        assert_eq!(
            parse("WHERE name LIKE 'bob%'").unwrap().filters[0].condition,
            Condition::StartsWith
        );
        assert_eq!(
            parse("WHERE name LIKE '%bob'").unwrap().filters[0].condition,
            Condition::EndsWith
        );
        assert_eq!(
            parse("WHERE name LIKE 'bob'").unwrap().filters[0].condition,
            Condition::Eq
        );
    }

    #[test]
    fn bang_equal_and_angle_bracket_equal_are_synonyms() {
        let a = parse("WHERE age != 5").unwrap();
        let b = parse("WHERE age <> 5").unwrap();
        assert_eq!(a.filters[0].condition, Condition::Ne);
        assert_eq!(b.filters[0].condition, Condition::Ne);
    }

    #[test]
    fn parses_order_limit_offset() {
        let q = parse("WHERE age > 1 ORDER BY name ASC LIMIT 10 OFFSET 5").unwrap();
        assert_eq!(q.order_by, OrderKey::Name);
        assert_eq!(q.order_dir, OrderDirection::Asc);
        assert_eq!(q.max_results, 10);
        assert_eq!(q.skip, 5);
    }

    #[test]
    fn order_direction_defaults_per_key() {
        let q = parse("ORDER BY createdutc").unwrap();
        assert_eq!(q.order_dir, OrderDirection::Desc);
        let q = parse("ORDER BY name").unwrap();
        assert_eq!(q.order_dir, OrderDirection::Asc);
    }

    #[test]
    fn dot_paths_are_valid_identifiers() {
        let q = parse("WHERE People.Name = 'A'").unwrap();
        assert_eq!(q.filters[0].field, "People.Name");
    }

    #[test]
    fn select_star_from_documents_prefix_is_optional() {
        let a = parse("SELECT * FROM documents WHERE age > 1").unwrap();
        let b = parse("WHERE age > 1").unwrap();
        assert_eq!(a.filters, b.filters);
    }

    #[test]
    fn malformed_query_reports_token_position() {
        let err = parse("WHERE age ?? 1").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let q = parse("where age > 1 order by name desc").unwrap();
        assert_eq!(q.filters.len(), 1);
        assert_eq!(q.order_by, OrderKey::Name);
        assert_eq!(q.order_dir, OrderDirection::Desc);
    }
}
