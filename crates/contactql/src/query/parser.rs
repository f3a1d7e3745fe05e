//! Recursive descent parser for contact queries.

use super::ast::Operator;
use super::error::{QueryError, QueryResult};
use super::lexer::{Lexer, Token, TokenKind};

/// Maximum nesting of parenthesized groupings in a single query.
pub const MAX_DEPTH: usize = 256;

/// Maximum depth of a parse tree. Each operator in a chain adds a level.
pub const MAX_TREE_DEPTH: usize = 1024;

/// A literal value as written in the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Bare text.
    Text(String),
    /// A quoted string, still quoted and escaped.
    String(String),
}

impl Literal {
    /// Returns the literal's value, unquoting and unescaping strings.
    pub fn into_value(self) -> String {
        match self {
            Literal::Text(text) => text,
            Literal::String(quoted) => {
                let inner = quoted
                    .strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .unwrap_or(&quoted);
                inner.replace("\"\"", "\"")
            }
        }
    }
}

/// The untyped tree produced by parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree {
    /// `property comparator literal`
    Condition {
        property: String,
        operator: Operator,
        literal: Literal,
    },

    /// A bare literal.
    ImplicitCondition(Literal),

    /// `expression AND expression`
    CombinationAnd(Box<ParseTree>, Box<ParseTree>),

    /// `expression expression`
    CombinationImplicitAnd(Box<ParseTree>, Box<ParseTree>),

    /// `expression OR expression`
    CombinationOr(Box<ParseTree>, Box<ParseTree>),

    /// `( expression )`
    Grouping(Box<ParseTree>),
}

/// A subtree and its nesting depth.
struct Parsed {
    tree: ParseTree,
    depth: usize,
}

impl Parsed {
    fn leaf(tree: ParseTree) -> Self {
        Self { tree, depth: 0 }
    }

    fn wrap(self, f: impl FnOnce(Box<ParseTree>) -> ParseTree) -> QueryResult<Self> {
        check_depth(self.depth + 1)?;
        Ok(Self {
            tree: f(Box::new(self.tree)),
            depth: self.depth + 1,
        })
    }

    fn combine(
        self,
        right: Parsed,
        f: impl FnOnce(Box<ParseTree>, Box<ParseTree>) -> ParseTree,
    ) -> QueryResult<Self> {
        let depth = self.depth.max(right.depth) + 1;
        check_depth(depth)?;
        Ok(Self {
            tree: f(Box::new(self.tree), Box::new(right.tree)),
            depth,
        })
    }
}

fn check_depth(depth: usize) -> QueryResult<()> {
    if depth > MAX_TREE_DEPTH {
        return Err(QueryError::syntax(format!(
            "query exceeds maximum depth of {}",
            MAX_TREE_DEPTH
        )));
    }
    Ok(())
}

/// Parser for contact queries.
///
/// # Grammar
///
/// ```text
/// expression ::= or_expr
/// or_expr    ::= and_expr ("OR" and_expr)*
/// and_expr   ::= primary (["AND"] primary)*
/// primary    ::= "(" expression ")" | TEXT COMPARATOR literal | literal
/// literal    ::= TEXT | STRING
/// ```
///
/// # Operator Precedence (highest to lowest)
///
/// 1. grouping, conditions and literals
/// 2. `AND` (explicit or implicit) - binary, left-associative
/// 3. `OR` - binary, left-associative
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Parses query text into a parse tree.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Syntax` if the query is empty, ends early, has an
    /// unclosed parenthesis or nests too deeply.
    ///
    /// Returns `QueryError::UnexpectedToken` if a token appears where it isn't allowed.
    pub fn parse(input: &str) -> QueryResult<ParseTree> {
        let tokens: Vec<Token> = Lexer::new(input)
            .tokenize()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Ws)
            .collect();

        if tokens.is_empty() {
            return Err(QueryError::syntax("query is empty"));
        }

        let mut parser = Self {
            tokens,
            position: 0,
        };
        let parsed = parser.parse_or_expr(0)?;

        // Check that we consumed all tokens
        if let Some(remaining) = parser.peek() {
            return Err(QueryError::unexpected_token(&remaining.text));
        }

        Ok(parsed.tree)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Parses OR expressions: `and_expr ("OR" and_expr)*`
    fn parse_or_expr(&mut self, nesting: usize) -> QueryResult<Parsed> {
        let mut left = self.parse_and_expr(nesting)?;

        while self.peek_kind() == Some(TokenKind::Or) {
            self.advance();
            let right = self.parse_and_expr(nesting)?;
            left = left.combine(right, ParseTree::CombinationOr)?;
        }

        Ok(left)
    }

    /// Parses AND expressions, where the AND may be left out: `primary (["AND"] primary)*`
    fn parse_and_expr(&mut self, nesting: usize) -> QueryResult<Parsed> {
        let mut left = self.parse_primary(nesting)?;

        loop {
            match self.peek_kind() {
                Some(TokenKind::And) => {
                    self.advance();
                    let right = self.parse_primary(nesting)?;
                    left = left.combine(right, ParseTree::CombinationAnd)?;
                }
                Some(TokenKind::LParen | TokenKind::Text | TokenKind::String) => {
                    let right = self.parse_primary(nesting)?;
                    left = left.combine(right, ParseTree::CombinationImplicitAnd)?;
                }
                _ => break,
            }
        }

        Ok(left)
    }

    /// Parses a grouping, condition or bare literal.
    fn parse_primary(&mut self, nesting: usize) -> QueryResult<Parsed> {
        let token = self
            .advance()
            .ok_or_else(|| QueryError::syntax("unexpected end of query"))?;

        match token.kind {
            TokenKind::LParen => {
                if nesting >= MAX_DEPTH {
                    return Err(QueryError::syntax(format!(
                        "query exceeds maximum nesting depth of {}",
                        MAX_DEPTH
                    )));
                }

                let inner = self.parse_or_expr(nesting + 1)?;
                match self.advance() {
                    Some(t) if t.kind == TokenKind::RParen => inner.wrap(ParseTree::Grouping),
                    Some(t) => Err(QueryError::unexpected_token(t.text)),
                    None => Err(QueryError::syntax("missing closing parenthesis")),
                }
            }
            TokenKind::Text if self.peek_kind() == Some(TokenKind::Comparator) => {
                let comparator = self
                    .advance()
                    .ok_or_else(|| QueryError::syntax("unexpected end of query"))?;
                let operator = Operator::from_comparator(&comparator.text)
                    .ok_or_else(|| QueryError::unexpected_token(&comparator.text))?;
                let literal = self.parse_literal()?;

                Ok(Parsed::leaf(ParseTree::Condition {
                    property: token.text,
                    operator,
                    literal,
                }))
            }
            TokenKind::Text => Ok(Parsed::leaf(ParseTree::ImplicitCondition(Literal::Text(
                token.text,
            )))),
            TokenKind::String => Ok(Parsed::leaf(ParseTree::ImplicitCondition(
                Literal::String(token.text),
            ))),
            _ => Err(QueryError::unexpected_token(token.text)),
        }
    }

    /// Parses the literal on the right of a comparator.
    fn parse_literal(&mut self) -> QueryResult<Literal> {
        let token = self
            .advance()
            .ok_or_else(|| QueryError::syntax("unexpected end of query"))?;

        match token.kind {
            TokenKind::Text => Ok(Literal::Text(token.text)),
            TokenKind::String => Ok(Literal::String(token.text)),
            _ => Err(QueryError::unexpected_token(token.text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(property: &str, operator: Operator, value: &str) -> ParseTree {
        ParseTree::Condition {
            property: property.to_string(),
            operator,
            literal: Literal::Text(value.to_string()),
        }
    }

    fn implicit(value: &str) -> ParseTree {
        ParseTree::ImplicitCondition(Literal::Text(value.to_string()))
    }

    #[test]
    fn test_parse_condition() {
        assert_eq!(
            Parser::parse("age > 18").unwrap(),
            condition("age", Operator::GreaterThan, "18")
        );
    }

    #[test]
    fn test_parse_comparator_aliases() {
        assert_eq!(
            Parser::parse("name IS bob").unwrap(),
            condition("name", Operator::Equal, "bob")
        );
        assert_eq!(
            Parser::parse("name has bob").unwrap(),
            condition("name", Operator::Contains, "bob")
        );
    }

    #[test]
    fn test_parse_and_binds_tighter_than_or() {
        let tree = Parser::parse("a OR b AND c").unwrap();
        assert_eq!(
            tree,
            ParseTree::CombinationOr(
                Box::new(implicit("a")),
                Box::new(ParseTree::CombinationAnd(
                    Box::new(implicit("b")),
                    Box::new(implicit("c"))
                ))
            )
        );
    }

    #[test]
    fn test_parse_implicit_and() {
        let tree = Parser::parse("will felix").unwrap();
        assert_eq!(
            tree,
            ParseTree::CombinationImplicitAnd(Box::new(implicit("will")), Box::new(implicit("felix")))
        );
    }

    #[test]
    fn test_parse_grouping() {
        let tree = Parser::parse("(a OR b) c").unwrap();
        let ParseTree::CombinationImplicitAnd(left, right) = tree else {
            panic!("expected implicit AND");
        };
        assert!(matches!(*left, ParseTree::Grouping(_)));
        assert_eq!(*right, implicit("c"));
    }

    #[test]
    fn test_parse_left_associative() {
        let tree = Parser::parse("a AND b AND c").unwrap();
        let ParseTree::CombinationAnd(left, _) = tree else {
            panic!("expected AND");
        };
        assert!(matches!(*left, ParseTree::CombinationAnd(_, _)));
    }

    #[test]
    fn test_parse_string_literal() {
        let tree = Parser::parse(r#"name = "Bob ""B"" Smith""#).unwrap();
        let ParseTree::Condition { literal, .. } = tree else {
            panic!("expected condition");
        };
        assert_eq!(literal.into_value(), r#"Bob "B" Smith"#);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Parser::parse("").unwrap_err().code(), "syntax");
        assert_eq!(Parser::parse("   ").unwrap_err().code(), "syntax");
        assert_eq!(Parser::parse("name =").unwrap_err().code(), "syntax");
        assert_eq!(Parser::parse("(name = bob").unwrap_err().code(), "syntax");
        assert_eq!(Parser::parse("a AND").unwrap_err().code(), "syntax");

        assert_eq!(
            Parser::parse("name = bob)").unwrap_err(),
            QueryError::unexpected_token(")")
        );
        assert_eq!(
            Parser::parse("$").unwrap_err(),
            QueryError::unexpected_token("$")
        );
        assert_eq!(
            Parser::parse("name = \"bob").unwrap_err(),
            QueryError::unexpected_token("\"")
        );
        assert_eq!(
            Parser::parse("= bob").unwrap_err(),
            QueryError::unexpected_token("=")
        );
        assert_eq!(
            Parser::parse("a OR OR b").unwrap_err(),
            QueryError::unexpected_token("OR")
        );
    }

    #[test]
    fn test_parse_depth_limit() {
        let nested = format!("{}a{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert!(Parser::parse(&nested).is_ok());

        let too_deep = format!("{}a{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(Parser::parse(&too_deep).unwrap_err().code(), "syntax");

        let chain = vec!["a"; MAX_DEPTH + 100].join(" OR ");
        assert!(Parser::parse(&chain).is_ok());

        let too_long = vec!["a"; MAX_TREE_DEPTH + 2].join(" OR ");
        assert_eq!(Parser::parse(&too_long).unwrap_err().code(), "syntax");
    }
}
