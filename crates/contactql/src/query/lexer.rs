//! Lexer (tokenizer) for contact queries.

use std::iter::Peekable;
use std::str::Chars;

/// Punctuation allowed inside bare text so that phone numbers, emails and URNs lex as one token.
const TEXT_PUNCTUATION: &[char] = &['\'', '+', '-', ':', '.', '@', '_', '/', '#', '&', '?'];

/// The kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Opening parenthesis `(`.
    LParen,

    /// Closing parenthesis `)`.
    RParen,

    /// The `and` keyword.
    And,

    /// The `or` keyword.
    Or,

    /// One of `= != ~ > < >= <=`, or the `is`/`has` aliases.
    Comparator,

    /// Bare text such as `name`, `bob` or `+250788123123`.
    Text,

    /// A double-quoted string, including its quotes.
    String,

    /// A run of whitespace.
    Ws,

    /// Anything else.
    Error,
}

/// A token with its raw text and position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The raw text of the token.
    pub text: String,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// Lexer for tokenizing contact queries.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Current byte position in the input string.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            self.position += ch.len_utf8();
        }
        c
    }

    /// Consumes characters while `pred` holds, appending them to `text`.
    fn read_while(&mut self, text: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.next_char();
        }
    }

    /// Reads a double-quoted string with `""` as an escaped quote.
    ///
    /// If the string is never closed only the opening quote is consumed and
    /// the token is an error.
    fn read_string(&mut self, text: &mut String) -> TokenKind {
        let checkpoint = (self.chars.clone(), self.position);

        // opening quote
        if let Some(c) = self.next_char() {
            text.push(c);
        }

        while let Some(c) = self.next_char() {
            text.push(c);
            if c == '"' {
                if self.peek() == Some('"') {
                    text.push('"');
                    self.next_char();
                } else {
                    return TokenKind::String;
                }
            }
        }

        (self.chars, self.position) = checkpoint;
        text.truncate(1);
        self.next_char();
        TokenKind::Error
    }

    /// Returns the next token, or `None` at the end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        let position = self.position;
        let first = self.peek()?;
        let mut text = String::new();

        let kind = match first {
            '(' | ')' | '=' | '~' => {
                text.push(first);
                self.next_char();
                match first {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    _ => TokenKind::Comparator,
                }
            }
            '!' | '>' | '<' => {
                text.push(first);
                self.next_char();
                if self.peek() == Some('=') {
                    text.push('=');
                    self.next_char();
                    TokenKind::Comparator
                } else if first == '!' {
                    TokenKind::Error
                } else {
                    TokenKind::Comparator
                }
            }
            '"' => self.read_string(&mut text),
            c if c.is_whitespace() => {
                self.read_while(&mut text, char::is_whitespace);
                TokenKind::Ws
            }
            c if is_text_char(c) => {
                self.read_while(&mut text, is_text_char);
                keyword_kind(&text)
            }
            _ => {
                text.push(first);
                self.next_char();
                TokenKind::Error
            }
        };

        Some(Token {
            kind,
            text,
            position,
        })
    }

    /// Tokenizes the entire input.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }
}

fn is_text_char(c: char) -> bool {
    c.is_alphanumeric() || TEXT_PUNCTUATION.contains(&c)
}

/// Classifies a run of text, recognizing keywords case-insensitively.
fn keyword_kind(text: &str) -> TokenKind {
    match text.to_lowercase().as_str() {
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "is" | "has" => TokenKind::Comparator,
        _ => TokenKind::Text,
    }
}

/// Whether text would lex as a keyword rather than as plain text.
pub(crate) fn is_keyword(text: &str) -> bool {
    keyword_kind(text) != TokenKind::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(input: &str) -> Vec<String> {
        Lexer::new(input)
            .tokenize()
            .into_iter()
            .filter(|t| t.kind != TokenKind::Ws)
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_lex_condition() {
        assert_eq!(
            kinds("age >= 18"),
            vec![
                TokenKind::Text,
                TokenKind::Ws,
                TokenKind::Comparator,
                TokenKind::Ws,
                TokenKind::Text,
            ]
        );
        assert_eq!(texts("age>=18"), vec!["age", ">=", "18"]);
    }

    #[test]
    fn test_lex_comparators() {
        assert_eq!(texts("a = b"), vec!["a", "=", "b"]);
        assert_eq!(texts("a != b"), vec!["a", "!=", "b"]);
        assert_eq!(texts("a ~ b"), vec!["a", "~", "b"]);
        assert_eq!(texts("a < b"), vec!["a", "<", "b"]);
        assert_eq!(texts("a <= b"), vec!["a", "<=", "b"]);
        assert_eq!(texts("a > b"), vec!["a", ">", "b"]);
    }

    #[test]
    fn test_lex_keywords_case_insensitive() {
        assert_eq!(
            kinds("a AND b Or c"),
            vec![
                TokenKind::Text,
                TokenKind::Ws,
                TokenKind::And,
                TokenKind::Ws,
                TokenKind::Text,
                TokenKind::Ws,
                TokenKind::Or,
                TokenKind::Ws,
                TokenKind::Text,
            ]
        );
        assert_eq!(kinds("IS")[0], TokenKind::Comparator);
        assert_eq!(kinds("Has")[0], TokenKind::Comparator);
        assert_eq!(kinds("android")[0], TokenKind::Text);
    }

    #[test]
    fn test_lex_text_punctuation() {
        assert_eq!(texts("tel:+12024561111"), vec!["tel:+12024561111"]);
        assert_eq!(texts("bob@nyaruka.com"), vec!["bob@nyaruka.com"]);
        assert_eq!(texts("O'Neil"), vec!["O'Neil"]);
        assert_eq!(texts("fields.age"), vec!["fields.age"]);
        assert_eq!(texts("Ndera_Gasabo"), vec!["Ndera_Gasabo"]);
    }

    #[test]
    fn test_lex_unicode_text() {
        let tokens = Lexer::new("name = Émile").tokenize();
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Text);
        assert_eq!(last.text, "Émile");
        assert_eq!(last.position, 7);
    }

    #[test]
    fn test_lex_string() {
        let tokens = Lexer::new(r#""Bob ""The Builder"" Smith""#).tokenize();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, r#""Bob ""The Builder"" Smith""#);
    }

    #[test]
    fn test_lex_unterminated_string() {
        let tokens = Lexer::new("name = \"bob").tokenize();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Text,
                TokenKind::Ws,
                TokenKind::Comparator,
                TokenKind::Ws,
                TokenKind::Error,
                TokenKind::Text,
            ]
        );
        assert_eq!(tokens[4].text, "\"");
        assert_eq!(tokens[5].text, "bob");
    }

    #[test]
    fn test_lex_errors() {
        assert_eq!(kinds("!"), vec![TokenKind::Error]);
        assert_eq!(kinds("$"), vec![TokenKind::Error]);
        assert_eq!(texts("a = $"), vec!["a", "=", "$"]);
    }

    #[test]
    fn test_lex_parens_and_positions() {
        let tokens = Lexer::new("(a)").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::LParen);
        assert_eq!(tokens[1].position, 1);
        assert_eq!(tokens[2].kind, TokenKind::RParen);
        assert_eq!(tokens[2].position, 2);
    }

    #[test]
    fn test_lex_empty() {
        assert!(Lexer::new("").tokenize().is_empty());
    }
}
