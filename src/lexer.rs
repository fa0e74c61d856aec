use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::Token;

/// Location in the source text. `line` and `column` are 1-based; `offset` is
/// the 0-based character index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// A token with the position where it starts and the offset just past it.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: Position,
    pub end: usize,
}

/// Errors raised while scanning.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    /// String literal without a closing quote
    #[error("unterminated string starting at line {}, position {}", .0.line, .0.column)]
    UnterminatedString(Position),

    /// Character that cannot start a token, or a raw control character inside
    /// a string
    #[error("illegal symbol {0:?} at line {line}, position {col}", line = .1.line, col = .1.column)]
    IllegalSymbol(char, Position),

    /// Number immediately followed by letters, e.g. `1abc`
    #[error("illegal variable name '{0}' at line {line}, position {col}", line = .1.line, col = .1.column)]
    IllegalVariableName(String, Position),

    /// Number with more than one decimal point or too many digits
    #[error("malformed number '{0}' at line {line}, position {col}", line = .1.line, col = .1.column)]
    MalformedNumber(String, Position),
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnterminatedString(pos) => *pos,
            LexError::IllegalSymbol(_, pos)
            | LexError::IllegalVariableName(_, pos)
            | LexError::MalformedNumber(_, pos) => *pos,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    fn here(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }

    /// Whitespace and stray control characters are insignificant outside
    /// string literals.
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() || ch.is_control() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self) -> Result<String, LexError> {
        let start = self.here();
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('"') => result.push('"'),
                        Some('\\') => result.push('\\'),
                        Some(other) => {
                            result.push('\\');
                            result.push(other);
                        }
                        None => return Err(LexError::UnterminatedString(start)),
                    }
                    self.advance();
                }
                '\r' | '\n' => {
                    result.push(ch);
                    self.advance();
                }
                c if c.is_control() => return Err(LexError::IllegalSymbol(c, self.here())),
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString(start))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.here();
        let mut number = String::new();
        let mut dots = 0;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' {
                dots += 1;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self
            .current_char()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        {
            number.push_str(&self.read_identifier());
            return Err(LexError::IllegalVariableName(number, start));
        }

        if dots > 1 || number.ends_with('.') {
            return Err(LexError::MalformedNumber(number, start));
        }

        Decimal::from_str(&number)
            .map(Token::Number)
            .map_err(|_| LexError::MalformedNumber(number, start))
    }

    /// Consumes `second` if it follows, choosing between a two-character and
    /// a one-character token.
    fn one_or_two(&mut self, second: char, double: Token, single: Token) -> Token {
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();
        let start = self.here();

        let token = match self.current_char() {
            None => Token::Eof,
            Some('"') => Token::String(self.read_string()?),
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();
                match ident.as_str() {
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "null" | "NULL" => Token::Null,
                    "var" => Token::Var,
                    "if" => Token::If,
                    "else" => Token::Else,
                    "while" => Token::While,
                    "function" => Token::Function,
                    _ => Token::Identifier(ident),
                }
            }
            Some('=') => self.one_or_two('=', Token::EqEq, Token::Assign),
            Some('!') => self.one_or_two('=', Token::NotEq, Token::Bang),
            Some('<') => self.one_or_two('=', Token::LtEq, Token::Lt),
            Some('>') => self.one_or_two('=', Token::GtEq, Token::Gt),
            Some('&') => self.one_or_two('&', Token::AndAnd, Token::Amp),
            Some('|') => self.one_or_two('|', Token::OrOr, Token::Pipe),
            Some(ch) => {
                let token = match ch {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '^' => Token::Caret,
                    '$' => Token::Dollar,
                    '?' => Token::Question,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    ',' => Token::Comma,
                    ';' => Token::Semicolon,
                    other => return Err(LexError::IllegalSymbol(other, start)),
                };
                self.advance();
                token
            }
        };

        Ok(Spanned {
            token,
            start,
            end: self.position,
        })
    }

    /// Scans the whole input. Mostly useful for tests and tooling.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokens("true false null NULL var if else while function"),
            vec![
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Null,
                Token::Null,
                Token::Var,
                Token::If,
                Token::Else,
                Token::While,
                Token::Function,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_logical_vs_bitwise() {
        assert_eq!(
            tokens("a && b & c || d | e"),
            vec![
                Token::Identifier("a".into()),
                Token::AndAnd,
                Token::Identifier("b".into()),
                Token::Amp,
                Token::Identifier("c".into()),
                Token::OrOr,
                Token::Identifier("d".into()),
                Token::Pipe,
                Token::Identifier("e".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_dotted_identifier() {
        assert_eq!(
            tokens("customer.address.zip"),
            vec![Token::Identifier("customer.address.zip".into()), Token::Eof]
        );
    }

    #[test]
    fn test_positions_track_lines() {
        let spanned = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!(spanned[1].start.line, 2);
        assert_eq!(spanned[1].start.column, 3);
        assert_eq!(spanned[1].start.offset, 4);
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""a\"b\n\t\\ \x""#),
            vec![Token::String("a\"b\n\t\\ \\x".into()), Token::Eof]
        );
    }

    #[test]
    fn test_string_control_char_is_illegal() {
        let err = Lexer::new("\"a\u{7}b\"").tokenize().unwrap_err();
        assert!(matches!(err, LexError::IllegalSymbol('\u{7}', _)));
    }

    #[test]
    fn test_raw_newline_allowed_in_string() {
        assert_eq!(
            tokens("\"a\nb\""),
            vec![Token::String("a\nb".into()), Token::Eof]
        );
    }

    #[test]
    fn test_control_chars_skipped_outside_strings() {
        assert_eq!(tokens("1\u{0}+\u{1b}2").len(), 4);
    }

    #[test]
    fn test_number_errors() {
        assert!(matches!(
            Lexer::new("1.2.3").tokenize(),
            Err(LexError::MalformedNumber(..))
        ));
        assert!(matches!(
            Lexer::new("12abc").tokenize(),
            Err(LexError::IllegalVariableName(name, _)) if name == "12abc"
        ));
        assert!(matches!(
            Lexer::new("\"open").tokenize(),
            Err(LexError::UnterminatedString(_))
        ));
        assert!(matches!(
            Lexer::new("a # b").tokenize(),
            Err(LexError::IllegalSymbol('#', _))
        ));
    }
}
