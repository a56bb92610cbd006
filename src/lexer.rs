//! Scanner (component B): a deterministic longest-match tokeniser over
//! the source buffer.

use crate::error::CompileError;
use crate::source::SourceBuffer;
use crate::token::{Token, TokenKind, keyword};

pub struct Lexer {
    buf: SourceBuffer,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            buf: SourceBuffer::new(source),
        }
    }

    /// Scan the entire source into a token stream ending in `Eof`. Stops
    /// at the first lexical error, per the lexer-totality property: any
    /// input either produces a full token stream or exactly one error.
    pub fn tokenize(mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        loop {
            self.buf.skip_trivia()?;
            let line = self.buf.line();
            let Some(c) = self.buf.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", line));
                break;
            };

            if c.is_ascii_alphabetic() {
                tokens.push(self.scan_identifier_or_keyword());
            } else if c.is_ascii_digit() {
                tokens.push(self.scan_number()?);
            } else if c == '"' {
                tokens.push(self.scan_string()?);
            } else {
                tokens.push(self.scan_operator_or_punctuator()?);
            }
        }
        Ok(tokens)
    }

    fn scan_identifier_or_keyword(&mut self) -> Token {
        let line = self.buf.line();
        let mut lexeme = String::new();
        while let Some(c) = self.buf.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                lexeme.push(c);
                self.buf.advance();
            } else {
                break;
            }
        }
        let kind = keyword(&lexeme).unwrap_or(TokenKind::Identifier);
        Token::new(kind, lexeme, line)
    }

    /// `[0-9][0-9_]*` optionally followed by `.` and `[0-9_]*`. Underscores
    /// are stripped before the parser converts the lexeme to a number;
    /// presence of `.` is what later distinguishes float from int.
    fn scan_number(&mut self) -> Result<Token, CompileError> {
        let line = self.buf.line();
        let mut lexeme = String::new();
        while let Some(c) = self.buf.peek() {
            if c.is_ascii_digit() || c == '_' {
                lexeme.push(c);
                self.buf.advance();
            } else {
                break;
            }
        }
        if self.buf.peek() == Some('.') {
            lexeme.push('.');
            self.buf.advance();
            while let Some(c) = self.buf.peek() {
                if c.is_ascii_digit() || c == '_' {
                    lexeme.push(c);
                    self.buf.advance();
                } else {
                    break;
                }
            }
        }
        Ok(Token::new(TokenKind::Number, lexeme, line))
    }

    /// `"` followed by characters from `[A-Za-z0-9 _,;:.']`, then `"`. No
    /// escapes; an unterminated string is a fatal error.
    fn scan_string(&mut self) -> Result<Token, CompileError> {
        let line = self.buf.line();
        self.buf.advance(); // opening quote
        let mut lexeme = String::new();
        loop {
            match self.buf.peek() {
                None => {
                    return Err(CompileError::lexical(
                        line,
                        "unterminated string literal",
                    ));
                }
                Some('"') => {
                    self.buf.advance();
                    break;
                }
                Some('\n') => {
                    return Err(CompileError::lexical(
                        line,
                        "unterminated string literal",
                    ));
                }
                Some(c) if is_string_char(c) => {
                    lexeme.push(c);
                    self.buf.advance();
                }
                Some(c) => {
                    return Err(CompileError::lexical(
                        self.buf.line(),
                        format!("illegal character '{}' in string literal", c),
                    ));
                }
            }
        }
        Ok(Token::new(TokenKind::StringLiteral, lexeme, line))
    }

    fn scan_operator_or_punctuator(&mut self) -> Result<Token, CompileError> {
        let line = self.buf.line();
        let c = self.buf.advance().expect("checked by caller");

        // Two-character operators are tried before their one-character
        // prefixes.
        if c == ':' && self.buf.peek() == Some('=') {
            self.buf.advance();
            return Ok(Token::new(TokenKind::Assign, ":=", line));
        }
        if c == '=' && self.buf.peek() == Some('=') {
            self.buf.advance();
            return Ok(Token::new(TokenKind::EqEq, "==", line));
        }
        if c == '!' && self.buf.peek() == Some('=') {
            self.buf.advance();
            return Ok(Token::new(TokenKind::NotEq, "!=", line));
        }
        if c == '>' && self.buf.peek() == Some('=') {
            self.buf.advance();
            return Ok(Token::new(TokenKind::GtEq, ">=", line));
        }
        if c == '<' && self.buf.peek() == Some('=') {
            self.buf.advance();
            return Ok(Token::new(TokenKind::LtEq, "<=", line));
        }

        let kind = match c {
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            other => {
                return Err(CompileError::lexical(
                    line,
                    format!("illegal character '{}'", other),
                ));
            }
        };
        Ok(Token::new(kind, c.to_string(), line))
    }
}

fn is_string_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | ',' | ';' | ':' | '.' | '\'')
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_keywords_and_identifiers() {
        let tokens = tokenize("program foo is").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Program,
                TokenKind::Identifier,
                TokenKind::Is,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn splits_numbers_into_int_and_float_lexemes() {
        let tokens = tokenize("3 3.5 1_000 2_5.0_1").unwrap();
        let lexemes: Vec<_> = tokens[..4].iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["3", "3.5", "1_000", "2_5.0_1"]);
    }

    #[test]
    fn two_char_operators_win_over_prefixes() {
        let tokens = tokenize(":= == != >= <=").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Assign,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::GtEq,
                TokenKind::LtEq,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = tokenize("\"hi").unwrap_err();
        assert!(matches!(err, CompileError::Lexical { .. }));
    }

    #[test]
    fn unknown_character_is_fatal() {
        let err = tokenize("@").unwrap_err();
        assert!(matches!(err, CompileError::Lexical { .. }));
    }
}
