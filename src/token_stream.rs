//! One-token-lookahead adapter over the scanner's output (component C).

use crate::error::CompileError;
use crate::token::{Token, TokenKind};

pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            matches!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof)),
            "token stream must end in Eof"
        );
        TokenStream { tokens, pos: 0 }
    }

    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Look one token past the current one, clamped to the trailing Eof.
    pub fn peek_next(&self) -> &Token {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Consume and return the current token if it matches `kind`, else
    /// fail with "expected <kind> at line L, got <kind>".
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let got = self.peek();
            Err(CompileError::syntax(
                got.line,
                format!(
                    "expected {} at line {}, got {}",
                    kind, got.line, got.kind
                ),
            ))
        }
    }
}
