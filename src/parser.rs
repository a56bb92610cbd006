//! Recursive-descent parser (component D): strict, non-recovering. The
//! first syntax error aborts compilation.
//!
//! The expression grammar is a left-associative precedence ladder. From
//! loosest to tightest binding: logical `|`, logical `&`, comparisons,
//! additive, multiplicative, unary, primary. (The prose description
//! only names logical/additive/multiplicative/unary/primary; comparison
//! operators are slotted between logical and additive — see
//! DESIGN.md for why.) The grammar is written right-recursive for
//! convenience in prose but every ladder level here folds left, so
//! `a - b - c` parses as `(a - b) - c`.

use crate::ast::{BinOp, Decl, Destination, Expr, LitValue, Param, ProcedureDecl, ProgramDecl,
                  Stmt, UnOp, VariableDecl};
use crate::error::CompileError;
use crate::lexer;
use crate::token::TokenKind;
use crate::token_stream::TokenStream;
use crate::types::{Direction, Type};

pub struct Parser {
    tokens: TokenStream,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, CompileError> {
        let tokens = lexer::tokenize(source)?;
        Ok(Parser {
            tokens: TokenStream::new(tokens),
        })
    }

    pub fn parse(&mut self) -> Result<ProgramDecl, CompileError> {
        self.tokens.expect(TokenKind::Program)?;
        let name = self.expect_identifier()?;
        self.tokens.expect(TokenKind::Is)?;
        let decls = self.parse_decls()?;
        self.tokens.expect(TokenKind::Begin)?;
        let body = self.parse_stmts(&[TokenKind::End])?;
        self.tokens.expect(TokenKind::End)?;
        self.tokens.expect(TokenKind::Program)?;
        Ok(ProgramDecl { name, decls, body })
    }

    // ---- declarations ----------------------------------------------

    fn parse_decls(&mut self) -> Result<Vec<Decl>, CompileError> {
        let mut decls = Vec::new();
        while !self.tokens.check(TokenKind::Begin) {
            decls.push(self.parse_decl()?);
        }
        Ok(decls)
    }

    fn parse_decl(&mut self) -> Result<Decl, CompileError> {
        let is_global = if self.tokens.check(TokenKind::Global) {
            self.tokens.advance();
            true
        } else {
            false
        };

        if self.tokens.check(TokenKind::Procedure) {
            Ok(Decl::Procedure(self.parse_procedure_decl(is_global)?))
        } else {
            let var = self.parse_variable_decl(is_global)?;
            self.tokens.expect(TokenKind::Semicolon)?;
            Ok(Decl::Variable(var))
        }
    }

    fn parse_variable_decl(&mut self, is_global: bool) -> Result<VariableDecl, CompileError> {
        let line = self.tokens.peek().line;
        let elem_ty = self.parse_type_mark()?;
        let name = self.expect_identifier()?;
        let array_size = self.parse_optional_bound()?;
        Ok(VariableDecl {
            name,
            elem_ty,
            array_size,
            is_global,
            line,
        })
    }

    fn parse_optional_bound(&mut self) -> Result<Option<usize>, CompileError> {
        if self.tokens.check(TokenKind::LBracket) {
            self.tokens.advance();
            let tok = self.tokens.expect(TokenKind::Number)?;
            let size = parse_int_literal(&tok.lexeme).ok_or_else(|| {
                CompileError::syntax(tok.line, format!("invalid array bound '{}'", tok.lexeme))
            })?;
            self.tokens.expect(TokenKind::RBracket)?;
            Ok(Some(size as usize))
        } else {
            Ok(None)
        }
    }

    fn parse_type_mark(&mut self) -> Result<Type, CompileError> {
        let tok = self.tokens.advance();
        match tok.kind {
            TokenKind::TypeInt => Ok(Type::Int),
            TokenKind::TypeFloat => Ok(Type::Float),
            TokenKind::TypeBool => Ok(Type::Bool),
            TokenKind::TypeString => Ok(Type::String),
            _ => Err(CompileError::syntax(
                tok.line,
                format!("expected a type at line {}, got {}", tok.line, tok.kind),
            )),
        }
    }

    fn parse_procedure_decl(&mut self, is_global: bool) -> Result<ProcedureDecl, CompileError> {
        let line = self.tokens.peek().line;
        self.tokens.expect(TokenKind::Procedure)?;
        let name = self.expect_identifier()?;
        self.tokens.expect(TokenKind::LParen)?;
        let params = if self.tokens.check(TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_param_list()?
        };
        self.tokens.expect(TokenKind::RParen)?;
        let decls = self.parse_decls()?;
        self.tokens.expect(TokenKind::Begin)?;
        let body = self.parse_stmts(&[TokenKind::End])?;
        self.tokens.expect(TokenKind::End)?;
        self.tokens.expect(TokenKind::Procedure)?;
        self.tokens.expect(TokenKind::Semicolon)?;
        Ok(ProcedureDecl {
            name,
            params,
            decls,
            body,
            return_type: Type::Void,
            is_global,
            line,
        })
    }

    fn parse_param_list(&mut self) -> Result<Vec<Param>, CompileError> {
        let mut params = vec![self.parse_param()?];
        while self.tokens.check(TokenKind::Comma) {
            self.tokens.advance();
            params.push(self.parse_param()?);
        }
        Ok(params)
    }

    fn parse_param(&mut self) -> Result<Param, CompileError> {
        let tok = self.tokens.peek().clone();
        let direction = match tok.kind {
            TokenKind::In => Direction::In,
            TokenKind::Out => Direction::Out,
            _ => {
                return Err(CompileError::syntax(
                    tok.line,
                    format!("expected 'in' or 'out' at line {}, got {}", tok.line, tok.kind),
                ));
            }
        };
        self.tokens.advance();
        let decl = self.parse_variable_decl(false)?;
        Ok(Param { decl, direction })
    }

    // ---- statements --------------------------------------------------

    /// Parse statements (each followed by its own `;`) until a token in
    /// `terminators` is seen.
    fn parse_stmts(&mut self, terminators: &[TokenKind]) -> Result<Vec<Stmt>, CompileError> {
        let mut stmts = Vec::new();
        while !terminators.iter().any(|k| self.tokens.check(*k)) {
            stmts.push(self.parse_stmt()?);
            self.tokens.expect(TokenKind::Semicolon)?;
        }
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, CompileError> {
        match self.tokens.peek().kind {
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::Return => {
                let line = self.tokens.advance().line;
                Ok(Stmt::Return { line })
            }
            TokenKind::Identifier if self.tokens.peek_next().kind == TokenKind::LParen => {
                self.parse_call_stmt()
            }
            TokenKind::Identifier => self.parse_assign_no_semi(),
            _ => {
                let tok = self.tokens.peek();
                Err(CompileError::syntax(
                    tok.line,
                    format!("unexpected token {} at line {}", tok.kind, tok.line),
                ))
            }
        }
    }

    fn parse_call_stmt(&mut self) -> Result<Stmt, CompileError> {
        let line = self.tokens.peek().line;
        let (callee, args) = self.parse_call_core()?;
        Ok(Stmt::Call { callee, args, line })
    }

    fn parse_call_core(&mut self) -> Result<(String, Vec<Expr>), CompileError> {
        let callee = self.expect_identifier()?;
        self.tokens.expect(TokenKind::LParen)?;
        let args = if self.tokens.check(TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_arg_list()?
        };
        self.tokens.expect(TokenKind::RParen)?;
        Ok((callee, args))
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, CompileError> {
        let mut args = vec![self.parse_expr()?];
        while self.tokens.check(TokenKind::Comma) {
            self.tokens.advance();
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }

    fn parse_assign_no_semi(&mut self) -> Result<Stmt, CompileError> {
        let line = self.tokens.peek().line;
        let target = self.parse_destination()?;
        self.tokens.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        Ok(Stmt::Assign { target, value, line })
    }

    fn parse_destination(&mut self) -> Result<Destination, CompileError> {
        let line = self.tokens.peek().line;
        let name = self.expect_identifier()?;
        let index = if self.tokens.check(TokenKind::LBracket) {
            self.tokens.advance();
            let idx = self.parse_expr()?;
            self.tokens.expect(TokenKind::RBracket)?;
            Some(idx)
        } else {
            None
        };
        Ok(Destination {
            name,
            index,
            ty: Type::Void,
            line,
        })
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, CompileError> {
        let line = self.tokens.advance().line; // 'if'
        self.tokens.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.tokens.expect(TokenKind::RParen)?;
        self.tokens.expect(TokenKind::Then)?;
        let then_branch = self.parse_stmts(&[TokenKind::Else, TokenKind::End])?;
        let else_branch = if self.tokens.check(TokenKind::Else) {
            self.tokens.advance();
            Some(self.parse_stmts(&[TokenKind::End])?)
        } else {
            None
        };
        self.tokens.expect(TokenKind::End)?;
        self.tokens.expect(TokenKind::If)?;
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            line,
        })
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt, CompileError> {
        let line = self.tokens.advance().line; // 'for'
        self.tokens.expect(TokenKind::LParen)?;
        let init = self.parse_assign_no_semi()?;
        self.tokens.expect(TokenKind::Semicolon)?;
        let cond = self.parse_expr()?;
        self.tokens.expect(TokenKind::RParen)?;
        let body = self.parse_stmts(&[TokenKind::End])?;
        self.tokens.expect(TokenKind::End)?;
        self.tokens.expect(TokenKind::For)?;
        Ok(Stmt::For {
            init: Box::new(init),
            cond,
            body,
            line,
        })
    }

    // ---- expressions ---------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_logical_and()?;
        while self.tokens.check(TokenKind::Pipe) {
            let line = self.tokens.advance().line;
            let rhs = self.parse_logical_and()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                broadcast_len: None,
                ty: Type::Void,
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_comparison()?;
        while self.tokens.check(TokenKind::Amp) {
            let line = self.tokens.advance().line;
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                broadcast_len: None,
                ty: Type::Void,
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.tokens.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::GtEq => BinOp::GtEq,
                _ => break,
            };
            let line = self.tokens.advance().line;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                broadcast_len: None,
                ty: Type::Void,
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.tokens.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let line = self.tokens.advance().line;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                broadcast_len: None,
                ty: Type::Void,
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.tokens.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            let line = self.tokens.advance().line;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                broadcast_len: None,
                ty: Type::Void,
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        if self.tokens.check(TokenKind::Minus) {
            let line = self.tokens.advance().line;
            let operand = self.parse_minus_operand()?;
            Ok(Expr::Unary {
                op: UnOp::Neg,
                expr: Box::new(operand),
                ty: Type::Void,
                line,
            })
        } else if self.tokens.check(TokenKind::Not) {
            let line = self.tokens.advance().line;
            let operand = self.parse_unary()?;
            Ok(Expr::Unary {
                op: UnOp::Not,
                expr: Box::new(operand),
                ty: Type::Void,
                line,
            })
        } else {
            self.parse_primary()
        }
    }

    /// Unary `-` may prefix a name (optionally indexed) or a number
    /// literal, never a parenthesised expression or a call.
    fn parse_minus_operand(&mut self) -> Result<Expr, CompileError> {
        let tok = self.tokens.peek().clone();
        match tok.kind {
            TokenKind::Number => self.parse_number_literal(),
            TokenKind::Identifier if self.tokens.peek_next().kind != TokenKind::LParen => {
                self.parse_name_or_index()
            }
            _ => Err(CompileError::syntax(
                tok.line,
                "unary '-' may only prefix a name or a number literal".to_string(),
            )),
        }
    }

    fn parse_name_or_index(&mut self) -> Result<Expr, CompileError> {
        let line = self.tokens.peek().line;
        let name = self.expect_identifier()?;
        if self.tokens.check(TokenKind::LBracket) {
            self.tokens.advance();
            let index = self.parse_expr()?;
            self.tokens.expect(TokenKind::RBracket)?;
            Ok(Expr::Index {
                name,
                index: Box::new(index),
                ty: Type::Void,
                line,
            })
        } else {
            Ok(Expr::Ref {
                name,
                ty: Type::Void,
                line,
            })
        }
    }

    fn parse_number_literal(&mut self) -> Result<Expr, CompileError> {
        let tok = self.tokens.expect(TokenKind::Number)?;
        let stripped: String = tok.lexeme.chars().filter(|c| *c != '_').collect();
        if stripped.contains('.') {
            let value: f64 = stripped.parse().map_err(|_| {
                CompileError::syntax(tok.line, format!("invalid float literal '{}'", tok.lexeme))
            })?;
            Ok(Expr::Lit {
                value: LitValue::Float(value),
                ty: Type::Void,
                line: tok.line,
            })
        } else {
            let value = parse_int_literal(&tok.lexeme).ok_or_else(|| {
                CompileError::syntax(tok.line, format!("invalid int literal '{}'", tok.lexeme))
            })?;
            Ok(Expr::Lit {
                value: LitValue::Int(value),
                ty: Type::Void,
                line: tok.line,
            })
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let tok = self.tokens.peek().clone();
        match tok.kind {
            TokenKind::Number => self.parse_number_literal(),
            TokenKind::StringLiteral => {
                self.tokens.advance();
                Ok(Expr::Lit {
                    value: LitValue::Str(tok.lexeme),
                    ty: Type::Void,
                    line: tok.line,
                })
            }
            TokenKind::True => {
                self.tokens.advance();
                Ok(Expr::Lit {
                    value: LitValue::Bool(true),
                    ty: Type::Void,
                    line: tok.line,
                })
            }
            TokenKind::False => {
                self.tokens.advance();
                Ok(Expr::Lit {
                    value: LitValue::Bool(false),
                    ty: Type::Void,
                    line: tok.line,
                })
            }
            TokenKind::LParen => {
                self.tokens.advance();
                let expr = self.parse_expr()?;
                self.tokens.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Identifier if self.tokens.peek_next().kind == TokenKind::LParen => {
                let line = tok.line;
                let (callee, args) = self.parse_call_core()?;
                Ok(Expr::Call {
                    callee,
                    args,
                    ty: Type::Void,
                    line,
                })
            }
            TokenKind::Identifier => self.parse_name_or_index(),
            _ => Err(CompileError::syntax(
                tok.line,
                format!("unexpected token {} at line {}", tok.kind, tok.line),
            )),
        }
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        let tok = self.tokens.expect(TokenKind::Identifier)?;
        Ok(tok.lexeme)
    }
}

fn parse_int_literal(lexeme: &str) -> Option<i64> {
    let stripped: String = lexeme.chars().filter(|c| *c != '_').collect();
    stripped.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> ProgramDecl {
        Parser::new(src).unwrap().parse().unwrap()
    }

    #[test]
    fn parses_minimal_program() {
        let program = parse("program p is begin return; end program");
        assert_eq!(program.name, "p");
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn parses_variable_and_array_decl() {
        let program = parse("program p is int x; int a[4]; begin return; end program");
        assert_eq!(program.decls.len(), 2);
    }

    #[test]
    fn left_associates_additive_chain() {
        let program = parse("program p is begin putInteger(a - b - c); return; end program");
        let Stmt::Call { args, .. } = &program.body[0] else {
            panic!("expected call");
        };
        let Expr::Binary { op, lhs, .. } = &args[0] else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Sub);
        assert!(matches!(**lhs, Expr::Binary { op: BinOp::Sub, .. }));
    }

    #[test]
    fn unary_minus_rejects_parenthesised_expression() {
        let err = Parser::new("program p is begin x := -(a + b); return; end program")
            .unwrap()
            .parse()
            .unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }

    #[test]
    fn for_loop_requires_assignment_initialiser() {
        let program = parse(
            "program p is int i; begin for (i := 0; i < 10) i := i + 1; end for; return; end program",
        );
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn missing_semicolon_is_a_syntax_error() {
        let err = Parser::new("program p is begin return end program")
            .unwrap()
            .parse()
            .unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }
}
