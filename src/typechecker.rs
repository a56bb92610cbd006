//! Type checker (component F): a single top-down walk over the AST that
//! attaches a concrete [`Type`] to every expression, inserts
//! [`Expr::ImplicitCast`] nodes where a coercion applies, and resolves
//! every name against the symbol table.
//!
//! Assignment coercion inserts an [`Expr::ImplicitCast`] for `int -> float`
//! (one-directional) and for both directions of `int <-> bool`
//! ("nonzero ⇔ true"). `string` never coerces with anything. `&`/`|`
//! accept either two `bool` operands (logical) or two `int` operands
//! (bitwise); `not` likewise accepts `bool` (logical negation) or `int`
//! (bitwise complement). Mixing a scalar with an array of the same
//! element type broadcasts the scalar across every element; the common
//! length is recorded on [`Expr::Binary::broadcast_len`] for the code
//! generator to lower into a loop.

use crate::ast::{
    BinOp, Decl, Destination, Expr, LitValue, ProcedureDecl, ProgramDecl, Stmt, UnOp, VariableDecl,
};
use crate::error::CompileError;
use crate::symtab::{Symbol, SymbolKind, SymbolTable};
use crate::types::{Direction, ParamType, Type};

pub fn check_program(program: &mut ProgramDecl) -> Result<(), CompileError> {
    let mut checker = Checker {
        symtab: SymbolTable::new(),
    };
    checker.check_decls(&mut program.decls)?;
    checker.check_stmts(&mut program.body)?;
    Ok(())
}

struct Checker {
    symtab: SymbolTable,
}

impl Checker {
    fn check_decls(&mut self, decls: &mut [Decl]) -> Result<(), CompileError> {
        for decl in decls {
            self.check_decl(decl)?;
        }
        Ok(())
    }

    fn check_decl(&mut self, decl: &mut Decl) -> Result<(), CompileError> {
        match decl {
            Decl::Variable(var) => self.check_variable_decl(var),
            Decl::Procedure(proc) => self.check_procedure_decl(proc),
        }
    }

    fn check_variable_decl(&mut self, var: &VariableDecl) -> Result<(), CompileError> {
        if var.is_global && !self.symtab.is_root_scope() {
            return Err(CompileError::semantic(
                var.line,
                "'global' is only legal on a declaration at program scope",
            ));
        }
        if let Some(0) = var.array_size {
            return Err(CompileError::semantic(
                var.line,
                format!("array '{}' must have a positive length", var.name),
            ));
        }
        self.symtab.declare(
            Symbol {
                name: var.name.clone(),
                kind: SymbolKind::Variable {
                    ty: var.elem_ty.clone(),
                    array_len: var.array_size,
                },
                line: var.line,
            },
            var.is_global,
        )
    }

    fn check_procedure_decl(&mut self, proc: &mut ProcedureDecl) -> Result<(), CompileError> {
        if proc.is_global && !self.symtab.is_root_scope() {
            return Err(CompileError::semantic(
                proc.line,
                "'global' is only legal on a declaration at program scope",
            ));
        }
        let params = proc
            .params
            .iter()
            .map(|p| ParamType {
                ty: p.decl.full_type(),
                direction: p.direction,
            })
            .collect();
        self.symtab.declare(
            Symbol {
                name: proc.name.clone(),
                kind: SymbolKind::Procedure {
                    params,
                    ret: proc.return_type.clone(),
                },
                line: proc.line,
            },
            proc.is_global,
        )?;

        self.symtab.push_scope();
        for param in &proc.params {
            self.symtab.declare(
                Symbol {
                    name: param.decl.name.clone(),
                    kind: SymbolKind::Variable {
                        ty: param.decl.elem_ty.clone(),
                        array_len: param.decl.array_size,
                    },
                    line: param.decl.line,
                },
                false,
            )?;
        }
        self.check_decls(&mut proc.decls)?;
        self.check_stmts(&mut proc.body)?;
        self.symtab.pop_scope();
        Ok(())
    }

    // ---- statements ----------------------------------------------------

    fn check_stmts(&mut self, stmts: &mut [Stmt]) -> Result<(), CompileError> {
        for stmt in stmts {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Assign { target, value, line } => {
                let target_ty = self.check_destination(target)?;
                target.ty = target_ty.clone();
                self.check_expr(value)?;
                self.coerce_in_place(value, &target_ty).map_err(|e| {
                    if let CompileError::Semantic { message, .. } = e {
                        CompileError::semantic(*line, message)
                    } else {
                        e
                    }
                })
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                line,
            } => {
                self.check_expr(cond)?;
                if *cond.ty() != Type::Bool {
                    return Err(CompileError::semantic(
                        *line,
                        format!("if condition must be bool, found {}", cond.ty()),
                    ));
                }
                self.check_stmts(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.check_stmts(else_branch)?;
                }
                Ok(())
            }
            Stmt::For { init, cond, body, line } => {
                self.check_stmt(init)?;
                self.check_expr(cond)?;
                if *cond.ty() != Type::Bool {
                    return Err(CompileError::semantic(
                        *line,
                        format!("for condition must be bool, found {}", cond.ty()),
                    ));
                }
                self.check_stmts(body)?;
                Ok(())
            }
            Stmt::Return { .. } => Ok(()),
            Stmt::Call { callee, args, line } => {
                self.check_call(callee, args, *line)?;
                Ok(())
            }
        }
    }

    fn check_destination(&mut self, dest: &mut Destination) -> Result<Type, CompileError> {
        let sym = self.lookup_variable(&dest.name, dest.line)?;
        let (elem_ty, array_len) = match &sym.kind {
            SymbolKind::Variable { ty, array_len } => (ty.clone(), *array_len),
            SymbolKind::Procedure { .. } => {
                return Err(CompileError::semantic(
                    dest.line,
                    format!("'{}' is a procedure, not a variable", dest.name),
                ));
            }
        };
        match &mut dest.index {
            Some(index_expr) => {
                let array_len = array_len.ok_or_else(|| {
                    CompileError::semantic(
                        dest.line,
                        format!("'{}' is not an array", dest.name),
                    )
                })?;
                self.check_expr(index_expr)?;
                if *index_expr.ty() != Type::Int {
                    return Err(CompileError::semantic(
                        dest.line,
                        format!("array index must be int, found {}", index_expr.ty()),
                    ));
                }
                check_literal_bound(index_expr, array_len)?;
                Ok(elem_ty)
            }
            None => match array_len {
                Some(n) => Ok(Type::Array(Box::new(elem_ty), n)),
                None => Ok(elem_ty),
            },
        }
    }

    // ---- expressions -----------------------------------------------------

    fn check_expr(&mut self, expr: &mut Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Lit { value, ty, .. } => {
                *ty = match value {
                    LitValue::Int(_) => Type::Int,
                    LitValue::Float(_) => Type::Float,
                    LitValue::Bool(_) => Type::Bool,
                    LitValue::Str(_) => Type::String,
                };
                Ok(())
            }
            Expr::Ref { name, ty, line } => {
                let sym = self.lookup_variable(name, *line)?;
                match &sym.kind {
                    SymbolKind::Variable { ty: t, array_len: None } => {
                        *ty = t.clone();
                        Ok(())
                    }
                    SymbolKind::Variable { ty: t, array_len: Some(n) } => {
                        *ty = Type::Array(Box::new(t.clone()), *n);
                        Ok(())
                    }
                    SymbolKind::Procedure { .. } => Err(CompileError::semantic(
                        *line,
                        format!("'{}' is a procedure, not a value", name),
                    )),
                }
            }
            Expr::Index { name, index, ty, line } => {
                let sym = self.lookup_variable(name, *line)?;
                let (elem_ty, array_len) = match &sym.kind {
                    SymbolKind::Variable { ty: t, array_len: Some(n) } => (t.clone(), *n),
                    SymbolKind::Variable { array_len: None, .. } => {
                        return Err(CompileError::semantic(
                            *line,
                            format!("'{}' is not an array", name),
                        ));
                    }
                    SymbolKind::Procedure { .. } => {
                        return Err(CompileError::semantic(
                            *line,
                            format!("'{}' is a procedure, not a value", name),
                        ));
                    }
                };
                self.check_expr(index)?;
                if *index.ty() != Type::Int {
                    return Err(CompileError::semantic(
                        *line,
                        format!("array index must be int, found {}", index.ty()),
                    ));
                }
                check_literal_bound(index, array_len)?;
                *ty = elem_ty;
                Ok(())
            }
            Expr::Unary { op, expr: inner, ty, line } => {
                self.check_expr(inner)?;
                match op {
                    UnOp::Neg => {
                        if !element_type(inner.ty()).is_numeric() {
                            return Err(CompileError::semantic(
                                *line,
                                format!("unary '-' requires a numeric operand, found {}", inner.ty()),
                            ));
                        }
                        *ty = inner.ty().clone();
                    }
                    UnOp::Not => {
                        let elem = element_type(inner.ty());
                        if elem != &Type::Bool && elem != &Type::Int {
                            return Err(CompileError::semantic(
                                *line,
                                format!("'not' requires a bool or int operand, found {}", inner.ty()),
                            ));
                        }
                        *ty = inner.ty().clone();
                    }
                }
                Ok(())
            }
            Expr::Call { callee, args, ty, line } => {
                let ret = self.check_call(callee, args, *line)?;
                if ret == Type::Void {
                    return Err(CompileError::semantic(
                        *line,
                        format!("'{}' returns no value and cannot be used in an expression", callee),
                    ));
                }
                *ty = ret;
                Ok(())
            }
            Expr::ImplicitCast { .. } => {
                unreachable!("ImplicitCast is only inserted by the checker, never parsed")
            }
            Expr::Binary { op, lhs, rhs, broadcast_len, ty, line } => {
                self.check_expr(lhs)?;
                self.check_expr(rhs)?;
                self.check_binary(*op, lhs, rhs, broadcast_len, ty, *line)
            }
        }
    }

    fn check_binary(
        &mut self,
        op: BinOp,
        lhs: &mut Box<Expr>,
        rhs: &mut Box<Expr>,
        broadcast_len: &mut Option<usize>,
        ty: &mut Type,
        line: usize,
    ) -> Result<(), CompileError> {
        let lhs_len = lhs.ty().as_array().map(|(_, n)| n);
        let rhs_len = rhs.ty().as_array().map(|(_, n)| n);
        let len = match (lhs_len, rhs_len) {
            (Some(a), Some(b)) if a == b => Some(a),
            (Some(a), Some(b)) => {
                return Err(CompileError::semantic(
                    line,
                    format!("mismatched array lengths {} and {} in expression", a, b),
                ));
            }
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        };
        *broadcast_len = len;

        let lhs_elem = element_type(lhs.ty()).clone();
        let rhs_elem = element_type(rhs.ty()).clone();

        match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                if !lhs_elem.is_numeric() || !rhs_elem.is_numeric() {
                    return Err(CompileError::semantic(
                        line,
                        format!("arithmetic requires numeric operands, found {} and {}", lhs.ty(), rhs.ty()),
                    ));
                }
                let result_elem = numeric_join(&lhs_elem, &rhs_elem);
                coerce_operand(lhs, &result_elem, line)?;
                coerce_operand(rhs, &result_elem, line)?;
                *ty = wrap(result_elem, len);
            }
            BinOp::And | BinOp::Or => {
                if lhs_elem == Type::Bool && rhs_elem == Type::Bool {
                    *ty = wrap(Type::Bool, len);
                } else if lhs_elem == Type::Int && rhs_elem == Type::Int {
                    *ty = wrap(Type::Int, len);
                } else {
                    return Err(CompileError::semantic(
                        line,
                        format!(
                            "'{}' requires two bool or two int operands, found {} and {}",
                            op_symbol(op),
                            lhs.ty(),
                            rhs.ty()
                        ),
                    ));
                }
            }
            BinOp::Eq | BinOp::NotEq => {
                if lhs_elem.is_numeric() && rhs_elem.is_numeric() {
                    let result_elem = numeric_join(&lhs_elem, &rhs_elem);
                    coerce_operand(lhs, &result_elem, line)?;
                    coerce_operand(rhs, &result_elem, line)?;
                } else if lhs_elem != rhs_elem {
                    return Err(CompileError::semantic(
                        line,
                        format!("cannot compare {} with {}", lhs.ty(), rhs.ty()),
                    ));
                }
                *ty = wrap(Type::Bool, len);
            }
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
                if !lhs_elem.is_numeric() || !rhs_elem.is_numeric() {
                    return Err(CompileError::semantic(
                        line,
                        format!(
                            "'{}' requires numeric operands, found {} and {}",
                            op_symbol(op),
                            lhs.ty(),
                            rhs.ty()
                        ),
                    ));
                }
                let result_elem = numeric_join(&lhs_elem, &rhs_elem);
                coerce_operand(lhs, &result_elem, line)?;
                coerce_operand(rhs, &result_elem, line)?;
                *ty = wrap(Type::Bool, len);
            }
        }
        Ok(())
    }

    fn check_call(
        &mut self,
        callee: &str,
        args: &mut [Expr],
        line: usize,
    ) -> Result<Type, CompileError> {
        let (params, ret) = {
            let sym = self
                .symtab
                .lookup(callee)
                .ok_or_else(|| CompileError::semantic(line, format!("undeclared procedure '{}'", callee)))?;
            match &sym.kind {
                SymbolKind::Procedure { params, ret } => (params.clone(), ret.clone()),
                SymbolKind::Variable { .. } => {
                    return Err(CompileError::semantic(
                        line,
                        format!("'{}' is a variable, not a procedure", callee),
                    ));
                }
            }
        };
        if args.len() != params.len() {
            return Err(CompileError::semantic(
                line,
                format!(
                    "'{}' expects {} argument(s), found {}",
                    callee,
                    params.len(),
                    args.len()
                ),
            ));
        }
        for (arg, param) in args.iter_mut().zip(params.iter()) {
            self.check_expr(arg)?;
            if param.direction == Direction::Out {
                if !arg.is_lvalue() {
                    return Err(CompileError::semantic(
                        arg.line(),
                        "an 'out' argument must be a variable or array element",
                    ));
                }
                if *arg.ty() != param.ty {
                    return Err(CompileError::semantic(
                        arg.line(),
                        format!("'out' argument must be exactly {}, found {}", param.ty, arg.ty()),
                    ));
                }
            } else {
                self.coerce_in_place(arg, &param.ty)?;
            }
        }
        Ok(ret)
    }

    fn lookup_variable(&self, name: &str, line: usize) -> Result<Symbol, CompileError> {
        self.symtab
            .lookup(name)
            .cloned()
            .ok_or_else(|| CompileError::semantic(line, format!("undeclared name '{}'", name)))
    }

    /// Coerce `expr` in place to `target`, inserting an [`Expr::ImplicitCast`]
    /// for `int -> float` and the `int <-> bool` pair ("nonzero <=> true").
    /// Any other mismatch is an error.
    fn coerce_in_place(&self, expr: &mut Expr, target: &Type) -> Result<(), CompileError> {
        coerce_operand_to(expr, target)
    }
}

fn coerce_operand(expr: &mut Expr, target: &Type, line: usize) -> Result<(), CompileError> {
    let wrapped = wrap(target.clone(), expr.ty().as_array().map(|(_, n)| n));
    coerce_operand_to(expr, &wrapped).map_err(|e| {
        if let CompileError::Semantic { message, .. } = e {
            CompileError::semantic(line, message)
        } else {
            e
        }
    })
}

fn coerce_operand_to(expr: &mut Expr, target: &Type) -> Result<(), CompileError> {
    if expr.ty() == target {
        return Ok(());
    }
    let target_elem = element_type(target);
    let expr_elem = element_type(expr.ty());
    let castable = (*target_elem == Type::Float && *expr_elem == Type::Int)
        || (*target_elem == Type::Bool && *expr_elem == Type::Int)
        || (*target_elem == Type::Int && *expr_elem == Type::Bool);
    if castable {
        let line = expr.line();
        let from = expr.ty().clone();
        let placeholder = Expr::Lit {
            value: LitValue::Int(0),
            ty: Type::Void,
            line,
        };
        let inner = std::mem::replace(expr, placeholder);
        *expr = Expr::ImplicitCast {
            expr: Box::new(inner),
            from,
            to: target.clone(),
            line,
        };
        return Ok(());
    }
    Err(CompileError::semantic(
        expr.line(),
        format!("expected {}, found {}", target, expr.ty()),
    ))
}

fn element_type(ty: &Type) -> &Type {
    match ty.as_array() {
        Some((elem, _)) => elem,
        None => ty,
    }
}

fn wrap(elem: Type, len: Option<usize>) -> Type {
    match len {
        Some(n) => Type::Array(Box::new(elem), n),
        None => elem,
    }
}

fn numeric_join(a: &Type, b: &Type) -> Type {
    if *a == Type::Float || *b == Type::Float {
        Type::Float
    } else {
        Type::Int
    }
}

fn op_symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::And => "&",
        BinOp::Or => "|",
        BinOp::Lt => "<",
        BinOp::Gt => ">",
        BinOp::LtEq => "<=",
        BinOp::GtEq => ">=",
        _ => "?",
    }
}

/// If `index` is a literal integer, statically reject it when out of
/// `[0, len)` (invariant: literal out-of-range indices are a compile
/// error, not a runtime trap).
fn check_literal_bound(index: &Expr, len: usize) -> Result<(), CompileError> {
    if let Expr::Lit { value: LitValue::Int(n), line, .. } = index {
        if *n < 0 || *n as usize >= len {
            return Err(CompileError::semantic(
                *line,
                format!("array index {} is out of bounds for length {}", n, len),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn check(src: &str) -> Result<ProgramDecl, CompileError> {
        let mut program = Parser::new(src).unwrap().parse().unwrap();
        check_program(&mut program)?;
        Ok(program)
    }

    #[test]
    fn undeclared_name_is_semantic_error() {
        let err = check("program p is begin x := 1; return; end program").unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn int_literal_coerces_into_float_variable() {
        let program = check("program p is float x; begin x := 3; return; end program").unwrap();
        let Stmt::Assign { value, .. } = &program.body[0] else {
            panic!()
        };
        assert!(matches!(value, Expr::ImplicitCast { to: Type::Float, .. }));
    }

    #[test]
    fn float_literal_into_int_variable_is_rejected() {
        let err = check("program p is int x; begin x := 3.5; return; end program").unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn int_literal_coerces_into_bool_variable() {
        let program = check("program p is bool x; begin x := 1; return; end program").unwrap();
        let Stmt::Assign { value, .. } = &program.body[0] else {
            panic!()
        };
        assert!(matches!(value, Expr::ImplicitCast { to: Type::Bool, .. }));
    }

    #[test]
    fn bool_literal_coerces_into_int_variable() {
        let program = check("program p is int x; begin x := true; return; end program").unwrap();
        let Stmt::Assign { value, .. } = &program.body[0] else {
            panic!()
        };
        assert!(matches!(value, Expr::ImplicitCast { to: Type::Int, .. }));
    }

    #[test]
    fn and_accepts_two_int_operands() {
        let program =
            check("program p is int a; int b; int c; begin c := a & b; return; end program").unwrap();
        let Stmt::Assign { value, .. } = &program.body[0] else {
            panic!()
        };
        assert_eq!(*value.ty(), Type::Int);
    }

    #[test]
    fn and_rejects_mixed_bool_and_int_operands() {
        let err =
            check("program p is bool a; int b; begin putBool(a & b); return; end program").unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn not_accepts_int_operand() {
        let program = check("program p is int a; int b; begin b := not a; return; end program").unwrap();
        let Stmt::Assign { value, .. } = &program.body[0] else {
            panic!()
        };
        assert_eq!(*value.ty(), Type::Int);
    }

    #[test]
    fn literal_out_of_bounds_index_is_rejected() {
        let err = check("program p is int a[4]; begin a[10] := 1; return; end program").unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn duplicate_local_declaration_is_rejected() {
        let err = check("program p is int x; int x; begin return; end program").unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn scalar_array_broadcast_records_length() {
        let program =
            check("program p is int a[4]; int b[4]; begin b := a + 1; return; end program").unwrap();
        let Stmt::Assign { value, .. } = &program.body[0] else {
            panic!()
        };
        let Expr::Binary { broadcast_len, .. } = value else {
            panic!("expected binary")
        };
        assert_eq!(*broadcast_len, Some(4));
    }

    #[test]
    fn out_parameter_requires_lvalue() {
        let err = check(
            "program p is procedure q(out int r) begin return; end procedure; begin q(1); return; end program",
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn global_on_nested_declaration_is_rejected() {
        let err = check(
            "program p is procedure q() global int r; begin return; end procedure; begin return; end program",
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }
}
