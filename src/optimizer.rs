//! Optimiser (component G): three levels, each a strict superset of the
//! last.
//!
//! - Level 0: the tree passes through untouched.
//! - Level 1: constant folding of scalar literal arithmetic, comparison
//!   and logical expressions, plus dead-branch elimination (an `if` or
//!   `for` whose condition folds to a literal is replaced by the branch
//!   that statically runs).
//! - Level 2: level 1, plus algebraic identities (`x + 0`, `x * 1`, ...)
//!   and a conservative dead-assignment pass that drops a write
//!   immediately overwritten by a later write to the same name with no
//!   intervening read.
//!
//! Every fold and rewrite that would drop a whole subexpression checks
//! [`Expr::contains_call`] first: a call's side effect is never removed,
//! even when its value is provably unused.

use std::collections::{HashMap, HashSet};

use crate::ast::{BinOp, Decl, Expr, LitValue, ProgramDecl, Stmt, UnOp};
use crate::types::Type;

pub fn optimize(program: &mut ProgramDecl, level: u8) {
    if level == 0 {
        return;
    }
    program.body = optimize_block(std::mem::take(&mut program.body), level);
    optimize_decls(&mut program.decls, level);
}

fn optimize_decls(decls: &mut [Decl], level: u8) {
    for decl in decls {
        if let Decl::Procedure(proc) = decl {
            proc.body = optimize_block(std::mem::take(&mut proc.body), level);
            optimize_decls(&mut proc.decls, level);
        }
    }
}

fn optimize_block(stmts: Vec<Stmt>, level: u8) -> Vec<Stmt> {
    let mut out = Vec::with_capacity(stmts.len());
    for mut stmt in stmts {
        fold_stmt_exprs(&mut stmt, level);
        match stmt {
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                line,
            } => {
                let then_branch = optimize_block(then_branch, level);
                let else_branch = else_branch.map(|b| optimize_block(b, level));
                if let Expr::Lit {
                    value: LitValue::Bool(b),
                    ..
                } = &cond
                {
                    if *b {
                        out.extend(then_branch);
                    } else if let Some(eb) = else_branch {
                        out.extend(eb);
                    }
                } else {
                    out.push(Stmt::If {
                        cond,
                        then_branch,
                        else_branch,
                        line,
                    });
                }
            }
            Stmt::For {
                init,
                cond,
                body,
                line,
            } => {
                let body = optimize_block(body, level);
                if let Expr::Lit {
                    value: LitValue::Bool(false),
                    ..
                } = &cond
                {
                    // the loop never runs, but its initialiser still must:
                    // it may have side effects or be observed afterwards.
                    out.push(*init);
                } else {
                    out.push(Stmt::For {
                        init,
                        cond,
                        body,
                        line,
                    });
                }
            }
            other => out.push(other),
        }
    }
    if level >= 2 {
        eliminate_dead_assignments(&mut out);
    }
    out
}

fn fold_stmt_exprs(stmt: &mut Stmt, level: u8) {
    match stmt {
        Stmt::Assign { target, value, .. } => {
            if let Some(index) = &mut target.index {
                fold_expr(index, level);
            }
            fold_expr(value, level);
        }
        Stmt::If { cond, .. } => fold_expr(cond, level),
        Stmt::For { init, cond, .. } => {
            fold_stmt_exprs(init, level);
            fold_expr(cond, level);
        }
        Stmt::Return { .. } => {}
        Stmt::Call { args, .. } => {
            for arg in args {
                fold_expr(arg, level);
            }
        }
    }
}

fn fold_expr(expr: &mut Expr, level: u8) {
    match expr {
        Expr::Lit { .. } | Expr::Ref { .. } => {}
        Expr::Index { index, .. } => fold_expr(index, level),
        Expr::Call { args, .. } => {
            for arg in args {
                fold_expr(arg, level);
            }
        }
        Expr::Unary { op, expr: inner, ty, line } => {
            fold_expr(inner, level);
            if let Some(folded) = try_fold_unary(*op, inner, ty.clone(), *line) {
                *expr = folded;
            }
        }
        Expr::ImplicitCast { expr: inner, to, line, .. } => {
            fold_expr(inner, level);
            match (inner.as_ref(), to) {
                (Expr::Lit { value: LitValue::Int(n), .. }, Type::Float) => {
                    *expr = Expr::Lit {
                        value: LitValue::Float(*n as f64),
                        ty: Type::Float,
                        line: *line,
                    };
                }
                (Expr::Lit { value: LitValue::Int(n), .. }, Type::Bool) => {
                    *expr = Expr::Lit {
                        value: LitValue::Bool(*n != 0),
                        ty: Type::Bool,
                        line: *line,
                    };
                }
                (Expr::Lit { value: LitValue::Bool(b), .. }, Type::Int) => {
                    *expr = Expr::Lit {
                        value: LitValue::Int(if *b { 1 } else { 0 }),
                        ty: Type::Int,
                        line: *line,
                    };
                }
                _ => {}
            }
        }
        Expr::Binary {
            op,
            lhs,
            rhs,
            broadcast_len,
            ty,
            line,
        } => {
            fold_expr(lhs, level);
            fold_expr(rhs, level);
            if broadcast_len.is_none() {
                if let Some(folded) = try_const_fold_binary(*op, lhs, rhs, ty.clone(), *line) {
                    *expr = folded;
                    return;
                }
            }
            if level >= 2 {
                if let Some(simplified) = try_identity_binary(*op, lhs, rhs) {
                    *expr = simplified;
                }
            }
        }
    }
}

fn lit(value: LitValue, ty: Type, line: usize) -> Expr {
    Expr::Lit { value, ty, line }
}

fn try_fold_unary(op: UnOp, inner: &Expr, ty: Type, line: usize) -> Option<Expr> {
    match (op, inner) {
        (UnOp::Neg, Expr::Lit { value: LitValue::Int(n), .. }) => Some(lit(LitValue::Int(-n), ty, line)),
        (UnOp::Neg, Expr::Lit { value: LitValue::Float(f), .. }) => {
            Some(lit(LitValue::Float(-f), ty, line))
        }
        (UnOp::Not, Expr::Lit { value: LitValue::Bool(b), .. }) => {
            Some(lit(LitValue::Bool(!b), ty, line))
        }
        (UnOp::Not, Expr::Lit { value: LitValue::Int(n), .. }) => Some(lit(LitValue::Int(!n), ty, line)),
        _ => None,
    }
}

fn try_const_fold_binary(op: BinOp, lhs: &Expr, rhs: &Expr, ty: Type, line: usize) -> Option<Expr> {
    use LitValue::*;
    let (Expr::Lit { value: lv, .. }, Expr::Lit { value: rv, .. }) = (lhs, rhs) else {
        return None;
    };
    let result = match (op, lv, rv) {
        (BinOp::Add, Int(a), Int(b)) => Int(a + b),
        (BinOp::Add, Float(a), Float(b)) => Float(a + b),
        (BinOp::Sub, Int(a), Int(b)) => Int(a - b),
        (BinOp::Sub, Float(a), Float(b)) => Float(a - b),
        (BinOp::Mul, Int(a), Int(b)) => Int(a * b),
        (BinOp::Mul, Float(a), Float(b)) => Float(a * b),
        (BinOp::Div, Int(a), Int(b)) if *b != 0 => Int(a / b),
        (BinOp::Div, Float(a), Float(b)) => Float(a / b),
        (BinOp::Eq, Int(a), Int(b)) => Bool(a == b),
        (BinOp::Eq, Float(a), Float(b)) => Bool(a == b),
        (BinOp::Eq, Bool(a), Bool(b)) => Bool(a == b),
        (BinOp::Eq, Str(a), Str(b)) => Bool(a == b),
        (BinOp::NotEq, Int(a), Int(b)) => Bool(a != b),
        (BinOp::NotEq, Float(a), Float(b)) => Bool(a != b),
        (BinOp::NotEq, Bool(a), Bool(b)) => Bool(a != b),
        (BinOp::NotEq, Str(a), Str(b)) => Bool(a != b),
        (BinOp::Lt, Int(a), Int(b)) => Bool(a < b),
        (BinOp::Lt, Float(a), Float(b)) => Bool(a < b),
        (BinOp::Gt, Int(a), Int(b)) => Bool(a > b),
        (BinOp::Gt, Float(a), Float(b)) => Bool(a > b),
        (BinOp::LtEq, Int(a), Int(b)) => Bool(a <= b),
        (BinOp::LtEq, Float(a), Float(b)) => Bool(a <= b),
        (BinOp::GtEq, Int(a), Int(b)) => Bool(a >= b),
        (BinOp::GtEq, Float(a), Float(b)) => Bool(a >= b),
        (BinOp::And, Bool(a), Bool(b)) => Bool(*a && *b),
        (BinOp::Or, Bool(a), Bool(b)) => Bool(*a || *b),
        (BinOp::And, Int(a), Int(b)) => Int(a & b),
        (BinOp::Or, Int(a), Int(b)) => Int(a | b),
        _ => return None,
    };
    Some(lit(result, ty, line))
}

fn as_lit(expr: &Expr) -> Option<&LitValue> {
    match expr {
        Expr::Lit { value, .. } => Some(value),
        _ => None,
    }
}

fn is_zero(lit: Option<&LitValue>) -> bool {
    matches!(lit, Some(LitValue::Int(0))) || matches!(lit, Some(LitValue::Float(f)) if *f == 0.0)
}

fn is_one(lit: Option<&LitValue>) -> bool {
    matches!(lit, Some(LitValue::Int(1))) || matches!(lit, Some(LitValue::Float(f)) if *f == 1.0)
}

fn is_true(lit: Option<&LitValue>) -> bool {
    matches!(lit, Some(LitValue::Bool(true)))
}

fn is_false(lit: Option<&LitValue>) -> bool {
    matches!(lit, Some(LitValue::Bool(false)))
}

/// Algebraic identities. Any rewrite that would drop a whole operand
/// (rather than just the literal it matched against) is rejected if
/// that operand contains a call.
fn try_identity_binary(op: BinOp, lhs: &Expr, rhs: &Expr) -> Option<Expr> {
    let lv = as_lit(lhs);
    let rv = as_lit(rhs);
    match op {
        BinOp::Add => {
            if is_zero(rv) {
                return Some(lhs.clone());
            }
            if is_zero(lv) {
                return Some(rhs.clone());
            }
        }
        BinOp::Sub if is_zero(rv) => return Some(lhs.clone()),
        BinOp::Mul => {
            if is_one(rv) {
                return Some(lhs.clone());
            }
            if is_one(lv) {
                return Some(rhs.clone());
            }
            if is_zero(rv) && !lhs.contains_call() {
                return Some(rhs.clone());
            }
            if is_zero(lv) && !rhs.contains_call() {
                return Some(lhs.clone());
            }
        }
        BinOp::Div if is_one(rv) => return Some(lhs.clone()),
        BinOp::And => {
            if is_true(rv) {
                return Some(lhs.clone());
            }
            if is_true(lv) {
                return Some(rhs.clone());
            }
            if is_false(rv) && !lhs.contains_call() {
                return Some(rhs.clone());
            }
            if is_false(lv) && !rhs.contains_call() {
                return Some(lhs.clone());
            }
        }
        BinOp::Or => {
            if is_false(rv) {
                return Some(lhs.clone());
            }
            if is_false(lv) {
                return Some(rhs.clone());
            }
            if is_true(rv) && !lhs.contains_call() {
                return Some(rhs.clone());
            }
            if is_true(lv) && !rhs.contains_call() {
                return Some(lhs.clone());
            }
        }
        _ => {}
    }
    None
}

fn eliminate_dead_assignments(stmts: &mut Vec<Stmt>) {
    let mut pending: HashMap<String, usize> = HashMap::new();
    let mut dead: HashSet<usize> = HashSet::new();
    for (i, stmt) in stmts.iter().enumerate() {
        let mut reads = HashSet::new();
        collect_stmt_reads(stmt, &mut reads);
        for name in &reads {
            pending.remove(name);
        }
        if let Stmt::Assign { target, value, .. } = stmt {
            if target.index.is_none() && !value.contains_call() {
                if let Some(prev) = pending.insert(target.name.clone(), i) {
                    dead.insert(prev);
                }
            } else {
                pending.remove(&target.name);
            }
        }
    }
    let mut idx = 0;
    stmts.retain(|_| {
        let keep = !dead.contains(&idx);
        idx += 1;
        keep
    });
}

fn collect_stmt_reads(stmt: &Stmt, out: &mut HashSet<String>) {
    match stmt {
        Stmt::Assign { target, value, .. } => {
            if let Some(index) = &target.index {
                collect_expr_reads(index, out);
            }
            collect_expr_reads(value, out);
        }
        Stmt::If {
            cond,
            then_branch,
            else_branch,
            ..
        } => {
            collect_expr_reads(cond, out);
            for s in then_branch {
                collect_stmt_reads(s, out);
            }
            if let Some(eb) = else_branch {
                for s in eb {
                    collect_stmt_reads(s, out);
                }
            }
        }
        Stmt::For { init, cond, body, .. } => {
            collect_stmt_reads(init, out);
            collect_expr_reads(cond, out);
            for s in body {
                collect_stmt_reads(s, out);
            }
        }
        Stmt::Return { .. } => {}
        Stmt::Call { args, .. } => {
            for arg in args {
                collect_expr_reads(arg, out);
            }
        }
    }
}

fn collect_expr_reads(expr: &Expr, out: &mut HashSet<String>) {
    match expr {
        Expr::Ref { name, .. } => {
            out.insert(name.clone());
        }
        Expr::Index { name, index, .. } => {
            out.insert(name.clone());
            collect_expr_reads(index, out);
        }
        Expr::Binary { lhs, rhs, .. } => {
            collect_expr_reads(lhs, out);
            collect_expr_reads(rhs, out);
        }
        Expr::Unary { expr, .. } | Expr::ImplicitCast { expr, .. } => collect_expr_reads(expr, out),
        Expr::Call { args, .. } => {
            for arg in args {
                collect_expr_reads(arg, out);
            }
        }
        Expr::Lit { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::typechecker::check_program;

    fn optimized(src: &str, level: u8) -> ProgramDecl {
        let mut program = Parser::new(src).unwrap().parse().unwrap();
        check_program(&mut program).unwrap();
        optimize(&mut program, level);
        program
    }

    #[test]
    fn level_zero_is_identity() {
        let program = optimized("program p is begin putInteger(2 + 3); return; end program", 0);
        let Stmt::Call { args, .. } = &program.body[0] else {
            panic!()
        };
        assert!(matches!(args[0], Expr::Binary { .. }));
    }

    #[test]
    fn level_one_folds_constants() {
        let program = optimized("program p is begin putInteger(2 + 3); return; end program", 1);
        let Stmt::Call { args, .. } = &program.body[0] else {
            panic!()
        };
        assert!(matches!(
            args[0],
            Expr::Lit { value: LitValue::Int(5), .. }
        ));
    }

    #[test]
    fn level_one_eliminates_constant_false_branch() {
        let program = optimized(
            "program p is begin if (false) then putInteger(1); else putInteger(2); end if; return; end program",
            1,
        );
        assert_eq!(program.body.len(), 2);
        let Stmt::Call { args, .. } = &program.body[0] else {
            panic!()
        };
        assert!(matches!(
            args[0],
            Expr::Lit { value: LitValue::Int(2), .. }
        ));
    }

    #[test]
    fn level_two_simplifies_additive_identity() {
        let program = optimized(
            "program p is int x; begin putInteger(x + 0); return; end program",
            2,
        );
        let Stmt::Call { args, .. } = &program.body[0] else {
            panic!()
        };
        assert!(matches!(args[0], Expr::Ref { .. }));
    }

    #[test]
    fn level_two_keeps_call_when_multiplied_by_zero() {
        let program = optimized(
            "program p is begin putInteger(getInteger() * 0); return; end program",
            2,
        );
        let Stmt::Call { args, .. } = &program.body[0] else {
            panic!()
        };
        assert!(args[0].contains_call());
    }

    #[test]
    fn level_two_drops_overwritten_assignment() {
        let program = optimized(
            "program p is int x; begin x := 1; x := 2; putInteger(x); return; end program",
            2,
        );
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn level_two_keeps_assignment_read_before_overwrite() {
        let program = optimized(
            "program p is int x; int y; begin x := 1; y := x; x := 2; putInteger(y); return; end program",
            2,
        );
        assert_eq!(program.body.len(), 4);
    }
}
