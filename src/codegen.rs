//! Code generator (component H): lowers a type-checked, optimised AST
//! into portable C99.
//!
//! Every expression node, including a bare literal or a variable
//! reference, is lowered into its own freshly named temporary
//! (`_t0`, `_t1`, ...); nothing is folded back into a single C
//! expression. This keeps the lowering rules uniform at the cost of
//! some redundant copies, which a C compiler's own optimiser erases.
//!
//! User identifiers are mangled with a `u_` prefix so that a source
//! name can never collide with a C keyword or a runtime symbol.
//! Procedures are flattened to top-level C functions regardless of how
//! deeply they were nested in the source; two procedures sharing a
//! name in different scopes is rejected rather than silently
//! miscompiled (see DESIGN.md).
//!
//! `&`/`|` on bool operands go through the runtime's `validateBooleanOp`
//! rather than C's `&&`/`||`, so both operands are always evaluated and
//! validated as proper booleans; on int operands they lower to plain
//! C `&`/`|` (bitwise).
//!
//! `string` variables are fixed `char[256]` buffers, never pointers to
//! runtime-owned storage, so that two values read independently (e.g.
//! two calls to `getString`) never alias each other.

use std::collections::HashMap;

use crate::ast::{BinOp, Decl, Expr, LitValue, ProcedureDecl, ProgramDecl, Stmt, UnOp, VariableDecl};
use crate::error::CompileError;
use crate::types::{Direction, Type};

#[derive(Clone)]
struct ProcInfo {
    c_name: String,
    directions: Vec<Direction>,
    ret: Type,
}

pub fn generate(program: &ProgramDecl, verbose: bool) -> Result<String, CompileError> {
    let mut ctx = CodegenCtx {
        procs: HashMap::new(),
        verbose,
    };
    for name in BUILTIN_NAMES {
        ctx.procs.insert(name.to_string(), builtin_proc_info(name));
    }

    let mut flat_procs = Vec::new();
    ctx.collect_procedures(&program.decls, &mut flat_procs)?;

    let mut out = String::new();
    out.push_str("#include <stdint.h>\n#include <stdbool.h>\n#include <string.h>\n#include \"runtime.h\"\n\n");

    for decl in &program.decls {
        if let Decl::Variable(var) = decl {
            if var.is_global {
                out.push_str(&emit_var_decl_line(var));
                out.push('\n');
            }
        }
    }
    out.push('\n');

    for proc in &flat_procs {
        out.push_str(&prototype(proc));
        out.push_str(";\n");
    }
    out.push('\n');

    for proc in &flat_procs {
        ctx.emit_procedure(proc, &mut out)?;
        out.push('\n');
    }

    out.push_str("int main(void) {\n");
    for decl in &program.decls {
        if let Decl::Variable(var) = decl {
            if !var.is_global {
                out.push_str("    ");
                out.push_str(&emit_var_decl_line(var));
                out.push('\n');
            }
        }
    }
    ctx.emit_stmts(&program.body, &mut out, 1, "return 0;")?;
    out.push_str("}\n");
    Ok(out)
}

const BUILTIN_NAMES: [&str; 8] = [
    "getBool",
    "getInteger",
    "getFloat",
    "getString",
    "putBool",
    "putInteger",
    "putFloat",
    "putString",
];

fn builtin_proc_info(name: &str) -> ProcInfo {
    let (directions, ret) = match name {
        "getBool" => (vec![], Type::Bool),
        "getInteger" => (vec![], Type::Int),
        "getFloat" => (vec![], Type::Float),
        "getString" => (vec![], Type::String),
        "putBool" | "putInteger" | "putFloat" | "putString" => (vec![Direction::In], Type::Void),
        _ => unreachable!("not a builtin"),
    };
    ProcInfo {
        c_name: name.to_string(),
        directions,
        ret,
    }
}

fn mangle(name: &str) -> String {
    format!("u_{name}")
}

/// Fixed size of a `string` value's storage, per the frozen runtime ABI.
const STRING_BUF_LEN: usize = 256;

fn c_type(ty: &Type) -> String {
    match ty {
        Type::Int => "int64_t".to_string(),
        Type::Float => "double".to_string(),
        Type::Bool => "bool".to_string(),
        // Only reached for the untested array-of-string case; a scalar
        // `string` is handled directly by its callers as a `char[256]`.
        Type::String => "const char*".to_string(),
        Type::Array(elem, _) => c_type(elem),
        Type::Void => "void".to_string(),
        Type::Procedure { .. } => unreachable!("a procedure's type is never emitted directly"),
    }
}

/// The base C type used for a scalar `string` parameter or element,
/// i.e. `char` so that the caller can declare `char[256]` or decay it
/// to `char*`.
fn scalar_elem_c_type(ty: &Type) -> String {
    match ty {
        Type::String => "char".to_string(),
        other => c_type(other),
    }
}

/// The scalar element type underlying a possibly-array type.
fn elem_of(ty: &Type) -> &Type {
    match ty.as_array() {
        Some((elem, _)) => elem,
        None => ty,
    }
}

fn emit_var_decl_line(var: &VariableDecl) -> String {
    if var.elem_ty == Type::String && var.array_size.is_none() {
        return format!("char {}[{}];", mangle(&var.name), STRING_BUF_LEN);
    }
    let ty = c_type(&var.elem_ty);
    match var.array_size {
        Some(n) => format!("{} {}[{}];", ty, mangle(&var.name), n),
        None => format!("{} {};", ty, mangle(&var.name)),
    }
}

fn prototype(proc: &ProcedureDecl) -> String {
    let params = proc
        .params
        .iter()
        .map(|p| {
            let base = scalar_elem_c_type(&p.decl.elem_ty);
            let is_array = p.decl.array_size.is_some() || p.decl.elem_ty == Type::String;
            let is_out = p.direction == Direction::Out;
            if is_array || is_out {
                format!("{}* {}", base, mangle(&p.decl.name))
            } else {
                format!("{} {}", base, mangle(&p.decl.name))
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    let params = if params.is_empty() { "void".to_string() } else { params };
    format!("void {}({})", mangle(&proc.name), params)
}

struct TempGen {
    next: usize,
}

impl TempGen {
    fn new() -> Self {
        TempGen { next: 0 }
    }

    fn fresh(&mut self) -> String {
        let n = self.next;
        self.next += 1;
        format!("_t{n}")
    }

    fn fresh_index(&mut self) -> String {
        let n = self.next;
        self.next += 1;
        format!("_i{n}")
    }
}

struct CodegenCtx {
    procs: HashMap<String, ProcInfo>,
    verbose: bool,
}

impl CodegenCtx {
    fn collect_procedures<'a>(
        &mut self,
        decls: &'a [Decl],
        out: &mut Vec<&'a ProcedureDecl>,
    ) -> Result<(), CompileError> {
        for decl in decls {
            if let Decl::Procedure(proc) = decl {
                if self.procs.contains_key(&proc.name) {
                    return Err(CompileError::semantic(
                        proc.line,
                        format!(
                            "procedure '{}' is declared in more than one scope; this backend \
                             flattens every procedure into a single C namespace and cannot emit both",
                            proc.name
                        ),
                    ));
                }
                let directions = proc.params.iter().map(|p| p.direction).collect();
                self.procs.insert(
                    proc.name.clone(),
                    ProcInfo {
                        c_name: mangle(&proc.name),
                        directions,
                        ret: proc.return_type.clone(),
                    },
                );
                out.push(proc);
                self.collect_procedures(&proc.decls, out)?;
            }
        }
        Ok(())
    }

    fn emit_procedure(&mut self, proc: &ProcedureDecl, out: &mut String) -> Result<(), CompileError> {
        out.push_str(&prototype(proc));
        out.push_str(" {\n");
        for decl in &proc.decls {
            if let Decl::Variable(var) = decl {
                out.push_str("    ");
                out.push_str(&emit_var_decl_line(var));
                out.push('\n');
            }
        }
        self.emit_stmts(&proc.body, out, 1, "return;")?;
        out.push_str("}\n");
        Ok(())
    }

    fn emit_stmts(
        &mut self,
        stmts: &[Stmt],
        out: &mut String,
        indent: usize,
        return_stmt: &str,
    ) -> Result<(), CompileError> {
        for stmt in stmts {
            self.emit_stmt(stmt, out, indent, return_stmt)?;
        }
        Ok(())
    }

    fn emit_stmt(
        &mut self,
        stmt: &Stmt,
        out: &mut String,
        indent: usize,
        return_stmt: &str,
    ) -> Result<(), CompileError> {
        let pad = "    ".repeat(indent);
        if self.verbose {
            out.push_str(&format!("{pad}// line {}\n", stmt.line()));
        }
        match stmt {
            Stmt::Assign { target, value, .. } => {
                let mut temps = TempGen::new();
                let value_name = self.lower_expr(value, out, &mut temps, indent)?;
                match &target.index {
                    Some(idx_expr) => {
                        let idx_name = self.lower_expr(idx_expr, out, &mut temps, indent)?;
                        out.push_str(&format!(
                            "{pad}{}[{}] = {};\n",
                            mangle(&target.name),
                            idx_name,
                            value_name
                        ));
                    }
                    None => {
                        if let Some((_, n)) = target.ty.as_array() {
                            let i = temps.fresh_index();
                            out.push_str(&format!("{pad}for (int64_t {i} = 0; {i} < {n}; {i}++) {{\n"));
                            out.push_str(&format!(
                                "{pad}    {}[{i}] = {}[{i}];\n",
                                mangle(&target.name),
                                value_name
                            ));
                            out.push_str(&format!("{pad}}}\n"));
                        } else if target.ty == Type::String {
                            out.push_str(&format!(
                                "{pad}strcpy({}, {});\n",
                                mangle(&target.name),
                                value_name
                            ));
                        } else {
                            out.push_str(&format!("{pad}{} = {};\n", mangle(&target.name), value_name));
                        }
                    }
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                let mut temps = TempGen::new();
                let cond_name = self.lower_expr(cond, out, &mut temps, indent)?;
                out.push_str(&format!("{pad}if ({cond_name}) {{\n"));
                self.emit_stmts(then_branch, out, indent + 1, return_stmt)?;
                if let Some(eb) = else_branch {
                    out.push_str(&format!("{pad}}} else {{\n"));
                    self.emit_stmts(eb, out, indent + 1, return_stmt)?;
                }
                out.push_str(&format!("{pad}}}\n"));
                Ok(())
            }
            Stmt::For { init, cond, body, .. } => {
                self.emit_stmt(init, out, indent, return_stmt)?;
                out.push_str(&format!("{pad}for (;;) {{\n"));
                let mut temps = TempGen::new();
                let cond_name = self.lower_expr(cond, out, &mut temps, indent + 1)?;
                out.push_str(&format!("{pad}    if (!({cond_name})) break;\n"));
                self.emit_stmts(body, out, indent + 1, return_stmt)?;
                out.push_str(&format!("{pad}}}\n"));
                Ok(())
            }
            Stmt::Return { .. } => {
                out.push_str(&format!("{pad}{return_stmt}\n"));
                Ok(())
            }
            Stmt::Call { callee, args, line } => {
                let mut temps = TempGen::new();
                if callee == "getString" {
                    self.lower_getstring_call(&mut temps, out, indent)?;
                    return Ok(());
                }
                let call_expr = self.lower_call(callee, args, &mut temps, out, indent, *line)?;
                out.push_str(&format!("{pad}{call_expr};\n"));
                Ok(())
            }
        }
    }

    fn lower_call(
        &mut self,
        callee: &str,
        args: &[Expr],
        temps: &mut TempGen,
        out: &mut String,
        indent: usize,
        line: usize,
    ) -> Result<String, CompileError> {
        let info = self
            .procs
            .get(callee)
            .cloned()
            .ok_or_else(|| CompileError::semantic(line, format!("undeclared procedure '{}'", callee)))?;
        let mut arg_strs = Vec::new();
        for (arg, direction) in args.iter().zip(info.directions.iter()) {
            match direction {
                Direction::In => {
                    let name = self.lower_expr(arg, out, temps, indent)?;
                    arg_strs.push(name);
                }
                Direction::Out => {
                    let lvalue = self.lvalue_c_expr(arg, out, temps, indent)?;
                    if arg.ty().as_array().is_some() || *arg.ty() == Type::String {
                        arg_strs.push(lvalue);
                    } else {
                        arg_strs.push(format!("&{lvalue}"));
                    }
                }
            }
        }
        Ok(format!("{}({})", info.c_name, arg_strs.join(", ")))
    }

    /// `getString` is zero-arity at the source level but its C ABI takes
    /// a caller-owned `char[256]` out-buffer; bridge the two here rather
    /// than in `lower_call`, which only knows the source-level signature.
    fn lower_getstring_call(
        &mut self,
        temps: &mut TempGen,
        out: &mut String,
        indent: usize,
    ) -> Result<String, CompileError> {
        let pad = "    ".repeat(indent);
        let t = temps.fresh();
        out.push_str(&format!("{pad}char {t}[{STRING_BUF_LEN}];\n"));
        out.push_str(&format!("{pad}getString({t});\n"));
        Ok(t)
    }

    fn lvalue_c_expr(
        &mut self,
        expr: &Expr,
        out: &mut String,
        temps: &mut TempGen,
        indent: usize,
    ) -> Result<String, CompileError> {
        match expr {
            Expr::Ref { name, .. } => Ok(mangle(name)),
            Expr::Index { name, index, .. } => {
                let idx_name = self.lower_expr(index, out, temps, indent)?;
                Ok(format!("{}[{}]", mangle(name), idx_name))
            }
            _ => Err(CompileError::semantic(
                expr.line(),
                "internal error: 'out' argument is not an lvalue",
            )),
        }
    }

    fn lower_expr(
        &mut self,
        expr: &Expr,
        out: &mut String,
        temps: &mut TempGen,
        indent: usize,
    ) -> Result<String, CompileError> {
        let pad = "    ".repeat(indent);
        match expr {
            Expr::Lit { value, ty, .. } => {
                let t = temps.fresh();
                if let LitValue::Str(_) = value {
                    out.push_str(&format!("{pad}char {t}[{STRING_BUF_LEN}];\n"));
                    out.push_str(&format!("{pad}strcpy({t}, {});\n", lit_literal(value)));
                } else {
                    out.push_str(&format!("{pad}{} {} = {};\n", c_type(ty), t, lit_literal(value)));
                }
                Ok(t)
            }
            Expr::Ref { name, ty, .. } => {
                let t = temps.fresh();
                if *ty == Type::String {
                    out.push_str(&format!("{pad}char* {t} = {};\n", mangle(name)));
                    return Ok(t);
                }
                match ty.as_array() {
                    Some((elem, _)) => {
                        out.push_str(&format!("{pad}{}* {} = {};\n", c_type(elem), t, mangle(name)))
                    }
                    None => out.push_str(&format!("{pad}{} {} = {};\n", c_type(ty), t, mangle(name))),
                }
                Ok(t)
            }
            Expr::Index { name, index, ty, .. } => {
                let idx = self.lower_expr(index, out, temps, indent)?;
                let t = temps.fresh();
                out.push_str(&format!("{pad}{} {} = {}[{}];\n", c_type(ty), t, mangle(name), idx));
                Ok(t)
            }
            Expr::Unary { op, expr: inner, ty, .. } => {
                let inner_name = self.lower_expr(inner, out, temps, indent)?;
                let t = temps.fresh();
                let c_op = unary_c_op(*op, *elem_of(inner.ty()) == Type::Bool);
                match ty.as_array() {
                    Some((elem, n)) => {
                        out.push_str(&format!("{pad}{} {}[{}];\n", c_type(elem), t, n));
                        let i = temps.fresh_index();
                        out.push_str(&format!("{pad}for (int64_t {i} = 0; {i} < {n}; {i}++) {{\n"));
                        out.push_str(&format!("{pad}    {t}[{i}] = {c_op}{inner_name}[{i}];\n"));
                        out.push_str(&format!("{pad}}}\n"));
                    }
                    None => {
                        out.push_str(&format!("{pad}{} {} = {}{};\n", c_type(ty), t, c_op, inner_name));
                    }
                }
                Ok(t)
            }
            Expr::ImplicitCast { expr: inner, to, .. } => {
                let inner_name = self.lower_expr(inner, out, temps, indent)?;
                let t = temps.fresh();
                match to.as_array() {
                    Some((elem, n)) => {
                        out.push_str(&format!("{pad}{} {}[{}];\n", c_type(elem), t, n));
                        let i = temps.fresh_index();
                        out.push_str(&format!("{pad}for (int64_t {i} = 0; {i} < {n}; {i}++) {{\n"));
                        let cast = cast_c_expr(elem, &format!("{inner_name}[{i}]"));
                        out.push_str(&format!("{pad}    {t}[{i}] = {cast};\n"));
                        out.push_str(&format!("{pad}}}\n"));
                    }
                    None => {
                        let cast = cast_c_expr(to, &inner_name);
                        out.push_str(&format!("{pad}{} {} = {};\n", c_type(to), t, cast));
                    }
                }
                Ok(t)
            }
            Expr::Call { callee, args, ty, line } => {
                if callee == "getString" {
                    return self.lower_getstring_call(temps, out, indent);
                }
                let call_expr = self.lower_call(callee, args, temps, out, indent, *line)?;
                let t = temps.fresh();
                if *ty == Type::String {
                    out.push_str(&format!("{pad}char* {t} = {};\n", call_expr));
                } else {
                    out.push_str(&format!("{pad}{} {} = {};\n", c_type(ty), t, call_expr));
                }
                Ok(t)
            }
            Expr::Binary {
                op,
                lhs,
                rhs,
                broadcast_len,
                ty,
                ..
            } => self.lower_binary(*op, lhs, rhs, *broadcast_len, ty, out, temps, indent),
        }
    }

    fn lower_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        broadcast_len: Option<usize>,
        ty: &Type,
        out: &mut String,
        temps: &mut TempGen,
        indent: usize,
    ) -> Result<String, CompileError> {
        let pad = "    ".repeat(indent);
        let lhs_name = self.lower_expr(lhs, out, temps, indent)?;
        let rhs_name = self.lower_expr(rhs, out, temps, indent)?;
        let lhs_is_array = lhs.ty().as_array().is_some();
        let rhs_is_array = rhs.ty().as_array().is_some();
        let operand_is_bool = *elem_of(lhs.ty()) == Type::Bool;

        match broadcast_len {
            None => {
                let t = temps.fresh();
                let expr_text = scalar_binary_expr(op, &lhs_name, &rhs_name, operand_is_bool);
                out.push_str(&format!("{pad}{} {} = {};\n", c_type(ty), t, expr_text));
                Ok(t)
            }
            Some(n) => {
                let elem_ty = ty.as_array().map(|(e, _)| e.clone()).unwrap_or_else(|| ty.clone());
                let t = temps.fresh();
                out.push_str(&format!("{pad}{} {}[{}];\n", c_type(&elem_ty), t, n));
                let i = temps.fresh_index();
                out.push_str(&format!("{pad}for (int64_t {i} = 0; {i} < {n}; {i}++) {{\n"));
                let lhs_elem = if lhs_is_array {
                    format!("{lhs_name}[{i}]")
                } else {
                    lhs_name.clone()
                };
                let rhs_elem = if rhs_is_array {
                    format!("{rhs_name}[{i}]")
                } else {
                    rhs_name.clone()
                };
                let expr_text = scalar_binary_expr(op, &lhs_elem, &rhs_elem, operand_is_bool);
                out.push_str(&format!("{pad}    {t}[{i}] = {expr_text};\n"));
                out.push_str(&format!("{pad}}}\n"));
                Ok(t)
            }
        }
    }
}

fn unary_c_op(op: UnOp, operand_is_bool: bool) -> &'static str {
    match op {
        UnOp::Neg => "-",
        UnOp::Not if operand_is_bool => "!",
        UnOp::Not => "~",
    }
}

/// Generate a C cast expression for an `ImplicitCast` to `to`, widening
/// `int -> float` and converting both directions of the `int <-> bool`
/// pair ("nonzero <=> true").
fn cast_c_expr(to: &Type, inner: &str) -> String {
    match to {
        Type::Float => format!("(double){inner}"),
        Type::Bool => format!("({inner} != 0)"),
        Type::Int => format!("(int64_t){inner}"),
        _ => inner.to_string(),
    }
}

fn scalar_binary_expr(op: BinOp, lhs: &str, rhs: &str, operand_is_bool: bool) -> String {
    match op {
        BinOp::Add => format!("{lhs} + {rhs}"),
        BinOp::Sub => format!("{lhs} - {rhs}"),
        BinOp::Mul => format!("{lhs} * {rhs}"),
        BinOp::Div => format!("{lhs} / {rhs}"),
        BinOp::Eq => format!("{lhs} == {rhs}"),
        BinOp::NotEq => format!("{lhs} != {rhs}"),
        BinOp::Lt => format!("{lhs} < {rhs}"),
        BinOp::Gt => format!("{lhs} > {rhs}"),
        BinOp::LtEq => format!("{lhs} <= {rhs}"),
        BinOp::GtEq => format!("{lhs} >= {rhs}"),
        BinOp::And if operand_is_bool => format!("validateBooleanOp({lhs}, {rhs}, true)"),
        BinOp::Or if operand_is_bool => format!("validateBooleanOp({lhs}, {rhs}, false)"),
        BinOp::And => format!("({lhs} & {rhs})"),
        BinOp::Or => format!("({lhs} | {rhs})"),
    }
}

fn lit_literal(value: &LitValue) -> String {
    match value {
        LitValue::Int(n) => format!("{n}"),
        LitValue::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{f:.1}")
            } else {
                format!("{f}")
            }
        }
        LitValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        LitValue::Str(s) => format!("{s:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::optimize;
    use crate::parser::Parser;
    use crate::typechecker::check_program;

    fn compile(src: &str) -> String {
        let mut program = Parser::new(src).unwrap().parse().unwrap();
        check_program(&mut program).unwrap();
        optimize(&mut program, 1);
        generate(&program, false).unwrap()
    }

    #[test]
    fn emits_main_and_includes_runtime_header() {
        let c = compile("program p is begin return; end program");
        assert!(c.contains("#include \"runtime.h\""));
        assert!(c.contains("int main(void) {"));
        assert!(c.contains("return 0;"));
    }

    #[test]
    fn global_variable_becomes_file_scope() {
        let c = compile("program p is global int counter; begin return; end program");
        assert!(c.contains("int64_t u_counter;"));
        assert!(!c.contains("    int64_t u_counter;"));
    }

    #[test]
    fn local_variable_is_declared_inside_main() {
        let c = compile("program p is int x; begin x := 1; return; end program");
        assert!(c.contains("    int64_t u_x;"));
    }

    #[test]
    fn procedure_call_forwards_out_argument_by_address() {
        let c = compile(
            "program p is procedure q(out int r) begin return; end procedure; int x; begin q(x); return; end program",
        );
        assert!(c.contains("u_q(&u_x)"));
    }

    #[test]
    fn boolean_and_uses_runtime_validation() {
        let c = compile("program p is bool a; bool b; begin putBool(a & b); return; end program");
        assert!(c.contains("validateBooleanOp("));
    }

    #[test]
    fn integer_and_is_plain_bitwise_and() {
        let c = compile("program p is int a; int b; begin putInteger(a & b); return; end program");
        assert!(!c.contains("validateBooleanOp("));
        assert!(c.contains(" & "));
    }

    #[test]
    fn not_on_int_is_bitwise_complement() {
        let c = compile("program p is int a; begin putInteger(not a); return; end program");
        assert!(c.contains("~u_a"));
    }

    #[test]
    fn not_on_bool_is_logical_negation() {
        let c = compile("program p is bool a; begin putBool(not a); return; end program");
        assert!(c.contains("!u_a"));
    }

    #[test]
    fn string_variable_is_a_fixed_buffer() {
        let c = compile("program p is string s; begin return; end program");
        assert!(c.contains("char u_s[256];"));
    }

    #[test]
    fn get_string_writes_into_its_own_buffer() {
        let c = compile("program p is string s; begin s := getString(); return; end program");
        assert!(c.contains("getString(_t"));
        assert!(!c.contains("getString()"));
    }

    #[test]
    fn two_get_string_calls_use_independent_buffers() {
        let c = compile(
            "program p is string s1; string s2; begin s1 := getString(); s2 := getString(); \
             putString(s1); return; end program",
        );
        assert!(c.contains("char _t0[256];"));
        assert!(c.contains("char _t1[256];"));
    }

    #[test]
    fn duplicate_procedure_name_across_scopes_is_rejected() {
        let mut program = Parser::new(
            "program p is \
             procedure outer() procedure inner() begin return; end procedure; begin return; end procedure; \
             procedure inner() begin return; end procedure; \
             begin return; end program",
        )
        .unwrap()
        .parse()
        .unwrap();
        check_program(&mut program).unwrap();
        let err = generate(&program, false).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }
}
