//! Abstract syntax tree for SRC.
//!
//! A closed set of variants, mirroring the data model: declarations,
//! statements, and expressions. Every [`Expr`] carries a `ty` field that
//! starts as [`Type::Void`] from the parser and is overwritten in place
//! by the type checker, which also inserts [`Expr::ImplicitCast`] nodes
//! where an operand needs a coercion.

use crate::types::{Direction, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LitValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// A single expression node. `line` is the source line of the operator
/// or leaf token, used for error messages and `-v` annotations.
#[derive(Debug, Clone)]
pub enum Expr {
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        /// Set by the type checker when one operand is a scalar and the
        /// other an array: the broadcast length, so the emitter knows to
        /// lower this to an element-wise loop.
        broadcast_len: Option<usize>,
        ty: Type,
        line: usize,
    },
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        ty: Type,
        line: usize,
    },
    Index {
        name: String,
        index: Box<Expr>,
        ty: Type,
        line: usize,
    },
    Ref {
        name: String,
        ty: Type,
        line: usize,
    },
    Lit {
        value: LitValue,
        ty: Type,
        line: usize,
    },
    ImplicitCast {
        expr: Box<Expr>,
        from: Type,
        to: Type,
        line: usize,
    },
    /// A call used in expression position, e.g. `x := getInteger();`.
    /// The closed statement/expression split in the data model lists
    /// `Call` only under statements; built-in getters need a value-
    /// producing call, so the same shape is also admitted as an
    /// expression (see DESIGN.md).
    Call {
        callee: String,
        args: Vec<Expr>,
        ty: Type,
        line: usize,
    },
}

impl Expr {
    pub fn ty(&self) -> &Type {
        match self {
            Expr::Binary { ty, .. }
            | Expr::Unary { ty, .. }
            | Expr::Index { ty, .. }
            | Expr::Ref { ty, .. }
            | Expr::Lit { ty, .. }
            | Expr::Call { ty, .. } => ty,
            Expr::ImplicitCast { to, .. } => to,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Expr::Binary { line, .. }
            | Expr::Unary { line, .. }
            | Expr::Index { line, .. }
            | Expr::Ref { line, .. }
            | Expr::Lit { line, .. }
            | Expr::Call { line, .. }
            | Expr::ImplicitCast { line, .. } => *line,
        }
    }

    /// An l-value is a bare name or an indexed name: the only expression
    /// shapes allowed as assignment targets or `out` arguments.
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Ref { .. } | Expr::Index { .. })
    }

    /// Whether this expression (or any sub-expression) performs a call.
    /// Used by the optimiser to avoid deleting statements with side
    /// effects.
    pub fn contains_call(&self) -> bool {
        match self {
            Expr::Call { .. } => true,
            Expr::Binary { lhs, rhs, .. } => lhs.contains_call() || rhs.contains_call(),
            Expr::Unary { expr, .. } | Expr::ImplicitCast { expr, .. } => expr.contains_call(),
            Expr::Index { index, .. } => index.contains_call(),
            Expr::Ref { .. } | Expr::Lit { .. } => false,
        }
    }
}

/// An assignment target: a bare name, or an indexed name. `ty` starts as
/// `Type::Void` from the parser and is filled in by the type checker,
/// same as [`Expr::ty`].
#[derive(Debug, Clone)]
pub struct Destination {
    pub name: String,
    pub index: Option<Expr>,
    pub ty: Type,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign {
        target: Destination,
        value: Expr,
        line: usize,
    },
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
        line: usize,
    },
    For {
        init: Box<Stmt>,
        cond: Expr,
        body: Vec<Stmt>,
        line: usize,
    },
    Return {
        line: usize,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        line: usize,
    },
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Assign { line, .. }
            | Stmt::If { line, .. }
            | Stmt::For { line, .. }
            | Stmt::Return { line, .. }
            | Stmt::Call { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: String,
    /// The element type: the declared scalar type regardless of whether
    /// this is an array.
    pub elem_ty: Type,
    pub array_size: Option<usize>,
    pub is_global: bool,
    pub line: usize,
}

impl VariableDecl {
    /// The full declared type: `elem_ty` itself, or `Array(elem_ty, n)`.
    pub fn full_type(&self) -> Type {
        match self.array_size {
            Some(n) => Type::Array(Box::new(self.elem_ty.clone()), n),
            None => self.elem_ty.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub decl: VariableDecl,
    pub direction: Direction,
}

#[derive(Debug, Clone)]
pub struct ProcedureDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub decls: Vec<Decl>,
    pub body: Vec<Stmt>,
    /// Always `Type::Void`: the source grammar has no return-type syntax
    /// for user-defined procedures. Kept as a field (rather than
    /// omitted) so `Decl::Procedure` stays uniform with the built-in
    /// procedure signatures recorded in the symbol table.
    pub return_type: Type,
    pub is_global: bool,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Variable(VariableDecl),
    Procedure(ProcedureDecl),
}

#[derive(Debug, Clone)]
pub struct ProgramDecl {
    pub name: String,
    pub decls: Vec<Decl>,
    pub body: Vec<Stmt>,
}
