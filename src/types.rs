//! The type lattice shared by the resolver, type checker, optimiser and
//! code generator.
//!
//! Types form a small closed lattice: scalars (`int`, `float`, `bool`,
//! `string`), fixed-length arrays of a scalar, and procedure signatures.
//! Arrays may not nest, and `Void` only ever appears as a procedure's
//! return type.

use std::fmt;

/// Parameter-passing direction for a procedure parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// A single parameter's type and direction, as recorded on a procedure's
/// symbol table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamType {
    pub ty: Type,
    pub direction: Direction,
}

/// The type of an expression, variable, or procedure signature.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    /// A fixed-length array of a scalar element type. Arrays do not nest,
    /// so `element` is always one of `Int`/`Float`/`Bool`/`String`.
    Array(Box<Type>, usize),
    /// A procedure signature: parameter types (with direction) and a
    /// return type. User-defined procedures always return `Void`; only
    /// built-ins (`getInteger`, ...) return a scalar.
    Procedure {
        params: Vec<ParamType>,
        ret: Box<Type>,
    },
    /// The "no value" return type of user-defined procedures.
    Void,
}

impl Type {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Int | Type::Float | Type::Bool | Type::String)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// If this is an array type, its element type and declared length.
    pub fn as_array(&self) -> Option<(&Type, usize)> {
        match self {
            Type::Array(elem, n) => Some((elem, *n)),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::Array(elem, n) => write!(f, "{}[{}]", elem, n),
            Type::Void => write!(f, "void"),
            Type::Procedure { params, ret } => {
                write!(f, "procedure(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", p.direction, p.ty)?;
                }
                write!(f, ") -> {}", ret)
            }
        }
    }
}
