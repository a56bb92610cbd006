//! Built-in I/O procedure table.
//!
//! The root scope is pre-populated with `getBool`/`getInteger`/
//! `getFloat`/`getString` (no parameters, returning their respective
//! type) and the corresponding `put*` (one `in` parameter, no return).
//! These names and their C runtime signatures are frozen (see
//! runtime/runtime.h).

use std::collections::HashMap;

use crate::symtab::{Symbol, SymbolKind};
use crate::types::{Direction, ParamType, Type};

/// The four `get*` built-ins, by (seq name, return type).
fn getters() -> [(&'static str, Type); 4] {
    [
        ("getBool", Type::Bool),
        ("getInteger", Type::Int),
        ("getFloat", Type::Float),
        ("getString", Type::String),
    ]
}

fn putters() -> [(&'static str, Type); 4] {
    [
        ("putBool", Type::Bool),
        ("putInteger", Type::Int),
        ("putFloat", Type::Float),
        ("putString", Type::String),
    ]
}

pub fn install_builtins(root: &mut HashMap<String, Symbol>) {
    for (name, ty) in getters() {
        root.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Procedure {
                    params: vec![],
                    ret: ty,
                },
                line: 0,
            },
        );
    }
    for (name, ty) in putters() {
        root.insert(
            name.to_string(),
            Symbol {
                name: name.to_string(),
                kind: SymbolKind::Procedure {
                    params: vec![ParamType {
                        ty,
                        direction: Direction::In,
                    }],
                    ret: Type::Void,
                },
                line: 0,
            },
        );
    }
}

/// True for any of the eight frozen runtime entry points.
pub fn is_builtin(name: &str) -> bool {
    getters().iter().any(|(n, _)| *n == name) || putters().iter().any(|(n, _)| *n == name)
}
