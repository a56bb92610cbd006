//! Symbol table (component E): a stack of scopes, call-stack aligned.
//!
//! Each scope maps an identifier to a declaration record. Lookup tries
//! the innermost scope, then falls back to the root scope, so that
//! `global`-marked declarations (which are additionally inserted into
//! the root) are visible from any nested procedure.

use std::collections::HashMap;

use crate::error::CompileError;
use crate::types::{ParamType, Type};

#[derive(Debug, Clone)]
pub enum SymbolKind {
    Variable {
        ty: Type,
        array_len: Option<usize>,
    },
    Procedure {
        params: Vec<ParamType>,
        ret: Type,
    },
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub line: usize,
}

pub struct SymbolTable {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl SymbolTable {
    /// A fresh table with only the root scope, pre-populated with the
    /// built-in I/O procedures.
    pub fn new() -> Self {
        let mut root = HashMap::new();
        crate::builtins::install_builtins(&mut root);
        SymbolTable { scopes: vec![root] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot pop the root scope");
        self.scopes.pop();
    }

    pub fn is_root_scope(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Declare `symbol` in the current (innermost) scope. Duplicate
    /// declaration in that scope is a fatal error. When `is_global` is
    /// set, the symbol is additionally inserted into the root scope so
    /// it is visible from any nested procedure.
    pub fn declare(&mut self, symbol: Symbol, is_global: bool) -> Result<(), CompileError> {
        let top = self.scopes.last_mut().expect("at least the root scope");
        if top.contains_key(&symbol.name) {
            return Err(CompileError::semantic(
                symbol.line,
                format!("duplicate declaration of {}", symbol.name),
            ));
        }
        top.insert(symbol.name.clone(), symbol.clone());
        if is_global && self.scopes.len() > 1 {
            self.scopes[0]
                .entry(symbol.name.clone())
                .or_insert(symbol);
        }
        Ok(())
    }

    /// Qualified lookup: innermost scope first, then the root.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        if let Some(top) = self.scopes.last() {
            if let Some(sym) = top.get(name) {
                return Some(sym);
            }
        }
        self.scopes[0].get(name)
    }

    /// Local lookup: the top scope only, for duplicate detection.
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|s| s.get(name))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, ty: Type, line: usize) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind: SymbolKind::Variable {
                ty,
                array_len: None,
            },
            line,
        }
    }

    #[test]
    fn shadowing_inner_scope_wins() {
        let mut table = SymbolTable::new();
        table.declare(var("x", Type::Int, 1), false).unwrap();
        table.push_scope();
        table.declare(var("x", Type::Float, 2), false).unwrap();
        assert!(matches!(
            table.lookup("x").unwrap().kind,
            SymbolKind::Variable {
                ty: Type::Float,
                ..
            }
        ));
        table.pop_scope();
        assert!(matches!(
            table.lookup("x").unwrap().kind,
            SymbolKind::Variable { ty: Type::Int, .. }
        ));
    }

    #[test]
    fn duplicate_local_declaration_is_fatal() {
        let mut table = SymbolTable::new();
        table.declare(var("x", Type::Int, 1), false).unwrap();
        let err = table.declare(var("x", Type::Int, 2), false).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }

    #[test]
    fn global_declaration_is_visible_from_nested_scope() {
        let mut table = SymbolTable::new();
        table.push_scope();
        table.declare(var("counter", Type::Int, 1), true).unwrap();
        table.push_scope();
        assert!(table.lookup("counter").is_some());
    }

    #[test]
    fn builtins_are_preinstalled() {
        let table = SymbolTable::new();
        assert!(table.lookup("getInteger").is_some());
        assert!(table.lookup("putString").is_some());
    }
}
