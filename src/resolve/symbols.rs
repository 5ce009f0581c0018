//! Variable symbol table
//!
//! Variables of the function being compiled live in an arena and are
//! referenced by [`VarId`]. Blocks push and pop [`Scope`]s that map names to
//! those ids. Independently of scope visibility, the table remembers which
//! names were already declared at each depth of the current function, since
//! every `(name, depth)` pair shares one frame slot.

use crate::types::{Constant, DataType};
use id_arena::{Arena, Id};
use rustc_hash::{FxHashMap, FxHashSet};

/// Index of a variable in the current function's arena
pub type VarId = Id<Variable>;

/// Name of the blank identifier
pub const BLANK: &str = "_";

/// A local variable or parameter
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub ty: DataType,
    /// Nesting depth of the declaring block; the function body is depth 1
    pub depth: usize,
    /// Value stored by the latest straight-line assignment, if constant
    pub constant: Option<Constant>,
}

impl Variable {
    pub fn is_blank(&self) -> bool {
        self.name == BLANK
    }

    /// Frame slot name, `name%depth`
    pub fn slot(&self) -> String {
        format!("{}%{}", self.name, self.depth)
    }
}

/// A single block scope
#[derive(Debug, Default)]
pub struct Scope {
    pub names: FxHashMap<String, VarId>,
}

/// Outcome of a successful declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declared {
    pub id: VarId,
    /// True when no earlier block at this depth declared the same name,
    /// i.e. the frame slot still needs a `DEFVAR`
    pub new_slot: bool,
}

/// Symbol table with scoped lookups
#[derive(Debug, Default)]
pub struct SymbolTable {
    variables: Arena<Variable>,
    scopes: Vec<Scope>,
    /// depth -> names declared at that depth in the current function
    declared: FxHashMap<usize, FxHashSet<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a block; every scope starts with its own blank entry
    pub fn push_scope(&mut self) {
        let depth = self.scopes.len() + 1;
        let blank = self.variables.alloc(Variable {
            name: BLANK.to_string(),
            ty: DataType::Untyped,
            depth,
            constant: None,
        });
        let mut scope = Scope::default();
        scope.names.insert(BLANK.to_string(), blank);
        self.scopes.push(scope);
    }

    /// Leave a block. Its names stop being visible, but the per-depth
    /// declaration record is kept until [`SymbolTable::reset`].
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Current nesting depth (0 outside any function)
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Forget everything about the finished function
    pub fn reset(&mut self) {
        self.variables = Arena::new();
        self.scopes.clear();
        self.declared.clear();
    }

    /// Declare a variable in the current scope
    pub fn declare(&mut self, name: &str, ty: DataType) -> Result<Declared, String> {
        let depth = self.depth();
        let Some(scope) = self.scopes.last_mut() else {
            return Err(format!("variable `{name}` declared outside of a function"));
        };
        if scope.names.contains_key(name) {
            return Err(format!("variable `{name}` is already declared in this scope"));
        }

        let id = self.variables.alloc(Variable {
            name: name.to_string(),
            ty,
            depth,
            constant: None,
        });
        scope.names.insert(name.to_string(), id);

        let new_slot = self
            .declared
            .entry(depth)
            .or_default()
            .insert(name.to_string());
        Ok(Declared { id, new_slot })
    }

    /// Look up a name, innermost scope first
    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.names.get(name).copied())
    }

    /// Look up a name in the current scope only
    pub fn lookup_current(&self, name: &str) -> Option<VarId> {
        self.scopes.last()?.names.get(name).copied()
    }

    pub fn get(&self, id: VarId) -> &Variable {
        &self.variables[id]
    }

    pub fn get_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.variables[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_nesting() {
        let mut table = SymbolTable::new();
        table.push_scope();
        let x = table.declare("x", DataType::Int).unwrap();
        assert!(x.new_slot);

        table.push_scope();
        assert_eq!(table.depth(), 2);
        assert_eq!(table.lookup("x"), Some(x.id));
        assert_eq!(table.lookup_current("x"), None);

        table.pop_scope();
        assert_eq!(table.depth(), 1);
    }

    #[test]
    fn test_shadowing() {
        let mut table = SymbolTable::new();
        table.push_scope();
        let outer = table.declare("x", DataType::Int).unwrap().id;
        table.push_scope();
        let inner = table.declare("x", DataType::String).unwrap().id;

        assert_eq!(table.lookup("x"), Some(inner));
        assert_eq!(table.get(inner).slot(), "x%2");
        table.pop_scope();
        assert_eq!(table.lookup("x"), Some(outer));
        assert_eq!(table.get(outer).slot(), "x%1");
    }

    #[test]
    fn test_redeclaration_rejected() {
        let mut table = SymbolTable::new();
        table.push_scope();
        table.declare("a", DataType::Untyped).unwrap();
        assert!(table.declare("a", DataType::Int).is_err());
        assert!(table.declare(BLANK, DataType::Int).is_err());
    }

    #[test]
    fn test_sibling_blocks_share_slot() {
        let mut table = SymbolTable::new();
        table.push_scope();

        table.push_scope();
        assert!(table.declare("i", DataType::Int).unwrap().new_slot);
        table.pop_scope();

        table.push_scope();
        assert_eq!(table.lookup("i"), None);
        let again = table.declare("i", DataType::Int).unwrap();
        assert!(!again.new_slot);
        table.pop_scope();

        table.reset();
        table.push_scope();
        table.push_scope();
        assert!(table.declare("i", DataType::Int).unwrap().new_slot);
    }

    #[test]
    fn test_blank_in_every_scope() {
        let mut table = SymbolTable::new();
        table.push_scope();
        let outer = table.lookup(BLANK).unwrap();
        table.push_scope();
        let inner = table.lookup(BLANK).unwrap();
        assert_ne!(outer, inner);
        assert!(table.get(inner).is_blank());
    }
}
