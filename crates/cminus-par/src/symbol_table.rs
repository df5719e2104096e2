//! Identifier records and the lexically scoped symbol table (§3, §4.6).
//!
//! Grounded on `original_source/cminus/scanner/symbol_table.py` (`Id`,
//! `Scope`, `SymbolTable`), adapted to Rust's ownership rules: the Python
//! `Scope` keeps a `parent` back-reference so `lookup` can walk outward.
//! Per §9's design note ("parent is a non-owning reference... lifetimes of
//! child scopes are nested inside parents, which is guaranteed by the LIFO
//! discipline of `create/delete_scope`"), that guarantee means a flat stack
//! of scopes *is* the parent chain: at any point the chain from the current
//! scope to the root is exactly the stack's contents read top-down, so
//! there is no need for an actual back-pointer — `lookup` just scans the
//! stack from the top.

use cminus_util::Symbol;

use crate::value::IdKind;

/// One declared identifier (§3: "`(lexeme, address, kind, params,
/// return_kind)`").
#[derive(Clone, Debug)]
pub struct IdRecord {
    pub lexeme: Symbol,
    pub address: Option<i64>,
    pub kind: IdKind,
    /// Ordered parameter kinds; only meaningful for `IdKind::Function`.
    pub params: Vec<IdKind>,
    pub return_kind: IdKind,
}

impl IdRecord {
    fn new(lexeme: Symbol) -> Self {
        Self { lexeme, address: None, kind: IdKind::Unspecified, params: Vec::new(), return_kind: IdKind::Unspecified }
    }
}

/// One lexical scope's locals, in declaration order.
#[derive(Default)]
struct Scope {
    locals: Vec<IdRecord>,
}

/// A stack of nested scopes (§3: "Scopes form a stack; lookup walks
/// outward... Scope lifecycle is LIFO").
pub struct SymbolTable {
    scopes: Vec<Scope>,
    /// Set by `declare` (§4.3); the next `add_symbol` call only appends
    /// when this is set (or `force` is passed), then clears it.
    declaring: bool,
}

impl SymbolTable {
    /// A fresh table always has exactly one (global) scope open — the
    /// invariant in §8 ("symbol-table depth returns to 1") is stated
    /// relative to this floor.
    pub fn new() -> Self {
        Self { scopes: vec![Scope::default()], declaring: false }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn create_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn delete_scope(&mut self) {
        self.scopes.pop();
        debug_assert!(!self.scopes.is_empty(), "deleted the global scope");
    }

    /// §4.3 `declare`: enables declaring mode for the next identifier.
    pub fn declare(&mut self) {
        self.declaring = true;
    }

    /// §4.6 `add_symbol`: appends to the top scope when declaring mode (or
    /// `force`) is set, then always clears declaring mode.
    pub fn add_symbol(&mut self, lexeme: Symbol, force: bool) -> Option<&mut IdRecord> {
        let should_add = self.declaring || force;
        self.declaring = false;
        if !should_add {
            return None;
        }
        let scope = self.scopes.last_mut().expect("global scope always present");
        scope.locals.push(IdRecord::new(lexeme));
        scope.locals.last_mut()
    }

    /// Walks outward (innermost scope first) for a matching lexeme.
    pub fn lookup(&self, lexeme: Symbol) -> Option<&IdRecord> {
        self.scopes.iter().rev().find_map(|scope| scope.locals.iter().rev().find(|id| id.lexeme == lexeme))
    }

    pub fn lookup_mut(&mut self, lexeme: Symbol) -> Option<&mut IdRecord> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.locals.iter_mut().rev().find(|id| id.lexeme == lexeme))
    }

    /// Specialized lookup used by `function_call` (§4.6): a function
    /// identifier bound to exactly this entry instruction index.
    pub fn lookup_by_instno(&self, instno: i64) -> Option<&IdRecord> {
        self.scopes.iter().rev().find_map(|scope| {
            scope.locals.iter().rev().find(|id| id.kind == IdKind::Function && id.address == Some(instno))
        })
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
    use cminus_util::Interner;

    fn sym(interner: &mut Interner, s: &str) -> Symbol {
        interner.intern(s)
    }

    #[test]
    fn add_symbol_without_declaring_mode_is_a_noop() {
        let arena = bumpalo::Bump::new();
        let mut interner = Interner::new(&arena);
        let mut table = SymbolTable::new();
        let x = sym(&mut interner, "x");
        assert!(table.add_symbol(x, false).is_none());
        assert!(table.lookup(x).is_none());
    }

    #[test]
    fn declare_then_add_symbol_registers_it_once() {
        let arena = bumpalo::Bump::new();
        let mut interner = Interner::new(&arena);
        let mut table = SymbolTable::new();
        let x = sym(&mut interner, "x");
        table.declare();
        table.add_symbol(x, false).unwrap().address = Some(0);
        assert!(table.lookup(x).is_some());
        // declaring mode cleared: a second add_symbol without re-declaring is a no-op.
        let y = sym(&mut interner, "y");
        assert!(table.add_symbol(y, false).is_none());
    }

    #[test]
    fn nested_scope_shadows_then_unwinds() {
        let arena = bumpalo::Bump::new();
        let mut interner = Interner::new(&arena);
        let mut table = SymbolTable::new();
        let x = sym(&mut interner, "x");
        table.add_symbol(x, true).unwrap().address = Some(0);
        table.create_scope();
        table.add_symbol(x, true).unwrap().address = Some(4);
        assert_eq!(table.lookup(x).unwrap().address, Some(4));
        table.delete_scope();
        assert_eq!(table.lookup(x).unwrap().address, Some(0));
    }

    #[test]
    fn lookup_walks_outward_through_enclosing_scopes() {
        let arena = bumpalo::Bump::new();
        let mut interner = Interner::new(&arena);
        let mut table = SymbolTable::new();
        let outer = sym(&mut interner, "outer");
        table.add_symbol(outer, true).unwrap().address = Some(0);
        table.create_scope();
        assert!(table.lookup(outer).is_some());
    }

    #[test]
    fn lookup_by_instno_finds_the_function_at_that_entry_address() {
        let arena = bumpalo::Bump::new();
        let mut interner = Interner::new(&arena);
        let mut table = SymbolTable::new();
        let f = sym(&mut interner, "f");
        let rec = table.add_symbol(f, true).unwrap();
        rec.address = Some(10);
        rec.kind = IdKind::Function;
        assert_eq!(table.lookup_by_instno(10).unwrap().lexeme, f);
        assert!(table.lookup_by_instno(11).is_none());
    }

    #[test]
    fn depth_starts_at_one_and_tracks_nesting() {
        let mut table = SymbolTable::new();
        assert_eq!(table.depth(), 1);
        table.create_scope();
        table.create_scope();
        assert_eq!(table.depth(), 3);
        table.delete_scope();
        assert_eq!(table.depth(), 2);
    }
}
