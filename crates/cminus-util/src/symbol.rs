//! String interning for identifiers and keywords.
//!
//! Grounded on `faxc-util`'s `Symbol`/`StringTable` split (a compact 4-byte
//! handle backed by an arena-owned string table) but simplified to a single
//! owned, single-threaded table: §5 states the compiler is single-threaded
//! and synchronous with all shared state owned by one compilation session,
//! so the teacher's `DashMap`/`AHasher` concurrent design has nothing to
//! protect against here and is dropped in favor of a plain `FxHashMap` over
//! a `bumpalo::Bump` arena.

use rustc_hash::FxHashMap;
use std::fmt;

/// An interned string handle. Cheap to copy and compare.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0)
    }
}

/// Owns the backing storage for every interned string in a compilation
/// session. Strings are never removed: the source's identifier count is
/// bounded by file size, so leaking nothing and growing the arena for the
/// session's lifetime is the simplest correct design.
pub struct Interner<'a> {
    arena: &'a bumpalo::Bump,
    map: FxHashMap<&'a str, Symbol>,
    strings: Vec<&'a str>,
}

impl<'a> Interner<'a> {
    pub fn new(arena: &'a bumpalo::Bump) -> Self {
        Self { arena, map: FxHashMap::default(), strings: Vec::new() }
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }
        let interned: &'a str = self.arena.alloc_str(s);
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(interned);
        self.map.insert(interned, sym);
        sym
    }

    pub fn resolve(&self, sym: Symbol) -> &'a str {
        self.strings[sym.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Every interned lexeme in insertion order, 1-indexed — the shape
    /// `symbol_table.txt` is rendered from (§6).
    pub fn entries(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        self.strings.iter().copied().enumerate().map(|(i, s)| (i + 1, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_string_same_symbol() {
        let arena = bumpalo::Bump::new();
        let mut interner = Interner::new(&arena);
        let a = interner.intern("main");
        let b = interner.intern("main");
        assert_eq!(a, b);
    }

    #[test]
    fn different_strings_different_symbols() {
        let arena = bumpalo::Bump::new();
        let mut interner = Interner::new(&arena);
        let a = interner.intern("x");
        let b = interner.intern("y");
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_round_trips() {
        let arena = bumpalo::Bump::new();
        let mut interner = Interner::new(&arena);
        let sym = interner.intern("repeat");
        assert_eq!(interner.resolve(sym), "repeat");
    }

    #[test]
    fn insertion_order_preserved() {
        let arena = bumpalo::Bump::new();
        let mut interner = Interner::new(&arena);
        let first = interner.intern("if");
        let second = interner.intern("else");
        let first_again = interner.intern("if");
        assert_eq!(first, first_again);
        assert_ne!(first, second);
    }
}
