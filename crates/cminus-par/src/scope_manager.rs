//! Scope manager and the "prison" forward-patch mechanism (§4.5).
//!
//! Grounded on `original_source/cminus/codegen/scope.py` (`Layer`,
//! `ScopeType`, `ScopeManager`). The Python `ScopeManager` stages the next
//! scope's type via `push_type`, then uses a `_delete` flag so that a
//! *later* `push_type` call either creates or deletes a layer depending on
//! what happened since — a call-order-dependent indirection that isn't
//! specified by name in §4.3's action table (which only describes
//! `function_scope`/`container_scope`/`temporary_scope`/`simple_scope` as
//! "stage next scope type" and `scope_start`/`scope_end` as "push/pop
//! scope"). This port keeps a single `pending_kind` set by the four stage
//! actions and read (not cleared) by both `scope_start` and `scope_end` —
//! whichever staging action most recently fired selects the layer for the
//! next open *or* close, which is the same effect without the flag
//! indirection. Recorded as an Open Question resolution in DESIGN.md.

use crate::instruction::{Instruction, Operation, ProgramBlock};
use crate::machine::{ActivationsStack, MachineState};
use crate::value::{IdKind, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScopeType {
    Function,
    Temporary,
    Simple,
    Container,
}

impl ScopeType {
    fn index(self) -> usize {
        match self {
            ScopeType::Function => 0,
            ScopeType::Temporary => 1,
            ScopeType::Simple => 2,
            ScopeType::Container => 3,
        }
    }
}

/// Per-scope-kind layer: one entry is pushed per `create_scope`, holding a
/// snapshot of the bump pointers to restore on `delete_scope`, plus a jail
/// of reserved patch slots to resolve when that entry closes.
#[derive(Default)]
struct Layer {
    data_stack: Vec<i64>,
    temp_stack: Vec<i64>,
    /// One jail per open scope of this kind; `Vec::push`/`pop` gives LIFO
    /// nesting matching `create_scope`/`delete_scope`.
    jails: Vec<Vec<usize>>,
}

impl Layer {
    fn create_scope(&mut self, state: &MachineState) {
        self.data_stack.push(state.data_address);
        self.temp_stack.push(state.temp_address);
        self.jails.push(Vec::new());
    }

    fn delete_scope(&mut self, state: &mut MachineState, pb: &mut ProgramBlock) {
        state.data_address = self.data_stack.pop().expect("unbalanced scope delete");
        state.temp_address = self.temp_stack.pop().expect("unbalanced scope delete");
        let jail = self.jails.pop().expect("unbalanced scope delete");
        for slot in jail {
            patch_jp_here(pb, slot);
        }
    }

    fn are_we_inside(&self) -> bool {
        !self.jails.is_empty()
    }

    fn prison(&mut self, pb: &mut ProgramBlock) {
        let slot = pb.i();
        pb.append(Instruction::empty());
        self.jails.last_mut().expect("prison outside any open scope of this kind").push(slot);
    }

    fn prison_break(&mut self, pb: &mut ProgramBlock) {
        let jail = self.jails.last_mut().expect("prison_break outside any open scope of this kind");
        let slot = jail.pop().expect("prison_break with an empty jail");
        patch_jp_here(pb, slot);
    }
}

fn patch_jp_here(pb: &mut ProgramBlock, slot: usize) {
    let target = Value::direct(pb.i() as i64, IdKind::Unspecified);
    pb.overwrite(slot, Instruction::one(Operation::Jp, target));
}

/// Owns the four scope-kind layers and dispatches `prison`/`prison_break`
/// to whichever kind is innermost (the *last staged* kind, per the type
/// resolution above).
pub struct ScopeManager {
    layers: [Layer; 4],
    pending_kind: Option<ScopeType>,
    /// Kinds for scopes currently open, innermost last. Not consulted by
    /// `prison`/`prison_break` (those take an explicit `kind`), but kept so
    /// `depth()` can assert the balance-law invariant of §8 in tests.
    open_stack: Vec<ScopeType>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self { layers: Default::default(), pending_kind: None, open_stack: Vec::new() }
    }

    pub fn stage(&mut self, kind: ScopeType) {
        self.pending_kind = Some(kind);
    }

    pub fn create_scope(&mut self, state: &MachineState, as_: &ActivationsStack, pb: &mut ProgramBlock) {
        let kind = self.pending_kind.expect("create_scope without a staged scope type");
        self.layers[kind.index()].create_scope(state);
        self.open_stack.push(kind);
        if kind == ScopeType::Function {
            as_.create_scope(pb);
        }
    }

    pub fn delete_scope(&mut self, state: &mut MachineState, as_: &ActivationsStack, pb: &mut ProgramBlock) {
        let kind = self.pending_kind.expect("delete_scope without a staged scope type");
        self.layers[kind.index()].delete_scope(state, pb);
        self.open_stack.pop();
        if kind == ScopeType::Function {
            as_.delete_scope(pb);
        }
    }

    /// Reserves a patch slot on the innermost open scope of `kind` — used
    /// by `return` (jailed on `Function`) and `break` (jailed on
    /// `Container`), which are not necessarily the most-recently-staged
    /// scope.
    pub fn prison(&mut self, kind: ScopeType, pb: &mut ProgramBlock) {
        self.layers[kind.index()].prison(pb);
    }

    pub fn prison_break(&mut self, kind: ScopeType, pb: &mut ProgramBlock) {
        self.layers[kind.index()].prison_break(pb);
    }

    pub fn are_we_inside(&self, kind: ScopeType) -> bool {
        self.layers[kind.index()].are_we_inside()
    }

    pub fn depth(&self) -> usize {
        self.open_stack.len()
    }

    /// The most recently staged kind — `scope_end` reads this to decide
    /// whether the closing scope is a `Function` (needing the epilogue's
    /// single `JP @ra`).
    pub fn pending_kind(&self) -> Option<ScopeType> {
        self.pending_kind
    }
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{CodegenConfig, RegisterFile};

    fn harness() -> (MachineState, ActivationsStack, ProgramBlock) {
        let config = CodegenConfig::default();
        let state = MachineState::new(config);
        let rf = RegisterFile { sp: 0, fp: 4, ra: 8, rv: 12 };
        (state, ActivationsStack::new(config, rf), ProgramBlock::new())
    }

    #[test]
    fn nested_container_scope_restores_bump_pointers() {
        let (mut state, as_, mut pb) = harness();
        let mut scope = ScopeManager::new();
        scope.stage(ScopeType::Container);
        scope.create_scope(&state, &as_, &mut pb);
        state.getvar(1);
        scope.stage(ScopeType::Container);
        scope.delete_scope(&mut state, &as_, &mut pb);
        assert_eq!(state.data_address, 0);
    }

    #[test]
    fn break_jails_on_the_enclosing_container_not_an_inner_if() {
        let (mut state, as_, mut pb) = harness();
        let mut scope = ScopeManager::new();
        scope.stage(ScopeType::Container);
        scope.create_scope(&state, &as_, &mut pb);

        scope.stage(ScopeType::Temporary);
        scope.create_scope(&state, &as_, &mut pb);
        // `break` inside the `if` still jails on Container, not Temporary.
        scope.prison(ScopeType::Container, &mut pb);
        let break_slot = pb.i() - 1;
        scope.stage(ScopeType::Temporary);
        scope.delete_scope(&mut state, &as_, &mut pb);

        let before_exit = pb.i();
        scope.stage(ScopeType::Container);
        scope.delete_scope(&mut state, &as_, &mut pb);
        assert_eq!(pb.get(break_slot).op, Operation::Jp);
        assert_eq!(pb.get(break_slot).arg1.raw, before_exit as i64);
    }

    #[test]
    fn are_we_inside_reflects_open_scopes_of_that_kind() {
        let (state, as_, mut pb) = harness();
        let mut scope = ScopeManager::new();
        assert!(!scope.are_we_inside(ScopeType::Container));
        scope.stage(ScopeType::Container);
        scope.create_scope(&state, &as_, &mut pb);
        assert!(scope.are_we_inside(ScopeType::Container));
    }
}
