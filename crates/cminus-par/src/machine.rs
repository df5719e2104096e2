//! Machine state and the activation-record model (§3, §4.3, §4.4).
//!
//! Grounded on `original_source/cminus/codegen/machine_state.py`
//! (`MachineState`) and `original_source/cminus/codegen/ar.py`
//! (`RegisterFile`, `ActivationsStack`).

use crate::instruction::{Instruction, Operation, ProgramBlock};
use crate::value::{IdKind, Value};
use cminus_util::Symbol;

/// Fixed compiler constants (§6): word size, and the three bump-allocated
/// address spaces' starting points.
#[derive(Clone, Copy, Debug)]
pub struct CodegenConfig {
    pub word_size: i64,
    pub data_start: i64,
    pub temp_start: i64,
    pub stack_start: i64,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self { word_size: 4, data_start: 0, temp_start: 1000, stack_start: 2000 }
    }
}

/// Bump pointers over the data and temporary address spaces, plus the
/// transient fields §3 calls out by name. §3's `last_id` is tracked as
/// `CodeGenerator::last_declared_symbol`/`last_declared_name` instead —
/// `declare_id`'s caller needs the lexeme text for diagnostics as well as
/// the symbol, which `MachineState` (lexeme-table-agnostic by design) has
/// no way to carry.
pub struct MachineState {
    config: CodegenConfig,
    pub data_address: i64,
    pub temp_address: i64,
    /// Snapshot of `data_address` taken by `declare_function`, restored by
    /// `function_call`'s `store`/`restore` around a call.
    pub data_pointer: i64,
    pub temp_pointer: i64,
    pub arg_pointer: Vec<usize>,
    pub last_type: IdKind,
    pub last_function_name: Option<Symbol>,
    pub declaring_args: bool,
    pub set_exec: bool,
}

impl MachineState {
    pub fn new(config: CodegenConfig) -> Self {
        Self {
            config,
            data_address: config.data_start,
            temp_address: config.temp_start,
            data_pointer: config.data_start,
            temp_pointer: config.temp_start,
            arg_pointer: Vec::new(),
            last_type: IdKind::Unspecified,
            last_function_name: None,
            declaring_args: false,
            set_exec: false,
        }
    }

    /// Allocates `size` words in the data address space, returning the base
    /// address of the allocation.
    pub fn getvar(&mut self, size: i64) -> i64 {
        let address = self.data_address;
        self.data_address += size * self.config.word_size;
        address
    }

    /// Allocates one word in the temporary pool (the "bump-allocated
    /// temporary pool" of §1's Non-goals: no reuse, no register
    /// allocation).
    pub fn gettemp(&mut self) -> i64 {
        let address = self.temp_address;
        self.temp_address += self.config.word_size;
        address
    }

    pub fn word_size(&self) -> i64 {
        self.config.word_size
    }
}

/// The four named registers of §3's logical activation record, each
/// materialized as a static data address.
#[derive(Clone, Copy, Debug)]
pub struct RegisterFile {
    pub sp: i64,
    pub fp: i64,
    pub ra: i64,
    pub rv: i64,
}

/// Runtime stack discipline: push/pop words through `sp`, frame
/// create/delete through `fp`, and the register-file save/restore used by
/// the call protocol (§4.4).
pub struct ActivationsStack {
    config: CodegenConfig,
    rf: RegisterFile,
}

impl ActivationsStack {
    pub fn new(config: CodegenConfig, rf: RegisterFile) -> Self {
        Self { config, rf }
    }

    /// Pushes `value` onto the runtime stack at `@sp`, then bumps `sp` by
    /// one word.
    pub fn push(&self, pb: &mut ProgramBlock, value: Value) {
        pb.append(Instruction::two(Operation::Assign, value, Value::indirect(self.rf.sp, IdKind::Unspecified)));
        pb.append(Instruction::new(
            Operation::Add,
            Value::direct(self.rf.sp, IdKind::Unspecified),
            Value::immediate(self.config.word_size, IdKind::Int),
            Value::direct(self.rf.sp, IdKind::Unspecified),
        ));
    }

    /// Decrements `sp` by one word, then pops the word at `@sp` into
    /// `address`.
    pub fn pop(&self, pb: &mut ProgramBlock, address: Value) {
        pb.append(Instruction::new(
            Operation::Sub,
            Value::direct(self.rf.sp, IdKind::Unspecified),
            Value::immediate(self.config.word_size, IdKind::Int),
            Value::direct(self.rf.sp, IdKind::Unspecified),
        ));
        pb.append(Instruction::two(Operation::Assign, Value::indirect(self.rf.sp, IdKind::Unspecified), address));
    }

    /// Opens a new activation frame: saves the caller's `fp` then points
    /// `fp` at the current `sp` (§4.5 function scopes).
    pub fn create_scope(&self, pb: &mut ProgramBlock) {
        self.push(pb, Value::direct(self.rf.fp, IdKind::Unspecified));
        pb.append(Instruction::two(
            Operation::Assign,
            Value::direct(self.rf.sp, IdKind::Unspecified),
            Value::direct(self.rf.fp, IdKind::Unspecified),
        ));
    }

    /// Closes the current frame: restores `sp` to `fp`, then pops the
    /// saved `fp` back.
    pub fn delete_scope(&self, pb: &mut ProgramBlock) {
        pb.append(Instruction::two(
            Operation::Assign,
            Value::direct(self.rf.fp, IdKind::Unspecified),
            Value::direct(self.rf.sp, IdKind::Unspecified),
        ));
        self.pop(pb, Value::direct(self.rf.fp, IdKind::Unspecified));
    }

    /// Reserves `size` zero-initialized words on the runtime stack (array
    /// storage, §4.3 `declare_array`).
    pub fn reserve(&self, pb: &mut ProgramBlock, size: i64) {
        for _ in 0..size {
            self.push(pb, Value::immediate(0, IdKind::Int));
        }
    }

    /// Saves `sp, fp, ra` before a call (§4.4 step 1).
    pub fn push_rf(&self, pb: &mut ProgramBlock) {
        self.push(pb, Value::direct(self.rf.sp, IdKind::Unspecified));
        self.push(pb, Value::direct(self.rf.fp, IdKind::Unspecified));
        self.push(pb, Value::direct(self.rf.ra, IdKind::Unspecified));
    }

    /// Restores `ra, fp, sp` after a call, in exact reverse push order
    /// (§4.4 step 6).
    pub fn pop_rf(&self, pb: &mut ProgramBlock) {
        self.pop(pb, Value::direct(self.rf.ra, IdKind::Unspecified));
        self.pop(pb, Value::direct(self.rf.fp, IdKind::Unspecified));
        self.pop(pb, Value::direct(self.rf.sp, IdKind::Unspecified));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getvar_bumps_by_word_size() {
        let mut state = MachineState::new(CodegenConfig::default());
        let a = state.getvar(1);
        let b = state.getvar(1);
        assert_eq!(a, 0);
        assert_eq!(b, 4);
    }

    #[test]
    fn getvar_array_bumps_by_size_words() {
        let mut state = MachineState::new(CodegenConfig::default());
        let base = state.getvar(1);
        let next = state.getvar(10);
        assert_eq!(next, base + 4);
        assert_eq!(state.data_address, next + 40);
    }

    #[test]
    fn gettemp_starts_at_configured_temp_start() {
        let mut state = MachineState::new(CodegenConfig::default());
        assert_eq!(state.gettemp(), 1000);
        assert_eq!(state.gettemp(), 1004);
    }

    #[test]
    fn push_then_pop_emits_balanced_sp_adjustment() {
        let config = CodegenConfig::default();
        let rf = RegisterFile { sp: 0, fp: 4, ra: 8, rv: 12 };
        let stack = ActivationsStack::new(config, rf);
        let mut pb = ProgramBlock::new();
        stack.push(&mut pb, Value::immediate(5, IdKind::Int));
        stack.pop(&mut pb, Value::direct(16, IdKind::Int));
        assert_eq!(pb.i(), 4);
    }
}
