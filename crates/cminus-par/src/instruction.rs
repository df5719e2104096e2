//! Three-address instructions and the program block that accumulates them.
//!
//! Grounded on `original_source/cminus/codegen/pb.py` (`Operation`,
//! `Instruction`, `ProgramBlock`).

use crate::value::Value;
use std::fmt;

/// §3: `op ∈ {ADD, SUB, MULT, EQ, LT, ASSIGN, JP, JPF, PRINT, EMPTY}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Add,
    Sub,
    Mult,
    Eq,
    Lt,
    Assign,
    Jp,
    Jpf,
    Print,
    /// A reserved, not-yet-patched slot (§4.3 `hold`/`prison`).
    Empty,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Add => "ADD",
            Operation::Sub => "SUB",
            Operation::Mult => "MULT",
            Operation::Eq => "EQ",
            Operation::Lt => "LT",
            Operation::Assign => "ASSIGN",
            Operation::Jp => "JP",
            Operation::Jpf => "JPF",
            Operation::Print => "PRINT",
            Operation::Empty => "",
        }
    }

    /// The operator-symbol-to-operation mapping `op_push` consults
    /// (`original_source/cminus/codegen/pb.py::OPERATIONS`).
    pub fn from_lexeme(lexeme: &str) -> Option<Operation> {
        match lexeme {
            "+" => Some(Operation::Add),
            "-" => Some(Operation::Sub),
            "*" => Some(Operation::Mult),
            "<" => Some(Operation::Lt),
            "==" => Some(Operation::Eq),
            _ => None,
        }
    }
}

/// A fixed-arity three-address instruction. `arg2`/`arg3` are
/// `Value::empty()` when unused.
#[derive(Clone, Copy, Debug)]
pub struct Instruction {
    pub op: Operation,
    pub arg1: Value,
    pub arg2: Value,
    pub arg3: Value,
}

impl Instruction {
    pub fn new(op: Operation, arg1: Value, arg2: Value, arg3: Value) -> Self {
        Self { op, arg1, arg2, arg3 }
    }

    pub fn one(op: Operation, arg1: Value) -> Self {
        Self::new(op, arg1, Value::empty(), Value::empty())
    }

    pub fn two(op: Operation, arg1: Value, arg2: Value) -> Self {
        Self::new(op, arg1, arg2, Value::empty())
    }

    pub fn empty() -> Self {
        Self::new(Operation::Empty, Value::empty(), Value::empty(), Value::empty())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.op, Operation::Empty)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(f, "({}, {}, {}, {})", self.op.name(), self.arg1, self.arg2, self.arg3)
    }
}

/// An ordered, randomly-overwritable instruction buffer (§3). `i` is the
/// monotone length; overwriting beyond it pads with `EMPTY` slots, exactly
/// as `original_source/cminus/codegen/pb.py::ProgramBlock`'s `i` setter
/// does.
#[derive(Default)]
pub struct ProgramBlock {
    instructions: Vec<Instruction>,
}

impl ProgramBlock {
    pub fn new() -> Self {
        Self { instructions: Vec::new() }
    }

    /// The current length — the index the next `append` will land at.
    pub fn i(&self) -> usize {
        self.instructions.len()
    }

    /// Truncates or pads with `EMPTY` slots to reach exactly `len`
    /// instructions, mirroring the Python property setter's semantics.
    pub fn set_i(&mut self, len: usize) {
        if len < self.instructions.len() {
            self.instructions.truncate(len);
        } else {
            self.instructions.resize_with(len, Instruction::empty);
        }
    }

    pub fn append(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Patches the instruction at `index`. Ordinarily `index` was already
    /// reserved by a prior `hold`/`prison`, but §3 specifies that an
    /// out-of-range `index` extends the block with `EMPTY` slots up to it
    /// first, exactly as the Python reference's `i` property setter does —
    /// `set_i` implements that extension.
    pub fn overwrite(&mut self, index: usize, instruction: Instruction) {
        if index >= self.instructions.len() {
            self.set_i(index + 1);
        }
        self.instructions[index] = instruction;
    }

    pub fn get(&self, index: usize) -> &Instruction {
        &self.instructions[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Instruction)> {
        self.instructions.iter().enumerate()
    }

    /// True if any reserved `hold`/`prison` slot never got patched — the
    /// EOF patch-completeness check `write_program_output_file` asserts
    /// before emitting a semantically correct program.
    pub fn has_unpatched_slots(&self) -> bool {
        self.instructions.iter().any(Instruction::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::IdKind;

    #[test]
    fn append_then_overwrite_patches_in_place() {
        let mut pb = ProgramBlock::new();
        let reserved = pb.i();
        pb.append(Instruction::empty());
        pb.append(Instruction::one(Operation::Print, Value::direct(0, IdKind::Int)));
        pb.overwrite(reserved, Instruction::one(Operation::Jp, Value::immediate(2, IdKind::Unspecified)));
        assert_eq!(pb.get(reserved).op, Operation::Jp);
    }

    #[test]
    fn set_i_pads_with_empty_slots_when_growing() {
        let mut pb = ProgramBlock::new();
        pb.set_i(3);
        assert_eq!(pb.i(), 3);
        assert!(pb.get(0).is_empty());
        assert!(pb.get(2).is_empty());
    }

    #[test]
    fn set_i_truncates_when_shrinking() {
        let mut pb = ProgramBlock::new();
        pb.append(Instruction::empty());
        pb.append(Instruction::empty());
        pb.set_i(1);
        assert_eq!(pb.i(), 1);
    }

    #[test]
    fn overwrite_past_the_end_extends_with_empty_slots() {
        let mut pb = ProgramBlock::new();
        pb.overwrite(2, Instruction::one(Operation::Jp, Value::immediate(0, IdKind::Unspecified)));
        assert_eq!(pb.i(), 3);
        assert!(pb.get(0).is_empty());
        assert!(pb.get(1).is_empty());
        assert_eq!(pb.get(2).op, Operation::Jp);
    }

    #[test]
    fn display_omits_empty_operation() {
        assert_eq!(Instruction::empty().to_string(), "");
        let inst = Instruction::two(
            Operation::Add,
            Value::immediate(2, IdKind::Int),
            Value::immediate(3, IdKind::Int),
        );
        assert_eq!(inst.to_string(), "(ADD, #2, #3, )");
    }
}
