//! Operands (§3: "A tagged integer with addressing mode") and the scalar
//! identifier kinds used for semantic type checking.
//!
//! Grounded on `original_source/cminus/codegen/pb.py::Value`, kept as the
//! authoritative typed revision per the resolved "most feature-complete
//! revision" open question (§9): the `kind` field is carried through so
//! `op_exec`/`function_call` can type-check operands, which the simpler
//! untyped revisions of the source drop.

use std::fmt;

/// The four scalar kinds an identifier or operand can carry (§3).
/// `Unspecified` marks a degraded value produced after a semantic error
/// (§7: "undefined identifiers yield immediate -1 with `Unspecified` kind,
/// which short-circuits downstream kind checks").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IdKind {
    Int,
    Void,
    Array,
    Function,
    #[default]
    Unspecified,
}

/// An operand's addressing mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Addressing {
    /// `#n` — a literal integer.
    Immediate,
    /// `n` — an absolute address.
    Direct,
    /// `@n` — the address held at another address.
    Indirect,
}

/// A typed operand on the semantic stack or in an instruction's argument
/// slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Value {
    pub addressing: Addressing,
    pub raw: i64,
    pub kind: IdKind,
}

impl Value {
    pub fn immediate(value: i64, kind: IdKind) -> Self {
        Self { addressing: Addressing::Immediate, raw: value, kind }
    }

    pub fn direct(address: i64, kind: IdKind) -> Self {
        Self { addressing: Addressing::Direct, raw: address, kind }
    }

    pub fn indirect(address: i64, kind: IdKind) -> Self {
        Self { addressing: Addressing::Indirect, raw: address, kind }
    }

    /// An unused instruction-argument slot: prints as the empty string
    /// (§6's instruction format: "empty string for unused slots").
    pub fn empty() -> Self {
        Self { addressing: Addressing::Direct, raw: i64::MIN, kind: IdKind::Unspecified }
    }

    pub fn is_empty(&self) -> bool {
        self.addressing == Addressing::Direct && self.raw == i64::MIN
    }

    /// The degraded value produced for an undefined identifier (§7).
    pub fn undefined() -> Self {
        Self::immediate(-1, IdKind::Unspecified)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        match self.addressing {
            Addressing::Immediate => write!(f, "#{}", self.raw),
            Addressing::Direct => write!(f, "{}", self.raw),
            Addressing::Indirect => write!(f, "@{}", self.raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_match_six_serialization_rules() {
        assert_eq!(Value::immediate(5, IdKind::Int).to_string(), "#5");
        assert_eq!(Value::direct(1000, IdKind::Int).to_string(), "1000");
        assert_eq!(Value::indirect(8, IdKind::Int).to_string(), "@8");
        assert_eq!(Value::empty().to_string(), "");
    }

    #[test]
    fn undefined_value_is_immediate_minus_one_unspecified() {
        let v = Value::undefined();
        assert_eq!(v.addressing, Addressing::Immediate);
        assert_eq!(v.raw, -1);
        assert_eq!(v.kind, IdKind::Unspecified);
    }
}
