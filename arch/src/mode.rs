use serde::{Deserialize, Serialize};
use strum::Display;

/// Operand-location scheme of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Mode {
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Implied,
    Accumulator,
    Relative,
}

impl Mode {
    /// Nominal operand width in bytes following the opcode byte.
    /// Immediate operands above $FF widen to two bytes during generation.
    pub fn operand_bytes(&self) -> usize {
        use Mode::*;
        match self {
            Implied | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY | Relative => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }
}

#[test]
fn test() {
    assert_eq!(Mode::Implied.operand_bytes(), 0);
    assert_eq!(Mode::ZeroPageX.operand_bytes(), 1);
    assert_eq!(Mode::Indirect.operand_bytes(), 2);
}
