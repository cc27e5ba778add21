use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The 56 legal 6502 instruction names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
pub enum Mnemonic {
    ADC,
    AND,
    ASL,
    BCC,
    BCS,
    BEQ,
    BIT,
    BMI,
    BNE,
    BPL,
    BRK,
    BVC,
    BVS,
    CLC,
    CLD,
    CLI,
    CLV,
    CMP,
    CPX,
    CPY,
    DEC,
    DEX,
    DEY,
    EOR,
    INC,
    INX,
    INY,
    JMP,
    JSR,
    LDA,
    LDX,
    LDY,
    LSR,
    NOP,
    ORA,
    PHA,
    PHP,
    PLA,
    PLP,
    ROL,
    ROR,
    RTI,
    RTS,
    SBC,
    SEC,
    SED,
    SEI,
    STA,
    STX,
    STY,
    TAX,
    TAY,
    TSX,
    TXA,
    TXS,
    TYA,
}

impl Mnemonic {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_uppercase().parse::<Self>() {
            Ok(m) => Ok(m),
            Err(_) => Err(format!("Undefined mnemonic: {s}")),
        }
    }

    /// Branch instructions take a bare label operand in relative mode.
    pub fn is_branch(&self) -> bool {
        use Mnemonic::*;
        matches!(self, BCC | BCS | BEQ | BMI | BNE | BPL | BVC | BVS)
    }
}

#[test]
fn test() {
    println!("{}", Mnemonic::LDA);
    println!("{:?}", Mnemonic::parse("lda"));
    println!("{:?}", Mnemonic::parse("brk"));
    println!("{:?}", Mnemonic::parse("hoge"));
    assert!(Mnemonic::parse("sta").is_ok());
    assert!(Mnemonic::parse("hoge").is_err());
    assert!(Mnemonic::BNE.is_branch());
    assert!(!Mnemonic::JMP.is_branch());
}
