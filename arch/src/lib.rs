pub mod flag;
pub mod mnemonic;
pub mod mode;
pub mod opcode;
