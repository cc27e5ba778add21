use arch::{mnemonic::Mnemonic, mode::Mode};
use thiserror::Error;

/// Fatal tokenization failure. Lexing aborts at the first bad lexeme.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LexError {
    #[error("Invalid immediate mode")]
    InvalidImmediate,

    #[error("Unknown directive `.{0}`")]
    UnknownDirective(String),

    #[error("Unrecognized character `{0}`")]
    UnrecognizedChar(char),

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Unterminated character literal")]
    UnterminatedChar,

    #[error("Expected hex digits after `$`")]
    MissingHexDigits,

    #[error("Number out of range: `{0}`")]
    NumberOutOfRange(String),
}

/// Fatal structural failure. Parsing aborts at the first bad sequence.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Incorrect addressing mode")]
    IncorrectAddressing,

    #[error("Missing right paren")]
    MissingRParen,

    #[error("Missing comma")]
    MissingComma,

    #[error("Invalid address")]
    InvalidAddress,

    #[error("Expected `$`-prefixed value after `=`")]
    MissingValue,

    #[error("Unexpected token at statement start")]
    UnexpectedToken,
}

/// Fatal generation failure. No partial object code is ever returned.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GenError {
    #[error("undefined identifier `{0}`")]
    UndefinedIdentifier(String),

    #[error("`{0}` does not support {1} addressing")]
    InvalidPairing(Mnemonic, Mode),

    #[error("constant `{0}` cannot be a branch target")]
    ConstantBranchTarget(String),

    #[error("`{0}` is missing its operand")]
    MissingOperand(Mnemonic),

    #[error("directive `{0}` requires at least one operand")]
    DirectiveArity(String),

    #[error("origin directive unsupported")]
    OriginUnsupported,

    #[error("empty program")]
    EmptyProgram,
}

/// Any stage failure, surfaced to the caller as a single descriptive error.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AsmError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Gen(#[from] GenError),
}
