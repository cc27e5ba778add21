pub mod codegen;
pub mod error;
pub mod lexer;
pub mod parser;

pub use codegen::Object;
pub use error::AsmError;

/// Assemble 6502 source text into a loadable object. Sources are
/// newline-terminated before lexing so a final line without one still
/// closes its statement.
pub fn assemble(source: &str) -> Result<Object, AsmError> {
    let mut source = source.to_string();
    source.push('\n');
    let tokens = lexer::tokenize(&source)?;
    let records = parser::parse(&tokens)?;
    let object = codegen::generate(&records)?;
    Ok(object)
}
