use arch::{mnemonic::Mnemonic, mode::Mode, opcode};
use indexmap::IndexMap;

use crate::error::GenError;
use crate::lexer::Directive;
use crate::parser::{Operand, Record};

/// Assembled machine code plus its load layout. The whole image is a
/// single segment loaded at address zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub bytes: Vec<u8>,
    pub segments: Vec<(u16, u16)>,
}

impl Object {
    /// Sixteen bytes per row, offset-prefixed.
    pub fn hex_dump(&self) -> String {
        let mut out = String::new();
        for (row, chunk) in self.bytes.chunks(16).enumerate() {
            out.push_str(&format!("{:04X}:", row * 16));
            for byte in chunk {
                out.push_str(&format!(" {:02X}", byte));
            }
            out.push('\n');
        }
        out
    }
}

/// Two-pass generation: the first pass sizes every record to pin label
/// addresses, the second emits bytes and resolves forward references.
pub fn generate(records: &[Record]) -> Result<Object, GenError> {
    let mut labels: IndexMap<String, u16> = IndexMap::new();
    let mut constants: IndexMap<String, u16> = IndexMap::new();

    let mut offset: u16 = 0;
    for record in records {
        match record {
            Record::LabelDecl { name } => {
                labels.insert(name.clone(), offset);
            }
            Record::ConstantDef { name, value } => {
                constants.insert(name.clone(), *value);
            }
            _ => offset = offset.wrapping_add(record_len(record)?),
        }
    }

    let mut bytes: Vec<u8> = Vec::with_capacity(offset as usize);
    for record in records {
        match record {
            Record::Op {
                mnemonic,
                mode,
                operands,
            } => emit_op(&mut bytes, *mnemonic, *mode, operands, &labels, &constants)?,
            Record::LabelDecl { .. } | Record::ConstantDef { .. } => {}
            Record::Directive {
                directive,
                operands,
            } => emit_directive(&mut bytes, *directive, operands, &labels, &constants)?,
            Record::OriginSet { .. } => return Err(GenError::OriginUnsupported),
        }
    }

    if bytes.is_empty() {
        return Err(GenError::EmptyProgram);
    }
    Ok(Object {
        bytes,
        segments: vec![(0, 0)],
    })
}

/// Byte length of a record, agreeing exactly with what `emit_op` and
/// `emit_directive` produce. Immediate operands over one byte widen the
/// instruction; address operands never do, their width is fixed by mode.
fn record_len(record: &Record) -> Result<u16, GenError> {
    match record {
        Record::Op {
            mnemonic,
            mode,
            operands,
        } => {
            let operand_len = match mode {
                Mode::Immediate => match operands.first() {
                    Some(Operand::Literal(v)) if *v > 0xFF => 2,
                    Some(_) => 1,
                    None => return Err(GenError::MissingOperand(*mnemonic)),
                },
                _ => mode.operand_bytes() as u16,
            };
            Ok(1 + operand_len)
        }
        Record::LabelDecl { .. } | Record::ConstantDef { .. } => Ok(0),
        Record::Directive {
            directive,
            operands,
        } => {
            if operands.is_empty() {
                return Err(GenError::DirectiveArity(directive.name().into()));
            }
            Ok((directive.operand_bytes() * operands.len()) as u16)
        }
        Record::OriginSet { .. } => Err(GenError::OriginUnsupported),
    }
}

fn emit_op(
    bytes: &mut Vec<u8>,
    mnemonic: Mnemonic,
    mode: Mode,
    operands: &[Operand],
    labels: &IndexMap<String, u16>,
    constants: &IndexMap<String, u16>,
) -> Result<(), GenError> {
    let op = opcode::encode(mnemonic, mode).ok_or(GenError::InvalidPairing(mnemonic, mode))?;
    bytes.push(op);

    match mode {
        Mode::Implied | Mode::Accumulator => {}
        Mode::Immediate => {
            let value = match operands.first() {
                Some(Operand::Literal(v)) => *v,
                _ => return Err(GenError::MissingOperand(mnemonic)),
            };
            bytes.push((value & 0xFF) as u8);
            if value > 0xFF {
                bytes.push((value >> 8) as u8);
            }
        }
        Mode::ZeroPage
        | Mode::ZeroPageX
        | Mode::ZeroPageY
        | Mode::IndirectX
        | Mode::IndirectY => {
            let value = resolve(operand(mnemonic, operands)?, labels, constants)?;
            bytes.push((value & 0xFF) as u8);
        }
        Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => {
            let value = resolve(operand(mnemonic, operands)?, labels, constants)?;
            bytes.push((value & 0xFF) as u8);
            bytes.push((value >> 8) as u8);
        }
        Mode::Relative => {
            let target = match operand(mnemonic, operands)? {
                Operand::Literal(v) => *v,
                Operand::Label(name) => match labels.get(name) {
                    Some(addr) => *addr,
                    None if constants.contains_key(name) => {
                        return Err(GenError::ConstantBranchTarget(name.clone()))
                    }
                    None => return Err(GenError::UndefinedIdentifier(name.clone())),
                },
            };
            // bytes.len() is the offset of the displacement byte itself,
            // so the branch base (the next instruction) is one past it.
            let disp = target
                .wrapping_sub(bytes.len() as u16)
                .wrapping_sub(1);
            bytes.push((disp & 0xFF) as u8);
        }
    }
    Ok(())
}

fn emit_directive(
    bytes: &mut Vec<u8>,
    directive: Directive,
    operands: &[Operand],
    labels: &IndexMap<String, u16>,
    constants: &IndexMap<String, u16>,
) -> Result<(), GenError> {
    if operands.is_empty() {
        return Err(GenError::DirectiveArity(directive.name().into()));
    }
    for operand in operands {
        let value = resolve(operand, labels, constants)?;
        match directive {
            Directive::Byte => bytes.push((value & 0xFF) as u8),
            Directive::Word => {
                bytes.push((value & 0xFF) as u8);
                bytes.push((value >> 8) as u8);
            }
        }
    }
    Ok(())
}

fn operand<'a>(mnemonic: Mnemonic, operands: &'a [Operand]) -> Result<&'a Operand, GenError> {
    operands.first().ok_or(GenError::MissingOperand(mnemonic))
}

/// Constants shadow labels of the same name.
fn resolve(
    operand: &Operand,
    labels: &IndexMap<String, u16>,
    constants: &IndexMap<String, u16>,
) -> Result<u16, GenError> {
    match operand {
        Operand::Literal(v) => Ok(*v),
        Operand::Label(name) => constants
            .get(name)
            .or_else(|| labels.get(name))
            .copied()
            .ok_or_else(|| GenError::UndefinedIdentifier(name.clone())),
    }
}
