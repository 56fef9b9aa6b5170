//! Fixed-width instruction encoding.
//!
//! # Layout (version 1)
//!
//! ```text
//! +--------+---------+
//! | opcode | operand |
//! | 1 byte | 1 byte  |
//! +--------+---------+
//! ```
//!
//! Instructions are packed back to back with no padding. The layout is owned
//! by the executing VM; the `0x060001001f00` after-timestamp program deployed
//! against it decodes as `BLOCK_TIMESTAMP`, `VAL 0`, `GREATER_THAN` under this
//! layout and no other.

use crate::script::errors::EncodingError;
use crate::script::opcode::Opcode;
use std::fmt;

/// Binary schema of one instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InstructionLayout {
    /// Schema version, written into serialized state configs.
    pub version: u8,
    /// Width of the opcode field in bytes.
    pub opcode_width: usize,
    /// Width of the operand field in bytes.
    pub operand_width: usize,
}

impl InstructionLayout {
    /// Total encoded width of one instruction.
    pub const fn width(&self) -> usize {
        self.opcode_width + self.operand_width
    }

    /// Largest operand the operand field can hold.
    pub const fn max_operand(&self) -> usize {
        (1usize << (8 * self.operand_width)) - 1
    }
}

/// The layout understood by the deployed VM.
pub const LAYOUT: InstructionLayout = InstructionLayout {
    version: 1,
    opcode_width: 1,
    operand_width: 1,
};

/// Encoded width of one instruction under [`LAYOUT`].
pub const INSTRUCTION_LEN: usize = LAYOUT.width();

/// One opcode with its operand. Always representable in [`LAYOUT`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: Opcode,
    operand: u8,
}

impl Instruction {
    /// Creates an instruction, rejecting operands wider than the operand field.
    pub fn new(opcode: Opcode, operand: usize) -> Result<Self, EncodingError> {
        let operand = u8::try_from(operand)
            .ok()
            .filter(|_| operand <= LAYOUT.max_operand())
            .ok_or(EncodingError::OperandOverflow {
                mnemonic: opcode.mnemonic(),
                operand,
                max: LAYOUT.max_operand(),
            })?;
        Ok(Self { opcode, operand })
    }

    /// Creates a zero-operand instruction.
    pub const fn bare(opcode: Opcode) -> Self {
        Self { opcode, operand: 0 }
    }

    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub const fn operand(&self) -> u8 {
        self.operand
    }

    /// Encodes to the wire representation.
    pub const fn to_bytes(&self) -> [u8; INSTRUCTION_LEN] {
        [self.opcode as u8, self.operand]
    }

    /// Decodes one instruction from exactly [`INSTRUCTION_LEN`] bytes.
    pub fn from_bytes(bytes: [u8; INSTRUCTION_LEN]) -> Result<Self, EncodingError> {
        Ok(Self {
            opcode: Opcode::try_from(bytes[0])?,
            operand: bytes[1],
        })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Opcode::Val | Opcode::Dup | Opcode::Every | Opcode::Any => {
                write!(f, "{} {}", self.opcode, self.operand)
            }
            _ if self.operand != 0 => write!(f, "{} {}", self.opcode, self.operand),
            _ => write!(f, "{}", self.opcode),
        }
    }
}

/// Encodes `opcode` with `operand` into one fixed-width instruction.
pub fn encode(opcode: Opcode, operand: usize) -> Result<[u8; INSTRUCTION_LEN], EncodingError> {
    Ok(Instruction::new(opcode, operand)?.to_bytes())
}

/// Encodes a zero-operand instruction.
pub fn op(opcode: Opcode) -> [u8; INSTRUCTION_LEN] {
    Instruction::bare(opcode).to_bytes()
}

/// Encodes from a raw numeric opcode, failing fast on values outside the opcode table.
pub fn encode_raw(opcode: u64, operand: usize) -> Result<[u8; INSTRUCTION_LEN], EncodingError> {
    encode(Opcode::from_raw(opcode)?, operand)
}
