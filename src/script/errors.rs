use crate::types::encoding::DecodeError;
use crate::types::word::ParseWordError;
use sale_gate_derive::Error;

/// An opcode or operand cannot be represented in the instruction layout.
///
/// Always a programming mistake on the caller's side; never retried.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Discriminant is not part of the opcode table.
    #[error("invalid opcode: {opcode}")]
    InvalidOpcode { opcode: u64 },
    /// Mnemonic is not part of the opcode table.
    #[error("invalid opcode name: {name}")]
    InvalidOpcodeName { name: String },
    /// Operand does not fit in the operand field.
    #[error("operand {operand} for {mnemonic} exceeds maximum {max}")]
    OperandOverflow {
        mnemonic: &'static str,
        operand: usize,
        max: usize,
    },
}

/// Errors from decoding, analysing, or loading programs.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("encoding error: {0}")]
    Encoding(EncodingError),
    /// Source length is not a whole number of instructions.
    #[error("source length {len} is not a multiple of instruction width {width}")]
    TruncatedSource { len: usize, width: usize },
    /// Instruction pops more values than the stack holds.
    #[error("stack underflow at instruction {index} ({mnemonic})")]
    StackUnderflow { index: usize, mnemonic: &'static str },
    /// Instruction has no statically known stack effect.
    #[error("cannot analyse stack effect of {mnemonic} at instruction {index}")]
    OpaqueStackEffect { index: usize, mnemonic: &'static str },
    /// Declared stack length is below what the program reaches.
    #[error("declared stack length {declared} is below required depth {needed}")]
    StackLengthTooSmall { declared: u32, needed: usize },
    /// `VAL` refers past the end of the constants table.
    #[error("VAL {index} at instruction {position} is out of range for {len} constants")]
    ConstantOutOfRange {
        position: usize,
        index: usize,
        len: usize,
    },
    #[error("invalid hex: {reason}")]
    InvalidHex { reason: String },
    #[error("invalid number: {0}")]
    InvalidNumber(ParseWordError),
    /// Failed to decode a serialized state config.
    #[error("decoding error: {reason}")]
    DecodeError { reason: String },
    #[error("io error: {path}: {reason}")]
    IoError { path: String, reason: String },
}

impl From<EncodingError> for ScriptError {
    fn from(err: EncodingError) -> Self {
        ScriptError::Encoding(err)
    }
}

impl From<ParseWordError> for ScriptError {
    fn from(err: ParseWordError) -> Self {
        ScriptError::InvalidNumber(err)
    }
}

impl From<DecodeError> for ScriptError {
    fn from(err: DecodeError) -> Self {
        ScriptError::DecodeError {
            reason: err.to_string(),
        }
    }
}
