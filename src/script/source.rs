//! Program fragments: densely packed instruction sequences.

use crate::script::errors::ScriptError;
use crate::script::instruction::{INSTRUCTION_LEN, Instruction};
use crate::script::opcode::StackEffect;
use sale_gate_derive::BinaryCodec;
use std::fmt;
use std::str::FromStr;

/// One executable sub-program as the VM receives it.
///
/// Holds encoded bytes rather than [`Instruction`]s so that fingerprints are
/// compared on exactly what was (or will be) deployed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, BinaryCodec)]
pub struct Source(Vec<u8>);

impl Source {
    /// Concatenates encoded instructions.
    pub fn concat<'a>(instructions: impl IntoIterator<Item = &'a Instruction>) -> Self {
        let mut bytes = Vec::new();
        for instr in instructions {
            bytes.extend_from_slice(&instr.to_bytes());
        }
        Self(bytes)
    }

    /// Wraps raw bytes without validating them.
    pub fn from_raw(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends another fragment's instructions.
    pub fn extend(&mut self, other: &Source) {
        self.0.extend_from_slice(&other.0);
    }

    /// Renders as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Parses hex with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, ScriptError> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        hex::decode(digits)
            .map(Self)
            .map_err(|e| ScriptError::InvalidHex {
                reason: e.to_string(),
            })
    }

    /// Decodes the fragment instruction by instruction.
    pub fn instructions(&self) -> Result<Vec<Instruction>, ScriptError> {
        if self.0.len() % INSTRUCTION_LEN != 0 {
            return Err(ScriptError::TruncatedSource {
                len: self.0.len(),
                width: INSTRUCTION_LEN,
            });
        }

        self.0
            .chunks_exact(INSTRUCTION_LEN)
            .map(|chunk| {
                let mut buf = [0u8; INSTRUCTION_LEN];
                buf.copy_from_slice(chunk);
                Instruction::from_bytes(buf).map_err(ScriptError::from)
            })
            .collect()
    }

    /// Simulates stack height and returns the deepest point reached.
    ///
    /// Fails on underflow and on opcodes whose effect depends on contract state.
    pub fn max_stack_depth(&self) -> Result<usize, ScriptError> {
        let mut height = 0usize;
        let mut deepest = 0usize;

        for (index, instr) in self.instructions()?.iter().enumerate() {
            let mnemonic = instr.opcode().mnemonic();
            let (pops, pushes) = match instr.opcode().stack_effect() {
                StackEffect::Fixed { pops, pushes } => (pops as usize, pushes as usize),
                StackEffect::Operand => (instr.operand() as usize, 1),
                StackEffect::Opaque => {
                    return Err(ScriptError::OpaqueStackEffect { index, mnemonic });
                }
            };

            height = height
                .checked_sub(pops)
                .ok_or(ScriptError::StackUnderflow { index, mnemonic })?;
            height += pushes;
            deepest = deepest.max(height);
        }

        Ok(deepest)
    }
}

impl FromStr for Source {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::from_hex(s)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
