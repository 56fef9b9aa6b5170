//! Condition programs for sale phase gating.
//!
//! Each rule builder is a pure function from its parameters to a
//! [`StateConfig`]. Numeric parameters are not validated; the VM decides what a
//! zero or wrapped constant means.
//!
//! | builder | program | constants |
//! |---|---|---|
//! | [`after_block_number`] | `BLOCK_NUMBER VAL0 GREATER_THAN` | `[block - 1]` |
//! | [`after_timestamp`] | `BLOCK_TIMESTAMP VAL0 GREATER_THAN` | `[timestamp]` |
//! | [`after_timestamp_end_with_raise_or_grace`] | see function | `[end, extra, amount]` |

use crate::script::errors::{EncodingError, ScriptError};
use crate::script::instruction::Instruction;
use crate::script::opcode::Opcode;
use crate::script::source::Source;
use crate::script::state_config::StateConfig;
use crate::types::word::Word;

/// Declared stack for the single-comparison programs (two slots are used).
pub const SIMPLE_STACK_LENGTH: u32 = 3;

/// Fixed upper bound declared for the raise-or-grace program (three slots are used).
pub const RAISE_OR_GRACE_STACK_LENGTH: u32 = 10;

/// Accumulates instructions and the constants they reference.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    constants: Vec<Word>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits a zero-operand instruction.
    pub fn op(&mut self, opcode: Opcode) -> &mut Self {
        self.instructions.push(Instruction::bare(opcode));
        self
    }

    /// Emits an instruction with an operand.
    pub fn op_with(&mut self, opcode: Opcode, operand: usize) -> Result<&mut Self, EncodingError> {
        self.instructions.push(Instruction::new(opcode, operand)?);
        Ok(self)
    }

    /// Appends `value` to the constants table and emits `VAL` for it.
    pub fn constant(&mut self, value: impl Into<Word>) -> Result<&mut Self, EncodingError> {
        let index = self.constants.len();
        self.op_with(Opcode::Val, index)?;
        self.constants.push(value.into());
        Ok(self)
    }

    /// Emits `VAL index` for a constant already in the table or reserved by the caller.
    pub fn constant_ref(&mut self, index: usize) -> Result<&mut Self, EncodingError> {
        self.op_with(Opcode::Val, index)
    }

    /// Reserves constant slots in construction order without emitting anything.
    ///
    /// Lets a program reference constants in an order other than the one the
    /// contract expects them to be listed in.
    pub fn reserve_constants(&mut self, values: impl IntoIterator<Item = Word>) -> usize {
        let first = self.constants.len();
        self.constants.extend(values);
        first
    }

    /// Appends every instruction of an already-encoded fragment.
    pub fn append(&mut self, fragment: &Source) -> Result<&mut Self, ScriptError> {
        self.instructions.extend(fragment.instructions()?);
        Ok(self)
    }

    /// Number of instructions emitted so far.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Packages the program as a single-source config.
    ///
    /// Fails if `stack_length` is below the depth the program reaches, if a
    /// `VAL` refers past the constants table, or if the stack effect of an
    /// instruction cannot be analysed.
    pub fn finish(self, stack_length: u32) -> Result<StateConfig, ScriptError> {
        for (position, instr) in self.instructions.iter().enumerate() {
            let index = instr.operand() as usize;
            if instr.opcode() == Opcode::Val && index >= self.constants.len() {
                return Err(ScriptError::ConstantOutOfRange {
                    position,
                    index,
                    len: self.constants.len(),
                });
            }
        }

        let source = Source::concat(&self.instructions);
        let needed = source.max_stack_depth()?;
        if (stack_length as usize) < needed {
            return Err(ScriptError::StackLengthTooSmall {
                declared: stack_length,
                needed,
            });
        }

        Ok(StateConfig {
            sources: vec![source],
            constants: self.constants,
            stack_length,
            arguments_length: 0,
        })
    }
}

/// Emits `lhs VAL(index) GREATER_THAN`.
fn greater_than_constant(
    b: &mut ProgramBuilder,
    lhs: Opcode,
    index: usize,
) -> Result<(), EncodingError> {
    b.op(lhs).constant_ref(index)?.op(Opcode::GreaterThan);
    Ok(())
}

/// True from block `block_number` onwards.
///
/// Stores `block_number - 1` so that the strict comparison holds at
/// `block_number` itself. Block 0 wraps to the maximum word.
pub fn after_block_number(block_number: impl Into<Word>) -> Result<StateConfig, ScriptError> {
    let threshold = block_number.into().wrapping_sub(Word::from(1u64));
    let mut b = ProgramBuilder::new();
    b.op(Opcode::BlockNumber)
        .constant(threshold)?
        .op(Opcode::GreaterThan);
    b.finish(SIMPLE_STACK_LENGTH)
}

/// True strictly after `timestamp`.
///
/// Unlike [`after_block_number`] the constant is stored as given.
// TODO: confirm with product whether this should also subtract one like the block variant.
pub fn after_timestamp(timestamp: impl Into<Word>) -> Result<StateConfig, ScriptError> {
    let mut b = ProgramBuilder::new();
    b.op(Opcode::BlockTimestamp)
        .constant(timestamp)?
        .op(Opcode::GreaterThan);
    b.finish(SIMPLE_STACK_LENGTH)
}

/// True once the sale is past `timestamp_end` while still under `amount`
/// raised, or unconditionally once past `timestamp_extra`.
///
/// ```text
/// BLOCK_TIMESTAMP VAL0 GREATER_THAN      ; now > end
/// TOTAL_RESERVE_IN VAL2 LESS_THAN        ; raised < amount
/// EVERY 2
/// BLOCK_TIMESTAMP VAL1 GREATER_THAN      ; now > extra
/// ANY 2
/// ```
pub fn after_timestamp_end_with_raise_or_grace(
    timestamp_end: impl Into<Word>,
    timestamp_extra: impl Into<Word>,
    amount: impl Into<Word>,
) -> Result<StateConfig, ScriptError> {
    let mut b = ProgramBuilder::new();
    let base = b.reserve_constants([
        timestamp_end.into(),
        timestamp_extra.into(),
        amount.into(),
    ]);
    let (end, extra, raise) = (base, base + 1, base + 2);

    greater_than_constant(&mut b, Opcode::BlockTimestamp, end)?;
    b.op(Opcode::TotalReserveIn)
        .constant_ref(raise)?
        .op(Opcode::LessThan)
        .op_with(Opcode::Every, 2)?;
    greater_than_constant(&mut b, Opcode::BlockTimestamp, extra)?;
    b.op_with(Opcode::Any, 2)?;

    b.finish(RAISE_OR_GRACE_STACK_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(config: &StateConfig, opcode: Opcode, operand: u8) -> usize {
        config.sources[0]
            .instructions()
            .unwrap()
            .iter()
            .filter(|i| i.opcode() == opcode && i.operand() == operand)
            .count()
    }

    #[test]
    fn after_block_number_subtracts_one() {
        let config = after_block_number(100u64).unwrap();
        assert_eq!(config.constants, vec![Word::from(99u64)]);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].to_hex(), "0x050001001f00");
        assert_eq!(config.stack_length, 3);
        assert_eq!(config.arguments_length, 0);
    }

    #[test]
    fn after_block_number_zero_wraps() {
        let config = after_block_number(0u64).unwrap();
        assert_eq!(config.constants, vec![Word::MAX]);
    }

    #[test]
    fn after_timestamp_keeps_value() {
        let config = after_timestamp(100u64).unwrap();
        assert_eq!(config.constants, vec![Word::from(100u64)]);
        assert_eq!(config.stack_length, 3);
        assert_eq!(config.arguments_length, 0);
    }

    #[test]
    fn after_timestamp_instructions_independent_of_value() {
        for t in [0u64, 1, 1_700_000_000, u64::MAX] {
            assert_eq!(after_timestamp(t).unwrap().sources[0].to_hex(), "0x060001001f00");
        }
        let wide = after_timestamp(u128::MAX).unwrap();
        assert_eq!(wide.sources[0].to_hex(), "0x060001001f00");
        assert_eq!(wide.constants[0], Word::from(u128::MAX));
    }

    #[test]
    fn raise_or_grace_constants_in_construction_order() {
        let config = after_timestamp_end_with_raise_or_grace(1000u64, 2000u64, 500u64).unwrap();
        assert_eq!(
            config.constants,
            vec![Word::from(1000u64), Word::from(2000u64), Word::from(500u64)]
        );
        assert_eq!(config.arguments_length, 0);
        assert_eq!(config.stack_length, RAISE_OR_GRACE_STACK_LENGTH);
    }

    #[test]
    fn raise_or_grace_has_one_every_and_one_any() {
        let config = after_timestamp_end_with_raise_or_grace(1000u64, 2000u64, 500u64).unwrap();
        assert_eq!(count(&config, Opcode::Every, 2), 1);
        assert_eq!(count(&config, Opcode::Any, 2), 1);
        let all = config.sources[0].instructions().unwrap();
        assert_eq!(all.iter().filter(|i| i.opcode() == Opcode::Every).count(), 1);
        assert_eq!(all.iter().filter(|i| i.opcode() == Opcode::Any).count(), 1);
    }

    #[test]
    fn raise_or_grace_instruction_sequence() {
        let config = after_timestamp_end_with_raise_or_grace(1u64, 2u64, 3u64).unwrap();
        let listing: Vec<String> = config.sources[0]
            .instructions()
            .unwrap()
            .iter()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(
            listing,
            vec![
                "BLOCK_TIMESTAMP",
                "VAL 0",
                "GREATER_THAN",
                "TOTAL_RESERVE_IN",
                "VAL 2",
                "LESS_THAN",
                "EVERY 2",
                "BLOCK_TIMESTAMP",
                "VAL 1",
                "GREATER_THAN",
                "ANY 2",
            ]
        );
    }

    #[test]
    fn declared_stack_never_understates() {
        let configs = [
            after_block_number(100u64).unwrap(),
            after_timestamp(100u64).unwrap(),
            after_timestamp_end_with_raise_or_grace(1000u64, 2000u64, 500u64).unwrap(),
        ];
        for config in &configs {
            let needed = config.sources[0].max_stack_depth().unwrap();
            assert!(config.stack_length as usize >= needed);
        }
        assert_eq!(configs[2].sources[0].max_stack_depth().unwrap(), 3);
    }

    #[test]
    fn builder_is_pure() {
        assert_eq!(
            after_timestamp_end_with_raise_or_grace(7u64, 8u64, 9u64).unwrap(),
            after_timestamp_end_with_raise_or_grace(7u64, 8u64, 9u64).unwrap()
        );
    }

    #[test]
    fn program_builder_composes_fragments() {
        let inner = after_timestamp(5u64).unwrap();
        let mut b = ProgramBuilder::new();
        b.append(&inner.sources[0]).unwrap();
        b.append(&inner.sources[0]).unwrap();
        b.op_with(Opcode::Every, 2).unwrap();
        b.reserve_constants(inner.constants.iter().copied());
        assert_eq!(b.len(), 7);
        let config = b.finish(4).unwrap();
        assert_eq!(config.sources[0].max_stack_depth().unwrap(), 3);
        assert_eq!(config.constants, vec![Word::from(5u64)]);
    }

    #[test]
    fn finish_rejects_understated_stack() {
        let inner = after_timestamp(5u64).unwrap();
        let mut b = ProgramBuilder::new();
        b.reserve_constants(inner.constants.iter().copied());
        b.append(&inner.sources[0]).unwrap();
        b.append(&inner.sources[0]).unwrap();
        b.op_with(Opcode::Every, 2).unwrap();
        assert!(matches!(
            b.finish(1),
            Err(ScriptError::StackLengthTooSmall {
                declared: 1,
                needed: 3
            })
        ));
    }

    #[test]
    fn finish_accepts_exact_stack() {
        let mut b = ProgramBuilder::new();
        b.op(Opcode::BlockNumber)
            .constant(1u64)
            .unwrap()
            .op(Opcode::GreaterThan);
        assert_eq!(b.finish(2).unwrap().stack_length, 2);
    }

    #[test]
    fn finish_rejects_val_past_constants() {
        let mut b = ProgramBuilder::new();
        b.op(Opcode::BlockTimestamp)
            .constant_ref(7)
            .unwrap()
            .op(Opcode::GreaterThan);
        assert!(matches!(
            b.finish(10),
            Err(ScriptError::ConstantOutOfRange {
                position: 1,
                index: 7,
                len: 0
            })
        ));
    }

    #[test]
    fn finish_rejects_unanalysable_program() {
        let mut b = ProgramBuilder::new();
        b.op(Opcode::Zipmap);
        assert!(matches!(
            b.finish(10),
            Err(ScriptError::OpaqueStackEffect { index: 0, .. })
        ));
    }

    #[test]
    fn program_builder_rejects_oversized_operand() {
        let mut b = ProgramBuilder::new();
        assert!(matches!(
            b.op_with(Opcode::Any, 300),
            Err(EncodingError::OperandOverflow { operand: 300, .. })
        ));
        assert!(b.is_empty());
    }

    #[test]
    fn constant_indexes_past_operand_width_fail() {
        let mut b = ProgramBuilder::new();
        b.reserve_constants((0..256u64).map(Word::from));
        assert!(b.constant(1u64).is_err());
    }
}
