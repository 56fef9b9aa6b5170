//! Opcode table of the sale-gating stack VM.
//!
//! The [`for_each_opcode!`](crate::for_each_opcode) macro holds the canonical
//! opcode definitions and hands them to a callback macro, so the enum, its
//! lookups, and the table-hash test are all generated from one list.
//!
//! Discriminants are part of the wire contract with the deployed VM and must
//! never be renumbered. Only a handful of these are emitted by the program
//! builders; the rest exist so that decoded programs can be named.
//!
//! # Stack effects
//!
//! - `fixed(pops, pushes)`: constant effect
//! - `OPERAND`: pops `operand` values and pushes one (`EVERY`, `ANY`)
//! - `OPAQUE`: depends on contract-side state or control flow; not analysable here

use crate::script::errors::EncodingError;
use std::fmt;

/// How an instruction changes the stack height.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StackEffect {
    Fixed { pops: u8, pushes: u8 },
    Operand,
    Opaque,
}

const fn fixed(pops: u8, pushes: u8) -> StackEffect {
    StackEffect::Fixed { pops, pushes }
}

const OPERAND: StackEffect = StackEffect::Operand;
const OPAQUE: StackEffect = StackEffect::Opaque;

/// Invokes a callback macro with the complete opcode list.
#[macro_export]
macro_rules! for_each_opcode {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Core
            // =========================
            /// SKIP n ; conditional jump over following instructions
            Skip = 0, "SKIP" => OPAQUE,
            /// VAL i ; push constants[i]
            Val = 1, "VAL" => fixed(0, 1),
            /// DUP i ; push a copy of stack[i]
            Dup = 2, "DUP" => fixed(0, 1),
            /// ZIPMAP ; run a source over zipped constants
            Zipmap = 3, "ZIPMAP" => OPAQUE,
            /// DEBUG ; emit the stack as a contract event
            Debug = 4, "DEBUG" => fixed(0, 0),
            // =========================
            // Environment
            // =========================
            /// BLOCK_NUMBER ; push current block number
            BlockNumber = 5, "BLOCK_NUMBER" => fixed(0, 1),
            /// BLOCK_TIMESTAMP ; push current block timestamp
            BlockTimestamp = 6, "BLOCK_TIMESTAMP" => fixed(0, 1),
            /// SENDER ; push msg.sender
            Sender = 7, "SENDER" => fixed(0, 1),
            /// THIS_ADDRESS ; push the executing contract's address
            ThisAddress = 8, "THIS_ADDRESS" => fixed(0, 1),
            // =========================
            // Fixed point
            // =========================
            Scale18Mul = 9, "SCALE18_MUL" => OPAQUE,
            Scale18Div = 10, "SCALE18_DIV" => OPAQUE,
            Scale18 = 11, "SCALE18" => OPAQUE,
            ScaleN = 12, "SCALEN" => OPAQUE,
            ScaleBy = 13, "SCALE_BY" => OPAQUE,
            Scale18One = 14, "SCALE18_ONE" => OPAQUE,
            Scale18Decimals = 15, "SCALE18_DECIMALS" => OPAQUE,
            // =========================
            // Math
            // =========================
            Add = 16, "ADD" => OPAQUE,
            SaturatingAdd = 17, "SATURATING_ADD" => OPAQUE,
            Sub = 18, "SUB" => OPAQUE,
            SaturatingSub = 19, "SATURATING_SUB" => OPAQUE,
            Mul = 20, "MUL" => OPAQUE,
            SaturatingMul = 21, "SATURATING_MUL" => OPAQUE,
            Div = 22, "DIV" => OPAQUE,
            Mod = 23, "MOD" => OPAQUE,
            Exp = 24, "EXP" => OPAQUE,
            Min = 25, "MIN" => OPAQUE,
            Max = 26, "MAX" => OPAQUE,
            // =========================
            // Logic
            // =========================
            /// ISZERO ; a == 0
            IsZero = 27, "ISZERO" => fixed(1, 1),
            /// EAGER_IF ; cond ? a : b
            EagerIf = 28, "EAGER_IF" => fixed(3, 1),
            /// EQUAL_TO ; a == b
            EqualTo = 29, "EQUAL_TO" => fixed(2, 1),
            /// LESS_THAN ; a < b
            LessThan = 30, "LESS_THAN" => fixed(2, 1),
            /// GREATER_THAN ; a > b
            GreaterThan = 31, "GREATER_THAN" => fixed(2, 1),
            /// EVERY n ; first of the top n values if all are nonzero, else 0
            Every = 32, "EVERY" => OPERAND,
            /// ANY n ; first nonzero of the top n values, else 0
            Any = 33, "ANY" => OPERAND,
            // =========================
            // Tier
            // =========================
            Report = 34, "REPORT" => OPAQUE,
            Never = 35, "NEVER" => OPAQUE,
            Always = 36, "ALWAYS" => OPAQUE,
            SaturatingDiff = 37, "SATURATING_DIFF" => OPAQUE,
            UpdateBlocksForTierRange = 38, "UPDATE_BLOCKS_FOR_TIER_RANGE" => OPAQUE,
            SelectLte = 39, "SELECT_LTE" => OPAQUE,
            // =========================
            // Token standards
            // =========================
            Ierc20BalanceOf = 40, "IERC20_BALANCE_OF" => OPAQUE,
            Ierc20TotalSupply = 41, "IERC20_TOTAL_SUPPLY" => OPAQUE,
            Ierc721BalanceOf = 42, "IERC721_BALANCE_OF" => OPAQUE,
            Ierc721OwnerOf = 43, "IERC721_OWNER_OF" => OPAQUE,
            Ierc1155BalanceOf = 44, "IERC1155_BALANCE_OF" => OPAQUE,
            Ierc1155BalanceOfBatch = 45, "IERC1155_BALANCE_OF_BATCH" => OPAQUE,
            // =========================
            // Sale
            // =========================
            /// REMAINING_UNITS ; push units left for sale
            RemainingUnits = 46, "REMAINING_UNITS" => fixed(0, 1),
            /// TOTAL_RESERVE_IN ; push cumulative reserve raised
            TotalReserveIn = 47, "TOTAL_RESERVE_IN" => fixed(0, 1),
            /// LAST_BUY_BLOCK ; push block of the most recent buy
            LastBuyBlock = 48, "LAST_BUY_BLOCK" => fixed(0, 1),
            /// LAST_BUY_UNITS ; push units of the most recent buy
            LastBuyUnits = 49, "LAST_BUY_UNITS" => fixed(0, 1),
            /// LAST_BUY_PRICE ; push price of the most recent buy
            LastBuyPrice = 50, "LAST_BUY_PRICE" => fixed(0, 1),
            /// CURRENT_BUY_UNITS ; push units of the buy being priced
            CurrentBuyUnits = 51, "CURRENT_BUY_UNITS" => fixed(0, 1),
            /// TOKEN_ADDRESS ; push the sale token address
            TokenAddress = 52, "TOKEN_ADDRESS" => fixed(0, 1),
            /// RESERVE_ADDRESS ; push the reserve token address
            ReserveAddress = 53, "RESERVE_ADDRESS" => fixed(0, 1),
        }
    };
}

#[macro_export]
macro_rules! define_opcodes {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal => $effect:expr
        ),* $(,)?
    ) => {
        #[repr(u8)]
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        pub enum Opcode {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<u8> for Opcode {
            type Error = EncodingError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Opcode::$name), )*
                    _ => Err(EncodingError::InvalidOpcode {
                        opcode: value as u64,
                    }),
                }
            }
        }

        impl Opcode {
            /// Every opcode, in discriminant order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name, )* ];

            /// Returns the mnemonic for this opcode.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Opcode::$name => $mnemonic, )*
                }
            }

            /// Returns the stack effect used by depth analysis.
            pub const fn stack_effect(&self) -> StackEffect {
                match self {
                    $( Opcode::$name => $effect, )*
                }
            }

            /// Looks an opcode up by mnemonic (case-insensitive).
            pub fn from_mnemonic(name: &str) -> Result<Opcode, EncodingError> {
                match name.to_ascii_uppercase().as_str() {
                    $( $mnemonic => Ok(Opcode::$name), )*
                    _ => Err(EncodingError::InvalidOpcodeName {
                        name: name.to_string(),
                    }),
                }
            }
        }
    };
}

for_each_opcode!(define_opcodes);

impl Opcode {
    /// Resolves a raw numeric opcode, including values wider than the opcode field.
    pub fn from_raw(value: u64) -> Result<Opcode, EncodingError> {
        u8::try_from(value)
            .map_err(|_| EncodingError::InvalidOpcode { opcode: value })
            .and_then(Opcode::try_from)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_try_from_invalid() {
        assert_eq!(
            Opcode::try_from(0xFF),
            Err(EncodingError::InvalidOpcode { opcode: 0xFF })
        );
        assert_eq!(
            Opcode::try_from(54),
            Err(EncodingError::InvalidOpcode { opcode: 54 })
        );
    }

    #[test]
    fn from_raw_rejects_wide_values() {
        assert_eq!(
            Opcode::from_raw(0x1_06),
            Err(EncodingError::InvalidOpcode { opcode: 0x106 })
        );
        assert_eq!(Opcode::from_raw(6), Ok(Opcode::BlockTimestamp));
    }

    #[test]
    fn discriminants_are_dense() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(*op as usize, i);
            assert_eq!(Opcode::try_from(i as u8), Ok(*op));
        }
    }

    #[test]
    fn emitted_opcodes_have_pinned_values() {
        assert_eq!(Opcode::Val as u8, 0x01);
        assert_eq!(Opcode::BlockNumber as u8, 0x05);
        assert_eq!(Opcode::BlockTimestamp as u8, 0x06);
        assert_eq!(Opcode::LessThan as u8, 0x1e);
        assert_eq!(Opcode::GreaterThan as u8, 0x1f);
        assert_eq!(Opcode::Every as u8, 0x20);
        assert_eq!(Opcode::Any as u8, 0x21);
        assert_eq!(Opcode::TotalReserveIn as u8, 0x2f);
    }

    #[test]
    fn mnemonic_lookup_round_trips() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Ok(*op));
        }
        assert_eq!(
            Opcode::from_mnemonic("greater_than"),
            Ok(Opcode::GreaterThan)
        );
        assert!(matches!(
            Opcode::from_mnemonic("GT"),
            Err(EncodingError::InvalidOpcodeName { .. })
        ));
    }

    #[test]
    fn combinators_take_operand_arity() {
        assert_eq!(Opcode::Every.stack_effect(), StackEffect::Operand);
        assert_eq!(Opcode::Any.stack_effect(), StackEffect::Operand);
        assert_eq!(
            Opcode::GreaterThan.stack_effect(),
            StackEffect::Fixed { pops: 2, pushes: 1 }
        );
        assert_eq!(Opcode::Zipmap.stack_effect(), StackEffect::Opaque);
    }
}
