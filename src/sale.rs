//! Sale lifecycle phases.

use crate::script::errors::ScriptError;
use std::fmt;

/// Phase of a sale, as reported by the sale contract.
///
/// `Pending -> Active` is driven by the start condition; `Active -> Success`
/// or `Active -> Fail` by the end condition.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SaleStatus {
    Pending = 0,
    Active = 1,
    Success = 2,
    Fail = 3,
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 4] = [
        SaleStatus::Pending,
        SaleStatus::Active,
        SaleStatus::Success,
        SaleStatus::Fail,
    ];

    /// True once the sale can no longer change phase.
    pub const fn is_final(&self) -> bool {
        matches!(self, SaleStatus::Success | SaleStatus::Fail)
    }

    /// Phases the sale can move to when this phase's condition holds.
    pub const fn successors(&self) -> &'static [SaleStatus] {
        match self {
            SaleStatus::Pending => &[SaleStatus::Active],
            SaleStatus::Active => &[SaleStatus::Success, SaleStatus::Fail],
            SaleStatus::Success | SaleStatus::Fail => &[],
        }
    }
}

impl TryFrom<u8> for SaleStatus {
    type Error = ScriptError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SaleStatus::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| ScriptError::DecodeError {
                reason: format!("invalid sale status: {value}"),
            })
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SaleStatus::Pending => "Pending",
            SaleStatus::Active => "Active",
            SaleStatus::Success => "Success",
            SaleStatus::Fail => "Fail",
        })
    }
}
