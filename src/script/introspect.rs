//! Recovers parameters from condition programs this crate generates.
//!
//! Matching is on the whole entry source, byte for byte, against a fixed
//! allow-list. Anything else is reported as absent rather than guessed at:
//! stack lengths and instruction order may differ between equivalent
//! programs, and a partial decode could return the wrong constant.
//!
//! If more program shapes are ever needed, replace the allow-list with a
//! structural decoder over [`Source::instructions`](crate::script::source::Source::instructions).

use crate::debug;
use crate::sale::SaleStatus;
use crate::script::state_config::StateConfig;
use crate::types::word::Word;
use chrono::{DateTime, Utc};

/// `BLOCK_TIMESTAMP VAL0 GREATER_THAN`.
pub const AFTER_TIMESTAMP: &[u8] = &[0x06, 0x00, 0x01, 0x00, 0x1f, 0x00];

/// The raise-or-grace program, see
/// [`after_timestamp_end_with_raise_or_grace`](crate::script::builder::after_timestamp_end_with_raise_or_grace).
pub const AFTER_TIMESTAMP_END_WITH_RAISE_OR_GRACE: &[u8] = &[
    0x06, 0x00, 0x01, 0x00, 0x1f, 0x00, // BLOCK_TIMESTAMP VAL0 GREATER_THAN
    0x2f, 0x00, 0x01, 0x02, 0x1e, 0x00, // TOTAL_RESERVE_IN VAL2 LESS_THAN
    0x20, 0x02, // EVERY 2
    0x06, 0x00, 0x01, 0x01, 0x1f, 0x00, // BLOCK_TIMESTAMP VAL1 GREATER_THAN
    0x21, 0x02, // ANY 2
];

/// After-timestamp under the VM's earlier opcode numbering. Read-only.
pub const LEGACY_AFTER_TIMESTAMP: &[u8] = &[0x05, 0x00, 0x01, 0x00, 0x0b, 0x00];

/// A recognised program shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fingerprint {
    AfterTimestamp,
    AfterTimestampEndWithRaiseOrGrace,
    LegacyAfterTimestamp,
}

impl Fingerprint {
    /// Every recognised shape with its exact bytes.
    pub const KNOWN: &'static [(Fingerprint, &'static [u8])] = &[
        (Fingerprint::AfterTimestamp, AFTER_TIMESTAMP),
        (
            Fingerprint::AfterTimestampEndWithRaiseOrGrace,
            AFTER_TIMESTAMP_END_WITH_RAISE_OR_GRACE,
        ),
        (Fingerprint::LegacyAfterTimestamp, LEGACY_AFTER_TIMESTAMP),
    ];

    pub const fn bytes(&self) -> &'static [u8] {
        match self {
            Fingerprint::AfterTimestamp => AFTER_TIMESTAMP,
            Fingerprint::AfterTimestampEndWithRaiseOrGrace => {
                AFTER_TIMESTAMP_END_WITH_RAISE_OR_GRACE
            }
            Fingerprint::LegacyAfterTimestamp => LEGACY_AFTER_TIMESTAMP,
        }
    }

    /// The phase this condition moves the sale out of: start conditions end
    /// `Pending`, the raise-or-grace end condition ends `Active`.
    pub const fn gated_phase(&self) -> SaleStatus {
        match self {
            Fingerprint::AfterTimestamp | Fingerprint::LegacyAfterTimestamp => {
                SaleStatus::Pending
            }
            Fingerprint::AfterTimestampEndWithRaiseOrGrace => SaleStatus::Active,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Fingerprint::AfterTimestamp => "after-timestamp",
            Fingerprint::AfterTimestampEndWithRaiseOrGrace => {
                "after-timestamp-end-with-raise-or-grace"
            }
            Fingerprint::LegacyAfterTimestamp => "legacy-after-timestamp",
        }
    }
}

/// Identifies the entry source of `config`, if it is a known shape.
pub fn fingerprint(config: &StateConfig) -> Option<Fingerprint> {
    let source = config.entry_source()?;
    let found = Fingerprint::KNOWN
        .iter()
        .find(|(_, bytes)| source.as_bytes() == *bytes)
        .map(|(fp, _)| *fp);
    if found.is_none() {
        debug!("unrecognised program {source}");
    }
    found
}

/// Returns `constants[index]` of a recognised program.
pub fn extract_constant(config: &StateConfig, index: usize) -> Option<Word> {
    fingerprint(config)?;
    config.constant(index)
}

/// Integer view: the constant as elapsed seconds, absent when it does not fit in `u64`.
pub fn extract_timestamp(config: &StateConfig, index: usize) -> Option<u64> {
    extract_constant(config, index)?.to_u64()
}

/// Date view: the constant as a Unix timestamp in seconds.
pub fn extract_date(config: &StateConfig, index: usize) -> Option<DateTime<Utc>> {
    let secs = extract_constant(config, index)?.to_i64()?;
    DateTime::from_timestamp(secs, 0)
}
