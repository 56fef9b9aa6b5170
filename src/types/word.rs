//! 256-bit unsigned integer used for program constants.
//!
//! The executing VM works on 32-byte words, so constants are carried at full
//! width instead of being squeezed into a machine integer. Only the handful of
//! operations the program builders and the introspector need are provided.

use sale_gate_derive::{BinaryCodec, Error};
use std::fmt;
use std::str::FromStr;

/// Word width in bytes.
pub const WORD_LEN: usize = 32;

/// Big-endian 256-bit unsigned integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BinaryCodec)]
pub struct Word(pub [u8; WORD_LEN]);

/// Errors produced while parsing a [`Word`] from text.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ParseWordError {
    #[error("empty number")]
    Empty,
    #[error("invalid digit in {token}")]
    InvalidDigit { token: String },
    #[error("number {token} does not fit in 256 bits")]
    Overflow { token: String },
}

impl Word {
    pub const ZERO: Word = Word([0u8; WORD_LEN]);
    pub const MAX: Word = Word([0xFF; WORD_LEN]);

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Subtracts `rhs` modulo 2^256.
    pub fn wrapping_sub(self, rhs: Word) -> Word {
        let mut out = [0u8; WORD_LEN];
        let mut borrow = 0i16;
        for i in (0..WORD_LEN).rev() {
            let mut diff = self.0[i] as i16 - rhs.0[i] as i16 - borrow;
            borrow = if diff < 0 {
                diff += 256;
                1
            } else {
                0
            };
            out[i] = diff as u8;
        }
        Word(out)
    }

    /// Returns the value as `u64` when it fits.
    pub fn to_u64(&self) -> Option<u64> {
        let (high, low) = self.0.split_at(WORD_LEN - 8);
        if high.iter().any(|&b| b != 0) {
            return None;
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(low);
        Some(u64::from_be_bytes(buf))
    }

    /// Returns the value as `i64` when it fits.
    pub fn to_i64(&self) -> Option<i64> {
        self.to_u64().and_then(|v| i64::try_from(v).ok())
    }

    /// Multiplies by `factor` and adds `addend`, failing on overflow.
    fn checked_mul_add(self, factor: u8, addend: u8) -> Option<Word> {
        let mut out = [0u8; WORD_LEN];
        let mut carry = addend as u32;
        for i in (0..WORD_LEN).rev() {
            let v = self.0[i] as u32 * factor as u32 + carry;
            out[i] = v as u8;
            carry = v >> 8;
        }
        (carry == 0).then_some(Word(out))
    }

    /// Divides by a small divisor in place and returns the remainder.
    fn div_rem_small(&mut self, divisor: u8) -> u8 {
        let mut rem = 0u32;
        for byte in self.0.iter_mut() {
            let cur = (rem << 8) | *byte as u32;
            *byte = (cur / divisor as u32) as u8;
            rem = cur % divisor as u32;
        }
        rem as u8
    }

    fn parse_radix(token: &str, digits: &str, radix: u8) -> Result<Word, ParseWordError> {
        if digits.is_empty() {
            return Err(ParseWordError::Empty);
        }
        let mut word = Word::ZERO;
        for c in digits.chars() {
            let digit = c
                .to_digit(radix as u32)
                .ok_or_else(|| ParseWordError::InvalidDigit {
                    token: token.to_string(),
                })?;
            word = word
                .checked_mul_add(radix, digit as u8)
                .ok_or_else(|| ParseWordError::Overflow {
                    token: token.to_string(),
                })?;
        }
        Ok(word)
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        let mut out = [0u8; WORD_LEN];
        out[WORD_LEN - 8..].copy_from_slice(&value.to_be_bytes());
        Word(out)
    }
}

impl From<u128> for Word {
    fn from(value: u128) -> Self {
        let mut out = [0u8; WORD_LEN];
        out[WORD_LEN - 16..].copy_from_slice(&value.to_be_bytes());
        Word(out)
    }
}

impl FromStr for Word {
    type Err = ParseWordError;

    /// Parses decimal, or hex with a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => Word::parse_radix(trimmed, hex, 16),
            None => Word::parse_radix(trimmed, trimmed, 10),
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut digits = Vec::with_capacity(78);
        let mut rest = *self;
        while !rest.is_zero() {
            digits.push(b'0' + rest.div_rem_small(10));
        }
        digits.reverse();
        f.write_str(std::str::from_utf8(&digits).map_err(|_| fmt::Error)?)
    }
}

impl fmt::LowerHex for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const U256_MAX_DEC: &str =
        "115792089237316195423570985008687907853269984665640564039457584007913129639935";

    #[test]
    fn from_u64_is_big_endian() {
        let w = Word::from(0x0102u64);
        assert_eq!(w.0[WORD_LEN - 2], 0x01);
        assert_eq!(w.0[WORD_LEN - 1], 0x02);
        assert!(w.0[..WORD_LEN - 2].iter().all(|&b| b == 0));
    }

    #[test]
    fn display_decimal() {
        assert_eq!(Word::ZERO.to_string(), "0");
        assert_eq!(Word::from(1_700_000_000u64).to_string(), "1700000000");
        assert_eq!(Word::from(u128::MAX).to_string(), u128::MAX.to_string());
        assert_eq!(Word::MAX.to_string(), U256_MAX_DEC);
    }

    #[test]
    fn parse_decimal_and_hex() {
        assert_eq!("99".parse::<Word>().unwrap(), Word::from(99u64));
        assert_eq!("0xff".parse::<Word>().unwrap(), Word::from(255u64));
        assert_eq!(U256_MAX_DEC.parse::<Word>().unwrap(), Word::MAX);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<Word>().unwrap_err(), ParseWordError::Empty);
        assert_eq!("0x".parse::<Word>().unwrap_err(), ParseWordError::Empty);
        assert!(matches!(
            "12a".parse::<Word>(),
            Err(ParseWordError::InvalidDigit { .. })
        ));
        assert!(matches!(
            "-1".parse::<Word>(),
            Err(ParseWordError::InvalidDigit { .. })
        ));
    }

    #[test]
    fn parse_rejects_overflow() {
        let too_big = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        assert!(matches!(
            too_big.parse::<Word>(),
            Err(ParseWordError::Overflow { .. })
        ));
    }

    #[test]
    fn wrapping_sub_borrows_across_bytes() {
        assert_eq!(
            Word::from(0x100u64).wrapping_sub(Word::from(1u64)),
            Word::from(0xFFu64)
        );
        assert_eq!(Word::ZERO.wrapping_sub(Word::from(1u64)), Word::MAX);
    }

    #[test]
    fn narrowing_conversions() {
        assert_eq!(Word::from(42u64).to_u64(), Some(42));
        assert_eq!(Word::from(u64::MAX).to_i64(), None);
        assert_eq!(Word::from(u128::MAX).to_u64(), None);
    }

    #[test]
    fn ordering_follows_magnitude() {
        assert!(Word::from(1u64) < Word::from(256u64));
        assert!(Word::from(u64::MAX) < Word::from(u128::MAX));
    }

    #[test]
    fn lower_hex_is_full_width() {
        let s = format!("{:x}", Word::from(1u64));
        assert_eq!(s.len(), 64);
        assert!(s.ends_with("01"));
    }
}
