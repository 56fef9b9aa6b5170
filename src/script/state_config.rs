//! The artifact handed to the sale contract: sources, constants, and stack sizing.
//!
//! A [`StateConfig`] is built once, serialized, and treated as immutable from
//! then on. [`StateConfig::to_bytes`] produces the framed binary blob that
//! [`StateConfig::from_bytes`] reads back.

use crate::script::errors::ScriptError;
use crate::script::instruction::LAYOUT;
use crate::script::source::Source;
use crate::types::encoding::{Decode, Encode};
use crate::types::word::Word;
use sale_gate_derive::BinaryCodec;
use std::fmt;
use std::fs;
use std::path::Path;

/// Magic bytes identifying a serialized state config.
const MAGIC: &[u8; 7] = b"SALE_SC";

/// Current blob format version.
const CURRENT_VERSION: Version = Version::new(1, 0, 0);

#[derive(Debug, PartialEq, Eq, BinaryCodec)]
struct Version {
    major: u8,
    minor: u8,
    patch: u8,
}

impl Version {
    const fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

/// Complete condition program for the external VM.
#[derive(Clone, Debug, PartialEq, Eq, BinaryCodec)]
pub struct StateConfig {
    /// Program fragments; the builders here only produce one.
    pub sources: Vec<Source>,
    /// Values referenced by `VAL` instructions, by position.
    pub constants: Vec<Word>,
    /// Stack slots the VM reserves; never less than the program needs.
    pub stack_length: u32,
    /// Runtime-supplied values; always 0 for sale conditions.
    pub arguments_length: u32,
}

impl StateConfig {
    /// Returns the first source, the one the sale contract evaluates.
    pub fn entry_source(&self) -> Option<&Source> {
        self.sources.first()
    }

    /// Returns the constant at `index`, if present.
    pub fn constant(&self, index: usize) -> Option<Word> {
        self.constants.get(index).copied()
    }

    /// Serializes with magic, format version, and instruction layout version.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        MAGIC.encode(&mut out);
        CURRENT_VERSION.encode(&mut out);
        LAYOUT.version.encode(&mut out);
        self.encode(&mut out);
        out
    }

    /// Deserializes a blob produced by [`StateConfig::to_bytes`].
    pub fn from_bytes(mut input: &[u8]) -> Result<Self, ScriptError> {
        if input.len() < MAGIC.len() {
            return Err(ScriptError::DecodeError {
                reason: "truncated".to_string(),
            });
        }

        if &<[u8; 7]>::decode(&mut input)? != MAGIC {
            return Err(ScriptError::DecodeError {
                reason: "bad magic".to_string(),
            });
        }

        if Version::decode(&mut input)? != CURRENT_VERSION {
            return Err(ScriptError::DecodeError {
                reason: "unsupported version".to_string(),
            });
        }

        if u8::decode(&mut input)? != LAYOUT.version {
            return Err(ScriptError::DecodeError {
                reason: "unsupported instruction layout".to_string(),
            });
        }

        let config = StateConfig::decode(&mut input)?;
        if !input.is_empty() {
            return Err(ScriptError::DecodeError {
                reason: "trailing bytes".to_string(),
            });
        }
        Ok(config)
    }

    /// Reads a serialized config from disk.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let path_ref = path.as_ref();
        let bytes = fs::read(path_ref).map_err(|e| ScriptError::IoError {
            path: path_ref.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_bytes(&bytes)
    }

    /// Writes the serialized config to disk.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ScriptError> {
        let path_ref = path.as_ref();
        fs::write(path_ref, self.to_bytes()).map_err(|e| ScriptError::IoError {
            path: path_ref.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// Renders the tuple form the sale contract's ABI takes.
impl fmt::Display for StateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ sources: [")?;
        for (i, source) in self.sources.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{source}")?;
        }
        f.write_str("], constants: [")?;
        for (i, constant) in self.constants.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{constant}")?;
        }
        write!(
            f,
            "], stackLength: {}, argumentsLength: {} }}",
            self.stack_length, self.arguments_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StateConfig {
        StateConfig {
            sources: vec![Source::from_hex("0x060001001f00").unwrap()],
            constants: vec![Word::from(1_700_000_000u64)],
            stack_length: 3,
            arguments_length: 0,
        }
    }

    #[test]
    fn roundtrip_blob() {
        let config = sample();
        let decoded = StateConfig::from_bytes(&config.to_bytes()).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn roundtrip_empty_config() {
        let config = StateConfig {
            sources: vec![],
            constants: vec![],
            stack_length: 0,
            arguments_length: 0,
        };
        let decoded = StateConfig::from_bytes(&config.to_bytes()).unwrap();
        assert!(decoded.sources.is_empty());
        assert!(decoded.entry_source().is_none());
    }

    #[test]
    fn from_bytes_truncated() {
        let err = StateConfig::from_bytes(&[0x00, 0x01]).unwrap_err();
        assert!(matches!(err, ScriptError::DecodeError { ref reason } if reason == "truncated"));
    }

    #[test]
    fn from_bytes_bad_magic() {
        let err = StateConfig::from_bytes(b"BADMAGI\x01\x00\x00").unwrap_err();
        assert!(matches!(err, ScriptError::DecodeError { ref reason } if reason == "bad magic"));
    }

    #[test]
    fn from_bytes_unsupported_version() {
        let mut bytes = Vec::new();
        MAGIC.encode(&mut bytes);
        Version::new(9, 0, 0).encode(&mut bytes);
        let err = StateConfig::from_bytes(&bytes).unwrap_err();
        assert!(
            matches!(err, ScriptError::DecodeError { ref reason } if reason == "unsupported version")
        );
    }

    #[test]
    fn from_bytes_other_layout() {
        let mut bytes = Vec::new();
        MAGIC.encode(&mut bytes);
        CURRENT_VERSION.encode(&mut bytes);
        (LAYOUT.version + 1).encode(&mut bytes);
        let err = StateConfig::from_bytes(&bytes).unwrap_err();
        assert!(
            matches!(err, ScriptError::DecodeError { ref reason } if reason == "unsupported instruction layout")
        );
    }

    #[test]
    fn from_bytes_trailing_bytes() {
        let mut bytes = sample().to_bytes();
        bytes.push(0xFF);
        let err = StateConfig::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ScriptError::DecodeError { ref reason } if reason == "trailing bytes"));
    }

    #[test]
    fn from_bytes_cut_short() {
        let bytes = sample().to_bytes();
        let err = StateConfig::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, ScriptError::DecodeError { .. }));
    }

    #[test]
    fn display_tuple_form() {
        assert_eq!(
            sample().to_string(),
            "{ sources: [0x060001001f00], constants: [1700000000], stackLength: 3, argumentsLength: 0 }"
        );
    }

    #[test]
    fn constant_out_of_range_is_none() {
        assert_eq!(sample().constant(0), Some(Word::from(1_700_000_000u64)));
        assert_eq!(sample().constant(1), None);
    }
}
