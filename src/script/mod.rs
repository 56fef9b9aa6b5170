//! Condition programs for the sale VM.
//!
//! The sale contract decides which phase a sale is in by running a small
//! stack program. This module produces those programs and reads parameters
//! back out of them.
//!
//! # Program model
//!
//! - [`source::Source`]: one packed instruction sequence
//! - [`state_config::StateConfig`]: sources, constants, and stack sizing as
//!   the contract receives them
//!
//! # Modules
//!
//! - [`builder`]: Program builder and the sale rule builders
//! - [`errors`]: Encoding and decoding error types
//! - [`instruction`]: Fixed-width instruction layout and encoder
//! - [`introspect`]: Fingerprint matching and constant extraction
//! - [`opcode`]: Opcode table with mnemonics and stack effects
//! - [`source`]: Instruction sequences, hex form, and stack analysis
//! - [`state_config`]: State config artifact and its binary blob

pub mod builder;
pub mod errors;
pub mod instruction;
pub mod introspect;
pub mod opcode;
#[cfg(test)]
mod opcode_static_check;
pub mod source;
pub mod state_config;
