//! Sale gating condition programs.
//!
//! Encodes phase conditions for a token sale into bytecode for the sale
//! contract's stack VM, and recovers their parameters from deployed configs.

pub mod sale;
pub mod script;
pub mod types;
pub mod utils;
