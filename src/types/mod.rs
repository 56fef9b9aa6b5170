//! Primitive types shared by the program encoder and introspector.
//!
//! - `Word`: 256-bit constant values as the VM sees them
//! - `encoding`: deterministic binary codec used for state config blobs

pub mod encoding;
pub mod word;
