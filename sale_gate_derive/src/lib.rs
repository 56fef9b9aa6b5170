//! Derive macros for the sale-gate crate.
//!
//! Provides:
//! - `#[derive(BinaryCodec)]` - binary framing for state configs and their parts
//! - `#[derive(Error)]` - `Display` and `Error` for error enums

mod binary_codec;
mod error;

use proc_macro::TokenStream;

/// Implements `Encode` and `Decode` for a struct, field by field.
#[proc_macro_derive(BinaryCodec)]
pub fn derive_binary_codec(input: TokenStream) -> TokenStream {
    binary_codec::derive_binary_codec(input)
}

/// Implements `Display` and `Error` for an error enum.
#[proc_macro_derive(Error, attributes(error))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
