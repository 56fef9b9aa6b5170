//! Derive macro for binary serialization of structs.
//!
//! Fields are written in declaration order using the crate's
//! `types::encoding` traits:
//! - Integers: little-endian, fixed-width
//! - Arrays: elements back to back, no length prefix
//! - Vec: u64 length prefix followed by the elements
//!
//! ```ignore
//! #[derive(BinaryCodec)]
//! pub struct StateConfig {
//!     pub sources: Vec<Source>,
//!     pub constants: Vec<Word>,
//!     pub stack_length: u32,
//!     pub arguments_length: u32,
//! }
//! ```
//!
//! Enums and unions are rejected; the state config format has no tagged data.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

pub fn derive_binary_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Struct(data_struct) = &input.data else {
        return syn::Error::new_spanned(&input, "BinaryCodec derive only supports structs")
            .to_compile_error()
            .into();
    };

    let (encode_body, decode_body) = match &data_struct.fields {
        Fields::Named(fields) => {
            let names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
            (
                quote! {
                    #( crate::types::encoding::Encode::encode(&self.#names, out); )*
                },
                quote! {
                    Ok(Self {
                        #( #names: crate::types::encoding::Decode::decode(input)?, )*
                    })
                },
            )
        }
        Fields::Unnamed(fields) => {
            let indices: Vec<_> = (0..fields.unnamed.len()).map(syn::Index::from).collect();
            let decodes = indices.iter().map(|_| {
                quote! { crate::types::encoding::Decode::decode(input)?, }
            });
            (
                quote! {
                    #( crate::types::encoding::Encode::encode(&self.#indices, out); )*
                },
                quote! {
                    Ok(Self( #(#decodes)* ))
                },
            )
        }
        Fields::Unit => (quote! { let _ = out; }, quote! { let _ = input; Ok(Self) }),
    };

    let expanded = quote! {
        impl #impl_generics crate::types::encoding::Encode for #name #ty_generics #where_clause {
            fn encode<S: crate::types::encoding::EncodeSink>(&self, out: &mut S) {
                #encode_body
            }
        }

        impl #impl_generics crate::types::encoding::Decode for #name #ty_generics #where_clause {
            fn decode(input: &mut &[u8]) -> ::std::result::Result<Self, crate::types::encoding::DecodeError> {
                #decode_body
            }
        }
    };

    TokenStream::from(expanded)
}
