//! Derive macro for error enums.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations from
//! one `#[error("...")]` attribute per variant.
//!
//! ```ignore
//! use sale_gate_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum EncodingError {
//!     #[error("invalid opcode: {opcode}")]
//!     InvalidOpcode { opcode: u8 },
//!
//!     #[error("bad hex: {0}")]
//!     BadHex(String),
//!
//!     #[error("empty source")]
//!     Empty,
//! }
//! ```
//!
//! Tuple fields are referenced positionally (`{0}`), named fields by name.
//! Every field must appear in the message.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Lit, Meta, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Error derive only supports enums",
        ));
    };

    let arms = data_enum
        .variants
        .iter()
        .map(|variant| {
            let variant_name = &variant.ident;
            let message = error_message(variant)?;

            Ok(match &variant.fields {
                Fields::Unit => quote! {
                    Self::#variant_name => write!(f, #message),
                },
                Fields::Unnamed(fields) => {
                    let bindings: Vec<_> = (0..fields.unnamed.len())
                        .map(|i| quote::format_ident!("f{}", i))
                        .collect();
                    let message = positional_to_named(&message, bindings.len());
                    quote! {
                        Self::#variant_name(#(#bindings),*) => write!(f, #message, #(#bindings = #bindings),*),
                    }
                }
                Fields::Named(fields) => {
                    let bindings: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                    quote! {
                        Self::#variant_name { #(#bindings),* } => write!(f, #message, #(#bindings = #bindings),*),
                    }
                }
            })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#arms)*
                }
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Reads the string literal out of a variant's `#[error("...")]` attribute.
fn error_message(variant: &syn::Variant) -> syn::Result<String> {
    for attr in &variant.attrs {
        if !attr.path().is_ident("error") {
            continue;
        }
        let Meta::List(list) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                &attr.meta,
                "use #[error(\"message\")] to describe the error",
            ));
        };
        return match syn::parse2::<Lit>(list.tokens.clone()) {
            Ok(Lit::Str(s)) => Ok(s.value()),
            _ => Err(syn::Error::new_spanned(
                &attr.meta,
                "#[error] expects a string literal, e.g. #[error(\"invalid opcode: {0}\")]",
            )),
        };
    }

    Err(syn::Error::new_spanned(
        &variant.ident,
        format!(
            "missing #[error(\"...\")] on variant `{}`",
            variant.ident
        ),
    ))
}

/// Rewrites `{0}`, `{1}` into `{f0}`, `{f1}` so tuple fields bind by name.
fn positional_to_named(message: &str, count: usize) -> String {
    let mut out = message.to_string();
    for i in (0..count).rev() {
        out = out.replace(&format!("{{{i}}}"), &format!("{{f{i}}}"));
        out = out.replace(&format!("{{{i}:"), &format!("{{f{i}:"));
    }
    out
}
