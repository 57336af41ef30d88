//! Derive a grammar accessor from grammar text.
//!
//! ```ignore
//! #[derive(Grammar)]
//! #[grammar_file = "grammars/csv.ometa"]
//! pub struct Csv;
//!
//! let tree = Csv::grammar()?;
//! ```
//!
//! The grammar is compiled when the macro expands, so malformed grammars are
//! compile errors. The generated code refers to `ometa_grammar`, which the
//! deriving crate has to depend on.

use proc_macro2::Span;
use syn::{parse_macro_input, DeriveInput};

mod error;
mod generate;

#[proc_macro_derive(Grammar, attributes(grammar_file, grammar_inline))]
pub fn derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let expanded = generate::generate(ast)
        .unwrap_or_else(|e| syn::Error::new(Span::call_site(), e).to_compile_error());
    proc_macro::TokenStream::from(expanded)
}
