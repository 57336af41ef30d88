use proc_macro2::TokenStream;
use quote::quote;
use std::env;
use std::fs;
use std::path::Path;
use syn::{Attribute, DeriveInput, Generics, Ident, Lit, Meta};

use ometa_grammar::Node;

use crate::error::{DeriveError, Result};

const GRAMMAR_FILE_ATTR: &str = "grammar_file";
const GRAMMAR_INLINE_ATTR: &str = "grammar_inline";

pub fn generate(ast: DeriveInput) -> Result<TokenStream> {
    let grammar = grammar_from_ast(&ast)?;
    generate_impl(&ast.ident, &ast.generics, &grammar)
}

/// Load and compile the grammar named by a derive attribute.
///
/// There must be exactly 1 attribute specifying the grammar source. The source
/// may either be written inline, or be a path to a grammar file relative to the
/// crate root. The grammar is named after the type.
fn grammar_from_ast(ast: &DeriveInput) -> Result<Node> {
    let sources: Vec<&Attribute> = ast
        .attrs
        .iter()
        .filter(|attr| match attr.parse_meta() {
            Ok(Meta::NameValue(val)) => {
                val.path.is_ident(GRAMMAR_FILE_ATTR) || val.path.is_ident(GRAMMAR_INLINE_ATTR)
            }
            _ => false,
        })
        .collect();

    let source_attr = match sources.len() {
        0 => return Err(DeriveError::MissingGrammarSource),
        1 => sources[0],
        _ => return Err(DeriveError::MultipleGrammarSources),
    };

    let text = match source_attr.parse_meta()? {
        Meta::NameValue(val) => match val.lit {
            Lit::Str(s) if val.path.is_ident(GRAMMAR_FILE_ATTR) => read_grammar_file(&s.value())?,
            Lit::Str(s) => s.value(),
            _ => return Err(DeriveError::NotAString),
        },
        _ => return Err(DeriveError::NotAString),
    };

    Ok(ometa::compile(&text, &ast.ident.to_string())?)
}

fn read_grammar_file(file: &str) -> Result<String> {
    let root = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into());
    let path = Path::new(&root).join(file);
    fs::read_to_string(&path).map_err(|e| DeriveError::Io {
        path: path.to_string_lossy().into_owned(),
        message: e.to_string(),
    })
}

/// Generate an associated `grammar()` function rebuilding the compiled tree.
fn generate_impl(name: &Ident, generics: &Generics, grammar: &Node) -> Result<TokenStream> {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let body = ometa_codegen::emit_body(grammar)?;

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub fn grammar() -> ::std::result::Result<::ometa_grammar::Node, ::ometa_grammar::BuildError> {
                use ::ometa_grammar::Builder as _;
                let b = ::ometa_grammar::TreeBuilder::new();
                Ok(#body)
            }
        }
    })
}
