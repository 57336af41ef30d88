//! Compiles the metagrammar with the seed parser and writes the result out as
//! Rust, so the crate carries a pinned first generation and never needs the
//! seed at runtime.

use std::env;
use std::error::Error;
use std::fs;
use std::path::Path;

use ometa_grammar::{seed, TreeBuilder};

const METAGRAMMAR: &str = "grammars/metagrammar.ometa";
const GRAMMAR_NAME: &str = "OMeta";

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed={}", METAGRAMMAR);

    let text = fs::read_to_string(METAGRAMMAR)?;
    let grammar = seed::parse_grammar(&text, GRAMMAR_NAME, &TreeBuilder::new())?;
    let source = ometa_codegen::emit(&grammar)?;

    let out = Path::new(&env::var("OUT_DIR")?).join("metagrammar.rs");
    fs::write(out, source)?;
    Ok(())
}
