use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use ometa::CompileOptions;

/// Compile a grammar into Rust source that rebuilds it.
#[derive(Parser, Debug)]
#[command(name = "ometa", version)]
struct Args {
    /// Grammar file to compile.
    input: PathBuf,

    /// Where to write the generated Rust source.
    output: PathBuf,

    /// Name of the grammar, defaults to the input file stem.
    #[arg(short, long)]
    name: Option<String>,

    /// Run the null optimizer over the parsed grammar.
    #[arg(long)]
    optimize: bool,

    /// Also print the compiled grammar in grammar notation.
    #[arg(long)]
    print: bool,

    /// Increase logging verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        ConfigBuilder::new().set_time_format_custom(&[]).build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .context("input path has no file name")?,
    };
    let options = CompileOptions {
        name,
        optimize: args.optimize,
    };

    let grammar = ometa::compile_options(&text, &options)
        .with_context(|| format!("failed to compile {}", args.input.display()))?;
    info!(
        "compiled {} with {} rules",
        options.name,
        grammar.rules().len()
    );
    if args.print {
        print!("{}", grammar);
    }

    let source = ometa_codegen::emit(&grammar).context("failed to emit grammar")?;
    fs::write(&args.output, source)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    Ok(())
}
