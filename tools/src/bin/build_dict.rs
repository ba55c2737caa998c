//! Build an indexed `.xdb` dictionary from one or more text dictionaries.
//!
//! Later inputs override earlier ones for the same `(word, attr)` pair.

use anyhow::{Context, Result};
use clap::Parser;
use libcws_core::lexicon::parse_text;
use libcws_core::{write_indexed, Charset};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Convert text dictionaries into an indexed .xdb file")]
struct Args {
    /// Text dictionaries (`word [tf [idf [attr]]]` per line)
    #[arg(long, num_args = 1.., required = true)]
    input: Vec<PathBuf>,

    #[arg(long, default_value = "dict.xdb")]
    output: PathBuf,

    /// Charset of the input files
    #[arg(long, default_value = "utf8")]
    charset: Charset,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut entries = Vec::new();
    for input in &args.input {
        let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let content = args
            .charset
            .decode(&bytes)
            .with_context(|| format!("decoding {} as {}", input.display(), args.charset))?;
        let parsed = parse_text(&content, input)?;
        println!("✓ {}: {} entries", input.display(), parsed.len());
        entries.extend(parsed);
    }

    let words = write_indexed(&args.output, entries)?;
    println!("Wrote {} words to {}", words, args.output.display());
    Ok(())
}
