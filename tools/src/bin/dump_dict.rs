//! List the entries of an indexed `.xdb` dictionary.

use anyhow::Result;
use clap::Parser;
use libcws_core::IndexedLexicon;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Print the words stored in an indexed dictionary")]
struct Args {
    #[arg(long)]
    input: PathBuf,

    /// Only words starting with this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Stop after this many words
    #[arg(long)]
    limit: Option<usize>,

    /// One JSON object per line instead of the text dictionary format
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Row<'a> {
    word: &'a str,
    attr: &'a str,
    tf: f32,
    idf: f32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let lexicon = IndexedLexicon::open(&args.input, 16)?;
    eprintln!(
        "{}: {} words, longest {} chars",
        args.input.display(),
        lexicon.len(),
        lexicon.max_chars()
    );

    let prefix = args.prefix.as_deref().unwrap_or("");
    let limit = args.limit.unwrap_or(usize::MAX);
    let entries = lexicon.entries()?;
    for (word, senses) in entries.iter().filter(|(w, _)| w.starts_with(prefix)).take(limit) {
        for s in senses {
            if args.json {
                let row = Row {
                    word,
                    attr: &s.attr,
                    tf: s.tf,
                    idf: s.idf,
                };
                println!("{}", serde_json::to_string(&row)?);
            } else {
                println!("{}\t{}\t{}\t{}", word, s.tf, s.idf, s.attr);
            }
        }
    }
    Ok(())
}
