use clap::Parser;
use libcws::{AttrFilter, Config, DictMode, DictSpec, MultiMode, Segmenter};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Segment Chinese text read from a file or stdin.
#[derive(Parser, Debug)]
#[command(name = "libcws", version, about)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dictionary to load; repeat to stack several (last one wins ties)
    #[arg(short, long)]
    dict: Vec<PathBuf>,

    /// Dictionary mode bits: 1 = indexed, 2 = memory, 4 = text (guessed from the extension when absent)
    #[arg(long)]
    dict_mode: Option<u32>,

    /// Rule file (TOML)
    #[arg(short, long)]
    rule: Option<PathBuf>,

    /// Input charset: utf8 or gbk
    #[arg(long)]
    charset: Option<String>,

    /// Drop punctuation from the output
    #[arg(short, long)]
    ignore: bool,

    /// Multi mode bits: 1 = short, 2 = duality, 4 = zmain, 8 = zall
    #[arg(short, long)]
    multi: Option<u32>,

    /// Pair up runs of unknown single characters
    #[arg(long)]
    duality: bool,

    /// Print the N heaviest keywords instead of the segmentation
    #[arg(short, long, value_name = "N")]
    tops: Option<usize>,

    /// Attribute filter, e.g. "n,v" or "~w"
    #[arg(short, long, default_value = "")]
    attr: String,

    /// Show attributes next to each word
    #[arg(short = 'A', long)]
    show_attr: bool,

    /// Report loading progress on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Input file; stdin when absent
    input: Option<PathBuf>,
}

fn build_config(args: &Args) -> libcws::Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::load_toml(path)?,
        None => Config::default(),
    };
    if let Some(name) = &args.charset {
        cfg.charset = name.parse()?;
    }
    for path in &args.dict {
        let mut spec = DictSpec::new(path.clone());
        if let Some(bits) = args.dict_mode {
            let mode = DictMode::from_bits(bits)?;
            spec.format = Some(mode.format);
            spec.in_memory = mode.in_memory;
        }
        cfg.dictionaries.push(spec);
    }
    if let Some(rule) = &args.rule {
        cfg.rule = Some(rule.clone());
    }
    if let Some(bits) = args.multi {
        cfg.multi = MultiMode::from_bits(bits)?;
    }
    cfg.ignore_punctuation |= args.ignore;
    cfg.duality |= args.duality;
    Ok(cfg)
}

fn read_input(args: &Args) -> io::Result<Vec<u8>> {
    match &args.input {
        Some(path) => std::fs::read(path),
        None => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = build_config(&args)?;
    if args.verbose {
        for spec in &cfg.dictionaries {
            eprintln!("loading dictionary {}", spec.path.display());
        }
        if let Some(rule) = &cfg.rule {
            eprintln!("loading rules {}", rule.display());
        }
    }
    let mut seg = Segmenter::from_config(cfg)?;
    if args.verbose {
        eprintln!(
            "✓ libcws {} ready ({} dictionaries, {} rules)",
            seg.version(),
            seg.dictionary().len(),
            seg.rules().len()
        );
    }

    let filter: AttrFilter = args.attr.parse()?;
    let input = read_input(&args)?;
    seg.submit_bytes(&input)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(n) = args.tops {
        for (i, w) in seg.tops(Some(n), &filter)?.iter().enumerate() {
            writeln!(out, "{:>3}. {}/{}\t{:.2}\t{}", i + 1, w.word, w.attr, w.weight, w.times)?;
        }
        return Ok(());
    }

    while let Some(batch) = seg.next_batch()? {
        for t in batch.iter().filter(|t| filter.matches(&t.attr)) {
            if t.text.contains('\n') {
                writeln!(out)?;
            } else if t.text.trim().is_empty() {
                continue;
            } else if args.show_attr {
                write!(out, "{}/{} ", t.text, t.attr)?;
            } else {
                write!(out, "{} ", t.text)?;
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("⚠ {}", e);
            ExitCode::FAILURE
        }
    }
}
