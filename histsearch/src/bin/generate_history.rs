//! Generate a synthetic history file (JSON lines) for manual testing and benchmarks.
//!
//! Usage:
//!     cargo run --release --bin generate-history -- --count 100000 history.jsonl
//!
//! Writes to stdout when no output path is given.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rand::seq::SliceRandom;
use rand::Rng;

use histsearch::RowItem;

const COMMANDS: &[&str] = &[
    "kubectl get pods -n {}",
    "kubectl logs -f {}",
    "git checkout {}",
    "git commit -m \"{}\"",
    "cargo test -p {}",
    "docker compose up {}",
    "ssh {}.internal",
    "vim {}.rs",
    "grep -rn {} src/",
    "make {}",
];

const WORDS: &[&str] = &[
    "api", "worker", "main", "release", "fix-login", "histsearch", "db", "cache", "frontend",
    "staging", "build", "deploy", "ingest", "metrics", "auth",
];

#[derive(Parser, Debug)]
#[command(name = "generate-history")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of rows to generate
    #[arg(short, long, default_value_t = 10_000)]
    count: usize,

    /// Output file (stdout if omitted)
    output: Option<PathBuf>,
}

fn generate_row(rng: &mut impl Rng, idx: usize, time: f64) -> RowItem {
    let template = COMMANDS.choose(rng).copied().unwrap_or("true");
    let word = WORDS.choose(rng).copied().unwrap_or("x");
    let mut content = template.replace("{}", word);
    // A few multi-line entries, like pasted scripts
    if rng.gen_bool(0.02) {
        content.push_str("\necho done");
    }
    RowItem {
        deleted: rng.gen_bool(0.01),
        favorite: rng.gen_bool(0.05),
        time: Some(format!("{:.3}", time)),
        exit_code: if rng.gen_bool(0.1) { 1 } else { 0 },
        idx: idx as i64,
        content,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = rand::thread_rng();

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(out);

    // Newest first, a few seconds to a few minutes apart
    let mut time = Utc::now().timestamp() as f64;
    for idx in 0..args.count {
        let row = generate_row(&mut rng, idx, time);
        serde_json::to_writer(&mut out, &row)?;
        out.write_all(b"\n")?;
        time -= rng.gen_range(2.0..300.0);
    }
    out.flush()?;

    eprintln!("Generated {} history rows", args.count);
    Ok(())
}
