//! Headless histsearch session.
//!
//! Loads a history corpus and replays an event script from stdin, one event
//! per line:
//!
//! ```text
//! query kubectl get     # full edit-buffer text after "query "
//! next | prev           # move the cursor
//! show                  # print the current snapshot to stderr
//! select | paste | abort
//! ```
//!
//! The session result goes to stdout and the process exits with its status
//! (111 = run the selected command). End of input behaves like `abort`.
//!
//! Usage:
//!     histsearch --history ~/.histsearch/history.jsonl < events.txt
//!     histsearch --demo 2000 --query kubectl < events.txt

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use histsearch::history::{demo_records, load_jsonl};
use histsearch::{Query, SearchConfig, SearchController, SessionOutcome, Snapshot};

const DEFAULT_DEMO_RECORDS: usize = 200;

#[derive(Parser, Debug)]
#[command(name = "histsearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON-lines history file
    #[arg(long, conflicts_with = "demo")]
    history: Option<PathBuf>,

    /// Use N generated `kubectl get pod{i}` records instead of a history file
    #[arg(long)]
    demo: Option<usize>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long)]
    log_level: Option<String>,

    /// Initial edit-buffer text
    #[arg(short, long, default_value = "")]
    query: String,

    /// Rows the (virtual) display can show
    #[arg(long)]
    rows: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Query(String),
    Next,
    Prev,
    Show,
    Select,
    Paste,
    Abort,
}

fn parse_event(line: &str) -> Option<Event> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(rest) = line.strip_prefix("query") {
        if rest.is_empty() {
            return Some(Event::Query(String::new()));
        }
        return rest.strip_prefix(' ').map(|q| Event::Query(q.to_string()));
    }
    match line.trim() {
        "next" => Some(Event::Next),
        "prev" => Some(Event::Prev),
        "show" => Some(Event::Show),
        "select" => Some(Event::Select),
        "paste" => Some(Event::Paste),
        "abort" => Some(Event::Abort),
        _ => None,
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Print the visible rows, then a status line with the query terms shortest first.
fn render(snapshot: &Snapshot, query: &Query, out: &mut impl Write) -> io::Result<()> {
    let rows = snapshot.displayed_count.min(snapshot.len());
    for (i, result) in snapshot.results.iter().take(rows).enumerate() {
        let marker = if i == snapshot.highlighted { '>' } else { ' ' };
        writeln!(out, "{} {}", marker, result.highlighted)?;
    }
    writeln!(
        out,
        "-- {} results, generation {}, terms [{}]",
        snapshot.len(),
        snapshot.generation,
        query.terms().join(" ")
    )
}

fn run(cli: Cli) -> Result<SessionOutcome> {
    let config = match &cli.config {
        Some(path) => SearchConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SearchConfig::default(),
    };
    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_level))?;

    let records = match &cli.history {
        Some(path) => load_jsonl(path)
            .with_context(|| format!("Failed to load history {}", path.display()))?,
        None => demo_records(cli.demo.unwrap_or(DEFAULT_DEMO_RECORDS)),
    };
    info!(record_count = records.len(), "loaded corpus");

    let controller = SearchController::builder(records)
        .config(config)
        .initial_query(cli.query.clone())
        .build()
        .context("Failed to start search session")?;
    if let Some(rows) = cli.rows {
        controller.set_displayed_count(rows);
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read event")?;
        let Some(event) = parse_event(&line) else {
            if !line.trim().is_empty() {
                tracing::warn!(line = %line, "ignoring unknown event");
            }
            continue;
        };
        match event {
            Event::Query(text) => {
                // Replay: wait for each pass so later events see its snapshot.
                controller.update(&text).wait_blocking();
            }
            Event::Next => {
                controller.next();
            }
            Event::Prev => {
                controller.previous();
            }
            Event::Show => {
                let query = Query::by_length(&controller.last_query());
                render(&controller.snapshot(), &query, &mut io::stderr().lock())?;
            }
            Event::Select => {
                if let Some(outcome) = controller.select() {
                    return Ok(outcome);
                }
            }
            Event::Paste => {
                if let Some(outcome) = controller.paste() {
                    return Ok(outcome);
                }
            }
            Event::Abort => return Ok(controller.abort()),
        }
    }
    Ok(controller.abort())
}

fn main() -> Result<()> {
    let outcome = run(Cli::parse())?;
    let mut stdout = io::stdout().lock();
    write!(stdout, "{}", outcome.output)?;
    stdout.flush()?;
    std::process::exit(outcome.action.exit_code());
}
