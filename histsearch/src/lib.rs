//! histsearch - incremental ranked search over shell history
//!
//! Re-ranks a bounded in-memory corpus on every keystroke. Each query change
//! cancels the previous ranking pass and starts a new one; only a pass that
//! finishes uncancelled publishes its results.
//!
//! # Architecture
//! - `query`: raw input → whitespace-free terms
//! - `scoring`: one record × terms → score + highlighted rendering
//! - `ranking`: whole corpus → deduplicated, sorted, capped result list
//! - `controller`: cancellation, publishing, cursor and session outcome
//! - `history`: JSON-lines history loading

pub mod config;
pub mod controller;
pub mod error;
pub mod history;
pub mod models;
pub mod query;
pub mod ranking;
pub mod scoring;

pub use config::SearchConfig;
pub use controller::{
    ControllerBuilder, PassHandle, PassOutcome, Phase, Redraw, SearchController, SessionAction,
    SessionOutcome, Snapshot, EXIT_CODE_EXECUTE,
};
pub use error::{HistSearchError, Result};
pub use models::{Record, RowItem};
pub use query::{tokenize, Query};
pub use ranking::rank;
pub use scoring::{score_record, ScoredResult};
