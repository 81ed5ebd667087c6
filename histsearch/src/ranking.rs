//! Ranking pass over the whole corpus.
//!
//! Scores every record, keeps the first result per dedup key (corpus order),
//! stable-sorts by score descending and caps the list at `max_results`.
//! The cancellation token is checked before each record is scored; a
//! cancelled pass returns `Err(Cancelled)` and its partial results are dropped.

use std::collections::HashSet;
use std::time::Instant;

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{HistSearchError, Result};
use crate::models::Record;
use crate::query::Query;
use crate::scoring::{score_record, ScoredResult};

pub fn rank(
    records: &[Record],
    query: &Query,
    token: &CancellationToken,
    config: &SearchConfig,
) -> Result<Vec<ScoredResult>> {
    let started = Instant::now();
    debug!(record_count = records.len(), term_count = query.terms().len(), "starting ranking pass");

    // Indexed par_iter keeps corpus order in the collected vector, so
    // first-seen dedup below is deterministic.
    let scored: Vec<Option<ScoredResult>> = records
        .par_iter()
        .map(|record| {
            if token.is_cancelled() {
                return None;
            }
            Some(score_record(record, query.terms(), config))
        })
        .collect();

    if token.is_cancelled() {
        debug!(elapsed = ?started.elapsed(), "ranking pass cancelled");
        return Err(HistSearchError::Cancelled);
    }

    let mut seen: HashSet<String> = HashSet::with_capacity(scored.len());
    let mut results: Vec<ScoredResult> = scored
        .into_iter()
        .flatten()
        .filter(|result| seen.insert(result.key().to_string()))
        .collect();
    debug!(item_count = results.len(), "scored records, sorting");

    // sort_by is stable: equal scores keep corpus order
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(config.max_results);

    #[cfg(feature = "perf-log")]
    eprintln!(
        "[perf] rank records={} results={} elapsed={:.1}ms",
        records.len(),
        results.len(),
        started.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(results)
}
