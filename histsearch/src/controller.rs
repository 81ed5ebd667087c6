//! Incremental search controller
//!
//! Owns the corpus and the published snapshot for one search session.
//!
//! Concurrency model:
//! - Every query change cancels the in-flight pass (if any) and spawns a new
//!   one on a tokio blocking thread. The caller never waits for a pass.
//! - Cancellation is cooperative: the pass polls its `CancellationToken`
//!   before scoring each record.
//! - The snapshot, cursor and pass bookkeeping live behind one
//!   `parking_lot::Mutex`. Cancelling the old token happens under that lock,
//!   and a pass re-checks its token under the same lock right before
//!   publishing, so a superseded pass can never overwrite a newer snapshot.
//! - The lock is never held while scoring.

use std::sync::{Arc, Once};
use std::time::Instant;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::Result;
use crate::models::Record;
use crate::query::Query;
use crate::ranking::rank;
use crate::scoring::ScoredResult;

/// Exit status for "run the selected command".
pub const EXIT_CODE_EXECUTE: i32 = 111;

/// Fallback runtime for callers that are not inside a tokio runtime.
/// Shared by all controllers and never dropped.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .thread_name("histsearch-pass")
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

static RAYON_INIT: Once = Once::new();

/// Initialize the global Rayon pool at low priority so scoring never starves
/// the input loop.
fn init_rayon() {
    RAYON_INIT.call_once(|| {
        let num_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        // Leave one core for the input/render loop.
        let rayon_threads = num_threads.saturating_sub(1).max(1);

        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(rayon_threads)
            .thread_name(|i| format!("histsearch-rayon-{}", i))
            .start_handler(|_| {
                use thread_priority::*;
                let _ = set_current_thread_priority(ThreadPriority::Min);
            })
            .build_global();
    });
}

/// Called after every publish so the display can redraw.
pub trait Redraw: Send + Sync {
    fn request_redraw(&self);
}

impl<F> Redraw for F
where
    F: Fn() + Send + Sync,
{
    fn request_redraw(&self) {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ranking,
}

/// How a session ended, from the calling process's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Selected result should be run
    Execute,
    /// Selected result should be pasted, not run
    Paste,
    /// Session aborted; output is the edit buffer
    Abort,
}

impl SessionAction {
    pub fn exit_code(self) -> i32 {
        match self {
            SessionAction::Execute => EXIT_CODE_EXECUTE,
            SessionAction::Paste | SessionAction::Abort => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub output: String,
    pub action: SessionAction,
}

/// Read-only copy of the published state, valid for one render pass.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub results: Arc<Vec<ScoredResult>>,
    pub highlighted: usize,
    pub displayed_count: usize,
    /// Number of publishes so far; changes whenever `results` is replaced
    pub generation: u64,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn selected(&self) -> Option<&ScoredResult> {
        self.results.get(self.highlighted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Published { generation: u64, result_count: usize },
    Cancelled,
}

/// Handle on a spawned pass. Dropping it does not cancel the pass.
#[derive(Debug)]
pub struct PassHandle {
    join: JoinHandle<PassOutcome>,
}

impl PassHandle {
    pub async fn wait(self) -> PassOutcome {
        // A JoinError means the task panicked or was aborted; either way nothing was published.
        self.join.await.unwrap_or(PassOutcome::Cancelled)
    }

    /// Block the current thread until the pass finishes. Must not be called
    /// from inside an async context.
    pub fn wait_blocking(self) -> PassOutcome {
        futures::executor::block_on(self.wait())
    }
}

struct ActivePass {
    id: u64,
    token: CancellationToken,
}

struct SessionState {
    results: Arc<Vec<ScoredResult>>,
    highlighted: usize,
    displayed_count: usize,
    generation: u64,
    active: Option<ActivePass>,
    next_pass_id: u64,
    last_query: String,
    initial_query: Option<String>,
}

impl SessionState {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            results: Arc::clone(&self.results),
            highlighted: self.highlighted,
            displayed_count: self.displayed_count,
            generation: self.generation,
        }
    }

    /// Cancel the in-flight pass and register a new one.
    fn begin_pass(&mut self, query: &str) -> ActivePass {
        if let Some(previous) = self.active.take() {
            previous.token.cancel();
            debug!(pass_id = previous.id, "cancelled superseded pass");
        }
        self.next_pass_id += 1;
        let token = CancellationToken::new();
        self.active = Some(ActivePass {
            id: self.next_pass_id,
            token: token.clone(),
        });
        self.last_query = query.to_string();
        ActivePass {
            id: self.next_pass_id,
            token,
        }
    }

    /// Overwrite the snapshot with a finished pass's results.
    fn publish(&mut self, pass_id: u64, results: Vec<ScoredResult>) -> PassOutcome {
        let result_count = results.len();
        self.results = Arc::new(results);
        self.highlighted = 0;
        self.generation += 1;
        if self.active.as_ref().map_or(false, |a| a.id == pass_id) {
            self.active = None;
        }
        PassOutcome::Published {
            generation: self.generation,
            result_count,
        }
    }
}

pub struct ControllerBuilder {
    records: Vec<Record>,
    config: SearchConfig,
    initial_query: String,
    redraw: Option<Arc<dyn Redraw>>,
    runtime: Option<tokio::runtime::Handle>,
}

impl ControllerBuilder {
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Text the edit buffer starts with; the first pass ranks against it.
    pub fn initial_query(mut self, query: impl Into<String>) -> Self {
        self.initial_query = query.into();
        self
    }

    pub fn on_redraw(mut self, redraw: impl Redraw + 'static) -> Self {
        self.redraw = Some(Arc::new(redraw));
        self
    }

    /// Runtime to spawn passes on. Defaults to the ambient runtime, or a
    /// process-wide fallback when there is none.
    pub fn runtime(mut self, handle: tokio::runtime::Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Validate the config and publish the first snapshot synchronously,
    /// so the display has something to render before the first keystroke.
    pub fn build(self) -> Result<SearchController> {
        self.config.validate()?;
        init_rayon();

        let runtime = self.runtime.unwrap_or_else(|| {
            tokio::runtime::Handle::try_current()
                .unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
        });

        let records: Arc<Vec<Record>> = Arc::new(self.records);
        let config = Arc::new(self.config);
        let initial_results = rank(
            &records,
            &Query::raw(&self.initial_query),
            &CancellationToken::new(),
            &config,
        )?;

        let state = SessionState {
            results: Arc::new(initial_results),
            highlighted: 0,
            displayed_count: config.max_results,
            generation: 1,
            active: None,
            next_pass_id: 0,
            last_query: self.initial_query.clone(),
            initial_query: if self.initial_query.is_empty() {
                None
            } else {
                Some(self.initial_query)
            },
        };

        debug!(record_count = records.len(), "search controller ready");
        Ok(SearchController {
            records,
            config,
            state: Arc::new(Mutex::new(state)),
            redraw: self.redraw,
            runtime,
        })
    }
}

/// Thread-safe search session over a read-only corpus.
pub struct SearchController {
    records: Arc<Vec<Record>>,
    config: Arc<SearchConfig>,
    state: Arc<Mutex<SessionState>>,
    redraw: Option<Arc<dyn Redraw>>,
    runtime: tokio::runtime::Handle,
}

impl SearchController {
    pub fn builder(records: Vec<Record>) -> ControllerBuilder {
        ControllerBuilder {
            records,
            config: SearchConfig::default(),
            initial_query: String::new(),
            redraw: None,
            runtime: None,
        }
    }

    pub fn new(records: Vec<Record>, config: SearchConfig) -> Result<Self> {
        Self::builder(records).config(config).build()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Re-rank for the full current query text. Returns immediately.
    pub fn update(&self, raw_query: &str) -> PassHandle {
        let pass = self.state.lock().begin_pass(raw_query);

        let records = Arc::clone(&self.records);
        let config = Arc::clone(&self.config);
        let state = Arc::clone(&self.state);
        let redraw = self.redraw.clone();
        let query = raw_query.to_string();

        let join = self.runtime.spawn_blocking(move || {
            run_pass(&records, &query, pass, &config, &state, redraw.as_deref())
        });
        PassHandle { join }
    }

    /// Re-run the pass for the last query text.
    pub fn refresh(&self) -> PassHandle {
        let query = self.state.lock().last_query.clone();
        self.update(&query)
    }

    pub fn phase(&self) -> Phase {
        if self.state.lock().active.is_some() {
            Phase::Ranking
        } else {
            Phase::Idle
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.lock().snapshot()
    }

    /// The display reports how many rows it can show.
    pub fn set_displayed_count(&self, count: usize) {
        let mut state = self.state.lock();
        state.displayed_count = count;
        let limit = state.displayed_count.min(state.results.len());
        if state.highlighted >= limit {
            state.highlighted = limit.saturating_sub(1);
        }
    }

    /// Move the cursor down one row. Returns the new index.
    pub fn next(&self) -> usize {
        let mut state = self.state.lock();
        let limit = state.displayed_count.min(state.results.len());
        if state.highlighted + 1 < limit {
            state.highlighted += 1;
        }
        state.highlighted
    }

    /// Move the cursor up one row. Returns the new index.
    pub fn previous(&self) -> usize {
        let mut state = self.state.lock();
        if state.highlighted > 0 {
            state.highlighted -= 1;
        }
        state.highlighted
    }

    /// The initial query, handed out once so the display can pre-fill its edit buffer.
    pub fn take_initial_query(&self) -> Option<String> {
        self.state.lock().initial_query.take()
    }

    pub fn last_query(&self) -> String {
        self.state.lock().last_query.clone()
    }

    /// Highlighted result's raw content, to be run.
    pub fn select(&self) -> Option<SessionOutcome> {
        self.pick(SessionAction::Execute)
    }

    /// Highlighted result's raw content, to be pasted without running.
    pub fn paste(&self) -> Option<SessionOutcome> {
        self.pick(SessionAction::Paste)
    }

    /// End the session with the current edit buffer.
    pub fn abort(&self) -> SessionOutcome {
        SessionOutcome {
            output: self.last_query(),
            action: SessionAction::Abort,
        }
    }

    fn pick(&self, action: SessionAction) -> Option<SessionOutcome> {
        let state = self.state.lock();
        state.results.get(state.highlighted).map(|result| SessionOutcome {
            output: result.output.clone(),
            action,
        })
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        if let Some(active) = self.state.lock().active.take() {
            active.token.cancel();
        }
    }
}

fn run_pass(
    records: &[Record],
    raw_query: &str,
    pass: ActivePass,
    config: &SearchConfig,
    state: &Mutex<SessionState>,
    redraw: Option<&dyn Redraw>,
) -> PassOutcome {
    let started = Instant::now();
    let query = Query::raw(raw_query);

    match rank(records, &query, &pass.token, config) {
        Ok(results) => publish_pass(pass, results, started, state, redraw),
        Err(_) => PassOutcome::Cancelled,
    }
}

/// Publish a ranked pass unless it was superseded while ranking finished.
fn publish_pass(
    pass: ActivePass,
    results: Vec<ScoredResult>,
    started: Instant,
    state: &Mutex<SessionState>,
    redraw: Option<&dyn Redraw>,
) -> PassOutcome {
    let outcome = {
        let mut state = state.lock();
        if pass.token.is_cancelled() {
            debug!(
                pass_id = pass.id,
                elapsed = ?started.elapsed(),
                "pass superseded before publish"
            );
            return PassOutcome::Cancelled;
        }
        state.publish(pass.id, results)
    };

    if let PassOutcome::Published { generation, result_count } = outcome {
        debug!(
            pass_id = pass.id,
            generation,
            result_count,
            elapsed = ?started.elapsed(),
            "published ranking pass"
        );
    }
    if let Some(redraw) = redraw {
        redraw.request_redraw();
    }
    outcome
}
