//! End-to-end ranking scenarios through the public API.

use histsearch::config::{HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN, MAX_RESULTS};
use histsearch::{rank, Query, Record, SearchConfig, SearchController};
use tokio_util::sync::CancellationToken;

fn rank_str(records: &[Record], input: &str) -> Vec<histsearch::ScoredResult> {
    rank(records, &Query::raw(input), &CancellationToken::new(), &SearchConfig::default()).unwrap()
}

#[test]
fn single_record_single_term() {
    let records = vec![Record::from_command_line("kubectl get pod1")];
    let results = rank_str(&records, "kubectl");
    assert_eq!(results.len(), 1);
    assert!(results[0].score >= 1.0);
    assert!(results[0]
        .highlighted
        .contains(&format!("{}kubectl{}", HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE)));
}

#[test]
fn repeated_term_adds_consecutive_bonus() {
    let records = vec![Record::from_command_line("abc abc")];
    let results = rank_str(&records, "abc");
    assert_eq!(results.len(), 1);
    assert!((results[0].score - 1.02).abs() < 1e-9, "got {}", results[0].score);
}

#[test]
fn empty_query_dedups_identical_records() {
    let records = vec![Record::from_command_line("get pod"), Record::from_command_line("get pod")];
    let results = rank_str(&records, "");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, "get pod");
}

#[test]
fn empty_corpus_gives_empty_snapshot() {
    let controller = SearchController::new(Vec::new(), SearchConfig::default()).unwrap();
    let outcome = controller.update("anything at all").wait_blocking();
    assert!(matches!(outcome, histsearch::PassOutcome::Published { result_count: 0, .. }));
    let snapshot = controller.snapshot();
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.highlighted, 0);
    assert!(snapshot.selected().is_none());
}

#[test]
fn large_corpus_capped_at_window() {
    let records: Vec<Record> = (0..5_000)
        .map(|i| Record::catalogued(i, format!("kubectl get pod{}", i), i as f64))
        .collect();
    let results = rank_str(&records, "kubectl");
    assert_eq!(results.len(), MAX_RESULTS);
    // Equal term scores: newer (higher weight) records first
    assert_eq!(results[0].record_id, Some(4_999));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn multi_line_history_entry() {
    let records = vec![Record::catalogued(
        1,
        "for f in *.log; do\n  gzip \"$f\"\ndone\n",
        1_700_000_000.0,
    )];
    let results = rank_str(&records, "gzip");
    assert_eq!(results[0].content, "for f in *.log; do\\n  gzip \"$f\"\\ndone");
    assert!(!results[0].highlighted.contains('\n'));
    assert!(results[0].output.ends_with("done\n"));
}
