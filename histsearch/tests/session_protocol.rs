//! Controller protocol under rapid query changes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use histsearch::{rank, PassOutcome, Phase, Query, Record, SearchConfig, SearchController};
use tokio_util::sync::CancellationToken;

fn big_corpus(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::catalogued(
                i as i64,
                format!("kubectl get pod{} -n team{}", i, i % 97),
                i as f64,
            )
        })
        .collect()
}

fn expected(records: &[Record], input: &str) -> Vec<histsearch::ScoredResult> {
    rank(records, &Query::raw(input), &CancellationToken::new(), &SearchConfig::default()).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn second_query_wins_over_slow_first() {
    let records = big_corpus(200_000);
    let controller = SearchController::builder(records.clone()).build().unwrap();

    let first = controller.update("kubectl");
    let second = controller.update("team42");

    let first_outcome = first.wait().await;
    let second_outcome = second.wait().await;

    let PassOutcome::Published { generation: second_gen, .. } = second_outcome else {
        panic!("latest pass must publish, got {:?}", second_outcome);
    };
    if let PassOutcome::Published { generation: first_gen, .. } = first_outcome {
        assert!(first_gen < second_gen, "stale pass published after newer one");
    }

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.generation, second_gen);
    assert_eq!(*snapshot.results, expected(&records, "team42"));
    assert_eq!(controller.phase(), Phase::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn keystroke_burst_publishes_only_final_query() {
    let records = big_corpus(50_000);
    let redraws = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&redraws);
    let controller = SearchController::builder(records.clone())
        .on_redraw(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let typed = "kubectl get pod123";
    let handles: Vec<_> = (1..=typed.len())
        .map(|end| controller.update(&typed[..end]))
        .collect();

    let mut published = 0;
    let mut last = None;
    for handle in handles {
        let outcome = handle.wait().await;
        if let PassOutcome::Published { generation, .. } = outcome {
            published += 1;
            if let Some(prev) = last {
                assert!(generation > prev);
            }
            last = Some(generation);
        }
    }

    assert!(published >= 1);
    assert_eq!(redraws.load(Ordering::SeqCst), published);
    assert_eq!(*controller.snapshot().results, expected(&records, typed));
    assert_eq!(controller.last_query(), typed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn navigation_is_independent_of_inflight_pass() {
    let records = big_corpus(100_000);
    let controller = SearchController::builder(records).build().unwrap();

    let pending = controller.update("pod1");
    // Cursor moves never wait for the pass
    assert_eq!(controller.next(), 1);
    assert_eq!(controller.previous(), 0);
    let _ = controller.snapshot();

    pending.wait().await;
    assert_eq!(controller.snapshot().highlighted, 0);
}

#[test]
fn dropping_controller_cancels_inflight_pass() {
    let records = big_corpus(200_000);
    let controller = SearchController::new(records, SearchConfig::default()).unwrap();
    let pending = controller.update("kubectl");
    drop(controller);
    // Either it already finished or it observes the cancellation; it must not hang.
    let _ = pending.wait_blocking();
}

#[test]
fn concurrent_readers_see_consistent_snapshots() {
    let records = big_corpus(20_000);
    let controller = Arc::new(SearchController::new(records, SearchConfig::default()).unwrap());

    let reader = {
        let controller = Arc::clone(&controller);
        std::thread::spawn(move || {
            for _ in 0..2_000 {
                let snapshot = controller.snapshot();
                assert!(snapshot.len() <= histsearch::config::MAX_RESULTS);
                assert!(snapshot.results.windows(2).all(|w| w[0].score >= w[1].score));
                controller.next();
            }
        })
    };

    let mut last = None;
    for query in ["k", "ku", "kub", "pod9", "team1", "get", ""] {
        last = Some(controller.update(query));
    }
    if let Some(handle) = last {
        handle.wait_blocking();
    }
    reader.join().unwrap();
}
