//! Per-record scoring and highlighting
//!
//! Score of a record against a term list:
//! - each term found in the raw content adds `hit_score` plus
//!   `hit_score_consecutive` per non-overlapping occurrence
//! - a term surrounded by spaces inside the trimmed content adds `proper_match_score`
//! - the record's recency weight adds `weight * time_score_coef`, which only
//!   breaks ties between otherwise equal records
//!
//! Scoring never fails and never filters; a record matching no term still gets
//! a result (its score is the recency term alone).

use crate::config::SearchConfig;
use crate::models::Record;

/// A record rendered and scored for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    /// Trimmed content with newlines replaced by the marker; doubles as the dedup key
    pub content: String,
    /// `content` with every matched term wrapped in highlight markers
    pub highlighted: String,
    pub score: f64,
    /// Untouched record content, handed back on select/paste
    pub output: String,
    pub record_id: Option<i64>,
}

impl ScoredResult {
    /// Dedup key: two records with the same normalized content collapse to one result.
    pub fn key(&self) -> &str {
        &self.content
    }
}

/// Trim trailing whitespace.
pub fn trim_content(content: &str) -> &str {
    content.trim_end()
}

/// Replace newlines with a visible marker for single-line display.
pub fn mark_newlines(content: &str, marker: &str) -> String {
    content.replace('\n', marker)
}

/// Trimmed, newline-marked content.
pub fn normalize_content(content: &str, marker: &str) -> String {
    mark_newlines(trim_content(content), marker)
}

/// A term delimited by spaces on both sides within the content.
pub fn proper_match(content: &str, term: &str) -> bool {
    content.contains(&format!(" {} ", term))
}

pub fn highlight_term(term: &str, config: &SearchConfig) -> String {
    format!("{}{}{}", config.highlight_open, term, config.highlight_close)
}

pub fn score_record(record: &Record, terms: &[String], config: &SearchConfig) -> ScoredResult {
    let raw = record.content();
    let trimmed = trim_content(raw);

    let mut score = 0.0;
    let mut highlighted = trimmed.to_string();
    for term in terms {
        if term.is_empty() {
            continue;
        }
        let count = raw.matches(term.as_str()).count();
        if count == 0 {
            continue;
        }
        score += config.hit_score + config.hit_score_consecutive * count as f64;
        if proper_match(trimmed, term) {
            score += config.proper_match_score;
        }
        // Literal replace over the already-highlighted text: a later term that
        // occurs inside earlier markup gets wrapped again.
        highlighted = highlighted.replace(term.as_str(), &highlight_term(term, config));
    }
    score += record.weight() * config.time_score_coef;

    ScoredResult {
        content: mark_newlines(trimmed, &config.newline_marker),
        highlighted: mark_newlines(&highlighted, &config.newline_marker),
        score,
        output: raw.to_string(),
        record_id: record.id(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HIGHLIGHT_CLOSE, HIGHLIGHT_OPEN};

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn score_line(content: &str, words: &[&str], config: &SearchConfig) -> ScoredResult {
        score_record(&Record::from_command_line(content), &terms(words), config)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_term_hit() {
        let config = SearchConfig::default();
        let result = score_line("kubectl get pod1", &["kubectl"], &config);
        assert!(result.score >= 1.0);
        assert!(approx(result.score, 1.01));
        let marked = format!("{}kubectl{}", HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE);
        assert!(result.highlighted.contains(&marked));
        assert_eq!(result.content, "kubectl get pod1");
    }

    #[test]
    fn test_consecutive_hits_counted() {
        let config = SearchConfig::default();
        let result = score_line("abc abc", &["abc"], &config);
        assert!(approx(result.score, 1.02), "got {}", result.score);
    }

    #[test]
    fn test_proper_match_bonus() {
        let config = SearchConfig::default();
        let result = score_line("kubectl get pod", &["get"], &config);
        assert!(approx(result.score, 1.0 + 0.01 + 0.3), "got {}", result.score);

        let result = score_line("kubectl getter pod", &["get"], &config);
        assert!(approx(result.score, 1.01), "got {}", result.score);
    }

    #[test]
    fn test_proper_match() {
        assert!(proper_match("git commit -m", "commit"));
        assert!(!proper_match("git commit", "commit"));
        assert!(!proper_match("git commits now", "commit"));
    }

    #[test]
    fn test_no_terms_scores_recency_only() {
        let config = SearchConfig::default();
        let result = score_record(&Record::catalogued(1, "ls", 1_700_000_000.0), &[], &config);
        assert!(approx(result.score, 1_700_000_000.0 * 1e-13));
        assert_eq!(result.highlighted, "ls");
    }

    #[test]
    fn test_unmatched_record_still_scored() {
        let config = SearchConfig::default();
        let result = score_line("ls -la", &["kubectl"], &config);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.highlighted, "ls -la");
    }

    #[test]
    fn test_recency_breaks_ties_only() {
        let config = SearchConfig::default();
        let make = terms(&["make"]);
        let old = score_record(&Record::catalogued(1, "make build", 1e9), &make, &config);
        let new = score_record(&Record::catalogued(2, "make test", 1.7e9), &make, &config);
        let better = score_record(&Record::catalogued(3, "make make", 0.0), &make, &config);
        assert!(new.score > old.score);
        assert!(better.score > new.score);
    }

    #[test]
    fn test_normalization_and_newline_marker() {
        let config = SearchConfig::default();
        let raw = "for i in 1 2\ndo echo $i\ndone  \n\t";
        let result = score_line(raw, &["echo"], &config);
        assert_eq!(result.content, "for i in 1 2\\ndo echo $i\\ndone");
        assert!(!result.highlighted.contains('\n'));
        assert_eq!(result.key(), result.content);
        assert_eq!(result.output, raw);
    }

    #[test]
    fn test_score_is_term_order_independent() {
        let config = SearchConfig::default();
        let a = score_line("docker compose up -d", &["up", "docker", "-d"], &config);
        let b = score_line("docker compose up -d", &["-d", "up", "docker"], &config);
        assert!(approx(a.score, b.score));
    }

    #[test]
    fn test_double_highlight_quirk_preserved() {
        let config = SearchConfig::default();
        let result = score_line("kubectl 33", &["kubectl", "33"], &config);
        let o = HIGHLIGHT_OPEN;
        let c = HIGHLIGHT_CLOSE;
        assert_eq!(result.highlighted, format!("\x1b[1;{o}33{c}mkubectl{c} {o}33{c}"));
    }

    #[test]
    fn test_custom_markers() {
        let config = SearchConfig {
            highlight_open: "[".to_string(),
            highlight_close: "]".to_string(),
            newline_marker: "#".to_string(),
            ..SearchConfig::default()
        };
        let result = score_line("get pod\nget svc", &["get"], &config);
        assert_eq!(result.highlighted, "[get] pod#[get] svc");
        assert_eq!(result.content, "get pod#get svc");
    }

    #[test]
    fn test_record_id_carried() {
        let config = SearchConfig::default();
        let catalogued = score_record(&Record::catalogued(42, "x", 0.0), &[], &config);
        assert_eq!(catalogued.record_id, Some(42));
        assert_eq!(score_line("x", &[], &config).record_id, None);
    }
}
