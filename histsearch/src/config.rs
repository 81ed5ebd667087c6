//! Search configuration
//!
//! Every field has a default, so an empty TOML file (or no file at all) gives
//! the stock scoring behavior:
//!
//! ```toml
//! max_results = 421
//! hit_score = 1.0
//! hit_score_consecutive = 0.01
//! proper_match_score = 0.3
//! time_score_coef = 1e-13
//! highlight_open = "\u001b[1;33m"
//! highlight_close = "\u001b[0m"
//! newline_marker = "\\n"
//! log_level = "info"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HistSearchError, Result};

/// Maximum number of results kept in a published snapshot (indices 0..=420).
pub const MAX_RESULTS: usize = 421;

/// Score added once per matched term.
pub const HIT_SCORE: f64 = 1.0;
/// Score added per occurrence of a matched term.
pub const HIT_SCORE_CONSECUTIVE: f64 = 0.01;
/// Bonus for a term delimited by spaces on both sides.
pub const PROPER_MATCH_SCORE: f64 = 0.3;
/// Recency weight multiplier; small enough to only break ties.
pub const TIME_SCORE_COEF: f64 = 1e-13;

pub const HIGHLIGHT_OPEN: &str = "\x1b[1;33m";
pub const HIGHLIGHT_CLOSE: &str = "\x1b[0m";
pub const NEWLINE_MARKER: &str = "\\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
    pub hit_score: f64,
    pub hit_score_consecutive: f64,
    pub proper_match_score: f64,
    pub time_score_coef: f64,
    pub highlight_open: String,
    pub highlight_close: String,
    pub newline_marker: String,
    /// Fallback filter for the binaries when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULTS,
            hit_score: HIT_SCORE,
            hit_score_consecutive: HIT_SCORE_CONSECUTIVE,
            proper_match_score: PROPER_MATCH_SCORE,
            time_score_coef: TIME_SCORE_COEF,
            highlight_open: HIGHLIGHT_OPEN.to_string(),
            highlight_close: HIGHLIGHT_CLOSE.to_string(),
            newline_marker: NEWLINE_MARKER.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl SearchConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SearchConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(HistSearchError::Config(
                "max_results must be greater than 0".to_string(),
            ));
        }
        let weights = [
            ("hit_score", self.hit_score),
            ("hit_score_consecutive", self.hit_score_consecutive),
            ("proper_match_score", self.proper_match_score),
            ("time_score_coef", self.time_score_coef),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(HistSearchError::Config(format!(
                    "{} must be a non-negative finite number, got {}",
                    name, value
                )));
            }
        }
        if self.newline_marker.contains('\n') {
            return Err(HistSearchError::Config(
                "newline_marker must not contain a newline".to_string(),
            ));
        }
        Ok(())
    }
}
