//! Corpus records
//!
//! A record is created once when the corpus is loaded and never mutated.
//! Two shapes exist: a raw command line typed by the user, and a catalogued
//! history entry carrying an id and a recency weight. Both are scored the
//! same way through `content()` and `weight()`.

use serde::{Deserialize, Serialize};

use crate::error::{HistSearchError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A raw command-line entry (no id, no recency weight)
    CommandLine { content: String },
    /// A catalogued history entry
    Catalogued { id: i64, content: String, weight: f64 },
}

impl Record {
    pub fn from_command_line(cmd_line: impl Into<String>) -> Self {
        Record::CommandLine {
            content: cmd_line.into(),
        }
    }

    pub fn catalogued(id: i64, content: impl Into<String>, weight: f64) -> Self {
        Record::Catalogued {
            id,
            content: content.into(),
            weight,
        }
    }

    /// Build a catalogued record from a history row.
    ///
    /// A missing or empty `time` means weight 0. A time that does not parse
    /// as a float is an error; callers log it and skip the row.
    pub fn from_row(row: &RowItem) -> Result<Self> {
        let weight = match row.time.as_deref().map(str::trim) {
            None | Some("") => 0.0,
            Some(raw) => raw.parse::<f64>().map_err(|e| {
                HistSearchError::InvalidRecord(format!(
                    "row {}: time {:?} is not a number ({})",
                    row.idx, raw, e
                ))
            })?,
        };
        if !weight.is_finite() {
            return Err(HistSearchError::InvalidRecord(format!(
                "row {}: time {:?} is not finite",
                row.idx, row.time
            )));
        }
        Ok(Record::Catalogued {
            id: row.idx,
            content: row.content.clone(),
            weight,
        })
    }

    pub fn content(&self) -> &str {
        match self {
            Record::CommandLine { content } => content,
            Record::Catalogued { content, .. } => content,
        }
    }

    /// Recency weight, 0 for raw command lines
    pub fn weight(&self) -> f64 {
        match self {
            Record::CommandLine { .. } => 0.0,
            Record::Catalogued { weight, .. } => *weight,
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Record::CommandLine { .. } => None,
            Record::Catalogued { id, .. } => Some(*id),
        }
    }

    pub fn is_command_line(&self) -> bool {
        matches!(self, Record::CommandLine { .. })
    }
}

/// One history row as stored on disk (JSON lines).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowItem {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub favorite: bool,
    /// Unix epoch seconds as a decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, rename = "exitCode", skip_serializing_if = "is_zero")]
    pub exit_code: i32,
    pub idx: i64,
    pub content: String,
}

fn is_zero(v: &i32) -> bool {
    *v == 0
}
