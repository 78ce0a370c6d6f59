//! Viewer session over a persisted result file.
//!
//! All state belongs to one `ViewerSession`; every load replaces it
//! wholesale, so a rejected file never leaves partial summaries behind.

use std::path::Path;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::core::{TrajectorySummary, summarize};
use crate::results::{ParsedResults, ResultFileError, parse_results, read_results};

pub const EMPTY_FILE_MESSAGE: &str = "Empty file...";
pub const INVALID_FILE_MESSAGE: &str = "Invalid file...";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewerError {
    #[error("no results are loaded")]
    NothingLoaded,
    #[error("simulation {index} is out of range (1-{count})")]
    SelectionOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerEntry {
    pub label: String,
    #[serde(flatten)]
    pub summary: TrajectorySummary,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewerState {
    #[default]
    NoData,
    Empty,
    Invalid,
    Loaded {
        entries: Vec<ViewerEntry>,
        selected: usize,
    },
}

#[derive(Debug, Default)]
pub struct ViewerSession {
    state: ViewerState,
}

impl ViewerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    /// Loads a file from disk. An unreadable file is returned as an error
    /// and the current state is kept.
    pub fn load_path(&mut self, path: &Path) -> Result<&ViewerState, ResultFileError> {
        match read_results(path) {
            Err(e) if !e.is_malformed() => Err(e),
            parsed => {
                info!("loading results from {}", path.display());
                self.state = state_from(parsed);
                Ok(&self.state)
            }
        }
    }

    pub fn load_str(&mut self, content: &str) -> &ViewerState {
        self.state = state_from(parse_results(content));
        &self.state
    }

    pub fn entries(&self) -> &[ViewerEntry] {
        match &self.state {
            ViewerState::Loaded { entries, .. } => entries,
            _ => &[],
        }
    }

    /// Zero-based; labels are one-based.
    pub fn select(&mut self, index: usize) -> Result<&ViewerEntry, ViewerError> {
        let ViewerState::Loaded { entries, selected } = &mut self.state else {
            return Err(ViewerError::NothingLoaded);
        };
        if index >= entries.len() {
            return Err(ViewerError::SelectionOutOfRange {
                index: index + 1,
                count: entries.len(),
            });
        }
        *selected = index;
        Ok(&entries[index])
    }

    pub fn selected(&self) -> Option<&ViewerEntry> {
        match &self.state {
            ViewerState::Loaded { entries, selected } => entries.get(*selected),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self.state {
            ViewerState::Empty => Some(EMPTY_FILE_MESSAGE),
            ViewerState::Invalid => Some(INVALID_FILE_MESSAGE),
            _ => None,
        }
    }

    pub fn detail_lines(&self) -> Vec<String> {
        self.selected()
            .map(|entry| detail_lines(&entry.summary))
            .unwrap_or_default()
    }
}

pub fn simulation_label(index: usize) -> String {
    format!("Simulation #{:03}", index + 1)
}

pub fn detail_lines(summary: &TrajectorySummary) -> Vec<String> {
    vec![
        format!("Maximum balance: {:.2}", summary.maximum),
        format!("Minimum balance: {:.2}", summary.minimum),
        format!("Average balance: {:.2}", summary.average),
    ]
}

fn state_from(parsed: Result<ParsedResults, ResultFileError>) -> ViewerState {
    let rows = match parsed {
        Ok(ParsedResults::Empty) => return ViewerState::Empty,
        Ok(ParsedResults::Loaded(rows)) => rows,
        Err(e) => {
            warn!("rejecting result file: {e}");
            return ViewerState::Invalid;
        }
    };

    let mut entries = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let Ok(summary) = summarize(&row.balances) else {
            return ViewerState::Invalid;
        };
        entries.push(ViewerEntry {
            label: simulation_label(idx),
            summary,
        });
    }

    if entries.is_empty() {
        return ViewerState::Invalid;
    }
    ViewerState::Loaded {
        entries,
        selected: 0,
    }
}
