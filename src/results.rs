//! Flat text persistence for simulation results.
//!
//! One line per trajectory, in run order: each yearly balance with two
//! decimals, then `successful` or `unsuccessful`, all separated by single
//! spaces.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::core::{Outcome, SimulationError, Trajectory, TrajectorySink};

#[derive(Debug, Error)]
pub enum ResultFileError {
    #[error("unable to write results to {}: {source}", path.display())]
    Unwritable { path: PathBuf, source: io::Error },
    #[error("unable to open file at {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },
    #[error("line {line}: '{token}' is not a number")]
    MalformedValue { line: usize, token: String },
    #[error("line {line} has no balances")]
    EmptyLine { line: usize },
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

impl ResultFileError {
    /// True for content problems, as opposed to I/O failures.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ResultFileError::MalformedValue { .. } | ResultFileError::EmptyLine { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersistedTrajectory {
    pub balances: Vec<f64>,
    /// `None` when the trailing token is not a known outcome.
    pub outcome: Option<Outcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResults {
    Empty,
    Loaded(Vec<PersistedTrajectory>),
}

pub fn format_trajectory_line(trajectory: &Trajectory) -> String {
    let mut line = String::with_capacity(trajectory.len() * 12 + 12);
    for balance in &trajectory.balances {
        line.push_str(&format!("{balance:.2} "));
    }
    line.push_str(trajectory.outcome.as_token());
    line
}

pub struct ResultWriter<W: Write> {
    out: W,
    path: PathBuf,
    lines_written: usize,
}

impl ResultWriter<BufWriter<File>> {
    /// Creates or truncates the file before any simulation runs.
    pub fn create(path: &Path) -> Result<Self, ResultFileError> {
        let resolved = resolve_path(path);
        let file = File::create(&resolved).map_err(|source| ResultFileError::Unwritable {
            path: resolved.clone(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), resolved))
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn new(out: W, path: impl Into<PathBuf>) -> Self {
        Self {
            out,
            path: path.into(),
            lines_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_trajectory(&mut self, trajectory: &Trajectory) -> Result<(), ResultFileError> {
        writeln!(self.out, "{}", format_trajectory_line(trajectory)).map_err(|e| self.unwritable(e))?;
        self.lines_written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W, ResultFileError> {
        self.out.flush().map_err(|e| self.unwritable(e))?;
        debug!(
            "wrote {} result lines to {}",
            self.lines_written,
            self.path.display()
        );
        Ok(self.out)
    }

    fn unwritable(&self, source: io::Error) -> ResultFileError {
        ResultFileError::Unwritable {
            path: self.path.clone(),
            source,
        }
    }
}

impl<W: Write> TrajectorySink for ResultWriter<W> {
    type Error = ResultFileError;

    fn accept(&mut self, trajectory: Trajectory) -> Result<(), Self::Error> {
        self.write_trajectory(&trajectory)
    }
}

/// Parses a whole result file. Any bad line rejects the entire content.
pub fn parse_results(content: &str) -> Result<ParsedResults, ResultFileError> {
    if content.is_empty() {
        return Ok(ParsedResults::Empty);
    }

    let mut trajectories = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        trajectories.push(parse_line(idx + 1, line)?);
    }
    Ok(ParsedResults::Loaded(trajectories))
}

pub fn read_results(path: &Path) -> Result<ParsedResults, ResultFileError> {
    let content = fs::read_to_string(path).map_err(|source| ResultFileError::Unreadable {
        path: resolve_path(path),
        source,
    })?;
    parse_results(&content)
}

fn parse_line(line_number: usize, line: &str) -> Result<PersistedTrajectory, ResultFileError> {
    let mut tokens = line.split_whitespace().collect::<Vec<_>>();
    let outcome = tokens.pop().and_then(Outcome::from_token);
    if tokens.is_empty() {
        return Err(ResultFileError::EmptyLine { line: line_number });
    }

    let balances = tokens
        .into_iter()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| ResultFileError::MalformedValue {
                    line: line_number,
                    token: token.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PersistedTrajectory { balances, outcome })
}

pub fn resolve_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|dir| dir.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
