//! CSV column aggregation, in plaintext or through an engine
//!
//! Columns are read fresh for every request and never written back.

use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::params::SchemeKind;
use crate::scheme::Scheme;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// How rows are split into cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Skip the first row
    pub has_header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: false,
        }
    }
}

/// Result of one column aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub values_processed: usize,
    pub result: f64,
    pub encrypted: bool,
    pub execution_time_ms: f64,
}

/// Loads numeric columns and aggregates them
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnAggregator {
    options: CsvOptions,
}

impl ColumnAggregator {
    pub fn new(options: CsvOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CsvOptions {
        self.options
    }

    /// Numeric cells of field `index`, in row order.
    ///
    /// Cells are trimmed; missing, unparseable or non-finite cells are
    /// skipped.
    pub fn load_column_from_rows<I, S>(&self, rows: I, index: usize) -> Vec<f64>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let delimiter = self.options.delimiter as char;
        rows.into_iter()
            .skip(usize::from(self.options.has_header))
            .filter_map(|row| {
                let cell = row.as_ref().split(delimiter).nth(index)?;
                let value: f64 = cell.trim().parse().ok()?;
                value.is_finite().then_some(value)
            })
            .collect()
    }

    /// Read a column from a file. An unreadable file yields an empty column.
    pub fn load_column(&self, path: impl AsRef<Path>, index: usize) -> Vec<f64> {
        match self.try_load_column(path.as_ref(), index) {
            Ok(values) => values,
            Err(err) => {
                warn!(path = %path.as_ref().display(), error = %err, "falling back to empty column");
                Vec::new()
            }
        }
    }

    /// Like [`load_column`](Self::load_column) but reports unreadable files.
    pub fn try_load_column(&self, path: &Path, index: usize) -> Result<Vec<f64>> {
        let content = fs::read_to_string(path).map_err(|e| {
            EngineError::FileUnavailable(format!("{}: {}", path.display(), e))
        })?;
        let values = self.load_column_from_rows(content.lines(), index);
        debug!(path = %path.display(), index, values = values.len(), "loaded column");
        Ok(values)
    }
}

pub fn plain_sum(column: &[f64]) -> f64 {
    column.iter().sum()
}

pub fn plain_average(column: &[f64]) -> f64 {
    if column.is_empty() {
        0.0
    } else {
        plain_sum(column) / column.len() as f64
    }
}

/// Encrypt every value, sum homomorphically, decrypt. Empty column is 0
/// without touching the engine.
///
/// Exact sums live modulo t, so a column whose (rounded) total passes
/// `engine.max_value()` would wrap. It is rejected with `OutOfRange` before
/// anything is encrypted.
pub fn encrypted_sum<S: Scheme>(column: &[f64], engine: &Engine<S>) -> Result<f64> {
    if column.is_empty() {
        return Ok(0.0);
    }
    if S::KIND == SchemeKind::Exact {
        let total: f64 = column.iter().map(|v| v.round()).sum();
        if total > engine.max_value() {
            warn!(total, limit = engine.max_value(), "exact column sum would wrap");
            return Err(EngineError::OutOfRange(format!(
                "exact column sum {} exceeds {}",
                total,
                engine.max_value()
            )));
        }
    }
    let ciphertexts = column
        .iter()
        .map(|&v| engine.encrypt(v))
        .collect::<Result<Vec<_>>>()?;
    engine.decrypt(&engine.sum(&ciphertexts)?)
}

/// Encrypted sum divided by the count in plaintext. Empty column is 0.
pub fn encrypted_average<S: Scheme>(column: &[f64], engine: &Engine<S>) -> Result<f64> {
    if column.is_empty() {
        return Ok(0.0);
    }
    Ok(encrypted_sum(column, engine)? / column.len() as f64)
}

/// Which aggregate a summary reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Sum,
    Average,
}

/// Aggregate a column, through `engine` when given, and time it.
pub fn summarize<S: Scheme>(
    column: &[f64],
    aggregate: Aggregate,
    engine: Option<&Engine<S>>,
) -> Result<ColumnSummary> {
    let start = Instant::now();
    let result = match (aggregate, engine) {
        (Aggregate::Sum, Some(engine)) => encrypted_sum(column, engine)?,
        (Aggregate::Average, Some(engine)) => encrypted_average(column, engine)?,
        (Aggregate::Sum, None) => plain_sum(column),
        (Aggregate::Average, None) => plain_average(column),
    };
    Ok(ColumnSummary {
        values_processed: column.len(),
        result,
        encrypted: engine.is_some(),
        execution_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}
