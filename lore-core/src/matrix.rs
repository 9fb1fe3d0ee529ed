use std::path::Path;

use crate::domain::{TimingRow, TimingVector};
use crate::error::{LoreError, Result};

/// Rows are images (sorted by file name), columns are sequence positions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimingMatrix {
    width: usize,
    rows: Vec<TimingRow>,
}

impl TimingMatrix {
    /// Width is taken from the first row; shape is not checked here, see `validate`.
    pub fn from_rows(rows: Vec<TimingRow>) -> Self {
        let width = rows.first().map(|r| r.vector.len()).unwrap_or(0);
        Self { width, rows }
    }

    pub fn with_width(width: usize, rows: Vec<TimingRow>) -> Self {
        Self { width, rows }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[TimingRow] {
        &self.rows
    }

    /// Transpose column at `position`: one bit per row, in row order.
    pub fn column(&self, position: usize) -> Option<TimingVector> {
        if position >= self.width {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|r| r.vector.get(position).unwrap_or(false))
                .collect(),
        )
    }

    pub fn columns(&self) -> impl Iterator<Item = TimingVector> + '_ {
        (0..self.width).filter_map(move |p| self.column(p))
    }

    pub fn validate(&self, expected_width: usize, origin: &Path) -> Result<()> {
        let corrupt = |reason: String| LoreError::CorruptCache {
            path: origin.to_path_buf(),
            reason,
        };
        if self.rows.is_empty() {
            return Err(corrupt("matrix has no rows".into()));
        }
        if self.width != expected_width {
            return Err(corrupt(format!(
                "width {} does not match expected {expected_width}",
                self.width
            )));
        }
        if let Some((i, r)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.vector.len() != self.width)
        {
            return Err(corrupt(format!(
                "row {i} ({}) has length {}, expected {}",
                r.source,
                r.vector.len(),
                self.width
            )));
        }
        Ok(())
    }
}
