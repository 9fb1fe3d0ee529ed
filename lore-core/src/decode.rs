use std::collections::HashMap;

use tracing::warn;

use crate::domain::TimingVector;
use crate::matrix::TimingMatrix;
use crate::seqmap::SequenceMap;

/// Caret-notation control markers, replaced in this order.
const ESCAPES: [(&str, &str); 3] = [("^J", "\n"), ("^I", "\t"), ("^L", "\u{0c}")];

/// Matrix column -> character.
#[derive(Clone, Debug, Default)]
pub struct LetterMap(HashMap<TimingVector, char>);

impl LetterMap {
    /// Keys each mapped position's column, in the sequence map's application
    /// order. When two positions share a column the later-applied one wins, so
    /// overrides beat scanned entries and position 0 is bound last.
    pub fn build(matrix: &TimingMatrix, seq: &SequenceMap) -> Self {
        let mut map = HashMap::with_capacity(seq.len());
        for (position, ch) in seq.applied() {
            match matrix.column(position) {
                Some(col) => {
                    map.insert(col, ch);
                }
                None => warn!(
                    position,
                    width = matrix.width(),
                    "sequence position beyond matrix width, ignored"
                ),
            }
        }
        Self(map)
    }

    pub fn get(&self, column: &TimingVector) -> Option<char> {
        self.0.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Matrix column -> index of its first occurrence, left to right.
#[derive(Clone, Debug, Default)]
pub struct PositionFallbackMap(HashMap<TimingVector, usize>);

impl PositionFallbackMap {
    pub fn build(matrix: &TimingMatrix) -> Self {
        let mut map = HashMap::new();
        for (i, col) in matrix.columns().enumerate() {
            map.entry(col).or_insert(i);
        }
        Self(map)
    }

    pub fn get(&self, column: &TimingVector) -> Option<usize> {
        self.0.get(column).copied()
    }

    /// Number of distinct columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Message with unmapped columns as `<N>` placeholders; escapes untouched.
pub fn decode_raw(matrix: &TimingMatrix, seq: &SequenceMap) -> String {
    let letters = LetterMap::build(matrix, seq);
    let fallback = PositionFallbackMap::build(matrix);

    let mut out = String::with_capacity(matrix.width());
    for (position, col) in matrix.columns().enumerate() {
        match letters.get(&col) {
            Some(ch) => out.push(ch),
            None => {
                // every column is in the fallback map by construction
                let first = fallback.get(&col).unwrap_or(position);
                out.push_str(&format!("<{first}>"));
            }
        }
    }
    out
}

pub fn render_escapes(raw: &str) -> String {
    ESCAPES
        .iter()
        .fold(raw.to_string(), |s, (from, to)| s.replace(from, to))
}

/// Final message for `matrix` under `seq`. Deterministic; no I/O.
pub fn decode(matrix: &TimingMatrix, seq: &SequenceMap) -> String {
    render_escapes(&decode_raw(matrix, seq))
}
