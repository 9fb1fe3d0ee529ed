use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::collection::ImageCollection;
use crate::error::Result;
use crate::media::gif_comments;
use crate::policy::CorrectionPolicy;

static SEQ_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Data recovered: SEQ-(\d+) = '(.)'").expect("sequence metadata pattern")
});

/// Position 0 always decodes to this.
pub const BASE_CHAR: char = ' ';

/// `(position, char)` from one embedded comment, if it carries one.
pub fn parse_metadata(comment: &str) -> Option<(usize, char)> {
    let caps = SEQ_RE.captures(comment)?;
    let position = caps[1].parse().ok()?;
    let ch = caps[2].chars().next()?;
    Some((position, ch))
}

/// Sequence entries embedded in every image of the collection, in file-name
/// order. Images without usable metadata contribute nothing.
pub fn scan_collection(collection: &ImageCollection, workers: usize) -> Result<Vec<(usize, char)>> {
    let found = collection.par_map(workers, |file| {
        let bytes = match file.read() {
            Ok(b) => b,
            Err(e) => {
                warn!(file = %file.name, error = %e, "unreadable image, no sequence entry");
                return None;
            }
        };
        let comments = match gif_comments(&bytes) {
            Ok(c) => c,
            Err(e) => {
                debug!(file = %file.name, error = %e, "no readable gif metadata");
                return None;
            }
        };
        let entry = comments.iter().find_map(|c| parse_metadata(c));
        if entry.is_none() {
            debug!(file = %file.name, "no sequence metadata");
        }
        entry
    })?;
    Ok(found.into_iter().flatten().collect())
}

/// Sequence position -> character, remembering the order entries were applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceMap {
    chars: BTreeMap<usize, char>,
    applied: Vec<usize>,
}

impl SequenceMap {
    /// Scanned entries (later duplicates win), minus the known-bad positions,
    /// then manual overrides, then position 0 pinned to a space.
    pub fn build(entries: impl IntoIterator<Item = (usize, char)>, policy: &CorrectionPolicy) -> Self {
        let mut map = Self::default();
        for (position, ch) in entries {
            map.set(position, ch);
        }
        for bad in &policy.known_bad {
            map.remove(*bad);
        }
        for (&position, &ch) in &policy.overrides {
            map.set(position, ch);
        }
        map.set(0, BASE_CHAR);
        map
    }

    fn set(&mut self, position: usize, ch: char) {
        if self.chars.insert(position, ch).is_some() {
            self.applied.retain(|&p| p != position);
        }
        self.applied.push(position);
    }

    fn remove(&mut self, position: usize) {
        if self.chars.remove(&position).is_some() {
            self.applied.retain(|&p| p != position);
        }
    }

    pub fn get(&self, position: usize) -> Option<char> {
        self.chars.get(&position).copied()
    }

    /// Ascending by position.
    pub fn iter(&self) -> impl Iterator<Item = (usize, char)> + '_ {
        self.chars.iter().map(|(&p, &c)| (p, c))
    }

    /// In application order: scanned, then overrides, then position 0.
    pub fn applied(&self) -> impl Iterator<Item = (usize, char)> + '_ {
        self.applied.iter().map(|&p| (p, self.chars[&p]))
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embedded_comment() {
        assert_eq!(
            parse_metadata("Data recovered: SEQ-30045 = 'h'"),
            Some((30045, 'h'))
        );
        assert_eq!(
            parse_metadata("junk before Data recovered: SEQ-7 = ' ' junk after"),
            Some((7, ' '))
        );
        assert_eq!(parse_metadata("Data recovered: SEQ-7 = 'é'"), Some((7, 'é')));
    }

    #[test]
    fn malformed_comment_yields_nothing() {
        assert_eq!(parse_metadata(""), None);
        assert_eq!(parse_metadata("Data recovered: SEQ- = 'x'"), None);
        assert_eq!(parse_metadata("Data recovered: SEQ-4 = 'xy'"), None);
        assert_eq!(parse_metadata("Data recovered: SEQ-99999999999999999999999 = 'x'"), None);
    }

    #[test]
    fn manual_override_wins() {
        let policy = CorrectionPolicy {
            known_bad: vec![],
            overrides: BTreeMap::from([(5, 'w')]),
        };
        let map = SequenceMap::build([(5, 'q')], &policy);
        assert_eq!(map.get(5), Some('w'));
    }

    #[test]
    fn known_bad_removed_before_overrides() {
        let policy = CorrectionPolicy {
            known_bad: vec![9, 12],
            overrides: BTreeMap::from([(12, 'k')]),
        };
        let map = SequenceMap::build([(9, 'h'), (12, 'a'), (3, 'z')], &policy);
        assert_eq!(map.get(9), None);
        assert_eq!(map.get(12), Some('k'));
        assert_eq!(map.get(3), Some('z'));
    }

    #[test]
    fn overrides_apply_after_scanned_entries() {
        let policy = CorrectionPolicy {
            known_bad: vec![3],
            overrides: BTreeMap::from([(1, 'b'), (8, 'c')]),
        };
        let map = SequenceMap::build([(8, 'a'), (3, 'x'), (5, 'y'), (5, 'z')], &policy);
        let applied: Vec<_> = map.applied().collect();
        assert_eq!(applied, [(5, 'z'), (1, 'b'), (8, 'c'), (0, ' ')]);
    }

    #[test]
    fn later_duplicates_win() {
        let map = SequenceMap::build([(4, 'a'), (4, 'b')], &CorrectionPolicy::default());
        assert_eq!(map.get(4), Some('b'));
    }

    #[test]
    fn position_zero_is_always_space() {
        let policy = CorrectionPolicy {
            known_bad: vec![0],
            overrides: BTreeMap::from([(0, 'x')]),
        };
        let map = SequenceMap::build([(0, 'y')], &policy);
        assert_eq!(map.get(0), Some(' '));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn recovered_set_corrections() {
        let policy = CorrectionPolicy::recovered_set();
        let map = SequenceMap::build([(30045, 'h'), (12525, 'a'), (23, 'e')], &policy);
        assert_eq!(map.get(30045), None);
        assert_eq!(map.get(12525), None);
        assert_eq!(map.get(23), Some('a'));
        assert_eq!(map.get(197), Some('V'));
        assert_eq!(map.iter().next(), Some((0, ' ')));
    }
}
