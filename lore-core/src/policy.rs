use std::collections::BTreeMap;

/// Hand-curated fixes applied on top of the scanned sequence map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorrectionPolicy {
    /// Scanned positions whose embedded metadata is wrong; always dropped.
    pub known_bad: Vec<usize>,
    /// Position -> character; overwrites scanned values and fills gaps.
    pub overrides: BTreeMap<usize, char>,
}

impl CorrectionPolicy {
    /// The fixed corrections for the recovered image set.
    pub fn recovered_set() -> Self {
        Self {
            known_bad: vec![30045, 12525],
            overrides: BTreeMap::from([
                (23, 'a'),
                (36, 'k'),
                (42, 'h'),
                (74, 's'),
                (99, 'c'),
                (133, 'Z'),
                (143, 'v'),
                (159, 'x'),
                (177, 'g'),
                (197, 'V'),
            ]),
        }
    }
}
