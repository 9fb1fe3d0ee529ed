// lore_core/src/domain.rs

/// Colour state of one decoded frame at the probe pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameState {
    pub black: bool,
    pub duration_ms: u64,
}

/// Frames of one image, in display order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameSequence(pub Vec<FrameState>);

impl FrameSequence {
    pub fn total_duration_ms(&self) -> u64 {
        self.0.iter().map(|f| f.duration_ms).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameState> {
        self.0.iter()
    }
}

/// Fixed-length boolean sequence. Used both for image rows and for matrix
/// columns; equality and hashing are structural so it can key a map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TimingVector(Vec<bool>);

impl TimingVector {
    pub fn new(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<bool> {
        self.0.get(idx).copied()
    }

    /// MSB-first packing, `ceil(len / 8)` bytes.
    pub fn pack(&self) -> Vec<u8> {
        let mut out = vec![0u8; packed_len(self.0.len())];
        for (i, &b) in self.0.iter().enumerate() {
            if b {
                out[i / 8] |= 0x80 >> (i % 8);
            }
        }
        out
    }

    pub fn unpack(bytes: &[u8], len: usize) -> Self {
        let bits = (0..len)
            .map(|i| bytes.get(i / 8).is_some_and(|b| b & (0x80 >> (i % 8)) != 0))
            .collect();
        Self(bits)
    }
}

impl From<Vec<bool>> for TimingVector {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl FromIterator<bool> for TimingVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub fn packed_len(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// One accepted image: its file name and its timing vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingRow {
    pub source: String,
    pub vector: TimingVector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_keeps_bit_order() {
        let v = TimingVector::new(vec![true, false, false, true, true, false, false, false, true]);
        let packed = v.pack();
        assert_eq!(packed, vec![0b1001_1000, 0b1000_0000]);
        assert_eq!(TimingVector::unpack(&packed, 9), v);
    }

    #[test]
    fn equal_bits_hash_equal() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(TimingVector::new(vec![true, false]));
        assert!(set.contains(&TimingVector::from(vec![true, false])));
        assert!(!set.contains(&TimingVector::from(vec![false, true])));
    }

    #[test]
    fn sequence_total_duration() {
        let seq = FrameSequence(vec![
            FrameState { black: true, duration_ms: 400 },
            FrameState { black: false, duration_ms: 800 },
        ]);
        assert_eq!(seq.total_duration_ms(), 1200);
        assert_eq!(seq.len(), 2);
    }
}
