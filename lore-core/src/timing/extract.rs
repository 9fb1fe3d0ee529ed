use crate::domain::{FrameSequence, TimingVector};
use crate::error::Result;
use crate::media::read_frames;

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Exact total duration an image must have to be accepted.
    pub expected_duration_ms: u64,
    /// Width of one timing slot.
    pub quantum_ms: u64,
    /// Pixel whose colour is sampled in every frame.
    pub probe: (u32, u32),
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            expected_duration_ms: 19_684_800,
            quantum_ms: 400,
            probe: (0, 0),
        }
    }
}

impl ExtractOptions {
    /// Canonical length of every accepted vector.
    pub fn vector_len(&self) -> usize {
        if self.quantum_ms == 0 {
            return 0;
        }
        (self.expected_duration_ms / self.quantum_ms) as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    NoFrames,
    ProbeOutOfBounds,
    DurationMismatch { expected: u64, actual: u64 },
    LengthMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NoFrames => write!(f, "no frames"),
            Rejection::ProbeOutOfBounds => write!(f, "probe pixel outside canvas"),
            Rejection::DurationMismatch { expected, actual } => {
                write!(f, "total duration {actual}ms, expected {expected}ms")
            }
            Rejection::LengthMismatch { expected, actual } => {
                write!(f, "resampled to {actual} slots, expected {expected}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extracted {
    Vector(TimingVector),
    Rejected(Rejection),
}

/// Decode one GIF and resample it. `Err` only for undecodable bytes.
pub fn extract_timing(bytes: &[u8], opts: &ExtractOptions) -> Result<Extracted> {
    match read_frames(bytes, opts.probe)? {
        Some(frames) => Ok(resample(&frames, opts)),
        None => Ok(Extracted::Rejected(Rejection::ProbeOutOfBounds)),
    }
}

/// Gate on exact total duration, then expand each frame into
/// `round(duration / quantum)` slots of its colour state.
pub fn resample(frames: &FrameSequence, opts: &ExtractOptions) -> Extracted {
    if frames.is_empty() {
        return Extracted::Rejected(Rejection::NoFrames);
    }
    let total = frames.total_duration_ms();
    if total != opts.expected_duration_ms {
        return Extracted::Rejected(Rejection::DurationMismatch {
            expected: opts.expected_duration_ms,
            actual: total,
        });
    }

    let expected = opts.vector_len();
    let q = opts.quantum_ms.max(1);
    let mut bits = Vec::with_capacity(expected);
    for f in frames.iter() {
        let slots = (f.duration_ms + q / 2) / q;
        bits.extend(std::iter::repeat_n(f.black, slots as usize));
    }
    if bits.len() != expected {
        return Extracted::Rejected(Rejection::LengthMismatch {
            expected,
            actual: bits.len(),
        });
    }
    Extracted::Vector(TimingVector::new(bits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FrameState;

    fn opts(total: u64) -> ExtractOptions {
        ExtractOptions {
            expected_duration_ms: total,
            quantum_ms: 400,
            probe: (0, 0),
        }
    }

    fn frames(spec: &[(bool, u64)]) -> FrameSequence {
        FrameSequence(
            spec.iter()
                .map(|&(black, duration_ms)| FrameState { black, duration_ms })
                .collect(),
        )
    }

    #[test]
    fn default_vector_len() {
        assert_eq!(ExtractOptions::default().vector_len(), 49_212);
    }

    #[test]
    fn expands_frames_in_order() {
        let got = resample(&frames(&[(true, 400), (false, 1200), (true, 400)]), &opts(2000));
        assert_eq!(
            got,
            Extracted::Vector(TimingVector::new(vec![true, false, false, false, true]))
        );
    }

    #[test]
    fn rejects_wrong_total() {
        let got = resample(&frames(&[(true, 400), (false, 400)]), &opts(1200));
        assert_eq!(
            got,
            Extracted::Rejected(Rejection::DurationMismatch {
                expected: 1200,
                actual: 800
            })
        );
    }

    #[test]
    fn rounds_off_grid_frames() {
        // 590 -> 1 slot, 610 -> 2 slots
        let got = resample(&frames(&[(true, 590), (false, 610)]), &opts(1200));
        assert_eq!(got, Extracted::Vector(TimingVector::new(vec![true, false, false])));
    }

    #[test]
    fn rejects_when_rounding_changes_length() {
        // 600 + 600 rounds to 2 + 2 slots but 1200 / 400 == 3
        let got = resample(&frames(&[(true, 600), (false, 600)]), &opts(1200));
        assert_eq!(
            got,
            Extracted::Rejected(Rejection::LengthMismatch {
                expected: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn rejects_empty() {
        let got = resample(&FrameSequence::default(), &opts(1200));
        assert_eq!(got, Extracted::Rejected(Rejection::NoFrames));
    }
}
