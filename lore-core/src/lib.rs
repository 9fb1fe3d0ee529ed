#![forbid(unsafe_code)]

pub mod error;
pub mod policy;
pub mod stats;

pub mod collection;
pub mod domain;
pub mod matrix;
pub mod media;

pub mod container {
    pub mod manifest;
    pub mod superblock;
}

pub mod timing {
    pub mod cache;
    pub mod extract;
}

pub mod decode;
pub mod seqmap;

// Re-exports: stable API surface
pub use collection::ImageCollection;
pub use decode::{LetterMap, PositionFallbackMap, decode, decode_raw, render_escapes};
pub use domain::{FrameSequence, FrameState, TimingRow, TimingVector};
pub use matrix::TimingMatrix;
pub use policy::CorrectionPolicy;
pub use seqmap::{SequenceMap, parse_metadata, scan_collection};
pub use stats::BuildStats;
pub use timing::cache::{BuildOptions, CacheInfo, TimingCache, build_matrix};
pub use timing::extract::{ExtractOptions, Extracted, Rejection, extract_timing};
