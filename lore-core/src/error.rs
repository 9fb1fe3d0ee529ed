use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Corrupt timing cache {}: {reason}", .path.display())]
    CorruptCache { path: PathBuf, reason: String },

    #[error("No usable images in {}", .0.display())]
    EmptyCollection(PathBuf),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, LoreError>;
