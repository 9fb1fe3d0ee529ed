use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Recover the message hidden in GIF frame timings", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct GlobalArgs {
    /// Directory of locally available images
    #[arg(long, global = true, default_value = "imgs")]
    pub imgs: PathBuf,

    /// Timing matrix cache file
    #[arg(long, global = true, default_value = "timing_data.bin")]
    pub cache: PathBuf,

    /// Extraction worker threads
    #[arg(long, global = true, default_value_t = 4)]
    pub workers: usize,

    /// Exact total duration (ms) an image must have to be used
    #[arg(long = "duration-ms", global = true, default_value_t = 19_684_800)]
    pub duration_ms: u64,

    /// Width (ms) of one timing slot
    #[arg(long = "quantum-ms", global = true, default_value_t = 400)]
    pub quantum_ms: u64,

    /// Skip the hand-curated sequence corrections
    #[arg(long = "no-corrections", global = true)]
    pub no_corrections: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode and print the hidden message
    Decode,

    /// Rebuild the timing cache from the image directory
    Rebuild,

    /// Delete the timing cache
    Invalidate,

    /// Print the sequence position to character map
    Seqmap,

    /// Show how one image is read
    Inspect { image: PathBuf },

    /// Show the timing cache header
    Info,
}
