pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use lore_core::error::Result;

pub fn run(cli: Cli) -> Result<()> {
    let g = cli.global;
    match cli.command {
        Commands::Decode => handlers::handle_decode(&g),
        Commands::Rebuild => handlers::handle_rebuild(&g),
        Commands::Invalidate => handlers::handle_invalidate(&g),
        Commands::Seqmap => handlers::handle_seqmap(&g),
        Commands::Inspect { image } => handlers::handle_inspect(&g, image),
        Commands::Info => handlers::handle_info(&g),
    }
}
