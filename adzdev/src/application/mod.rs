pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use adz_core::error::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Create {
            archive,
            input,
            deterministic,
        } => handlers::handle_create(archive, input, deterministic),
        Commands::List { archive, long } => handlers::handle_list(archive, long),
        Commands::Extract {
            archive,
            dest,
            preserve_permissions,
            preserve_owner,
        } => handlers::handle_extract(archive, dest, preserve_permissions, preserve_owner),
        Commands::Verify { archive, json } => handlers::handle_verify(archive, json),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
