use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "adzdev: ADZ directory containers", long_about = None)]
pub struct Cli {
    /// More logging on stderr (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Archive a file or directory into a new container
    #[command(visible_alias = "c")]
    Create {
        archive: PathBuf,
        input: PathBuf,

        /// Store owner/group as 0 for reproducible output
        #[arg(long)]
        deterministic: bool,
    },

    /// Print the archived tree
    #[command(visible_alias = "p")]
    List {
        archive: PathBuf,

        /// show mode, owner, group and size
        #[arg(long)]
        long: bool,
    },

    /// Recreate the archived tree under a destination directory
    #[command(visible_alias = "x")]
    Extract {
        archive: PathBuf,
        dest: PathBuf,

        /// Apply stored permission bits
        #[arg(long)]
        preserve_permissions: bool,

        /// Apply stored owner/group (best effort, usually needs root)
        #[arg(long)]
        preserve_owner: bool,
    },

    /// Check container structure end to end
    Verify {
        archive: PathBuf,

        /// print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}
