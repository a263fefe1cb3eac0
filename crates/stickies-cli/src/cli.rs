use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stickies")]
#[command(about = "Colorful sticky notes from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quick capture: stickies "my note here"
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note content (read from stdin when omitted)
        content: Vec<String>,
        /// Palette color, by name (`green`) or hex (`#dcfce7`)
        #[arg(short, long, value_name = "COLOR", default_value = "yellow")]
        color: String,
        /// Image to attach (at most 5 MiB)
        #[arg(short, long, value_name = "PATH")]
        image: Option<PathBuf>,
    },
    /// List notes, newest first
    List {
        /// Number of notes to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single note
    Show {
        /// Note ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a note
    Delete {
        /// Note ID
        id: String,
    },
    /// Print the share link for a note
    Share {
        /// Note ID
        id: String,
    },
}
