use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "colloquy")]
#[command(author, version, about = "Chat client core with persistent conversations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a single prompt and print the reply
    Ask { prompt: String },

    /// Start an interactive chat with a persistent conversation list
    Interactive {
        /// Directory conversations are stored in (default: from settings)
        #[arg(long)]
        storage_dir: Option<String>,

        /// Keep conversations in memory only
        #[arg(short, long)]
        ephemeral: bool,
    },

    /// List stored conversations
    List {
        /// Directory conversations are stored in (default: from settings)
        #[arg(long)]
        storage_dir: Option<String>,
    },
}
