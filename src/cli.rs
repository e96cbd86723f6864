use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "multiface")]
#[command(version)]
#[command(about = "Inspect how a chain of fallback fonts covers text", long_about = None)]
#[command(after_help = "\
CONFIG:
    The chain is read from --config, or from
    $XDG_CONFIG_HOME/multiface/chain.toml (~/.config/multiface/chain.toml).
    Fonts are tried in the order they are listed:

        [face]
        size = 20.0
        dpi = 96.0

        [[font]]
        path = \"ArchitectsDaughter-Regular.ttf\"

        [[font]]
        path = \"ter-u12n.bdf\"")]
pub struct Cli {
    /// Chain description to load instead of the user config
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show which font answers for each character of TEXT
    Probe {
        text: String,
    },
    /// Show the metrics of the primary font
    Metrics,
}
