pub mod chain;
pub mod cli;
pub mod config;
pub mod font;
pub mod probe;

use log::info;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::font::FontFace;

pub fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default(),
    };
    if config.fonts.is_empty() {
        log::warn!("No fonts configured, every lookup will come back empty");
    }

    let mut face = chain::build(&config)?;
    info!("Fallback chain ready with {} font(s)", face.len());

    match cli.command {
        Command::Probe { text } => {
            for line in probe::probe(&face, &text) {
                println!("{}", line);
            }
        }
        Command::Metrics => println!("{}", probe::format_metrics(&face.metrics())),
    }

    face.release_entries()?;
    Ok(())
}
