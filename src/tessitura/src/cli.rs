use clap::{Parser, Subcommand};

use crate::cmd::*;

mod args;

/// The CLI interface for the Tessitura application.
#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Cli {
    /// The selected command.
    #[clap(subcommand)]
    pub command: TessituraCommand,

    #[clap(flatten)]
    pub verbosity: args::Verbosity,
}

/// The top-level commands supported by Tessitura.
#[derive(Debug, Subcommand)]
pub enum TessituraCommand {
    Extract(extract::Extract),
}

impl Command for TessituraCommand {
    fn handle(self) -> eyre::Result<()> {
        match self {
            Self::Extract(extract) => extract.handle(),
        }
    }
}
