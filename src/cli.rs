use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "copy-json")]
#[command(about = "Show a JSON payload with a click-to-copy button", long_about = None)]
pub struct Cli {
    /// Read the payload from this file instead of stdin
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Press the copy button once without opening the page
    Copy,
}
