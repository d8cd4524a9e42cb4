//! Command-line interface for bulls_cows.

use std::net::SocketAddr;
use std::path::PathBuf;

use bulls_cows_core::Alphabet;
use clap::{Parser, Subcommand};

/// Bulls and Cows - two-player code-breaking match server
#[derive(Parser, Debug)]
#[command(name = "bulls_cows")]
#[command(about = "Two-player Bulls and Cows match server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP match server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to bind to, overriding config and environment
        #[arg(long)]
        addr: Option<SocketAddr>,
    },

    /// Score a guess against a target code offline
    Score {
        /// The guessed code
        guess: String,

        /// The secret code
        target: String,

        /// Symbols allowed in both codes (digits or alphanumeric)
        #[arg(long, default_value_t = Alphabet::Digits)]
        alphabet: Alphabet,
    },
}
