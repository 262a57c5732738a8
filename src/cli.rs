//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

/// shorturls - A URL shortener with expiring shortcodes
#[derive(Parser, Debug)]
#[command(name = "shorturls")]
#[command(version)]
#[command(about = "A URL shortener with expiring shortcodes and click statistics", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, short = 'c', global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Write a sample configuration file
    GenerateConfig {
        /// Output file path (default: stdout)
        path: Option<String>,
    },
}
