use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "media-monitor")]
#[command(about = "Watches a media directory and keeps its catalog in sync", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Watch the configured root and accept interactive commands
    Run,
    /// Reconcile the whole watch root against the catalog once
    Rescan,
    /// Print every cataloged record and the tag counts
    Dump,
    /// Query the catalog with field=value terms (regex on text fields)
    Query {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    /// Print configuration values
    PrintConfig,
    /// Write the current configuration to a file
    InitConfig {
        #[arg(default_value = "Config.toml")]
        path: PathBuf,
    },
}
