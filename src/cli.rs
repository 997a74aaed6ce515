use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reportpack")]
#[command(about = "Batch reporting pack builder for analyst data dumps", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline: ingest, clean, aggregate, write the report pack
    Run {
        /// Configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Override the configured input directory
        #[arg(long)]
        input: Option<PathBuf>,

        /// Override the configured output directory
        #[arg(long)]
        out: Option<PathBuf>,

        /// Override the configured currency code
        #[arg(long)]
        currency: Option<String>,

        /// Force PDF generation on
        #[arg(long, conflicts_with = "no_pdf")]
        pdf: bool,

        /// Force PDF generation off
        #[arg(long)]
        no_pdf: bool,
    },

    /// Write a starter config.yaml in the current directory
    Init {
        /// Overwrite an existing config.yaml
        #[arg(long)]
        force: bool,
    },

    /// Generate deterministic sample inputs and run over them
    Demo {
        /// Directory the demo inputs and outputs are written under
        #[arg(long, default_value = "demo")]
        dir: PathBuf,
    },
}
