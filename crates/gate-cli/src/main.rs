//! `gate`: inspect markers, classify test paths and evaluate suite manifests

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gate")]
#[command(about = "Selection gate - decide which marked tests run on this host")]
#[command(version)]
struct Cli {
    /// Suite manifest path
    #[arg(short = 'c', long, global = true, default_value = "gate.yaml")]
    manifest: PathBuf,

    /// Raise the log level (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the registered markers
    Markers,

    /// Print the category tags of test paths
    Classify {
        /// Test file paths
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Validate the manifest
    Validate {
        /// Strict mode - fail on unregistered markers
        #[arg(short, long)]
        strict: bool,
    },

    /// Decide run or skip for every test in the manifest
    Evaluate {
        /// Run tests marked destructive_test
        #[arg(long)]
        run_destructive: bool,

        /// Run tests marked expensive_test
        #[arg(long)]
        run_expensive: bool,

        /// Only evaluate tests carrying this category tag
        #[arg(short = 'm', long)]
        tag: Option<String>,

        /// Output format (table or json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Run the network probes
    Probe {
        /// Output format (table or json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Markers => commands::markers::run(),
        Commands::Classify { paths } => commands::classify::run(&cli.manifest, &paths),
        Commands::Validate { strict } => commands::validate::run(&cli.manifest, strict),
        Commands::Evaluate {
            run_destructive,
            run_expensive,
            tag,
            format,
        } => commands::evaluate::run(
            &cli.manifest,
            run_destructive,
            run_expensive,
            tag.as_deref(),
            &format,
        ),
        Commands::Probe { format } => commands::probe::run(&cli.manifest, &format),
    }
}
