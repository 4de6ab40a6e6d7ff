//! h5file CLI
//!
//! Command-line tools for h5file containers.
//!
//! # Commands
//!
//! - `create` - Create a container
//! - `inspect` - Display container metadata
//! - `ls` - List groups
//! - `mkgroup` - Create a group
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// h5file command-line container tools.
#[derive(Parser)]
#[command(name = "h5file")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the container
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Low-level driver (sec2, stdio, core, family)
    #[arg(global = true, short, long)]
    driver: Option<String>,

    /// Driver option as KEY=VALUE, repeatable
    #[arg(global = true, short = 'o', long = "option")]
    options: Vec<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a container
    Create {
        /// Mode token (w, w-, x, a)
        #[arg(short, long, default_value = "w-")]
        mode: String,

        /// Compatibility bound: one tag, or LOW,HIGH
        #[arg(short, long)]
        libver: Option<String>,
    },

    /// Display container metadata
    Inspect {
        /// List every group
        #[arg(short, long)]
        groups: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the groups below a group
    Ls {
        /// Group to list
        #[arg(default_value = "/")]
        group: String,

        /// Descend into subgroups
        #[arg(short, long)]
        recursive: bool,
    },

    /// Create a group
    Mkgroup {
        /// Group path
        name: String,

        /// Create missing parents, and succeed if the group exists
        #[arg(long)]
        parents: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let target = commands::Target::new(cli.driver, &cli.options)?;

    match cli.command {
        Commands::Create { mode, libver } => {
            let path = cli.path.ok_or("Container path required for create")?;
            commands::create::run(&path, &target, &mode, libver.as_deref())?;
        }
        Commands::Inspect { groups, format } => {
            let path = cli.path.ok_or("Container path required for inspect")?;
            commands::inspect::run(&path, &target, groups, &format)?;
        }
        Commands::Ls { group, recursive } => {
            let path = cli.path.ok_or("Container path required for ls")?;
            commands::ls::run(&path, &target, &group, recursive)?;
        }
        Commands::Mkgroup { name, parents } => {
            let path = cli.path.ok_or("Container path required for mkgroup")?;
            commands::mkgroup::run(&path, &target, &name, parents)?;
        }
        Commands::Version => {
            println!("h5file CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("h5file Core v{}", h5file_core::VERSION);
        }
    }

    Ok(())
}
