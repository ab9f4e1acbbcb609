//! Command-line argument definitions for the Trellis CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, per-run layout overrides, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Trellis layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input diagram (JSON)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output layout file (JSON)
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Flow direction (TB, BT, LR, RL, DOWN, UP, RIGHT, LEFT)
    #[arg(short, long)]
    pub direction: Option<String>,

    /// Placement algorithm (layered, force, stress, radial, tree, circular)
    #[arg(short, long)]
    pub algorithm: Option<String>,

    /// Gap between sibling elements
    #[arg(short, long)]
    pub spacing: Option<f32>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
