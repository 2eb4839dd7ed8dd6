//! Command-line argument definitions for the bpmn-layout CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the input and output files, the
//! configuration file, layout overrides, and logging verbosity.

use clap::Parser;

use bpmn_layout::config::{Direction, LayoutEngine, LayoutMode};

/// Command-line arguments for the bpmn-layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input model (JSON)
    #[arg(help = "Path to the input model file")]
    pub input: String,

    /// Path to the positioned output model (JSON)
    #[arg(short, long, default_value = "out.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Layout mode override (auto, preserve)
    #[arg(long)]
    pub mode: Option<LayoutMode>,

    /// Flow direction override (LR, TB)
    #[arg(long)]
    pub direction: Option<Direction>,

    /// Placement engine override (basic, sugiyama, graphviz)
    #[arg(long)]
    pub engine: Option<LayoutEngine>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Arguments for laying out `input` into `output` with default settings.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            config: None,
            mode: None,
            direction: None,
            engine: None,
            log_level: "off".to_string(),
        }
    }
}
