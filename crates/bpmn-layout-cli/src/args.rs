//! Command-line argument definitions for the bpmn-layout CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the input and output formats, the
//! output path, the configuration file, and logging verbosity.

use clap::Parser;

use bpmn_layout::{ExportFormat, InputFormat};

/// Command-line arguments for the BPMN auto-layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input files: one BPMN document, or a node file and an edge file for CSV
    #[arg(required = true, num_args = 1..=2, help = "Path to the input file(s)")]
    pub inputs: Vec<String>,

    /// Input format (BPMN, CSV)
    #[arg(short = 't', long, default_value_t = InputFormat::Bpmn)]
    pub input_type: InputFormat,

    /// Output format (BPMN, SVG, ASCII)
    #[arg(short = 'u', long, default_value_t = ExportFormat::Bpmn)]
    pub output_type: ExportFormat,

    /// Output file; standard output when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
