//! CLI logic for the BPMN auto-layout tool.
//!
//! [`run`] reads the input files, lays the process out, and writes the
//! result. Problems with the invocation itself are reported as
//! [`CliError::Usage`] and map to exit code 2; everything else exits with 1.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    fs,
    io::{self, Write as _},
    path::Path,
};

use log::info;
use thiserror::Error;

use bpmn_layout::{AutoLayout, Error, Input, InputFormat};

/// Failure of one CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    /// The invocation is wrong; nothing was read.
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Run(#[from] Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Run(_) => 1,
        }
    }
}

fn check_inputs(args: &Args) -> Result<(), CliError> {
    let expected = args.input_type.file_count();
    if args.inputs.len() != expected {
        return Err(CliError::Usage(format!(
            "{} input takes {expected} file(s), got {}",
            args.input_type,
            args.inputs.len()
        )));
    }
    if let Some(missing) = args.inputs.iter().find(|path| !Path::new(path).is_file()) {
        return Err(CliError::Usage(format!("input file `{missing}` does not exist")));
    }
    Ok(())
}

/// Run the BPMN auto-layout CLI application
///
/// # Errors
///
/// Returns [`CliError::Usage`] when the number of input files does not
/// match the input type or an input file is missing, and
/// [`CliError::Run`] for configuration, I/O, parse, layout and export
/// errors.
pub fn run(args: &Args) -> Result<(), CliError> {
    check_inputs(args)?;
    info!(
        inputs:? = args.inputs,
        input_type:% = args.input_type,
        output_type:% = args.output_type;
        "Processing process"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let auto_layout = AutoLayout::new(app_config);

    let sources = args
        .inputs
        .iter()
        .map(fs::read_to_string)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)?;
    let input = match args.input_type {
        InputFormat::Bpmn => Input::Bpmn(&sources[0]),
        InputFormat::Csv => Input::Csv {
            nodes: &sources[0],
            edges: &sources[1],
        },
    };

    let output = auto_layout.generate(input, args.output_type)?;

    match &args.output {
        Some(path) => {
            fs::write(path, output).map_err(Error::from)?;
            info!(output_file = path; "Layout written");
        }
        None => io::stdout()
            .lock()
            .write_all(output.as_bytes())
            .map_err(Error::from)?,
    }

    Ok(())
}
