//! Settle CLI library
//!
//! This module contains the core CLI logic for the Settle layout tool.

pub mod error_adapter;

mod args;
mod config;
mod graph_file;
mod output;

pub use args::{Args, OutputFormat};

use log::{info, warn};

use settle::{LayoutBuilder, SettleError};

/// Run the Settle CLI application
///
/// This function lays out the graph described by the input file and writes
/// the result to the output file in the requested format.
///
/// # Errors
///
/// Returns `SettleError` for:
/// - File I/O errors
/// - Configuration loading and validation errors
/// - Graph file parse errors
/// - Inconsistent graphs (duplicate names, unknown edge endpoints)
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), SettleError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing graph"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let description = graph_file::load_graph(&args.input)?;

    let builder = LayoutBuilder::new(app_config);
    let (graph, outcome) = builder.layout(description)?;
    if !outcome.is_relaxed() {
        warn!(
            elapsed:? = outcome.elapsed(),
            cycles = outcome.cycles();
            "Calculation time limit reached before the layout relaxed"
        );
    }

    output::write_output(&builder, &graph, args.format, &args.output)?;

    info!(output_file = args.output; "Layout exported successfully");

    Ok(())
}
