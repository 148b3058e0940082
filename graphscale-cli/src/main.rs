//! CLI entry point for the graphscale generator.
//!
//! Parses command-line arguments with clap, executes the generation
//! pipeline, renders the run summary to stdout, and maps errors to exit
//! codes. Logging is initialised eagerly so subsequent phases can emit
//! structured diagnostics via `tracing`.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use graphscale_cli::{
    cli::{Cli, render_summary, run_cli},
    logging::{self, LoggingError},
};

/// Parse CLI arguments, execute the pipeline, render the summary, and
/// flush the output stream.
fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let summary = run_cli(&cli).context("failed to generate the scaled graph")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_summary(&summary, &mut writer).context("failed to render summary")?;
    writer.flush().context("failed to flush output")?;
    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init() {
        // Tracing is not available yet; stderr is all there is.
        report_logging_failure(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        error!(error = %err, "run failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn report_logging_failure(err: &LoggingError) {
    eprintln!("graphscale: diagnostics unavailable: {err}");
}
