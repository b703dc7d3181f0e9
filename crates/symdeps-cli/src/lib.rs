//! Library interface for the symdeps command line

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use symdeps_core::{DependencySpec, ExitStatus, NmSymbolSource, VerificationReport, Verifier};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "symdeps")]
#[command(
    about = "Check that built object files only depend on the libraries they declare",
    long_about = None
)]
pub struct Cli {
    /// Root directory with one subdirectory of object files per library
    pub root: PathBuf,

    /// Dependency declaration (TOML)
    #[arg(short = 's', long = "deps", env = "SYMDEPS_DEPS", default_value = "dependencies.toml")]
    pub deps: PathBuf,

    /// nm binary to use instead of the one on PATH
    #[arg(long, env = "SYMDEPS_NM")]
    pub nm: Option<PathBuf>,

    /// Object file extension
    #[arg(long, default_value = "o")]
    pub object_ext: String,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exit with status 2 when the run passes with informational diagnostics
    #[arg(long)]
    pub warnings_exit_code: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,
}

/// Install the log subscriber. `RUST_LOG` takes precedence over the flags.
pub fn init_tracing(cli: &Cli) {
    let level = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug)
        .with_writer(std::io::stderr)
        .init();
}

/// Load the declaration, verify the build tree and print the report
pub fn run(cli: &Cli) -> Result<ExitStatus> {
    let spec = DependencySpec::load(&cli.deps)
        .with_context(|| format!("Failed to load dependency declaration {}", cli.deps.display()))?;
    info!(
        "Loaded {} items, {} libraries from {}",
        spec.items.len(),
        spec.libraries.len(),
        cli.deps.display()
    );

    let source = match &cli.nm {
        Some(nm) => NmSymbolSource::with_binary(nm),
        None => NmSymbolSource::new()?,
    };

    let report = Verifier::new(&cli.root, spec, source)
        .with_object_extension(cli.object_ext.clone())
        .run()?;

    if let Some(output_path) = &cli.output {
        std::fs::write(output_path, report.to_json()?)
            .with_context(|| format!("Failed to write report to {}", output_path.display()))?;
        info!("Report written to: {}", output_path.display());
    }

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print_report(&report, &mut std::io::stdout(), &mut std::io::stderr())?;
    }

    Ok(report.exit_status(cli.warnings_exit_code))
}

/// Informational lines go to `out`, errors to `err`
pub fn print_report<O: Write, E: Write>(
    report: &VerificationReport,
    out: &mut O,
    err: &mut E,
) -> std::io::Result<()> {
    for diagnostic in &report.diagnostics {
        let severity = diagnostic.severity();
        if diagnostic.is_error() {
            writeln!(err, "{}: {}", severity, diagnostic)?;
        } else {
            writeln!(out, "{}: {}", severity, diagnostic)?;
        }
    }
    if report.is_success() {
        writeln!(out, "{}", symdeps_core::report::SUCCESS_LINE)?;
    }
    Ok(())
}
