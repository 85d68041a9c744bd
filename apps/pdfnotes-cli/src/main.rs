//! pdfnotes binary
//!
//! Command-line front end for the page transformer: pick an input PDF,
//! optionally an output path and a line spacing, and get a copy with ruled
//! note margins.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use pdfnotes_core::{derive_output_path, parse_spacing, plan, LopdfSource, NotesOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pdfnotes")]
#[command(version, about = "Add ruled note margins to every page of a PDF")]
struct Args {
    /// Input PDF
    input: PathBuf,

    /// Output PDF (default: "<input> - notes.pdf" next to the input)
    #[arg(short, long)]
    output: Option<String>,

    /// Gap between ruled lines in centimeters (default: 0.7)
    #[arg(short, long)]
    spacing: Option<String>,

    /// TOML file with ruling options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print page layouts as JSON instead of writing a PDF
    #[arg(long)]
    plan: bool,

    /// Log per-page details to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn options(&self) -> anyhow::Result<NotesOptions> {
        let options = match &self.config {
            Some(path) => NotesOptions::from_file(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => NotesOptions::default(),
        };

        match &self.spacing {
            Some(text) => Ok(options.with_spacing(parse_spacing(text)?)),
            None => Ok(options),
        }
    }

    /// Explicit output path, or one derived from the input when blank
    fn output_path(&self, options: &NotesOptions) -> PathBuf {
        match &self.output {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => derive_output_path(&self.input, &options.output_suffix),
        }
    }
}

/// Filter used when RUST_LOG is unset
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // stdout carries results; logs go to stderr
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn print_plan(input: &Path, options: &NotesOptions) -> anyhow::Result<String> {
    let source = LopdfSource::open(input)?;
    let layouts = plan(&source, options)?;
    Ok(serde_json::to_string_pretty(&layouts)?)
}

/// Run one invocation, returning the message shown on success
fn run(args: &Args) -> anyhow::Result<String> {
    let options = args.options()?;

    if args.plan {
        return print_plan(&args.input, &options);
    }

    let output = args.output_path(&options);
    tracing::info!("Processing {} -> {}", args.input.display(), output.display());

    let report = pdfnotes_core::transform_file(&args.input, &output, &options)?;

    Ok(format!(
        "PDF processed successfully.\nOutput saved as: {} ({} pages)",
        output.display(),
        report.page_count
    ))
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(message) => {
            println!("{}", message);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("An error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
