use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::clients::bold::BoldDatabase;
use crate::clients::HttpTransport;
use crate::engine::{IdEngine, IdentifyConfig, DEFAULT_PACING};
use crate::output::TableWriter;
use crate::parsing::fasta;

pub const DEFAULT_OUTPUT: &str = "sppsID.txt";

#[derive(Args)]
pub struct IdentifyArgs {
    /// Multi-FASTA file with the query sequences
    #[arg(required = true)]
    pub input: PathBuf,

    /// Minimum similarity for a match to reach the filtered table
    #[arg(short = 't', long, default_value = "0.98")]
    pub threshold: f64,

    /// BOLD database to query
    #[arg(short = 'b', long, value_enum, default_value = "cox1-species-public")]
    pub bold_db: BoldDatabase,

    /// Fall back to NCBI BLAST when BOLD finds nothing
    #[arg(short = 'n', long)]
    pub ncbi: bool,

    /// Output table name; the filtered table gets a `_filtered` suffix
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT)]
    pub out: PathBuf,
}

/// Execute the identify subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be read, the HTTP client cannot be
/// built, or an output file cannot be written. Per-sequence service failures
/// are isolated by the engine and do not surface here.
pub fn run(args: IdentifyArgs, quiet: bool) -> anyhow::Result<()> {
    let records = fasta::read_fasta_file(&args.input)
        .with_context(|| format!("could not read {}", args.input.display()))?;

    if !quiet {
        eprintln!(
            "Read {} sequences from {}",
            records.len(),
            args.input.display()
        );
    }

    let transport = HttpTransport::new().context("could not build HTTP client")?;
    let config = IdentifyConfig {
        database: args.bold_db,
        blast_fallback: args.ncbi,
        pacing: DEFAULT_PACING,
        quiet,
    };
    let engine = IdEngine::new(&transport, config);
    let writer = TableWriter::new(&args.out, args.threshold);

    let summary = engine
        .identify_all(&records, &writer)
        .with_context(|| format!("could not write {}", args.out.display()))?;

    if !quiet {
        eprintln!(
            "Wrote {} rows for {} sequences to {}",
            summary.rows,
            summary.sequences,
            args.out.display()
        );
    }

    Ok(())
}
