//! Command-line interface for spps-id.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **identify**: Identify every sequence in a multi-FASTA file
//! - **taxon**: Resolve a taxon name against WoRMS
//!
//! ## Usage
//!
//! ```text
//! # Identify sequences, BOLD only
//! spps-id identify queries.fasta
//!
//! # Enable the NCBI BLAST fallback and raise the filter threshold
//! spps-id identify queries.fasta --ncbi --threshold 0.99
//!
//! # Query a different BOLD database, custom output name
//! spps-id identify queries.fasta -b cox1 -o results.txt
//!
//! # Resolve a taxon and print its classification
//! spps-id taxon "Mobula birostris"
//!
//! # Just one rank, or the synonym list
//! spps-id taxon "Manta birostris" --rank Family
//! spps-id taxon "Manta birostris" --synonyms
//! ```

use clap::{Parser, Subcommand};

pub mod identify;
pub mod taxon;

#[derive(Parser)]
#[command(name = "spps-id")]
#[command(version)]
#[command(about = "Identify species from DNA barcode sequences")]
#[command(
    long_about = "spps-id wraps the BOLD and NCBI BLAST identification services for batch species\nidentification from multi-FASTA files.\n\nHosts:\n  BOLD: http://www.boldsystems.org/index.php/Ids_xml\n  NCBI: https://blast.ncbi.nlm.nih.gov/blast/Blast.cgi\n  WoRMS: https://www.marinespecies.org/rest"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Suppress progress messages
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify every sequence in a multi-FASTA file
    Identify(identify::IdentifyArgs),

    /// Resolve a taxon name against the World Register of Marine Species
    Taxon(taxon::TaxonArgs),
}
