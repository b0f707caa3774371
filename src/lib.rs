//! # spps-id
//!
//! A library for identifying species from DNA barcode sequences.
//!
//! Given a nucleotide sequence (typically a COI barcode), spps-id queries the
//! Barcode of Life Data system (BOLD) for an identification and can fall back
//! to NCBI BLAST when BOLD has no match. Results are written as tab-separated
//! tables, with a second table holding only matches above a similarity
//! threshold. A standalone WoRMS client resolves taxon names to AphiaIDs and
//! retrieves classifications and synonyms.
//!
//! ## Example
//!
//! ```rust,no_run
//! use spps_id::{HttpTransport, IdEngine, IdentifyConfig, SequenceRecord, TableWriter};
//!
//! let transport = HttpTransport::new().unwrap();
//! let engine = IdEngine::new(&transport, IdentifyConfig::default());
//!
//! let records = vec![SequenceRecord::new("query_1", "ACTGGCACCCTTTATCTAGTATTTGGTGC")];
//! let writer = TableWriter::new("sppsID.txt", 0.98);
//!
//! let summary = engine.identify_all(&records, &writer).unwrap();
//! eprintln!("wrote {} rows", summary.rows);
//! ```
//!
//! ## Modules
//!
//! - [`clients`]: BOLD, NCBI BLAST, and WoRMS web-service clients
//! - [`core`]: Core data types for sequences and identification candidates
//! - [`engine`]: The sequential identification pipeline
//! - [`parsing`]: Multi-FASTA input reading
//! - [`output`]: Tab-separated result tables
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod clients;
pub mod core;
pub mod engine;
pub mod output;
pub mod parsing;

// Re-export commonly used types for convenience
pub use clients::blast::{BlastClient, BlastHit, BlastOutcome, PollPolicy};
pub use clients::bold::{BoldClient, BoldDatabase, BoldMatch};
pub use clients::worms::{Classification, RankLookup, ResolvedTaxon, WormsClient};
pub use clients::{ClientError, HttpTransport, RetryPolicy, Transport, TransportError};
pub use core::candidate::Candidate;
pub use core::sequence::SequenceRecord;
pub use engine::{IdEngine, IdentifyConfig, RunSummary};
pub use output::TableWriter;
