//! Multi-FASTA reader using noodles.
//!
//! Reads every record into memory, preserving file order. Labels keep the
//! full header text (name plus description) without the leading `>`; records
//! are never merged or dropped, so duplicate headers survive as separate
//! entries. Supports gzip-compressed input by extension.

use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use noodles::fasta;
use thiserror::Error;

use crate::core::sequence::SequenceRecord;

#[derive(Error, Debug)]
pub enum FastaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid FASTA: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Read all records from a multi-FASTA file.
///
/// # Errors
///
/// Returns `FastaError::Io` if the file cannot be read, `FastaError::Noodles`
/// if parsing fails, or `FastaError::InvalidFormat` if no records are found.
pub fn read_fasta_file(path: &Path) -> Result<Vec<SequenceRecord>, FastaError> {
    if is_gzipped(path) {
        read_fasta_gzipped(path)
    } else {
        read_fasta_uncompressed(path)
    }
}

fn read_fasta_uncompressed(path: &Path) -> Result<Vec<SequenceRecord>, FastaError> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut fasta_reader = fasta::io::Reader::new(reader);

    read_records(&mut fasta_reader)
}

fn read_fasta_gzipped(path: &Path) -> Result<Vec<SequenceRecord>, FastaError> {
    let file = std::fs::File::open(path)?;
    let decoder = GzDecoder::new(file);
    let reader = BufReader::new(decoder);
    let mut fasta_reader = fasta::io::Reader::new(reader);

    read_records(&mut fasta_reader)
}

fn read_records<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> Result<Vec<SequenceRecord>, FastaError> {
    let mut records = Vec::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| FastaError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        let name = String::from_utf8_lossy(record.name()).to_string();
        let label = match record.description() {
            Some(description) => {
                format!("{name} {}", String::from_utf8_lossy(description))
            }
            None => name,
        };
        let sequence = String::from_utf8_lossy(record.sequence().as_ref()).to_string();

        records.push(SequenceRecord::new(label, sequence));
    }

    if records.is_empty() {
        return Err(FastaError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(records)
}
