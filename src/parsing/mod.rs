//! Parsers for query input files.
//!
//! Currently a single format: multi-FASTA (plain or gzip-compressed), read
//! into ordered [`SequenceRecord`](crate::core::sequence::SequenceRecord)s.

pub mod fasta;
