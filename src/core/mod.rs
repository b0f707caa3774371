//! Core data types for query sequences and identification candidates.

pub mod candidate;
pub mod sequence;
