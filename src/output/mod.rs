//! Tab-separated result tables.
//!
//! Every identification attempt appends one group of rows to the main table;
//! rows whose numeric similarity meets the threshold are additionally
//! appended to `<out>_filtered`, which is only created once a row qualifies.
//! Writes are append-only: re-running against the same output name
//! accumulates rows, it never rewrites or deduplicates. Files are opened and
//! closed per group rather than held across the run.

use std::ffi::OsStr;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::core::candidate::Candidate;

pub struct TableWriter {
    path: PathBuf,
    filtered_path: PathBuf,
    threshold: f64,
}

impl TableWriter {
    pub fn new(path: impl Into<PathBuf>, threshold: f64) -> Self {
        let path = path.into();
        let filtered_path = filtered_path_for(&path);
        Self {
            path,
            filtered_path,
            threshold,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn filtered_path(&self) -> &Path {
        &self.filtered_path
    }

    /// Append one group of rows; qualifying rows also go to the filtered
    /// table. Equal-to-threshold counts as qualifying.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if either file cannot be written.
    pub fn append(&self, candidates: &[Candidate]) -> io::Result<()> {
        if candidates.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for candidate in candidates {
            file.write_all(candidate.to_row().as_bytes())?;
        }

        let passing: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.similarity_value() >= self.threshold)
            .collect();
        if passing.is_empty() {
            return Ok(());
        }

        let mut filtered = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.filtered_path)?;
        for candidate in passing {
            filtered.write_all(candidate.to_row().as_bytes())?;
        }

        Ok(())
    }
}

/// `<out>_filtered`: the suffix goes after the full file name, extension
/// included, matching the layout downstream scripts expect.
fn filtered_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    name.push("_filtered");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn candidate(query: &str, similarity: &str) -> Candidate {
        Candidate {
            query: query.to_string(),
            matched_name: "Mobula birostris".to_string(),
            similarity: similarity.to_string(),
            source_id: "GBGC0434-06".to_string(),
        }
    }

    #[test]
    fn test_filtered_path_keeps_extension() {
        let writer = TableWriter::new("out/sppsID.txt", 0.98);
        assert_eq!(
            writer.filtered_path(),
            Path::new("out/sppsID.txt_filtered")
        );
    }

    #[test]
    fn test_append_writes_all_rows_and_filters() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("sppsID.txt");
        let writer = TableWriter::new(&out, 0.98);

        writer
            .append(&[candidate("a", "0.995"), candidate("b", "0.9")])
            .unwrap();

        let all = std::fs::read_to_string(&out).unwrap();
        assert_eq!(all.lines().count(), 2);

        let filtered = std::fs::read_to_string(writer.filtered_path()).unwrap();
        assert_eq!(filtered.lines().count(), 1);
        assert!(filtered.starts_with("a\t"));
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let dir = tempdir().unwrap();
        let writer = TableWriter::new(dir.path().join("out.txt"), 0.98);

        writer.append(&[candidate("exact", "0.98")]).unwrap();

        let filtered = std::fs::read_to_string(writer.filtered_path()).unwrap();
        assert_eq!(filtered.lines().count(), 1);
    }

    #[test]
    fn test_filtered_file_not_created_without_qualifying_rows() {
        let dir = tempdir().unwrap();
        let writer = TableWriter::new(dir.path().join("out.txt"), 0.98);

        writer.append(&[candidate("low", "0.5")]).unwrap();

        assert!(writer.path().exists());
        assert!(!writer.filtered_path().exists());
    }

    #[test]
    fn test_unparseable_similarity_never_passes() {
        let dir = tempdir().unwrap();
        let writer = TableWriter::new(dir.path().join("out.txt"), 0.0);

        writer.append(&[candidate("odd", "n/a")]).unwrap();

        // Coerced to 0, which still meets a 0.0 threshold
        assert!(writer.filtered_path().exists());

        let writer = TableWriter::new(dir.path().join("other.txt"), 0.1);
        writer.append(&[candidate("odd", "n/a")]).unwrap();
        assert!(!writer.filtered_path().exists());
    }

    #[test]
    fn test_append_is_cumulative_across_calls() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let writer = TableWriter::new(&out, 0.98);

        writer.append(&[candidate("a", "0.99")]).unwrap();
        writer.append(&[candidate("a", "0.99")]).unwrap();

        // Append-only: a re-run duplicates prior rows
        let all = std::fs::read_to_string(&out).unwrap();
        assert_eq!(all.lines().count(), 2);
    }

    #[test]
    fn test_empty_group_writes_nothing() {
        let dir = tempdir().unwrap();
        let writer = TableWriter::new(dir.path().join("out.txt"), 0.98);

        writer.append(&[]).unwrap();
        assert!(!writer.path().exists());
    }
}
