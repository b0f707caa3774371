//! The sequential identification pipeline.
//!
//! For each sequence, in file order: query BOLD; on an empty match list fall
//! back to NCBI BLAST when enabled, otherwise emit a placeholder row. Every
//! outcome flows through the same [`Candidate`] conversion step, so BOLD and
//! BLAST rows share one format. Per-sequence failures degrade to placeholder
//! rows and never abort the run; a fixed pause after every sequence keeps the
//! request rate acceptable to the upstream services.

use std::io;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::clients::blast::{BlastClient, BlastOutcome, PollPolicy};
use crate::clients::bold::{BoldClient, BoldDatabase};
use crate::clients::Transport;
use crate::core::candidate::{Candidate, RID_NOT_AVAILABLE, UNAVAILABLE_BOLD, UNAVAILABLE_NCBI};
use crate::core::sequence::SequenceRecord;
use crate::output::TableWriter;

/// Delay inserted after every sequence to respect upstream rate limits
pub const DEFAULT_PACING: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct IdentifyConfig {
    pub database: BoldDatabase,
    /// Query NCBI BLAST when BOLD returns no match
    pub blast_fallback: bool,
    pub pacing: Duration,
    /// Suppress per-sequence progress messages
    pub quiet: bool,
}

impl Default for IdentifyConfig {
    fn default() -> Self {
        Self {
            database: BoldDatabase::default(),
            blast_fallback: false,
            pacing: DEFAULT_PACING,
            quiet: false,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sequences: usize,
    pub rows: usize,
}

pub struct IdEngine<'a, T> {
    transport: &'a T,
    config: IdentifyConfig,
    poll: PollPolicy,
}

impl<'a, T: Transport> IdEngine<'a, T> {
    pub fn new(transport: &'a T, config: IdentifyConfig) -> Self {
        Self {
            transport,
            config,
            poll: PollPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Identify every record, appending each result group as it completes.
    ///
    /// # Errors
    ///
    /// Returns an IO error only when an output file cannot be written; client
    /// failures are isolated per sequence.
    pub fn identify_all(
        &self,
        records: &[SequenceRecord],
        writer: &TableWriter,
    ) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();

        for record in records {
            if !self.config.quiet {
                eprintln!("Identifying: {}", record.label);
            }

            let group = self.identify_one(record);
            writer.append(&group)?;

            summary.sequences += 1;
            summary.rows += group.len();

            if !self.config.pacing.is_zero() {
                thread::sleep(self.config.pacing);
            }
        }

        Ok(summary)
    }

    fn identify_one(&self, record: &SequenceRecord) -> Vec<Candidate> {
        let bold = BoldClient::new(self.transport, self.config.database);

        match bold.identify(&record.sequence) {
            Ok(matches) if !matches.is_empty() => matches
                .iter()
                .map(|m| Candidate::from_bold(&record.label, m))
                .collect(),
            Ok(_) if self.config.blast_fallback => self.blast_fallback(record),
            Ok(_) => vec![Candidate::no_match(&record.label, UNAVAILABLE_BOLD)],
            Err(err) => {
                warn!("BOLD identification failed for {}: {err}", record.label);
                vec![Candidate::no_match(&record.label, UNAVAILABLE_BOLD)]
            }
        }
    }

    fn blast_fallback(&self, record: &SequenceRecord) -> Vec<Candidate> {
        let blast = BlastClient::new(self.transport, self.poll.clone());

        match blast.identify(&record.sequence) {
            Ok(BlastOutcome::Hits(hits)) => hits
                .iter()
                .map(|hit| Candidate::from_blast(&record.label, hit))
                .collect(),
            Ok(BlastOutcome::NoRequestId) => {
                vec![Candidate::no_match(&record.label, RID_NOT_AVAILABLE)]
            }
            Ok(BlastOutcome::NoHits) => {
                vec![Candidate::no_match(&record.label, UNAVAILABLE_NCBI)]
            }
            Err(err) => {
                warn!("BLAST identification failed for {}: {err}", record.label);
                vec![Candidate::no_match(&record.label, UNAVAILABLE_NCBI)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::testing::ScriptedTransport;
    use tempfile::tempdir;

    const BOLD_HIT: &str = r#"<matches>
  <match>
    <ID>GBGC0434-06</ID>
    <taxonomicidentification>Mobula birostris</taxonomicidentification>
    <similarity>0.995</similarity>
  </match>
</matches>"#;

    const BOLD_EMPTY: &str = "<matches></matches>";

    const BLAST_SUBMIT: &str = r#"<input name="RID" value="8AZV9WUA014" type="hidden">"#;

    const BLAST_RESULT: &str = r#"<BlastOutput>
  <BlastOutput_iterations>
    <Iteration>
      <Iteration_hits>
        <Hit>
          <Hit_def>Mobula birostris voucher UERR-01</Hit_def>
          <Hit_accession>MH429337</Hit_accession>
          <Hit_hsps>
            <Hsp>
              <Hsp_identity>648</Hsp_identity>
              <Hsp_align-len>652</Hsp_align-len>
            </Hsp>
          </Hit_hsps>
        </Hit>
      </Iteration_hits>
    </Iteration>
  </BlastOutput_iterations>
</BlastOutput>"#;

    fn test_config(blast_fallback: bool) -> IdentifyConfig {
        IdentifyConfig {
            database: BoldDatabase::default(),
            blast_fallback,
            pacing: Duration::ZERO,
            quiet: true,
        }
    }

    fn fast_poll() -> PollPolicy {
        PollPolicy {
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            deadline: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_bold_hit_and_bold_miss_without_fallback() {
        // Sequence A matches BOLD above the default threshold, sequence B has
        // no BOLD match and the fallback is disabled.
        let transport = ScriptedTransport::ok(&[BOLD_HIT, BOLD_EMPTY]);
        let engine = IdEngine::new(&transport, test_config(false));

        let records = vec![
            SequenceRecord::new("seqA", "ACGTACGT"),
            SequenceRecord::new("seqB", "TTTTTTTT"),
        ];

        let dir = tempdir().unwrap();
        let writer = TableWriter::new(dir.path().join("sppsID.txt"), 0.98);
        let summary = engine.identify_all(&records, &writer).unwrap();

        assert_eq!(summary, RunSummary { sequences: 2, rows: 2 });

        let all = std::fs::read_to_string(writer.path()).unwrap();
        let rows: Vec<&str> = all.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "seqA\tMobula birostris\t0.995\tGBGC0434-06");
        assert_eq!(rows[1], "seqB\t\t0\tUnavailable with BOLD");

        let filtered = std::fs::read_to_string(writer.filtered_path()).unwrap();
        assert_eq!(filtered.lines().collect::<Vec<_>>(), [rows[0]]);
    }

    #[test]
    fn test_blast_fallback_produces_genbank_rows() {
        let transport =
            ScriptedTransport::ok(&[BOLD_EMPTY, BLAST_SUBMIT, "", BLAST_RESULT]);
        let engine =
            IdEngine::new(&transport, test_config(true)).with_poll_policy(fast_poll());

        let records = vec![SequenceRecord::new("seqA", "ACGTACGT")];
        let dir = tempdir().unwrap();
        let writer = TableWriter::new(dir.path().join("sppsID.txt"), 0.98);
        engine.identify_all(&records, &writer).unwrap();

        let all = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(
            all.lines().collect::<Vec<_>>(),
            ["seqA\tMobula bir\t0.9939\tGenBank: MH429337"]
        );
    }

    #[test]
    fn test_missing_rid_writes_placeholder_without_polling() {
        let transport = ScriptedTransport::ok(&[BOLD_EMPTY, "<html>no job</html>"]);
        let engine =
            IdEngine::new(&transport, test_config(true)).with_poll_policy(fast_poll());

        let records = vec![SequenceRecord::new("seqA", "ACGTACGT")];
        let dir = tempdir().unwrap();
        let writer = TableWriter::new(dir.path().join("sppsID.txt"), 0.98);
        engine.identify_all(&records, &writer).unwrap();

        let all = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(
            all.lines().collect::<Vec<_>>(),
            ["seqA\t\t0\tGenBank: RID not available"]
        );
        // One BOLD call plus one submission; the empty RID stopped the job
        assert_eq!(transport.request_count(), 2);
    }

    #[test]
    fn test_blast_no_hits_writes_placeholder() {
        let no_hits = "<BlastOutput><BlastOutput_iterations><Iteration>\
                       </Iteration></BlastOutput_iterations></BlastOutput>";
        let transport = ScriptedTransport::ok(&[BOLD_EMPTY, BLAST_SUBMIT, no_hits]);
        let engine =
            IdEngine::new(&transport, test_config(true)).with_poll_policy(fast_poll());

        let records = vec![SequenceRecord::new("seqA", "ACGT")];
        let dir = tempdir().unwrap();
        let writer = TableWriter::new(dir.path().join("out.txt"), 0.98);
        engine.identify_all(&records, &writer).unwrap();

        let all = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(
            all.lines().collect::<Vec<_>>(),
            ["seqA\t\t0\tUnavailable with NCBI"]
        );
    }

    #[test]
    fn test_bold_failure_is_isolated_per_sequence() {
        let transport = ScriptedTransport::new(vec![
            Err(ScriptedTransport::status_error(502)),
            Ok(BOLD_HIT.to_string()),
        ]);
        let engine = IdEngine::new(&transport, test_config(false));

        let records = vec![
            SequenceRecord::new("seqA", "ACGT"),
            SequenceRecord::new("seqB", "TTTT"),
        ];
        let dir = tempdir().unwrap();
        let writer = TableWriter::new(dir.path().join("out.txt"), 0.98);
        let summary = engine.identify_all(&records, &writer).unwrap();

        assert_eq!(summary.rows, 2);
        let all = std::fs::read_to_string(writer.path()).unwrap();
        let rows: Vec<&str> = all.lines().collect();
        assert_eq!(rows[0], "seqA\t\t0\tUnavailable with BOLD");
        assert_eq!(rows[1], "seqB\tMobula birostris\t0.995\tGBGC0434-06");
    }
}
