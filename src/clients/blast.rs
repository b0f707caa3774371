//! Client for the asynchronous NCBI BLAST service.
//!
//! Identification is a three-step state machine:
//!
//! 1. **Submit** the sequence (`CMD=Put`). The response is an HTML page with
//!    the job's request identifier (RID) embedded in a hidden form input; the
//!    RID is scraped with a regex because no structured format exists there.
//! 2. **Poll** the result endpoint (`CMD=Get`) until the body is non-empty,
//!    under a [`PollPolicy`] with backoff and a hard deadline.
//! 3. **Parse** the BLAST XML and compute a percent identity per hit from the
//!    first HSP's identity count and alignment length.
//!
//! A submission without an extractable RID is a terminal per-sequence outcome
//! ([`BlastOutcome::NoRequestId`]); no poll request is issued for it.

use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use super::{ClientError, Transport};

pub const BLAST_ENDPOINT: &str = "https://blast.ncbi.nlm.nih.gov/blast/Blast.cgi";

const SERVICE: &str = "NCBI BLAST";
const WORD_SIZE: &str = "28";
const HITLIST_SIZE: &str = "3";

/// Consecutive transport failures tolerated while polling
const MAX_POLL_ERRORS: u32 = 3;

static RID_RE: OnceLock<Regex> = OnceLock::new();

/// Pacing and deadline for polling an asynchronous BLAST job.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(300),
            max_interval: Duration::from_secs(5),
            deadline: Duration::from_secs(600),
        }
    }
}

/// One BLAST hit with its computed identity fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct BlastHit {
    pub definition: String,
    pub accession: String,
    /// `identity / align-len` rounded to 4 decimals; 0 when unavailable
    pub identity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlastOutcome {
    /// The submission response carried no request identifier
    NoRequestId,
    /// The job finished but the result carried no hit list
    NoHits,
    Hits(Vec<BlastHit>),
}

pub struct BlastClient<'a, T> {
    transport: &'a T,
    poll: PollPolicy,
}

impl<'a, T: Transport> BlastClient<'a, T> {
    pub fn new(transport: &'a T, poll: PollPolicy) -> Self {
        Self { transport, poll }
    }

    /// Submit one sequence and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` on a failed submission,
    /// `ClientError::RetriesExhausted` when polling keeps failing,
    /// `ClientError::PollTimeout` when the deadline passes, and
    /// `ClientError::Malformed` when the result is not BLAST XML.
    pub fn identify(&self, sequence: &str) -> Result<BlastOutcome, ClientError> {
        let Some(rid) = self.submit(sequence)? else {
            return Ok(BlastOutcome::NoRequestId);
        };
        debug!("BLAST job submitted, RID {rid}");
        let body = self.poll_result(&rid)?;
        parse_hits(&body)
    }

    fn submit(&self, sequence: &str) -> Result<Option<String>, ClientError> {
        let url = Url::parse_with_params(
            BLAST_ENDPOINT,
            &[
                ("CMD", "Put"),
                ("PROGRAM", "blastn"),
                ("MEGABLAST", "on"),
                ("DATABASE", "nt"),
                ("QUERY", sequence),
                ("WORD_SIZE", WORD_SIZE),
                ("HITLIST_SIZE", HITLIST_SIZE),
            ],
        )
        .map_err(|e| ClientError::InvalidRequest {
            service: SERVICE,
            detail: e.to_string(),
        })?;

        let body = self.transport.get(&url)?;
        Ok(extract_rid(&body))
    }

    fn poll_result(&self, rid: &str) -> Result<String, ClientError> {
        let url = Url::parse_with_params(
            BLAST_ENDPOINT,
            &[("CMD", "Get"), ("FORMAT_TYPE", "XML"), ("RID", rid)],
        )
        .map_err(|e| ClientError::InvalidRequest {
            service: SERVICE,
            detail: e.to_string(),
        })?;

        let start = Instant::now();
        let mut interval = self.poll.initial_interval;
        let mut consecutive_errors = 0u32;

        loop {
            match self.transport.get(&url) {
                Ok(body) if !body.trim().is_empty() => return Ok(body),
                Ok(_) => {
                    consecutive_errors = 0;
                    debug!("BLAST job {rid} not ready yet");
                }
                Err(source) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_POLL_ERRORS {
                        return Err(ClientError::RetriesExhausted {
                            service: SERVICE,
                            attempts: consecutive_errors,
                            source,
                        });
                    }
                    debug!(
                        "polling BLAST job {rid} failed ({consecutive_errors}/{MAX_POLL_ERRORS}): {source}"
                    );
                }
            }

            if start.elapsed() >= self.poll.deadline {
                return Err(ClientError::PollTimeout {
                    rid: rid.to_string(),
                    elapsed: start.elapsed(),
                });
            }

            thread::sleep(interval);
            interval = interval.mul_f64(1.5).min(self.poll.max_interval);
        }
    }
}

/// Scrape the request identifier from the submission HTML.
///
/// The page carries it as `<input name="RID" value="...">`; an empty value
/// counts as missing.
fn extract_rid(body: &str) -> Option<String> {
    let re = RID_RE.get_or_init(|| {
        Regex::new(r#""RID" value="([A-Za-z0-9_-]+)""#).expect("RID pattern is valid")
    });
    let flat = body.replace('\n', "");
    re.captures(&flat).map(|c| c[1].to_string())
}

#[derive(Debug, Deserialize)]
struct BlastOutputXml {
    #[serde(rename = "BlastOutput_iterations")]
    iterations: Option<BlastIterationsXml>,
}

#[derive(Debug, Deserialize)]
struct BlastIterationsXml {
    #[serde(rename = "Iteration", default)]
    iterations: Vec<BlastIterationXml>,
}

#[derive(Debug, Deserialize)]
struct BlastIterationXml {
    #[serde(rename = "Iteration_hits")]
    hits: Option<BlastIterationHitsXml>,
}

#[derive(Debug, Deserialize)]
struct BlastIterationHitsXml {
    #[serde(rename = "Hit", default)]
    hits: Vec<BlastHitXml>,
}

#[derive(Debug, Deserialize)]
struct BlastHitXml {
    #[serde(rename = "Hit_def", default)]
    definition: String,
    #[serde(rename = "Hit_accession", default)]
    accession: String,
    #[serde(rename = "Hit_hsps")]
    hsps: Option<BlastHitHspsXml>,
}

#[derive(Debug, Deserialize)]
struct BlastHitHspsXml {
    #[serde(rename = "Hsp", default)]
    hsps: Vec<BlastHspXml>,
}

#[derive(Debug, Deserialize)]
struct BlastHspXml {
    #[serde(rename = "Hsp_identity")]
    identity: Option<String>,
    #[serde(rename = "Hsp_align-len")]
    align_len: Option<String>,
}

fn parse_hits(xml: &str) -> Result<BlastOutcome, ClientError> {
    let parsed: BlastOutputXml =
        quick_xml::de::from_str(xml).map_err(|e| ClientError::Malformed {
            service: SERVICE,
            detail: e.to_string(),
        })?;

    let raw_hits: Vec<BlastHitXml> = parsed
        .iterations
        .into_iter()
        .flat_map(|i| i.iterations)
        .filter_map(|i| i.hits)
        .flat_map(|h| h.hits)
        .collect();

    if raw_hits.is_empty() {
        return Ok(BlastOutcome::NoHits);
    }

    let hits = raw_hits
        .into_iter()
        .map(|hit| {
            let identity = percent_identity(&hit);
            BlastHit {
                definition: hit.definition,
                accession: hit.accession,
                identity,
            }
        })
        .collect();

    Ok(BlastOutcome::Hits(hits))
}

/// `round(identity / align-len, 4)` from the first HSP; 0 on any parse or
/// division failure.
fn percent_identity(hit: &BlastHitXml) -> f64 {
    let Some(hsp) = hit.hsps.as_ref().and_then(|h| h.hsps.first()) else {
        return 0.0;
    };
    let identity = hsp
        .identity
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok());
    let length = hsp
        .align_len
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok());

    match (identity, length) {
        (Some(identity), Some(length)) if length > 0.0 => {
            (identity / length * 10_000.0).round() / 10_000.0
        }
        _ => 0.0,
    }
}
