//! Client for the World Register of Marine Species (WoRMS) REST API.
//!
//! Resolution is a pure pipeline rather than a stateful object: resolve a
//! name to an AphiaID (exact lookup, then fuzzy match), fetch the
//! classification once, then query ranks from the immutable result. Rank
//! lookups return a tagged [`RankLookup`] so "rank absent" and "taxon never
//! resolved" stay distinguishable.
//!
//! The service intermittently answers 5xx under load, so every call runs
//! under the bounded [`RetryPolicy`](super::RetryPolicy).

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use serde::Deserialize;

use super::{ClientError, RetryPolicy, Transport};

pub const WORMS_ENDPOINT: &str = "https://www.marinespecies.org/rest";

const SERVICE: &str = "WoRMS";

/// Sentinel AphiaID the service returns for unmatched names
const NO_MATCH_APHIA_ID: i64 = -999;

static BINOMIAL_RE: OnceLock<Regex> = OnceLock::new();

/// A taxon name resolved to its accepted WoRMS record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTaxon {
    pub aphia_id: i64,
    pub scientific_name: String,
}

/// One level of a taxonomic classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationLevel {
    pub rank: String,
    pub scientific_name: String,
}

/// Ordered classification hierarchy, root first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    levels: Vec<ClassificationLevel>,
}

/// Result of looking up a single rank in a classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankLookup {
    Found(String),
    /// The rank exists but its name is flagged `[unassigned]`
    Unassigned,
    /// The classification exists but does not carry this rank
    RankNotFound,
    /// No classification is available for the taxon at all
    TaxonUnresolved,
}

impl Classification {
    #[must_use]
    pub fn levels(&self) -> &[ClassificationLevel] {
        &self.levels
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Rank names in order of appearance.
    pub fn ranks(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|l| l.rank.as_str())
    }

    /// Look up one rank by exact name.
    #[must_use]
    pub fn rank(&self, rank: &str) -> RankLookup {
        if self.levels.is_empty() {
            return RankLookup::TaxonUnresolved;
        }
        match self.levels.iter().find(|l| l.rank == rank) {
            None => RankLookup::RankNotFound,
            Some(level) if level.scientific_name.contains("[unassigned]") => {
                RankLookup::Unassigned
            }
            Some(level) => RankLookup::Found(level.scientific_name.clone()),
        }
    }
}

pub struct WormsClient<'a, T> {
    transport: &'a T,
    retry: RetryPolicy,
}

impl<'a, T: Transport> WormsClient<'a, T> {
    pub fn new(transport: &'a T, retry: RetryPolicy) -> Self {
        Self { transport, retry }
    }

    /// Exact-name AphiaID lookup.
    ///
    /// An empty body or the `-999` sentinel both mean "not found".
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RetriesExhausted` when the service keeps
    /// failing and `ClientError::Malformed` when the body is not an id.
    pub fn aphia_id_by_name(&self, taxon: &str) -> Result<Option<i64>, ClientError> {
        let url = self.url(
            &format!("AphiaIDByName/{taxon}"),
            &[("marine_only", "false")],
        )?;
        let body = self.retry.run(SERVICE, || self.transport.get(&url))?;

        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let id: i64 = trimmed.parse().map_err(|_| ClientError::Malformed {
            service: SERVICE,
            detail: format!("expected an AphiaID, got {trimmed:?}"),
        })?;
        Ok((id != NO_MATCH_APHIA_ID).then_some(id))
    }

    /// Fuzzy name match, returning the accepted record when one exists.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`WormsClient::aphia_id_by_name`].
    pub fn match_name(&self, taxon: &str) -> Result<Option<ResolvedTaxon>, ClientError> {
        let normalized = normalize_query_name(taxon);
        let url = self.url(
            "AphiaRecordsByMatchNames",
            &[
                ("scientificnames[]", normalized.as_str()),
                ("marine_only", "false"),
            ],
        )?;
        let body = self.retry.run(SERVICE, || self.transport.get(&url))?;

        if body.trim().is_empty() {
            return Ok(None);
        }
        let batches: Vec<Vec<MatchRecord>> =
            serde_json::from_str(&body).map_err(|e| ClientError::Malformed {
                service: SERVICE,
                detail: e.to_string(),
            })?;

        Ok(batches.into_iter().flatten().find_map(|record| {
            match (record.valid_aphia_id, record.valid_name) {
                (Some(id), Some(name)) if id != NO_MATCH_APHIA_ID => Some(ResolvedTaxon {
                    aphia_id: id,
                    scientific_name: name,
                }),
                _ => None,
            }
        }))
    }

    /// Exact lookup with fuzzy-match fallback.
    ///
    /// # Errors
    ///
    /// Same failure modes as the underlying lookups.
    pub fn resolve(&self, taxon: &str) -> Result<Option<ResolvedTaxon>, ClientError> {
        if let Some(aphia_id) = self.aphia_id_by_name(taxon)? {
            return Ok(Some(ResolvedTaxon {
                aphia_id,
                scientific_name: taxon.to_string(),
            }));
        }
        self.match_name(taxon)
    }

    /// Fetch the classification hierarchy for a resolved taxon.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RetriesExhausted` or `ClientError::Malformed`.
    pub fn classification(&self, aphia_id: i64) -> Result<Classification, ClientError> {
        let url = self.url(&format!("AphiaClassificationByAphiaID/{aphia_id}"), &[])?;
        let body = self.retry.run(SERVICE, || self.transport.get(&url))?;

        if body.trim().is_empty() {
            return Ok(Classification::default());
        }
        let root: ClassificationNode =
            serde_json::from_str(&body).map_err(|e| ClientError::Malformed {
                service: SERVICE,
                detail: e.to_string(),
            })?;

        let mut levels = Vec::new();
        let mut current = Some(Box::new(root));
        while let Some(node) = current {
            let node = *node;
            if let (Some(rank), Some(name)) = (node.rank, node.scientific_name) {
                levels.push(ClassificationLevel {
                    rank,
                    scientific_name: name,
                });
            }
            current = node.child;
        }
        Ok(Classification { levels })
    }

    /// List recorded synonym names for a resolved taxon.
    ///
    /// Names are filtered by a two-word binomial heuristic (capitalized genus
    /// plus lowercase epithet), which both under- and over-matches real
    /// taxonomic synonyms; callers wanting the raw record list should query
    /// the API directly.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RetriesExhausted` or `ClientError::Malformed`.
    pub fn synonyms(&self, aphia_id: i64) -> Result<Vec<String>, ClientError> {
        let url = self.url(&format!("AphiaSynonymsByAphiaID/{aphia_id}"), &[])?;
        let body = self.retry.run(SERVICE, || self.transport.get(&url))?;

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<SynonymRecord> =
            serde_json::from_str(&body).map_err(|e| ClientError::Malformed {
                service: SERVICE,
                detail: e.to_string(),
            })?;

        Ok(records
            .into_iter()
            .filter_map(|r| r.scientific_name)
            .filter(|name| is_binomial(name))
            .collect())
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ClientError> {
        let base = format!("{WORMS_ENDPOINT}/{path}");
        let url = if params.is_empty() {
            Url::parse(&base)
        } else {
            Url::parse_with_params(&base, params)
        };
        url.map_err(|e| ClientError::InvalidRequest {
            service: SERVICE,
            detail: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct MatchRecord {
    #[serde(rename = "valid_AphiaID", default)]
    valid_aphia_id: Option<i64>,
    #[serde(rename = "valid_name", default)]
    valid_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClassificationNode {
    #[serde(default)]
    rank: Option<String>,
    #[serde(rename = "scientificname", default)]
    scientific_name: Option<String>,
    #[serde(default)]
    child: Option<Box<ClassificationNode>>,
}

#[derive(Debug, Deserialize)]
struct SynonymRecord {
    #[serde(rename = "scientificname", default)]
    scientific_name: Option<String>,
}

/// Prepare a name for the fuzzy-match endpoint: drop parenthesized
/// annotations, collapse whitespace, lowercase.
fn normalize_query_name(taxon: &str) -> String {
    let mut stripped = String::with_capacity(taxon.len());
    let mut depth = 0usize;
    for c in taxon.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c),
            _ => {}
        }
    }
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_binomial(name: &str) -> bool {
    let re = BINOMIAL_RE
        .get_or_init(|| Regex::new(r"^[A-Z][a-z]+ [a-z]+$").expect("binomial pattern is valid"));
    re.is_match(name)
}
