use crate::clients::blast::BlastHit;
use crate::clients::bold::BoldMatch;

/// Status string written when BOLD has no match and the BLAST fallback is off
pub const UNAVAILABLE_BOLD: &str = "Unavailable with BOLD";

/// Status string written when the BLAST result carries no hit list
pub const UNAVAILABLE_NCBI: &str = "Unavailable with NCBI";

/// Status string written when the BLAST submission yields no request id
pub const RID_NOT_AVAILABLE: &str = "GenBank: RID not available";

const GENBANK_PREFIX: &str = "GenBank: ";

/// Characters of a BLAST hit definition kept in the match column
const HIT_DEF_PREFIX_LEN: usize = 10;

/// One identification candidate, mapping 1:1 to an output row.
///
/// `similarity` keeps the text reported upstream ("0" for placeholder rows);
/// [`Candidate::similarity_value`] coerces it for threshold filtering.
/// `source_id` carries provenance: a raw BOLD process ID, a
/// `"GenBank: <accession>"` tag, or a status string for the no-match cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub query: String,
    pub matched_name: String,
    pub similarity: String,
    pub source_id: String,
}

impl Candidate {
    pub fn from_bold(query: &str, record: &BoldMatch) -> Self {
        Self {
            query: query.to_string(),
            matched_name: record.taxonomic_identification.clone(),
            similarity: record.similarity.clone(),
            source_id: record.process_id.clone(),
        }
    }

    pub fn from_blast(query: &str, hit: &BlastHit) -> Self {
        Self {
            query: query.to_string(),
            matched_name: hit.definition.chars().take(HIT_DEF_PREFIX_LEN).collect(),
            similarity: format_similarity(hit.identity),
            source_id: format!("{GENBANK_PREFIX}{}", hit.accession),
        }
    }

    /// Placeholder row for a sequence that could not be identified.
    pub fn no_match(query: &str, status: &str) -> Self {
        Self {
            query: query.to_string(),
            matched_name: String::new(),
            similarity: "0".to_string(),
            source_id: status.to_string(),
        }
    }

    /// Numeric similarity for threshold filtering.
    ///
    /// Unparseable, non-finite, and negative values normalize to 0.0 so that
    /// filtering never fails on upstream text.
    #[must_use]
    pub fn similarity_value(&self) -> f64 {
        self.similarity
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0)
    }

    /// Render the fixed 4-column tab-separated row, newline-terminated.
    #[must_use]
    pub fn to_row(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\n",
            self.query, self.matched_name, self.similarity, self.source_id
        )
    }
}

/// Format a computed identity fraction with up to 4 decimals, no trailing zeros.
fn format_similarity(value: f64) -> String {
    let text = format!("{value:.4}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
