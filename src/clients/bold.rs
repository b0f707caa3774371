//! Client for the BOLD identification engine.
//!
//! BOLD answers a single GET with an XML document whose `match` elements each
//! describe one candidate identification. An empty match list is a valid
//! "no identification" outcome, not an error; the caller decides whether to
//! fall back to BLAST. Transport failures are not retried here (one sequence,
//! one request) and are isolated per sequence by the pipeline.

use reqwest::Url;
use serde::Deserialize;

use super::{ClientError, Transport};

pub const BOLD_ENDPOINT: &str = "http://www.boldsystems.org/index.php/Ids_xml";

const SERVICE: &str = "BOLD";

/// The four published BOLD COI databases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum BoldDatabase {
    /// Every COI barcode record with a species-level identification
    Cox1,
    /// Species-level records with mtDNA COI-5P markers
    Cox1Species,
    /// Public species-level records only
    #[default]
    Cox1SpeciesPublic,
    /// Records with COI sequences of at least 640 bp
    Cox1L640bp,
}

impl BoldDatabase {
    /// The selector value the Ids_xml endpoint expects.
    #[must_use]
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Cox1 => "COX1",
            Self::Cox1Species => "COX1_SPECIES",
            Self::Cox1SpeciesPublic => "COX1_SPECIES_PUBLIC",
            Self::Cox1L640bp => "COX1_L640bp",
        }
    }
}

/// One candidate record from a BOLD identification response.
///
/// Fields absent from the response resolve to empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoldMatch {
    #[serde(rename = "ID", default)]
    pub process_id: String,
    #[serde(rename = "taxonomicidentification", default)]
    pub taxonomic_identification: String,
    #[serde(rename = "similarity", default)]
    pub similarity: String,
}

#[derive(Debug, Deserialize)]
struct BoldResponse {
    #[serde(rename = "match", default)]
    matches: Vec<BoldMatch>,
}

pub struct BoldClient<'a, T> {
    transport: &'a T,
    database: BoldDatabase,
}

impl<'a, T: Transport> BoldClient<'a, T> {
    pub fn new(transport: &'a T, database: BoldDatabase) -> Self {
        Self {
            transport,
            database,
        }
    }

    /// Identify one sequence against the configured database.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` on a failed request and
    /// `ClientError::Malformed` when the body is not the expected XML.
    pub fn identify(&self, sequence: &str) -> Result<Vec<BoldMatch>, ClientError> {
        let url = Url::parse_with_params(
            BOLD_ENDPOINT,
            &[
                ("db", self.database.as_query_value()),
                ("sequence", sequence),
            ],
        )
        .map_err(|e| ClientError::InvalidRequest {
            service: SERVICE,
            detail: e.to_string(),
        })?;

        let body = self.transport.get(&url)?;
        parse_matches(&body)
    }
}

fn parse_matches(xml: &str) -> Result<Vec<BoldMatch>, ClientError> {
    let parsed: BoldResponse =
        quick_xml::de::from_str(xml).map_err(|e| ClientError::Malformed {
            service: SERVICE,
            detail: e.to_string(),
        })?;
    Ok(parsed.matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::testing::ScriptedTransport;

    const TWO_MATCHES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<matches>
  <match>
    <ID>GBGC0434-06</ID>
    <sequencedescription>COI-5P</sequencedescription>
    <taxonomicidentification>Mobula birostris</taxonomicidentification>
    <similarity>0.995</similarity>
  </match>
  <match>
    <ID>ANGBF1234-12</ID>
    <taxonomicidentification>Mobula mobular</taxonomicidentification>
    <similarity>0.981</similarity>
  </match>
</matches>"#;

    #[test]
    fn test_parse_two_matches() {
        let matches = parse_matches(TWO_MATCHES).unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].process_id, "GBGC0434-06");
        assert_eq!(matches[0].taxonomic_identification, "Mobula birostris");
        assert_eq!(matches[0].similarity, "0.995");
        assert_eq!(matches[1].process_id, "ANGBF1234-12");
    }

    #[test]
    fn test_parse_missing_fields_default_to_empty() {
        let xml = "<matches><match><ID>X-1</ID></match></matches>";
        let matches = parse_matches(xml).unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].process_id, "X-1");
        assert_eq!(matches[0].taxonomic_identification, "");
        assert_eq!(matches[0].similarity, "");
    }

    #[test]
    fn test_parse_empty_match_list_is_not_an_error() {
        let matches = parse_matches("<matches></matches>").unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_matches("not xml at all <<<").unwrap_err();
        assert!(matches!(err, ClientError::Malformed { .. }));
    }

    #[test]
    fn test_identify_builds_expected_url() {
        let transport = ScriptedTransport::ok(&["<matches></matches>"]);
        let client = BoldClient::new(&transport, BoldDatabase::Cox1Species);

        let matches = client.identify("ACGTACGT").unwrap();

        assert!(matches.is_empty());
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with(BOLD_ENDPOINT));
        assert!(requests[0].contains("db=COX1_SPECIES"));
        assert!(requests[0].contains("sequence=ACGTACGT"));
    }

    #[test]
    fn test_identify_propagates_transport_errors() {
        let transport =
            ScriptedTransport::new(vec![Err(ScriptedTransport::status_error(502))]);
        let client = BoldClient::new(&transport, BoldDatabase::default());

        let err = client.identify("ACGT").unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn test_database_query_values() {
        assert_eq!(BoldDatabase::Cox1.as_query_value(), "COX1");
        assert_eq!(BoldDatabase::Cox1Species.as_query_value(), "COX1_SPECIES");
        assert_eq!(
            BoldDatabase::Cox1SpeciesPublic.as_query_value(),
            "COX1_SPECIES_PUBLIC"
        );
        assert_eq!(BoldDatabase::Cox1L640bp.as_query_value(), "COX1_L640bp");
    }
}
