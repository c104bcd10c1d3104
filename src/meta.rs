// 🧾 Run Metadata - What a completed ingestion looked like
// Counts, content hashes and provenance for one run, persisted next to the
// dataset blob (independently of it) and served by the metadata read path.
//
// Row-level skips are observable here as count deltas (sdnRows − entities),
// not as log output. The wire shape is a contract; field names serialize
// camelCase to match it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// WIRE SHAPES
// ============================================================================

/// Where each source table was fetched from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceUrls {
    pub sdn_url: String,
    pub alt_url: String,
    pub add_url: String,
}

/// Row counts per source table plus the resulting entity count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowCounts {
    pub sdn_rows: usize,
    pub alt_rows: usize,
    pub add_rows: usize,
    pub entities: usize,
}

/// One SHA-256 digest per source table's raw text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentHashes {
    pub sdn_sha256: String,
    pub alt_sha256: String,
    pub add_sha256: String,
}

/// Metadata describing one completed ingestion run
///
/// `{fetchedAt, source: {sdnUrl, ...}, counts: {sdnRows, ..., entities},
/// hashes: {sdnSha256, ...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestMetadata {
    /// UTC timestamp of the run (RFC 3339 on the wire)
    pub fetched_at: DateTime<Utc>,
    pub source: SourceUrls,
    pub counts: RowCounts,
    pub hashes: ContentHashes,
}

impl IngestMetadata {
    /// Rows the extractor skipped for incompleteness (missing uid or name)
    pub fn skipped_rows(&self) -> usize {
        self.counts.sdn_rows.saturating_sub(self.counts.entities)
    }

    /// One-line human summary for CLI output
    pub fn summary(&self) -> String {
        format!(
            "{} entities from {} SDN rows ({} skipped), {} alias rows, {} address rows, fetched {}",
            self.counts.entities,
            self.counts.sdn_rows,
            self.skipped_rows(),
            self.counts.alt_rows,
            self.counts.add_rows,
            self.fetched_at.to_rfc3339(),
        )
    }
}

// ============================================================================
// CONTENT HASHING
// ============================================================================

/// SHA-256 of a source table's raw text, lowercase hex
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> IngestMetadata {
        IngestMetadata {
            fetched_at: "2025-06-01T12:00:00Z".parse().unwrap(),
            source: SourceUrls {
                sdn_url: "https://example.test/sdn.csv".to_string(),
                alt_url: "https://example.test/alt.csv".to_string(),
                add_url: "https://example.test/add.csv".to_string(),
            },
            counts: RowCounts {
                sdn_rows: 10,
                alt_rows: 4,
                add_rows: 3,
                entities: 8,
            },
            hashes: ContentHashes {
                sdn_sha256: sha256_hex("sdn"),
                alt_sha256: sha256_hex("alt"),
                add_sha256: sha256_hex("add"),
            },
        }
    }

    #[test]
    fn test_sha256_known_vector() {
        // sha256 of the empty string
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sha256_is_deterministic() {
        assert_eq!(sha256_hex("OFAC"), sha256_hex("OFAC"));
        assert_ne!(sha256_hex("OFAC"), sha256_hex("OFAC "));
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(sample_metadata()).unwrap();

        assert!(json.get("fetchedAt").is_some());
        assert!(json["source"].get("sdnUrl").is_some());
        assert!(json["counts"].get("sdnRows").is_some());
        assert!(json["counts"].get("entities").is_some());
        assert!(json["hashes"].get("sdnSha256").is_some());
        // No snake_case leaks onto the wire
        assert!(json.get("fetched_at").is_none());
        assert!(json["hashes"].get("sdn_sha256").is_none());
    }

    #[test]
    fn test_metadata_round_trip() {
        let meta = sample_metadata();
        let json = serde_json::to_string(&meta).unwrap();
        let restored: IngestMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, meta);
    }

    #[test]
    fn test_skipped_rows_delta() {
        let meta = sample_metadata();
        assert_eq!(meta.skipped_rows(), 2);
        assert!(meta.summary().contains("8 entities"));
        assert!(meta.summary().contains("2 skipped"));
    }
}
