// 📦 Dataset Codec - Entities ↔ persisted blob
// UTF-8 JSON array, gzip-compressed. The sole persisted representation.
//
// Every ingestion run writes a full replacement blob; there are no partial
// or incremental updates to decode against.

use crate::entity::Entity;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Serialize the entity collection to its persisted form
pub fn encode_dataset(entities: &[Entity]) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(entities).context("Failed to serialize dataset to JSON")?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .context("Failed to gzip dataset")?;
    encoder.finish().context("Failed to finish gzip stream")
}

/// Restore the entity collection from a persisted blob
///
/// Exact inverse of [`encode_dataset`]: field-for-field, order preserved,
/// absent optional fields stay absent.
pub fn decode_dataset(blob: &[u8]) -> Result<Vec<Entity>> {
    let mut decoder = GzDecoder::new(blob);
    let mut json = Vec::new();
    decoder
        .read_to_end(&mut json)
        .context("Failed to decompress dataset blob")?;

    serde_json::from_slice(&json).context("Failed to parse dataset JSON")
}

// ============================================================================
// TESTS
// ============================================================================
