// 🚀 Ingestion Pipeline - Fetch, normalize, consolidate, persist
//
// One linear batch run:
//
//   FETCHING → PARSING → EXTRACTING → CONSOLIDATING_ALIASES
//     → CONSOLIDATING_ADDRESSES → ENCODING → PERSISTED
//
// Any unrecoverable failure aborts with no partial write: the previously
// persisted dataset and metadata stay authoritative until a run reaches
// PERSISTED. Only auxiliary fetch failures are survivable (the run proceeds
// with an empty table, since aliases and addresses are enrichments).

use anyhow::{Context, Result};
use chrono::Utc;

use crate::codec::encode_dataset;
use crate::consolidate::{consolidate_aliases, consolidate_addresses};
use crate::extract::extract_entities;
use crate::fetch::{SourceFetcher, DEFAULT_ADD_URL, DEFAULT_ALT_URL, DEFAULT_SDN_URL};
use crate::meta::{sha256_hex, ContentHashes, IngestMetadata, RowCounts, SourceUrls};
use crate::rows::parse_table;
use crate::store::{BlobStore, DATASET_KEY, METADATA_KEY};

// ============================================================================
// RUN STAGES
// ============================================================================

/// Where an ingestion run currently is (or where it died)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Fetching,
    Parsing,
    Extracting,
    ConsolidatingAliases,
    ConsolidatingAddresses,
    Encoding,
    Persisted,
}

impl IngestStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestStage::Fetching => "FETCHING",
            IngestStage::Parsing => "PARSING",
            IngestStage::Extracting => "EXTRACTING",
            IngestStage::ConsolidatingAliases => "CONSOLIDATING_ALIASES",
            IngestStage::ConsolidatingAddresses => "CONSOLIDATING_ADDRESSES",
            IngestStage::Encoding => "ENCODING",
            IngestStage::Persisted => "PERSISTED",
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Source URLs from the environment, falling back to the Treasury defaults
///
/// Overrides: `SDN_CSV_URL`, `ALT_CSV_URL`, `ADD_CSV_URL`.
pub fn source_urls_from_env() -> SourceUrls {
    SourceUrls {
        sdn_url: std::env::var("SDN_CSV_URL").unwrap_or_else(|_| DEFAULT_SDN_URL.to_string()),
        alt_url: std::env::var("ALT_CSV_URL").unwrap_or_else(|_| DEFAULT_ALT_URL.to_string()),
        add_url: std::env::var("ADD_CSV_URL").unwrap_or_else(|_| DEFAULT_ADD_URL.to_string()),
    }
}

// ============================================================================
// FETCH STAGE
// ============================================================================

/// Raw text of the three source tables, in fetch order
pub struct FetchedTables {
    pub sdn_text: String,
    pub alt_text: String,
    pub add_text: String,
}

/// Download all three source tables
///
/// The primary SDN table is mandatory. The alias and address tables degrade
/// to empty text on fetch failure, with a console warning.
pub fn fetch_tables(fetcher: &dyn SourceFetcher, urls: &SourceUrls) -> Result<FetchedTables> {
    let sdn_text = fetcher
        .fetch_text(&urls.sdn_url)
        .with_context(|| format!("{} failed for primary table", IngestStage::Fetching.as_str()))?;

    let alt_text = match fetcher.fetch_text(&urls.alt_url) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("⚠️  Alias table fetch failed, continuing without aliases: {:#}", e);
            String::new()
        }
    };

    let add_text = match fetcher.fetch_text(&urls.add_url) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("⚠️  Address table fetch failed, continuing without addresses: {:#}", e);
            String::new()
        }
    };

    Ok(FetchedTables {
        sdn_text,
        alt_text,
        add_text,
    })
}

// ============================================================================
// FULL RUN
// ============================================================================

/// Run one full ingestion: fetch the OFAC tables, build the consolidated
/// entity dataset, and persist blob + metadata to the store.
///
/// Returns the metadata of the completed run.
pub fn run_ingest(
    fetcher: &dyn SourceFetcher,
    store: &dyn BlobStore,
    urls: &SourceUrls,
) -> Result<IngestMetadata> {
    println!("📥 [{}] Downloading source tables...", IngestStage::Fetching.as_str());
    let tables = fetch_tables(fetcher, urls)?;

    // Hashes cover the raw fetched text, before any parsing
    let hashes = ContentHashes {
        sdn_sha256: sha256_hex(&tables.sdn_text),
        alt_sha256: sha256_hex(&tables.alt_text),
        add_sha256: sha256_hex(&tables.add_text),
    };

    println!("📄 [{}] Parsing CSV tables...", IngestStage::Parsing.as_str());
    let sdn_rows = parse_table(&tables.sdn_text)
        .with_context(|| format!("{} failed on the SDN table", IngestStage::Parsing.as_str()))?;
    let alt_rows = parse_table(&tables.alt_text)
        .with_context(|| format!("{} failed on the alias table", IngestStage::Parsing.as_str()))?;
    let add_rows = parse_table(&tables.add_text)
        .with_context(|| format!("{} failed on the address table", IngestStage::Parsing.as_str()))?;
    println!(
        "   {} SDN rows, {} alias rows, {} address rows",
        sdn_rows.len(),
        alt_rows.len(),
        add_rows.len()
    );

    println!("🏷️  [{}] Extracting entities...", IngestStage::Extracting.as_str());
    let entities = extract_entities(&sdn_rows);
    let skipped = sdn_rows.len() - entities.len();
    if skipped > 0 {
        println!("   ⚠️  Skipped {} incomplete rows (missing uid or name)", skipped);
    }

    println!("🔗 [{}] Attaching aliases...", IngestStage::ConsolidatingAliases.as_str());
    let entities = consolidate_aliases(entities, &alt_rows);

    println!("📍 [{}] Attaching addresses...", IngestStage::ConsolidatingAddresses.as_str());
    let entities = consolidate_addresses(entities, &add_rows);

    println!("🗜️  [{}] Encoding dataset...", IngestStage::Encoding.as_str());
    let blob = encode_dataset(&entities)
        .with_context(|| format!("{} failed", IngestStage::Encoding.as_str()))?;

    let metadata = IngestMetadata {
        fetched_at: Utc::now(),
        source: urls.clone(),
        counts: RowCounts {
            sdn_rows: sdn_rows.len(),
            alt_rows: alt_rows.len(),
            add_rows: add_rows.len(),
            entities: entities.len(),
        },
        hashes,
    };

    // Dataset first, metadata second: a visible metadata record always
    // describes a dataset that is already readable
    store
        .set(DATASET_KEY, &blob)
        .context("Failed to persist dataset blob")?;
    let record = serde_json::to_value(&metadata).context("Failed to serialize run metadata")?;
    store
        .set_json(METADATA_KEY, &record)
        .context("Failed to persist run metadata")?;

    println!(
        "✅ [{}] {} ({} compressed bytes)",
        IngestStage::Persisted.as_str(),
        metadata.summary(),
        blob.len()
    );

    Ok(metadata)
}

// ============================================================================
// TESTS
// ============================================================================
