// SDN Screen - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod rows;
pub mod entity;
pub mod extract;
pub mod consolidate;
pub mod codec;
pub mod meta;
pub mod store;
pub mod fetch;
pub mod pipeline;    // Full ingestion run: fetch → parse → consolidate → persist
pub mod search;      // Fuzzy screening over the decoded dataset
pub mod cache;       // TTL-bounded snapshot cache for the read path

// Re-export commonly used types
pub use rows::{canonical_key, parse_table, resolve_field, Row};
pub use entity::{Address, Entity};
pub use extract::{extract_entities, split_programs};
pub use consolidate::{consolidate_aliases, consolidate_addresses};
pub use codec::{decode_dataset, encode_dataset};
pub use meta::{sha256_hex, ContentHashes, IngestMetadata, RowCounts, SourceUrls};
pub use store::{BlobStore, MemoryStore, SqliteStore, DATASET_KEY, METADATA_KEY};
pub use fetch::{HttpFetcher, SourceFetcher};
pub use pipeline::{fetch_tables, run_ingest, source_urls_from_env, FetchedTables, IngestStage};
pub use search::{search_entities, SearchHit};
pub use cache::{Clock, DatasetCache, DatasetSnapshot, SystemClock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
