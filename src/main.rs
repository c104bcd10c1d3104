use anyhow::{Context, Result};
use std::env;
use std::path::Path;

// Use library instead of local modules
use sdn_screen::{
    decode_dataset, run_ingest, search_entities, source_urls_from_env, BlobStore, DatasetSnapshot,
    Entity, HttpFetcher, IngestMetadata, SqliteStore, DATASET_KEY, METADATA_KEY,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("ingest") => run_ingest_command(),
        Some("search") => {
            let query = match args.get(2) {
                Some(q) => q,
                None => {
                    eprintln!("❌ Missing query!");
                    eprintln!("   Usage: sdn-screen search <query> [limit]");
                    std::process::exit(1);
                }
            };
            let limit = match args.get(3) {
                Some(raw) => Some(
                    raw.parse::<usize>()
                        .with_context(|| format!("Invalid limit: {}", raw))?,
                ),
                None => None,
            };
            run_search_command(query, limit)
        }
        Some("show") => {
            let uid = match args.get(2) {
                Some(u) => u,
                None => {
                    eprintln!("❌ Missing uid!");
                    eprintln!("   Usage: sdn-screen show <uid>");
                    std::process::exit(1);
                }
            };
            run_show_command(uid)
        }
        Some("meta") => run_meta_command(),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn db_path() -> String {
    env::var("SDN_SCREEN_DB").unwrap_or_else(|_| "sdn-screen.db".to_string())
}

fn run_ingest_command() -> Result<()> {
    println!("🛡️  SDN SCREEN - OFAC List Ingestion");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let path = db_path();
    let urls = source_urls_from_env();
    println!("📦 Database: {}", path);
    println!("🌐 Primary table: {}\n", urls.sdn_url);

    let fetcher = HttpFetcher::new()?;
    let store = SqliteStore::open(&path)?;

    let metadata = run_ingest(&fetcher, &store, &urls)?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 Ingestion complete!");
    println!("✓ {}", metadata.summary());
    println!("✓ Fetched at {}", metadata.fetched_at.to_rfc3339());

    Ok(())
}

fn run_search_command(query: &str, limit: Option<usize>) -> Result<()> {
    let store = open_existing_store()?;
    let entities = load_entities(&store)?;

    let hits = search_entities(&entities, query, limit);
    if hits.is_empty() {
        println!("🔎 No matches for \"{}\"", query);
        return Ok(());
    }

    println!("🔎 {} match(es) for \"{}\":\n", hits.len(), query);
    for (rank, hit) in hits.iter().enumerate() {
        let score = match hit.score {
            Some(s) => format!("{:.3}", s),
            None => "  n/a".to_string(),
        };
        println!(
            "{:>3}. [{}] {} (uid {}{})",
            rank + 1,
            score,
            hit.name,
            hit.uid,
            match &hit.entity_type {
                Some(t) => format!(", {}", t),
                None => String::new(),
            }
        );
        if !hit.programs.is_empty() {
            println!("     Programs: {}", hit.programs.join(", "));
        }
    }

    Ok(())
}

fn run_show_command(uid: &str) -> Result<()> {
    let store = open_existing_store()?;
    let snapshot = DatasetSnapshot::new(load_entities(&store)?);

    let entity = match snapshot.find(uid) {
        Some(e) => e,
        None => {
            eprintln!("❌ No entity with uid {}", uid);
            std::process::exit(1);
        }
    };

    println!("🪪 Entity {}", entity.uid);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Name:     {}", entity.name);
    if let Some(t) = &entity.entity_type {
        println!("Type:     {}", t);
    }
    if !entity.programs.is_empty() {
        println!("Programs: {}", entity.programs.join(", "));
    }
    if let Some(r) = &entity.remarks {
        println!("Remarks:  {}", r);
    }
    if !entity.aka.is_empty() {
        println!("\nAlso known as:");
        for name in &entity.aka {
            println!("  • {}", name);
        }
    }
    if !entity.addresses.is_empty() {
        println!("\nAddresses:");
        for addr in &entity.addresses {
            let parts: Vec<&str> = [&addr.address, &addr.city, &addr.country]
                .iter()
                .filter_map(|p| p.as_deref())
                .collect();
            println!("  • {}", parts.join(", "));
        }
    }

    Ok(())
}

fn run_meta_command() -> Result<()> {
    let store = open_existing_store()?;

    let bytes = match store.get(METADATA_KEY)? {
        Some(bytes) => bytes,
        None => {
            eprintln!("❌ No ingestion metadata found!");
            eprintln!("   Run: sdn-screen ingest");
            std::process::exit(1);
        }
    };
    let metadata: IngestMetadata =
        serde_json::from_slice(&bytes).context("Failed to decode ingestion metadata")?;

    println!("📋 Last ingestion run");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Fetched at:    {}", metadata.fetched_at.to_rfc3339());
    println!("Entities:      {}", metadata.counts.entities);
    println!(
        "Rows:          {} SDN / {} alias / {} address ({} skipped)",
        metadata.counts.sdn_rows,
        metadata.counts.alt_rows,
        metadata.counts.add_rows,
        metadata.skipped_rows()
    );
    println!("SDN source:    {}", metadata.source.sdn_url);
    println!("SDN sha256:    {}", metadata.hashes.sdn_sha256);

    Ok(())
}

// Open the store for a read command; never create the database here
fn open_existing_store() -> Result<SqliteStore> {
    let path = db_path();

    if !Path::new(&path).exists() {
        eprintln!("❌ Database not found: {}", path);
        eprintln!("   Run: sdn-screen ingest");
        eprintln!("   to build the dataset first.");
        std::process::exit(1);
    }

    SqliteStore::open(&path)
}

fn load_entities(store: &SqliteStore) -> Result<Vec<Entity>> {
    match store.get(DATASET_KEY)? {
        Some(blob) => decode_dataset(&blob),
        None => {
            eprintln!("❌ No dataset in {} yet", db_path());
            eprintln!("   Run: sdn-screen ingest");
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    println!("🛡️  SDN Screen - OFAC sanctions list screening");
    println!();
    println!("Usage:");
    println!("  sdn-screen ingest                Fetch the OFAC tables and build the dataset");
    println!("  sdn-screen search <query> [n]    Screen a name against the dataset");
    println!("  sdn-screen show <uid>            Print one entity in full");
    println!("  sdn-screen meta                  Show the last ingestion run");
    println!();
    println!("Environment:");
    println!("  SDN_SCREEN_DB                    Database path (default: sdn-screen.db)");
    println!("  SDN_CSV_URL / ALT_CSV_URL / ADD_CSV_URL");
    println!("                                   Override the Treasury source URLs");
}
