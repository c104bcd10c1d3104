// 🧾 Row Layer - Canonical headers + field resolution
// One normalization path for every column name, one lookup path for every field
//
// Treasury exports rename columns between publication cycles ("Ent Num",
// "ent_num", "ENT-NUM"...). Everything downstream works against canonical
// keys so that drift is absorbed here and nowhere else.

use anyhow::{Context, Result};
use std::collections::HashMap;

/// A parsed CSV row: canonical header key → raw cell value
pub type Row = HashMap<String, String>;

// ============================================================================
// HEADER NORMALIZER
// ============================================================================

/// Canonicalize a raw CSV column header into a stable lookup key
///
/// Steps:
/// 1. Strip a leading byte-order-mark if present
/// 2. Trim surrounding whitespace, lowercase
/// 3. Drop characters that are not alphanumeric/underscore/whitespace/hyphen
/// 4. Collapse each run of whitespace or hyphens into a single underscore
///
/// Pure and total: every input produces a deterministic key, never fails,
/// and the output is a fixed point (`canonical_key(canonical_key(s)) ==
/// canonical_key(s)`).
///
/// # Examples
/// ```
/// use sdn_screen::canonical_key;
///
/// assert_eq!(canonical_key("Ent Num"), "ent_num");
/// assert_eq!(canonical_key("Program(s)"), "programs");
/// assert_eq!(canonical_key("\u{feff}Ent Num"), "ent_num");
/// assert_eq!(canonical_key("SDN-Type"), "sdn_type");
/// ```
pub fn canonical_key(raw: &str) -> String {
    let stripped = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let lowered = stripped.trim().to_lowercase();

    let mut key = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            // Separator runs collapse to one underscore, and only between
            // kept characters (no leading/trailing underscore)
            if !key.is_empty() {
                pending_separator = true;
            }
        } else if c.is_alphanumeric() || c == '_' {
            if pending_separator {
                key.push('_');
                pending_separator = false;
            }
            key.push(c);
        }
        // Everything else ("(", ")", ".", "*"...) is dropped
    }

    key
}

// ============================================================================
// FIELD RESOLVER
// ============================================================================

/// Resolve a field from an ordered list of candidate keys (most preferred
/// first)
///
/// Returns the trimmed value of the first candidate present in the row whose
/// value is non-blank after trimming. A whitespace-only value counts as
/// absent, exactly like a missing key: "no value" has one meaning across
/// the whole pipeline.
pub fn resolve_field<'a>(row: &'a Row, candidates: &[&str]) -> Option<&'a str> {
    for key in candidates {
        if let Some(value) = row.get(*key) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
    }
    None
}

// ============================================================================
// TABLE PARSING (CSV text → rows)
// ============================================================================

/// Parse CSV text into rows keyed by canonical header
///
/// The reader is flexible: ragged rows are tolerated, fields beyond the
/// header count are dropped, and a row shorter than the header simply lacks
/// those keys. Duplicate canonical headers resolve to the rightmost column
/// (map insert semantics). Empty input yields zero rows, not an error.
pub fn parse_table(text: &str) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(canonical_key)
        .collect();

    let mut rows = Vec::new();

    for (line_num, result) in reader.records().enumerate() {
        // +2: records are 1-indexed and follow the header row
        let record =
            result.with_context(|| format!("Failed to parse CSV line {}", line_num + 2))?;

        let mut row = Row::new();
        for (i, field) in record.iter().enumerate() {
            if let Some(key) = headers.get(i) {
                row.insert(key.clone(), field.to_string());
            }
        }

        rows.push(row);
    }

    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================
