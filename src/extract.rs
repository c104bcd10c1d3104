// 🏗️ Entity Extractor - Primary table rows → entity records
// The only step that creates entities; later joins can only append
//
// Rows that cannot produce a complete record (missing uid or name) are
// skipped silently. That is a completeness metric, not a failure: the
// delta between sdnRows and entities in the run metadata is the count.

use crate::entity::Entity;
use crate::rows::{resolve_field, Row};

// ============================================================================
// CANDIDATE KEYS (primary table)
// ============================================================================
// Ordered most-preferred first. Header-name drift across publication cycles
// is absorbed by the resolver walking these lists.

pub const UID_KEYS: &[&str] = &["ent_num", "entnum", "uid", "id"];
pub const NAME_KEYS: &[&str] = &["sdn_name", "sdnname", "name", "full_name"];
pub const TYPE_KEYS: &[&str] = &["sdn_type", "sdntype", "type"];
pub const PROGRAM_KEYS: &[&str] = &["program", "programs", "sanctions_program"];
pub const REMARKS_KEYS: &[&str] = &["remarks", "comment", "comments"];

// ============================================================================
// PROGRAMS FIELD
// ============================================================================

/// Split the delimited programs field into tags
///
/// Splits on commas and semicolons, trims each token, drops empty tokens.
/// Order follows the source field; duplicates are kept as published.
///
/// - split_programs("OFAC; SDN; CAPTA") = ["OFAC", "SDN", "CAPTA"]
/// - split_programs("OFAC,,SDN") = ["OFAC", "SDN"]
/// - split_programs("") = []
pub fn split_programs(raw: &str) -> Vec<String> {
    raw.split(|c| c == ',' || c == ';')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Convert primary-table rows into entity records
///
/// Per row: uid and name are mandatory; if either is absent the row is
/// skipped. Type and remarks stay optional; programs default to the empty
/// list when the field is absent. Output order preserves the order of the
/// rows that produced a record.
///
/// Completeness property: the number of entities returned equals exactly
/// the number of rows where both uid and name resolve non-blank.
pub fn extract_entities(rows: &[Row]) -> Vec<Entity> {
    let mut entities = Vec::with_capacity(rows.len());

    for row in rows {
        let uid = match resolve_field(row, UID_KEYS) {
            Some(value) => value,
            None => continue,
        };
        let name = match resolve_field(row, NAME_KEYS) {
            Some(value) => value,
            None => continue,
        };

        let entity_type = resolve_field(row, TYPE_KEYS).map(str::to_string);
        let programs = resolve_field(row, PROGRAM_KEYS)
            .map(split_programs)
            .unwrap_or_default();
        let remarks = resolve_field(row, REMARKS_KEYS).map(str::to_string);

        entities.push(Entity::new(
            uid.to_string(),
            name.to_string(),
            entity_type,
            programs,
            remarks,
        ));
    }

    entities
}

// ============================================================================
// TESTS
// ============================================================================
