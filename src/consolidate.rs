// 🔗 Consolidators - Append-only joins by uid
// Alias and address tables enrich existing entities; they never create one
//
// Both joins are pure transformations: they take the entity collection by
// value and hand the same collection back, matched rows appended in row
// order. Rows that cannot join (missing uid, missing payload, unknown uid)
// are dropped silently. The source tables are not referentially consistent,
// so a foreign-key miss is expected data, not an error.
//
// PRECONDITION: each consolidator runs at most once per fresh extraction
// output. Re-applying the same rows to an already-consolidated collection
// appends the same values again (duplicates are kept by contract, so there
// is no dedup to save you).

use crate::entity::{Address, Entity};
use crate::extract::UID_KEYS;
use crate::rows::{resolve_field, Row};
use std::collections::HashMap;

// ============================================================================
// CANDIDATE KEYS (auxiliary tables)
// ============================================================================

pub const ALT_NAME_KEYS: &[&str] = &["alt_name", "altname", "name", "alternate_name"];
pub const ADDRESS_KEYS: &[&str] = &["address", "addr", "street"];
pub const CITY_KEYS: &[&str] = &["city", "city_name"];
pub const COUNTRY_KEYS: &[&str] = &["country", "country_name"];

// ============================================================================
// UID INDEX
// ============================================================================

/// Build the uid → position lookup once per join (O(n))
///
/// Positions, not references: the collection stays exclusively owned and the
/// index cannot alias it while rows append. A duplicated uid (never the case
/// in a well-formed export) resolves to its last occurrence.
fn index_by_uid(entities: &[Entity]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(entities.len());
    for (position, entity) in entities.iter().enumerate() {
        index.insert(entity.uid.clone(), position);
    }
    index
}

// ============================================================================
// ALIAS CONSOLIDATOR
// ============================================================================

/// Join alias rows onto entities, appending alternate names
///
/// Per row: resolve uid and alt_name; if either is absent, or no entity
/// carries that uid, the row is skipped. Matched names append to `aka` in
/// row-processing order with no deduplication.
pub fn consolidate_aliases(mut entities: Vec<Entity>, rows: &[Row]) -> Vec<Entity> {
    let index = index_by_uid(&entities);

    for row in rows {
        let uid = match resolve_field(row, UID_KEYS) {
            Some(value) => value,
            None => continue,
        };
        let alt_name = match resolve_field(row, ALT_NAME_KEYS) {
            Some(value) => value,
            None => continue,
        };

        if let Some(&position) = index.get(uid) {
            entities[position].aka.push(alt_name.to_string());
        }
    }

    entities
}

// ============================================================================
// ADDRESS CONSOLIDATOR
// ============================================================================

/// Join address rows onto entities, appending address records
///
/// Per row: resolve uid first; absent or unmatched → skip. Then resolve
/// address, city and country independently; if all three are absent the row
/// carries nothing and is skipped. Otherwise the partial record is appended
/// as-is (each field independently optional).
pub fn consolidate_addresses(mut entities: Vec<Entity>, rows: &[Row]) -> Vec<Entity> {
    let index = index_by_uid(&entities);

    for row in rows {
        let uid = match resolve_field(row, UID_KEYS) {
            Some(value) => value,
            None => continue,
        };
        let position = match index.get(uid) {
            Some(&position) => position,
            None => continue,
        };

        let record = Address {
            address: resolve_field(row, ADDRESS_KEYS).map(str::to_string),
            city: resolve_field(row, CITY_KEYS).map(str::to_string),
            country: resolve_field(row, COUNTRY_KEYS).map(str::to_string),
        };

        // An address record must carry at least one populated field
        if record.is_empty() {
            continue;
        }

        entities[position].addresses.push(record);
    }

    entities
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_entities;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base_entities() -> Vec<Entity> {
        extract_entities(&[
            row(&[("ent_num", "123"), ("sdn_name", "John Doe")]),
            row(&[("ent_num", "456"), ("sdn_name", "Acme Corp")]),
        ])
    }

    #[test]
    fn test_alias_appends_to_matched_entity() {
        let entities = consolidate_aliases(
            base_entities(),
            &[row(&[("ent_num", "123"), ("alt_name", "Johnny Doe")])],
        );

        assert_eq!(entities[0].aka, vec!["Johnny Doe"]);
        assert!(entities[1].aka.is_empty());
    }

    #[test]
    fn test_alias_unmatched_uid_changes_nothing() {
        let before = base_entities();
        let after = consolidate_aliases(
            base_entities(),
            &[row(&[("ent_num", "999"), ("alt_name", "Ghost")])],
        );

        assert_eq!(before, after);
    }

    #[test]
    fn test_alias_missing_fields_skip_row() {
        let after = consolidate_aliases(
            base_entities(),
            &[
                row(&[("alt_name", "No Uid")]),
                row(&[("ent_num", "123")]),
                row(&[("ent_num", "123"), ("alt_name", "   ")]),
            ],
        );

        assert_eq!(after, base_entities());
    }

    #[test]
    fn test_alias_keeps_duplicates_in_row_order() {
        let entities = consolidate_aliases(
            base_entities(),
            &[
                row(&[("ent_num", "123"), ("alt_name", "J. Doe")]),
                row(&[("ent_num", "123"), ("alt_name", "Johnny Doe")]),
                row(&[("ent_num", "123"), ("alt_name", "J. Doe")]),
            ],
        );

        assert_eq!(entities[0].aka, vec!["J. Doe", "Johnny Doe", "J. Doe"]);
    }

    #[test]
    fn test_address_partial_fields() {
        let entities = consolidate_addresses(
            base_entities(),
            &[row(&[("ent_num", "456"), ("city", "Geneva")])],
        );

        assert_eq!(
            entities[1].addresses,
            vec![Address {
                address: None,
                city: Some("Geneva".to_string()),
                country: None,
            }]
        );
    }

    #[test]
    fn test_address_all_fields_absent_skips_row() {
        // uid matches, but there is nothing to store
        let after = consolidate_addresses(
            base_entities(),
            &[row(&[("ent_num", "123"), ("address", ""), ("city", "  ")])],
        );

        assert_eq!(after, base_entities());
    }

    #[test]
    fn test_address_key_variants() {
        let entities = consolidate_addresses(
            base_entities(),
            &[row(&[
                ("ent_num", "123"),
                ("addr", "5 Rue X"),
                ("city_name", "Paris"),
                ("country_name", "France"),
            ])],
        );

        assert_eq!(
            entities[0].addresses,
            vec![Address {
                address: Some("5 Rue X".to_string()),
                city: Some("Paris".to_string()),
                country: Some("France".to_string()),
            }]
        );
    }

    #[test]
    fn test_exactly_one_append_per_valid_row() {
        let alias_rows = vec![
            row(&[("ent_num", "123"), ("alt_name", "A1")]),
            row(&[("ent_num", "999"), ("alt_name", "Ghost")]),
            row(&[("ent_num", "456"), ("alt_name", "A2")]),
        ];

        let entities = consolidate_aliases(base_entities(), &alias_rows);

        let total: usize = entities.iter().map(|e| e.aka.len()).sum();
        assert_eq!(total, 2); // one per valid row, unmatched row dropped
    }

    #[test]
    fn test_consolidation_deterministic_over_fresh_runs() {
        // The at-most-once contract: consolidating fresh extraction output
        // with the same rows always lands on the identical collection
        let alias_rows = vec![row(&[("ent_num", "123"), ("alt_name", "Johnny Doe")])];
        let address_rows = vec![row(&[("ent_num", "123"), ("city", "NY")])];

        let run = || {
            consolidate_addresses(
                consolidate_aliases(base_entities(), &alias_rows),
                &address_rows,
            )
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_golden_scenario() {
        // The end-to-end shape from the primary + alias + address tables
        let primary = vec![row(&[("ent_num", "123"), ("sdn_name", "John Doe")])];
        let aliases = vec![row(&[("ent_num", "123"), ("alt_name", "Johnny Doe")])];
        let addresses = vec![row(&[
            ("ent_num", "123"),
            ("address", "123 Main St"),
            ("city", "NY"),
        ])];

        let entities = consolidate_addresses(
            consolidate_aliases(extract_entities(&primary), &aliases),
            &addresses,
        );

        assert_eq!(entities.len(), 1);
        let e = &entities[0];
        assert_eq!(e.uid, "123");
        assert_eq!(e.name, "John Doe");
        assert_eq!(e.entity_type, None);
        assert!(e.programs.is_empty());
        assert_eq!(e.remarks, None);
        assert_eq!(e.aka, vec!["Johnny Doe"]);
        assert_eq!(
            e.addresses,
            vec![Address {
                address: Some("123 Main St".to_string()),
                city: Some("NY".to_string()),
                country: None,
            }]
        );
    }
}
