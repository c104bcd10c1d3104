// 🔎 Fuzzy Screening - Ranked name search over the entity dataset
//
// Pure functions over an immutable snapshot. Scores are DISTANCES: 0.0 is a
// perfect match, 1.0 is no match at all. Matching cascades per field:
//
//   exact (after normalization)      → 0.0
//   one contains the other           → (1 - len ratio) × 0.5
//   otherwise                        → 1 - jaro_winkler
//
// The primary name outranks aliases: alias distances are stretched by
// 1/AKA_WEIGHT before comparison, so an equally-close alias match always
// scores worse than the same match on the primary name.

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::entity::Entity;

/// Results returned when the caller does not say how many
pub const DEFAULT_LIMIT: usize = 20;

/// Hard ceiling on results per query
pub const MAX_LIMIT: usize = 50;

/// Entities scoring above this distance are not matches
pub const MAX_DISTANCE: f64 = 0.4;

/// Alias matches count at 75% of a primary-name match
pub const AKA_WEIGHT: f64 = 0.75;

/// Containment matches land in [0, 0.5), always beating plain similarity
pub const SUBSTRING_SCALE: f64 = 0.5;

// ============================================================================
// WIRE SHAPE
// ============================================================================

/// One ranked search result
///
/// `score` is serialized even when absent (`null`), unlike the optional
/// entity fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub score: Option<f64>,
    pub uid: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    pub programs: Vec<String>,
}

impl SearchHit {
    fn from_entity(entity: &Entity, score: f64) -> Self {
        SearchHit {
            score: Some(score),
            uid: entity.uid.clone(),
            name: entity.name.clone(),
            entity_type: entity.entity_type.clone(),
            programs: entity.programs.clone(),
        }
    }
}

// ============================================================================
// NORMALIZATION & SCORING
// ============================================================================

/// Fold a name to its comparable form: lowercase, punctuation to spaces,
/// whitespace collapsed
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            pending_space = true;
        }
    }

    out
}

/// Distance between a normalized query and one raw candidate name
fn field_distance(query: &str, candidate_raw: &str) -> f64 {
    let candidate = normalize_name(candidate_raw);
    if candidate.is_empty() {
        return 1.0;
    }
    if candidate == query {
        return 0.0;
    }

    let (short, long) = if query.len() <= candidate.len() {
        (query, candidate.as_str())
    } else {
        (candidate.as_str(), query)
    };
    if long.contains(short) {
        let ratio = short.len() as f64 / long.len() as f64;
        return (1.0 - ratio) * SUBSTRING_SCALE;
    }

    1.0 - jaro_winkler(query, &candidate)
}

/// Best weighted distance across an entity's searchable names
fn entity_distance(entity: &Entity, query: &str) -> f64 {
    let mut best = field_distance(query, &entity.name);

    for aka in &entity.aka {
        let stretched = (field_distance(query, aka) / AKA_WEIGHT).min(1.0);
        if stretched < best {
            best = stretched;
        }
    }

    best
}

// ============================================================================
// SEARCH
// ============================================================================

/// Screen the dataset against a query
///
/// Returns at most `limit` hits (clamped to 1..=50, default 20), best match
/// first. Ties keep dataset order. A query that normalizes to nothing
/// matches nothing.
pub fn search_entities(entities: &[Entity], query: &str, limit: Option<usize>) -> Vec<SearchHit> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let normalized = normalize_name(query);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f64, &Entity)> = entities
        .iter()
        .map(|entity| (entity_distance(entity, &normalized), entity))
        .filter(|(distance, _)| *distance <= MAX_DISTANCE)
        .collect();

    // sort_by is stable, so equal scores preserve dataset order
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    scored.truncate(limit);

    scored
        .into_iter()
        .map(|(distance, entity)| SearchHit::from_entity(entity, distance))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(uid: &str, name: &str, aka: &[&str]) -> Entity {
        let mut e = Entity::new(
            uid.to_string(),
            name.to_string(),
            Some("individual".to_string()),
            vec!["SDGT".to_string()],
            None,
        );
        e.aka = aka.iter().map(|s| s.to_string()).collect();
        e
    }

    fn corpus() -> Vec<Entity> {
        vec![
            entity("1", "Juan Carlos Perez", &[]),
            entity("2", "ACME Trading LLC", &["ACME Trade Co"]),
            entity("3", "Maria Gonzalez", &["Juan Carlos Perez"]),
        ]
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  JOHN-DOE!! "), "john doe");
        assert_eq!(normalize_name("Juan   Carlos"), "juan carlos");
        assert_eq!(normalize_name("***"), "");
        assert_eq!(normalize_name("O'Brien, Patrick"), "o brien patrick");
    }

    #[test]
    fn test_exact_name_scores_zero_and_ranks_first() {
        let hits = search_entities(&corpus(), "juan carlos perez", None);

        assert!(!hits.is_empty());
        assert_eq!(hits[0].uid, "1");
        assert_eq!(hits[0].score, Some(0.0));
    }

    #[test]
    fn test_exact_match_survives_punctuation_and_case() {
        let hits = search_entities(&corpus(), "  JUAN-CARLOS  PEREZ!", None);
        assert_eq!(hits[0].uid, "1");
        assert_eq!(hits[0].score, Some(0.0));
    }

    #[test]
    fn test_name_match_outranks_equal_alias_match() {
        // Same partial string appears as uid 1's name and uid 3's alias;
        // the containment distances are equal before weighting
        let hits = search_entities(&corpus(), "juan carlos", None);

        let pos_name = hits.iter().position(|h| h.uid == "1").unwrap();
        let pos_aka = hits.iter().position(|h| h.uid == "3").unwrap();
        assert!(pos_name < pos_aka);
        assert!(hits[pos_name].score.unwrap() < hits[pos_aka].score.unwrap());
    }

    #[test]
    fn test_alias_only_match_is_found() {
        let hits = search_entities(&corpus(), "acme trade co", None);
        assert!(hits.iter().any(|h| h.uid == "2"));
    }

    #[test]
    fn test_scores_ascend() {
        let hits = search_entities(&corpus(), "juan carlos", None);
        for pair in hits.windows(2) {
            assert!(pair[0].score.unwrap() <= pair[1].score.unwrap());
        }
    }

    #[test]
    fn test_unrelated_query_matches_nothing() {
        let hits = search_entities(&corpus(), "zzzzqqqq xkwv", None);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        assert!(search_entities(&corpus(), "", None).is_empty());
        assert!(search_entities(&corpus(), "   ", None).is_empty());
        assert!(search_entities(&corpus(), "!!!", None).is_empty());
    }

    #[test]
    fn test_limit_default_and_clamping() {
        let many: Vec<Entity> = (0..60)
            .map(|i| entity(&i.to_string(), &format!("Branch Office {}", i), &[]))
            .collect();

        assert_eq!(search_entities(&many, "branch office", None).len(), 20);
        assert_eq!(search_entities(&many, "branch office", Some(5)).len(), 5);
        assert_eq!(search_entities(&many, "branch office", Some(500)).len(), 50);
        assert_eq!(search_entities(&many, "branch office", Some(0)).len(), 1);
    }

    #[test]
    fn test_tied_scores_keep_dataset_order() {
        let twins = vec![
            entity("a", "Same Name Holdings", &[]),
            entity("b", "Same Name Holdings", &[]),
        ];
        let hits = search_entities(&twins, "same name holdings", None);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].uid, "a");
        assert_eq!(hits[1].uid, "b");
    }

    #[test]
    fn test_near_miss_typo_still_matches() {
        let hits = search_entities(&corpus(), "juan carlos peres", None);
        assert_eq!(hits[0].uid, "1");
        assert!(hits[0].score.unwrap() > 0.0);
        assert!(hits[0].score.unwrap() <= MAX_DISTANCE);
    }

    #[test]
    fn test_hit_wire_shape() {
        let hits = search_entities(&corpus(), "juan carlos perez", Some(1));
        let json = serde_json::to_value(&hits[0]).unwrap();

        assert_eq!(json["score"], 0.0);
        assert_eq!(json["uid"], "1");
        assert_eq!(json["type"], "individual");
        assert_eq!(json["programs"][0], "SDGT");

        // Null score serializes, absent type disappears
        let bare = SearchHit {
            score: None,
            uid: "x".to_string(),
            name: "X".to_string(),
            entity_type: None,
            programs: Vec::new(),
        };
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json["score"].is_null());
        assert!(json.as_object().unwrap().contains_key("score"));
        assert!(!json.as_object().unwrap().contains_key("type"));
    }
}
