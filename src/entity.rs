// 🪪 Entity Model - The unit of record
// One sanctioned person/organization, keyed by the Treasury-assigned uid
//
// Identity: uid (assigned by the primary table, never changes)
// Values: name, type, programs, remarks, aka, addresses

use serde::{Deserialize, Serialize};

// ============================================================================
// ENTITY
// ============================================================================

/// A consolidated sanctions entity
///
/// Built once per ingestion run by the extractor, appended to by the alias
/// and address consolidators, then frozen into the persisted dataset blob.
///
/// Optional-field policy: "no value" is always `None` and serializes as an
/// absent JSON key (`skip_serializing_if`), never as an empty string or
/// explicit null. Source cells that are missing and cells that are blank
/// after trimming are the same "no value". Sequences serialize even when
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier from the primary table (ent_num)
    pub uid: String,

    /// Primary display name
    pub name: String,

    /// Classification, e.g. "individual" vs organization
    #[serde(rename = "type")]
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    /// Sanctions program tags, source order, duplicates kept
    pub programs: Vec<String>,

    /// Free-text remarks from the primary table
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,

    /// Alternate names, appended in alias-row order, no deduplication
    pub aka: Vec<String>,

    /// Known addresses, appended in address-row order
    pub addresses: Vec<Address>,
}

impl Entity {
    /// Create an entity fresh from a primary-table row
    ///
    /// `aka` and `addresses` start empty; only the consolidators fill them.
    pub fn new(
        uid: String,
        name: String,
        entity_type: Option<String>,
        programs: Vec<String>,
        remarks: Option<String>,
    ) -> Self {
        Entity {
            uid,
            name,
            entity_type,
            programs,
            remarks,
            aka: Vec::new(),
            addresses: Vec::new(),
        }
    }

    /// All searchable names (primary name + aliases)
    pub fn all_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(1 + self.aka.len());
        names.push(self.name.as_str());
        names.extend(self.aka.iter().map(String::as_str));
        names
    }
}

// ============================================================================
// ADDRESS
// ============================================================================

/// One address record from the auxiliary address table
///
/// Each field is independently optional, but the address consolidator only
/// appends a record when at least one field is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    /// True when no field carries a value (such a record is never stored)
    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.city.is_none() && self.country.is_none()
    }
}

// ============================================================================
// TESTS
// ============================================================================
