//! Item entity
//!
//! The only record type the service persists. Field names are serialized in
//! camelCase to match the JSON contract of the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Build a fresh item with both timestamps set to `now`
    pub fn new(id: String, name: String, description: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place.
    ///
    /// `updated_at` never moves before `created_at`, even if the clock does.
    pub fn apply(&mut self, patch: &ItemPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        self.updated_at = std::cmp::max(now, self.created_at);
    }
}

/// Fields replaced by an update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ItemPatch {
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn test_serializes_camel_case() {
        let item = Item::new("1".into(), "A".into(), "B".into(), at(1_700_000_000_000));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20Z");
        assert_eq!(json["updatedAt"], json["createdAt"]);
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_apply_replaces_only_supplied_fields() {
        let mut item = Item::new("1".into(), "A".into(), "B".into(), at(1_000));
        let patch = ItemPatch {
            name: Some("renamed".into()),
            description: None,
        };
        item.apply(&patch, at(2_000));
        assert_eq!(item.name, "renamed");
        assert_eq!(item.description, "B");
        assert_eq!(item.created_at, at(1_000));
        assert_eq!(item.updated_at, at(2_000));
    }

    #[test]
    fn test_apply_never_moves_updated_before_created() {
        let created = at(10_000);
        let mut item = Item::new("1".into(), "A".into(), "B".into(), created);
        let patch = ItemPatch {
            name: None,
            description: Some("new".into()),
        };
        item.apply(&patch, created - Duration::seconds(5));
        assert_eq!(item.updated_at, created);
    }
}
