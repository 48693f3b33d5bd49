//! Panel element model
//!
//! An element's schema is owned by the definition file, not by this crate;
//! the document is carried as opaque JSON with the handful of fields the
//! engine needs mirrored out of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One provisionable panel element parsed from a definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementModel {
    /// Storage-assigned numeric id. Zero when not yet persisted.
    pub id: i64,
    /// Stable unique identifier carried by the definition, if any.
    pub uid: String,
    pub title: String,
    pub org_id: i64,
    /// Destination folder id. Zero means root placement.
    pub folder_id: i64,
    /// Whether this element is a folder rather than a leaf panel element.
    pub is_folder: bool,
    /// The full definition document.
    pub data: Value,
}

impl ElementModel {
    /// Build an element from a parsed definition document, mirroring the
    /// identity fields out of it.
    pub fn from_json(data: Value) -> Self {
        let id = data.get("id").and_then(Value::as_i64).unwrap_or_default();
        let uid = data
            .get("uid")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let title = data
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            id,
            uid,
            title,
            org_id: 0,
            folder_id: 0,
            is_folder: false,
            data,
        }
    }

    /// Build a folder element with the given title.
    pub fn new_folder(title: &str) -> Self {
        let mut folder = Self::from_json(serde_json::json!({ "title": title }));
        folder.is_folder = true;
        folder
    }

    /// Attach a storage-assigned id, keeping the document in step.
    pub fn set_id(&mut self, id: i64) {
        self.id = id;
        if let Value::Object(map) = &mut self.data {
            map.insert("id".to_string(), Value::from(id));
        }
    }

    /// Drop an id carried over from the definition file. Ids are assigned
    /// by storage, never by the file.
    pub fn clear_id(&mut self) {
        self.id = 0;
        if let Value::Object(map) = &mut self.data {
            map.insert("id".to_string(), Value::Null);
        }
    }
}

/// A persistence-ready save request for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveElementCommand {
    pub element: ElementModel,
    pub org_id: i64,
    /// Provisioned writes always overwrite whatever the store holds.
    pub overwrite: bool,
    /// The definition file's modification time.
    pub updated_at: DateTime<Utc>,
}

/// What the store reports back after persisting or looking up an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedElement {
    pub id: i64,
    pub uid: String,
    pub title: String,
    pub is_folder: bool,
}

/// Provisioning metadata sent alongside a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionInfo {
    /// Source-relative definition file path.
    pub external_id: String,
    /// Name of the source that provisioned the element.
    pub name: String,
    pub updated: DateTime<Utc>,
    pub checksum: String,
}

/// Persisted association between a definition file and a stored element.
///
/// At most one exists per (source name, external path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedElementRef {
    pub external_id: String,
    pub name: String,
    pub updated: DateTime<Utc>,
    pub checksum: String,
    pub element_id: i64,
}

/// Destination identity of an element, for duplicate-usage accounting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementIdentity {
    pub title: String,
    pub folder_id: i64,
}

impl ElementIdentity {
    /// An identity only counts once it has a title.
    pub fn exists(&self) -> bool {
        !self.title.is_empty()
    }
}

/// Identity usage recorded for one file during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningMetadata {
    pub uid: String,
    pub identity: ElementIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_mirrors_identity_fields() {
        let element = ElementModel::from_json(json!({
            "id": 7,
            "uid": "cpu-gauge",
            "title": "CPU",
            "model": { "type": "gauge" }
        }));

        assert_eq!(element.id, 7);
        assert_eq!(element.uid, "cpu-gauge");
        assert_eq!(element.title, "CPU");
        assert!(!element.is_folder);
    }

    #[test]
    fn from_json_tolerates_missing_fields() {
        let element = ElementModel::from_json(json!({ "model": {} }));
        assert_eq!(element.id, 0);
        assert_eq!(element.uid, "");
        assert_eq!(element.title, "");
    }

    #[test]
    fn clear_id_nulls_the_document_field() {
        let mut element = ElementModel::from_json(json!({ "id": 42, "title": "CPU" }));
        element.clear_id();

        assert_eq!(element.id, 0);
        assert_eq!(element.data["id"], serde_json::Value::Null);
    }

    #[test]
    fn set_id_keeps_document_in_step() {
        let mut element = ElementModel::from_json(json!({ "title": "CPU" }));
        element.set_id(13);

        assert_eq!(element.id, 13);
        assert_eq!(element.data["id"], serde_json::json!(13));
    }

    #[test]
    fn identity_exists_only_with_a_title() {
        let named = ElementIdentity {
            title: "CPU".to_string(),
            folder_id: 0,
        };
        let unnamed = ElementIdentity {
            title: String::new(),
            folder_id: 3,
        };

        assert!(named.exists());
        assert!(!unnamed.exists());
    }
}
