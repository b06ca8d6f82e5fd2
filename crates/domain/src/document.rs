//! The persisted document and its schema migrations.
//!
//! ```json
//! { "version": 2, "virtual_devices": { "<device_id>": { ... } } }
//! ```
//!
//! Migrations operate on raw JSON so that a record this build cannot decode
//! is still carried forward untouched.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::device::VirtualDevice;
use crate::id::DeviceId;

/// Schema version written by this build.
pub const STORE_VERSION: u64 = 2;

const VERSION_KEY: &str = "version";
const DEVICES_KEY: &str = "virtual_devices";

/// Why a stored document cannot be used at all.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("stored document is not a JSON object")]
    NotAnObject,

    #[error("stored document has version {found}, newest supported is {supported}")]
    UnsupportedVersion { found: u64, supported: u64 },
}

/// Result of bringing a stored document up to [`STORE_VERSION`].
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub document: Value,
    pub from_version: u64,
}

impl Migration {
    /// Whether any step ran, i.e. the document should be written back.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.from_version < STORE_VERSION
    }
}

/// An empty document at the current version.
#[must_use]
pub fn empty() -> Value {
    json!({ VERSION_KEY: STORE_VERSION, DEVICES_KEY: {} })
}

/// Apply every migration step above the stored version, in order.
///
/// A document without a version is treated as version 1.
///
/// # Errors
///
/// Returns [`DocumentError::NotAnObject`] when the root is not an object and
/// [`DocumentError::UnsupportedVersion`] when the document is newer than
/// this build.
pub fn migrate(document: Value) -> Result<Migration, DocumentError> {
    let Value::Object(mut root) = document else {
        return Err(DocumentError::NotAnObject);
    };
    let from_version = root.get(VERSION_KEY).and_then(Value::as_u64).unwrap_or(1);
    if from_version > STORE_VERSION {
        return Err(DocumentError::UnsupportedVersion {
            found: from_version,
            supported: STORE_VERSION,
        });
    }

    let mut version = from_version;
    while version < STORE_VERSION {
        root = match version {
            1 => v1_to_v2(root),
            _ => root,
        };
        version += 1;
        root.insert(VERSION_KEY.into(), version.into());
    }

    Ok(Migration {
        document: Value::Object(root),
        from_version,
    })
}

/// Add `device_type` and `entity_configs` to devices that lack them.
fn v1_to_v2(mut root: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::Object(devices)) = root.get_mut(DEVICES_KEY) {
        for record in devices.values_mut() {
            if let Value::Object(device) = record {
                device
                    .entry("device_type")
                    .or_insert_with(|| Value::from("generic"));
                device
                    .entry("entity_configs")
                    .or_insert_with(|| Value::Object(Map::new()));
            }
        }
    }
    root
}

/// A device record that could not be decoded.
#[derive(Debug)]
pub struct RecordFailure {
    pub key: String,
    pub error: serde_json::Error,
}

/// Devices decoded from a migrated document.
#[derive(Debug, Default)]
pub struct Decoded {
    pub devices: BTreeMap<DeviceId, VirtualDevice>,
    pub failures: Vec<RecordFailure>,
}

/// Decode every device record, isolating the ones that fail.
#[must_use]
pub fn decode(document: &Value) -> Decoded {
    let mut decoded = Decoded::default();
    let Some(Value::Object(records)) = document.get(DEVICES_KEY) else {
        return decoded;
    };
    for (key, record) in records {
        match serde_json::from_value::<VirtualDevice>(record.clone()) {
            Ok(device) => {
                decoded.devices.insert(device.id, device);
            }
            Err(error) => decoded.failures.push(RecordFailure {
                key: key.clone(),
                error,
            }),
        }
    }
    decoded
}

/// Serialize devices into a document at the current version.
///
/// # Errors
///
/// Returns the underlying serializer error; with the types in this crate
/// that only happens for non-string map keys, which cannot occur.
pub fn encode<'a>(
    devices: impl IntoIterator<Item = &'a VirtualDevice>,
) -> Result<Value, serde_json::Error> {
    let mut records = Map::new();
    for device in devices {
        records.insert(device.id.to_string(), serde_json::to_value(device)?);
    }
    Ok(json!({ VERSION_KEY: STORE_VERSION, DEVICES_KEY: records }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceType;

    fn v1() -> Value {
        json!({
            "virtual_devices": {
                "0f8fad5b-d9cb-469f-a165-70867728950e": {
                    "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
                    "name": "TV",
                    "ir_blaster_entity_id": "remote.living_room",
                    "commands": {
                        "power": {
                            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
                            "name": "Power",
                            "code": "JgBQAA==",
                            "command_type": "ir",
                            "learned_at": "2024-05-01T18:22:03.123456+00:00",
                            "icon": null
                        }
                    },
                    "created_at": "2024-05-01T18:00:00+00:00"
                }
            }
        })
    }

    #[test]
    fn should_add_defaults_when_migrating_v1() {
        let migration = migrate(v1()).unwrap();
        assert!(migration.changed());
        assert_eq!(migration.from_version, 1);
        let device = &migration.document["virtual_devices"]["0f8fad5b-d9cb-469f-a165-70867728950e"];
        assert_eq!(device["device_type"], "generic");
        assert_eq!(device["entity_configs"], json!({}));
        assert_eq!(migration.document["version"], 2);
    }

    #[test]
    fn should_be_idempotent_when_run_twice() {
        let once = migrate(v1()).unwrap().document;
        let twice = migrate(once.clone()).unwrap();
        assert!(!twice.changed());
        assert_eq!(twice.document, once);
    }

    #[test]
    fn should_not_overwrite_existing_device_type() {
        let mut doc = v1();
        doc["virtual_devices"]["0f8fad5b-d9cb-469f-a165-70867728950e"]["device_type"] =
            json!("light");
        let migrated = migrate(doc).unwrap().document;
        assert_eq!(
            migrated["virtual_devices"]["0f8fad5b-d9cb-469f-a165-70867728950e"]["device_type"],
            "light"
        );
    }

    #[test]
    fn should_reject_newer_version() {
        let result = migrate(json!({"version": 3, "virtual_devices": {}}));
        assert!(matches!(
            result,
            Err(DocumentError::UnsupportedVersion { found: 3, .. })
        ));
    }

    #[test]
    fn should_reject_non_object_document() {
        assert!(matches!(migrate(json!([1, 2])), Err(DocumentError::NotAnObject)));
    }

    #[test]
    fn should_skip_corrupt_records_and_keep_the_rest() {
        let mut doc = migrate(v1()).unwrap().document;
        doc["virtual_devices"]["broken"] = json!({"name": 12});
        let decoded = decode(&doc);
        assert_eq!(decoded.devices.len(), 1);
        assert_eq!(decoded.failures.len(), 1);
        assert_eq!(decoded.failures[0].key, "broken");
        let device = decoded.devices.values().next().unwrap();
        assert_eq!(device.device_type, DeviceType::Generic);
        assert_eq!(device.command("POWER").unwrap().code.as_str(), "JgBQAA==");
    }

    #[test]
    fn should_decode_nothing_from_empty_document() {
        let decoded = decode(&empty());
        assert!(decoded.devices.is_empty());
        assert!(decoded.failures.is_empty());
    }

    #[test]
    fn should_encode_devices_keyed_by_id() {
        let device = VirtualDevice::builder()
            .name("Fan")
            .blaster("remote.bedroom")
            .build()
            .unwrap();
        let doc = encode([&device]).unwrap();
        assert_eq!(doc["version"], 2);
        assert_eq!(
            doc["virtual_devices"][device.id.to_string()]["name"],
            "Fan"
        );
    }
}
