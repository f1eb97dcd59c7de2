//! openconfig-lldp payload schema and raw snapshot files.
//!
//! A snapshot is the collector's output: one verbatim RESTCONF body per
//! hostname. List members (interfaces and neighbors) decode one entry at a
//! time, so a wrongly shaped entry is kept as [`Entry::Invalid`] and only that
//! entry is skipped later.

pub mod normalize;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::Result;

pub use normalize::NeighborRecord;

/// Hostname to verbatim RESTCONF response body
pub type RawSnapshot = BTreeMap<String, Value>;

/// One member of a list in the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Valid(T),
    /// Did not match the schema; the original JSON is kept for re-serialization
    Invalid { raw: Value, error: String },
}

impl<T> Entry<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Entry::Valid(value) => Some(value),
            Entry::Invalid { .. } => None,
        }
    }
}

impl<T: DeserializeOwned> Entry<T> {
    fn from_value(value: Value) -> Self {
        match T::deserialize(&value) {
            Ok(decoded) => Entry::Valid(decoded),
            Err(e) => Entry::Invalid {
                raw: value,
                error: e.to_string(),
            },
        }
    }
}

impl<T: Serialize> Serialize for Entry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Entry::Valid(value) => value.serialize(serializer),
            Entry::Invalid { raw, .. } => raw.serialize(serializer),
        }
    }
}

/// Decode a JSON list entry by entry. `null` reads as empty; a non-list value
/// becomes a single invalid entry.
fn entry_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<Entry<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(Entry::from_value).collect(),
        other => vec![Entry::Invalid {
            error: format!("expected a list, found {}", other),
            raw: other,
        }],
    })
}

/// Body of `GET /restconf/data/openconfig-lldp:lldp/interfaces/interface`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LldpPayload {
    #[serde(
        rename = "openconfig-lldp:interface",
        default,
        deserialize_with = "entry_list"
    )]
    pub interfaces: Vec<Entry<LldpInterface>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LldpInterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Absent when the interface has never seen an LLDP neighbor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbors: Option<NeighborList>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborList {
    #[serde(default, deserialize_with = "entry_list")]
    pub neighbor: Vec<Entry<LldpNeighbor>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LldpNeighbor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<NeighborState>,
}

/// Remote end of an adjacency as advertised by the neighbor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeighborState {
    #[serde(rename = "system-name", default, skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    #[serde(rename = "port-id", default, skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
    #[serde(
        rename = "port-description",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub port_description: Option<String>,
    #[serde(rename = "chassis-id", default, skip_serializing_if = "Option::is_none")]
    pub chassis_id: Option<String>,
}

impl LldpInterface {
    /// Neighbor entries, empty when the collection is missing
    pub fn neighbor_entries(&self) -> &[Entry<LldpNeighbor>] {
        self.neighbors
            .as_ref()
            .map(|list| list.neighbor.as_slice())
            .unwrap_or(&[])
    }
}

/// Typed view of a snapshot, containing only devices whose payload decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LldpSnapshot {
    pub devices: BTreeMap<String, LldpPayload>,
}

impl LldpSnapshot {
    pub fn from_raw(raw: &RawSnapshot) -> Self {
        let mut devices = BTreeMap::new();

        for (hostname, body) in raw {
            match LldpPayload::deserialize(body) {
                Ok(payload) => {
                    devices.insert(hostname.clone(), payload);
                }
                Err(e) => {
                    warn!(device = %hostname, error = %e, "Skipping undecodable LLDP payload")
                }
            }
        }

        Self { devices }
    }

    /// All well-formed neighbor records across every device, in hostname order
    pub fn records(&self) -> impl Iterator<Item = NeighborRecord<'_>> {
        self.devices
            .iter()
            .flat_map(|(hostname, payload)| normalize::neighbor_records(hostname, payload))
    }
}

pub fn load_snapshot(path: &Path) -> Result<RawSnapshot> {
    let content = fs::read_to_string(path)?;
    let raw: RawSnapshot = serde_json::from_str(&content)?;
    info!(path = %path.display(), devices = raw.len(), "Loaded LLDP snapshot");
    Ok(raw)
}

pub fn save_snapshot(path: &Path, raw: &RawSnapshot) -> Result<()> {
    let content = serde_json::to_string_pretty(raw)?;
    fs::write(path, content)?;
    info!(path = %path.display(), devices = raw.len(), "Saved LLDP snapshot");
    Ok(())
}
