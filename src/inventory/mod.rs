//! Device inventory loaded from a CSV file with `hostname` and `switchip` columns.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InventoryDevice {
    pub hostname: String,
    /// Management address used to reach the RESTCONF endpoint
    #[serde(rename = "switchip")]
    pub management_address: String,
}

pub fn load_inventory(path: &Path) -> Result<Vec<InventoryDevice>> {
    let file = std::fs::File::open(path)?;
    let devices = parse_inventory(file)?;
    info!(path = %path.display(), devices = devices.len(), "Loaded inventory");
    Ok(devices)
}

/// Parse inventory rows in file order, skipping rows with a blank hostname or address.
pub fn parse_inventory<R: Read>(reader: R) -> Result<Vec<InventoryDevice>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut devices = Vec::new();

    for (row, result) in reader.deserialize::<InventoryDevice>().enumerate() {
        let device = result?;
        if device.hostname.is_empty() || device.management_address.is_empty() {
            warn!(row = row + 1, "Skipping inventory row with empty hostname or switchip");
            continue;
        }
        devices.push(device);
    }

    Ok(devices)
}
