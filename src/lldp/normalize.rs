//! Flattens one device's LLDP payload into neighbor records.

use tracing::warn;

use super::{Entry, LldpInterface, LldpNeighbor, LldpPayload};
use crate::error::RecordDefect;

/// One adjacency as seen from `local_device`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NeighborRecord<'a> {
    pub local_device: &'a str,
    pub local_port: &'a str,
    pub remote_device: &'a str,
    pub remote_port: &'a str,
}

/// Lazily yields every well-formed neighbor record in `payload`.
///
/// Malformed interfaces and neighbors are logged and skipped one at a time;
/// they never stop the remaining entries from being read.
pub fn neighbor_records<'a>(
    hostname: &'a str,
    payload: &'a LldpPayload,
) -> impl Iterator<Item = NeighborRecord<'a>> + 'a {
    payload
        .interfaces
        .iter()
        .filter_map(move |entry| match entry {
            Entry::Valid(interface) => Some(interface),
            Entry::Invalid { error, .. } => {
                let defect = RecordDefect::InvalidEntry(error.clone());
                warn!(device = hostname, %defect, "Skipping malformed LLDP interface");
                None
            }
        })
        .flat_map(move |interface| {
            interface
                .neighbor_entries()
                .iter()
                .filter_map(move |entry| match entry_to_record(hostname, interface, entry) {
                    Ok(record) => Some(record),
                    Err(defect) => {
                        warn!(
                            device = hostname,
                            interface = interface.name.as_deref().unwrap_or("<unnamed>"),
                            %defect,
                            "Skipping malformed LLDP neighbor"
                        );
                        None
                    }
                })
        })
}

fn entry_to_record<'a>(
    hostname: &'a str,
    interface: &'a LldpInterface,
    entry: &'a Entry<LldpNeighbor>,
) -> Result<NeighborRecord<'a>, RecordDefect> {
    match entry {
        Entry::Valid(neighbor) => to_record(hostname, interface, neighbor),
        Entry::Invalid { error, .. } => Err(RecordDefect::InvalidEntry(error.clone())),
    }
}

fn to_record<'a>(
    hostname: &'a str,
    interface: &'a LldpInterface,
    neighbor: &'a LldpNeighbor,
) -> Result<NeighborRecord<'a>, RecordDefect> {
    let local_port = interface
        .name
        .as_deref()
        .ok_or(RecordDefect::MissingInterfaceName)?;
    let state = neighbor
        .state
        .as_ref()
        .ok_or(RecordDefect::MissingNeighborState)?;
    let remote_device = state
        .system_name
        .as_deref()
        .ok_or(RecordDefect::MissingSystemName)?;
    let remote_port = state
        .port_id
        .as_deref()
        .ok_or(RecordDefect::MissingPortId)?;

    Ok(NeighborRecord {
        local_device: hostname,
        local_port,
        remote_device,
        remote_port,
    })
}
