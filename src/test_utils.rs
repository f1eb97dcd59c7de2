use serde_json::Value;

use crate::lldp::{Entry, LldpInterface, LldpNeighbor, LldpPayload, NeighborList, NeighborState};
use crate::topology::Topology;

/// Builder for synthetic openconfig-lldp payloads
#[derive(Default)]
pub struct PayloadBuilder {
    interfaces: Vec<Entry<LldpInterface>>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interface with no neighbor collection at all
    pub fn interface(mut self, name: &str) -> Self {
        self.interfaces.push(Entry::Valid(LldpInterface {
            name: Some(name.to_string()),
            neighbors: None,
        }));
        self
    }

    /// Add a neighbor under `local_port`, creating the interface if needed
    pub fn neighbor(self, local_port: &str, system_name: &str, port_id: &str) -> Self {
        self.push_neighbor(
            local_port,
            NeighborState {
                system_name: Some(system_name.to_string()),
                port_id: Some(port_id.to_string()),
                ..Default::default()
            },
        )
    }

    pub fn neighbor_without_system_name(self, local_port: &str, port_id: &str) -> Self {
        self.push_neighbor(
            local_port,
            NeighborState {
                port_id: Some(port_id.to_string()),
                ..Default::default()
            },
        )
    }

    fn push_neighbor(mut self, local_port: &str, state: NeighborState) -> Self {
        let neighbor = LldpNeighbor {
            id: None,
            state: Some(state),
        };

        match self
            .interfaces
            .iter_mut()
            .filter_map(|entry| match entry {
                Entry::Valid(iface) => Some(iface),
                Entry::Invalid { .. } => None,
            })
            .find(|iface| iface.name.as_deref() == Some(local_port))
        {
            Some(iface) => iface
                .neighbors
                .get_or_insert_with(NeighborList::default)
                .neighbor
                .push(Entry::Valid(neighbor)),
            None => self.interfaces.push(Entry::Valid(LldpInterface {
                name: Some(local_port.to_string()),
                neighbors: Some(NeighborList {
                    neighbor: vec![Entry::Valid(neighbor)],
                }),
            })),
        }
        self
    }

    pub fn build(self) -> LldpPayload {
        LldpPayload {
            interfaces: self.interfaces,
        }
    }

    pub fn build_json(self) -> Value {
        serde_json::to_value(self.build()).expect("payload serializes")
    }
}

/// Build a topology directly from `(local, local_port, remote, remote_port)` tuples
pub fn topology_from(links: &[(&str, &str, &str, &str)]) -> Topology {
    let mut topology = Topology::new();
    for (local, local_port, remote, remote_port) in links {
        topology.insert_link(local, local_port, remote, remote_port);
    }
    topology
}
