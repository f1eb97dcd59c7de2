//! Device connectivity graph built from LLDP neighbor records.
//!
//! The graph is an undirected multigraph: devices are keyed by exact name and
//! every observed adjacency is kept as its own [`Link`], including parallel
//! links and the same cable reported from both ends.

pub mod builder;
pub mod filter;

use std::collections::BTreeMap;

pub use builder::TopologyBuilder;
pub use filter::PrefixFilter;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Device {
    pub name: String,
}

/// A device interface
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint {
    pub device: String,
    pub port: String,
}

/// One observed adjacency. `local` is the side that reported it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Link {
    pub local: Endpoint,
    pub remote: Endpoint,
}

impl Link {
    /// Human readable port pair, e.g. `Ethernet0 <-> Ethernet48`
    pub fn label(&self) -> String {
        format!("{} <-> {}", self.local.port, self.remote.port)
    }

    pub fn is_self_link(&self) -> bool {
        self.local.device == self.remote.device
    }

    /// True if this link joins `a` and `b`, in either direction
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.local.device == a && self.remote.device == b)
            || (self.local.device == b && self.remote.device == a)
    }
}

/// Snapshot graph of devices and the links between them.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    devices: BTreeMap<String, Device>,
    links: Vec<Link>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device if it is not already present. Returns true if it was new.
    pub fn insert_device(&mut self, name: &str) -> bool {
        if self.devices.contains_key(name) {
            return false;
        }
        self.devices.insert(
            name.to_string(),
            Device {
                name: name.to_string(),
            },
        );
        true
    }

    /// Add exactly one link, creating either endpoint device on first sight.
    pub fn insert_link(
        &mut self,
        local_device: &str,
        local_port: &str,
        remote_device: &str,
        remote_port: &str,
    ) {
        self.insert_device(local_device);
        self.insert_device(remote_device);
        self.links.push(Link {
            local: Endpoint {
                device: local_device.to_string(),
                port: local_port.to_string(),
            },
            remote: Endpoint {
                device: remote_device.to_string(),
                port: remote_port.to_string(),
            },
        });
    }

    /// Devices in name order
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Links in insertion order
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn contains_device(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Link count per unordered device pair, self-links excluded
    pub fn pair_link_counts(&self) -> BTreeMap<(&str, &str), usize> {
        let mut counts = BTreeMap::new();
        for link in self.links.iter().filter(|link| !link.is_self_link()) {
            let (a, b) = (link.local.device.as_str(), link.remote.device.as_str());
            *counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
        }
        counts
    }

    /// Links joining `a` and `b` regardless of which side reported them
    #[cfg(test)]
    pub fn links_between<'a>(&'a self, a: &'a str, b: &'a str) -> impl Iterator<Item = &'a Link> {
        self.links.iter().filter(move |link| link.connects(a, b))
    }

    /// Number of links touching `name`. A self-link counts twice.
    pub fn degree(&self, name: &str) -> usize {
        self.links
            .iter()
            .map(|link| {
                usize::from(link.local.device == name) + usize::from(link.remote.device == name)
            })
            .sum()
    }

    /// Returns a copy without devices matching `filter` or any link touching them.
    pub fn filtered(&self, filter: &PrefixFilter) -> Topology {
        if !filter.is_active() {
            return self.clone();
        }

        let devices = self
            .devices
            .iter()
            .filter(|(name, _)| !filter.excludes(name))
            .map(|(name, device)| (name.clone(), device.clone()))
            .collect();
        let links = self
            .links
            .iter()
            .filter(|link| !filter.excludes_link(link))
            .cloned()
            .collect();

        Topology { devices, links }
    }

    fn sorted_links(&self) -> Vec<&Link> {
        let mut links: Vec<&Link> = self.links.iter().collect();
        links.sort();
        links
    }
}

/// Two topologies are equal when they hold the same devices and the same
/// multiset of links; link enumeration order does not matter.
impl PartialEq for Topology {
    fn eq(&self, other: &Self) -> bool {
        self.devices == other.devices
            && self.links.len() == other.links.len()
            && self.sorted_links() == other.sorted_links()
    }
}

impl Eq for Topology {}
