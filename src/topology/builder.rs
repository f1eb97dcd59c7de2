//! Drives [`Topology::insert_link`] from normalized neighbor records.

use tracing::{debug, info};

use super::{PrefixFilter, Topology};
use crate::lldp::{LldpSnapshot, NeighborRecord};

/// Owns the graph exclusively while it is being populated.
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    topology: Topology,
    filter: PrefixFilter,
    excluded: usize,
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop records touching excluded devices as they arrive
    pub fn with_filter(mut self, filter: PrefixFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn add_record(&mut self, record: &NeighborRecord<'_>) {
        if self.filter.excludes(record.local_device) || self.filter.excludes(record.remote_device) {
            debug!(
                local = record.local_device,
                remote = record.remote_device,
                "Excluded by prefix filter"
            );
            self.excluded += 1;
            return;
        }

        self.topology.insert_link(
            record.local_device,
            record.local_port,
            record.remote_device,
            record.remote_port,
        );
    }

    pub fn add_records<'a>(&mut self, records: impl IntoIterator<Item = NeighborRecord<'a>>) {
        for record in records {
            self.add_record(&record);
        }
    }

    /// Number of records dropped by the filter so far
    pub fn excluded_count(&self) -> usize {
        self.excluded
    }

    pub fn build(self) -> Topology {
        info!(
            devices = self.topology.device_count(),
            links = self.topology.link_count(),
            excluded = self.excluded_count(),
            "Topology built"
        );
        self.topology
    }

    /// Build the whole graph for a decoded snapshot
    pub fn from_snapshot(snapshot: &LldpSnapshot, filter: PrefixFilter) -> Topology {
        let mut builder = TopologyBuilder::new().with_filter(filter);
        builder.add_records(snapshot.records());
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lldp::RawSnapshot;
    use crate::test_utils::{PayloadBuilder, topology_from};
    use serde_json::json;

    fn scenario_snapshot() -> LldpSnapshot {
        let mut raw = RawSnapshot::new();
        raw.insert(
            "sw1".to_string(),
            PayloadBuilder::new().neighbor("eth0", "sw2", "eth1").build_json(),
        );
        raw.insert("sw2".to_string(), json!({"openconfig-lldp:interface": []}));
        LldpSnapshot::from_raw(&raw)
    }

    fn build_unfiltered(snapshot: &LldpSnapshot) -> Topology {
        TopologyBuilder::from_snapshot(snapshot, PrefixFilter::disabled())
    }

    fn record<'a>(
        local: &'a str,
        local_port: &'a str,
        remote: &'a str,
        remote_port: &'a str,
    ) -> NeighborRecord<'a> {
        NeighborRecord {
            local_device: local,
            local_port,
            remote_device: remote,
            remote_port,
        }
    }

    #[test]
    fn test_two_switch_scenario() {
        let topology = build_unfiltered(&scenario_snapshot());

        assert_eq!(topology, topology_from(&[("sw1", "eth0", "sw2", "eth1")]));
        let names: Vec<_> = topology.devices().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["sw1", "sw2"]);
        assert_eq!(topology.links()[0].label(), "eth0 <-> eth1");
    }

    #[test]
    fn test_scenario_with_unmatched_prefix() {
        let unfiltered = build_unfiltered(&scenario_snapshot());
        let filtered =
            TopologyBuilder::from_snapshot(&scenario_snapshot(), PrefixFilter::new("gpu"));
        assert_eq!(filtered, unfiltered);
    }

    #[test]
    fn test_unpolled_neighbor_becomes_device() {
        let mut raw = RawSnapshot::new();
        raw.insert(
            "leaf1".to_string(),
            PayloadBuilder::new()
                .neighbor("Ethernet0", "server42", "eno1")
                .build_json(),
        );
        let topology = build_unfiltered(&LldpSnapshot::from_raw(&raw));
        assert!(topology.contains_device("server42"));
    }

    #[test]
    fn test_insertion_filter_matches_post_filter() {
        let mut raw = RawSnapshot::new();
        raw.insert(
            "leaf1".to_string(),
            PayloadBuilder::new()
                .neighbor("Ethernet0", "spine1", "Ethernet0")
                .neighbor("Ethernet4", "gpu01", "eth0")
                .neighbor("Ethernet8", "gpu02", "eth0")
                .build_json(),
        );
        raw.insert(
            "gpu01".to_string(),
            PayloadBuilder::new().neighbor("eth0", "leaf1", "Ethernet4").build_json(),
        );
        let snapshot = LldpSnapshot::from_raw(&raw);

        let mut builder = TopologyBuilder::new().with_filter(PrefixFilter::new("gpu"));
        builder.add_records(snapshot.records());
        assert_eq!(builder.excluded_count(), 3);
        let during = builder.build();

        let after = build_unfiltered(&snapshot).filtered(&PrefixFilter::new("gpu"));

        assert_eq!(during, after);
        assert_eq!(during.device_count(), 2);
        assert_eq!(during.link_count(), 1);
    }

    #[test]
    fn test_parallel_links_with_distinct_ports() {
        let mut builder = PayloadBuilder::new();
        for i in 0..4 {
            let local_port = format!("Ethernet{}", i);
            let remote_port = format!("Ethernet{}", 100 + i);
            builder = builder.neighbor(&local_port, "spine1", &remote_port);
        }
        let mut raw = RawSnapshot::new();
        raw.insert("leaf1".to_string(), builder.build_json());

        let topology = build_unfiltered(&LldpSnapshot::from_raw(&raw));
        assert_eq!(topology.device_count(), 2);
        assert_eq!(topology.links_between("leaf1", "spine1").count(), 4);
    }

    #[test]
    fn test_order_independence() {
        let records = [
            record("a", "1", "b", "2"),
            record("b", "2", "a", "1"),
            record("c", "1", "a", "3"),
        ];

        let mut forward = TopologyBuilder::new();
        forward.add_records(records.iter().copied());
        let mut backward = TopologyBuilder::new();
        backward.add_records(records.iter().rev().copied());

        assert_eq!(forward.build(), backward.build());
    }
}
