//! Read-only views of a finished [`Topology`].
//!
//! `layout` feeds the SVG renderer, `graphml` writes and reads the exchange
//! file. Both only borrow the graph, so they can run side by side on a shared
//! snapshot.

pub mod graphml;
pub mod layout;

use crate::topology::{Device, Link, Topology};

/// A link paired with its display label
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledLink<'a> {
    pub link: &'a Link,
    pub label: String,
}

/// Nodes and labelled edges for a force-directed renderer.
#[derive(Debug, Clone)]
pub struct LayoutView<'a> {
    pub devices: Vec<&'a Device>,
    pub links: Vec<LabeledLink<'a>>,
}

impl<'a> LayoutView<'a> {
    pub fn new(topology: &'a Topology) -> Self {
        Self {
            devices: topology.devices().collect(),
            links: topology
                .links()
                .iter()
                .map(|link| LabeledLink {
                    link,
                    label: link.label(),
                })
                .collect(),
        }
    }

    /// Position of `name` in `devices`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.devices
            .binary_search_by(|device| device.name.as_str().cmp(name))
            .ok()
    }
}
