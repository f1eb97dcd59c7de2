//! GraphML exchange format.
//!
//! Every device becomes a `<node>` keyed by name and every link an `<edge>`
//! with `local_port` and `neighbor_port` data. Edge ids are unique across the
//! file so parallel links survive a round trip through other tools.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::{debug, info};

use crate::error::{Result, TopologyError};
use crate::topology::Topology;

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://graphml.graphdrawing.org/xmlns http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd";

pub const LOCAL_PORT_ATTR: &str = "local_port";
pub const NEIGHBOR_PORT_ATTR: &str = "neighbor_port";

const LOCAL_PORT_KEY: &str = "d0";
const NEIGHBOR_PORT_KEY: &str = "d1";

pub fn to_string(topology: &Topology) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("graphml").with_attributes([
        ("xmlns", GRAPHML_NS),
        ("xmlns:xsi", XSI_NS),
        ("xsi:schemaLocation", SCHEMA_LOCATION),
    ])))?;

    for (id, name) in [
        (LOCAL_PORT_KEY, LOCAL_PORT_ATTR),
        (NEIGHBOR_PORT_KEY, NEIGHBOR_PORT_ATTR),
    ] {
        writer.write_event(Event::Empty(BytesStart::new("key").with_attributes([
            ("id", id),
            ("for", "edge"),
            ("attr.name", name),
            ("attr.type", "string"),
        ])))?;
    }

    writer.write_event(Event::Start(
        BytesStart::new("graph").with_attributes([("edgedefault", "undirected")]),
    ))?;

    for device in topology.devices() {
        writer.write_event(Event::Empty(
            BytesStart::new("node").with_attributes([("id", device.name.as_str())]),
        ))?;
    }

    for (index, link) in topology.links().iter().enumerate() {
        let edge_id = format!("e{}", index);
        writer.write_event(Event::Start(BytesStart::new("edge").with_attributes([
            ("id", edge_id.as_str()),
            ("source", link.local.device.as_str()),
            ("target", link.remote.device.as_str()),
        ])))?;
        write_data(&mut writer, LOCAL_PORT_KEY, &link.local.port)?;
        write_data(&mut writer, NEIGHBOR_PORT_KEY, &link.remote.port)?;
        writer.write_event(Event::End(BytesEnd::new("edge")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("graph")))?;
    writer.write_event(Event::End(BytesEnd::new("graphml")))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| TopologyError::InvalidGraphMl(format!("writer produced invalid UTF-8: {}", e)))
}

fn write_data(writer: &mut Writer<Vec<u8>>, key: &str, value: &str) -> Result<()> {
    let element = BytesStart::new("data").with_attributes([("key", key)]);

    // An empty start/end pair would be split across lines by the indenter
    if value.is_empty() {
        writer.write_event(Event::Empty(element))?;
        return Ok(());
    }

    writer.write_event(Event::Start(element))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("data")))?;
    Ok(())
}

pub fn write_file(path: &Path, topology: &Topology) -> Result<()> {
    fs::write(path, to_string(topology)?)?;
    info!(
        path = %path.display(),
        nodes = topology.device_count(),
        edges = topology.link_count(),
        "Wrote GraphML"
    );
    Ok(())
}

/// Edge being assembled while its `<data>` children are read
#[derive(Debug, Default)]
struct PendingEdge {
    source: String,
    target: String,
    data: HashMap<String, String>,
}

/// Parse a GraphML document into a topology.
///
/// Edge data is matched through the `<key>` declarations by attribute name,
/// so files using other key ids are accepted. Missing port data reads as an
/// empty string.
pub fn from_str(xml: &str) -> Result<Topology> {
    let mut reader = Reader::from_str(xml);
    let mut topology = Topology::new();

    // key id -> attr.name
    let mut keys: HashMap<String, String> = HashMap::new();
    let mut edge: Option<PendingEdge> = None;
    let mut data_key: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"edge" => edge = Some(start_edge(&e)?),
                b"data" => {
                    data_key = attribute(&e, b"key")?;
                    text.clear();
                }
                b"node" => insert_node(&mut topology, &e)?,
                b"key" => register_key(&mut keys, &e)?,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"node" => insert_node(&mut topology, &e)?,
                b"edge" => finish_edge(&mut topology, &keys, start_edge(&e)?),
                b"key" => register_key(&mut keys, &e)?,
                _ => {}
            },
            Event::Text(t) => {
                if data_key.is_some() {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if data_key.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"data" => {
                    if let (Some(key), Some(pending)) = (data_key.take(), edge.as_mut()) {
                        pending.data.insert(key, std::mem::take(&mut text));
                    }
                }
                b"edge" => {
                    if let Some(pending) = edge.take() {
                        finish_edge(&mut topology, &keys, pending);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    debug!(
        nodes = topology.device_count(),
        edges = topology.link_count(),
        "Parsed GraphML"
    );
    Ok(topology)
}

pub fn read_file(path: &Path) -> Result<Topology> {
    let content = fs::read_to_string(path)?;
    from_str(&content)
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn required_attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<String> {
    attribute(e, name)?.ok_or_else(|| {
        TopologyError::InvalidGraphMl(format!(
            "<{}> without {} attribute",
            String::from_utf8_lossy(e.local_name().as_ref()),
            String::from_utf8_lossy(name)
        ))
    })
}

fn register_key(keys: &mut HashMap<String, String>, e: &BytesStart<'_>) -> Result<()> {
    let id = required_attribute(e, b"id")?;
    let name = attribute(e, b"attr.name")?.unwrap_or_else(|| id.clone());
    keys.insert(id, name);
    Ok(())
}

fn insert_node(topology: &mut Topology, e: &BytesStart<'_>) -> Result<()> {
    let id = required_attribute(e, b"id")?;
    topology.insert_device(&id);
    Ok(())
}

fn start_edge(e: &BytesStart<'_>) -> Result<PendingEdge> {
    Ok(PendingEdge {
        source: required_attribute(e, b"source")?,
        target: required_attribute(e, b"target")?,
        data: HashMap::new(),
    })
}

fn finish_edge(topology: &mut Topology, keys: &HashMap<String, String>, edge: PendingEdge) {
    let mut local_port = String::new();
    let mut neighbor_port = String::new();

    for (key, value) in edge.data {
        let name = keys.get(&key).map(String::as_str).unwrap_or(key.as_str());
        match name {
            LOCAL_PORT_ATTR => local_port = value,
            NEIGHBOR_PORT_ATTR => neighbor_port = value,
            _ => {}
        }
    }

    topology.insert_link(&edge.source, &local_port, &edge.target, &neighbor_port);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::topology_from;
    use proptest::prelude::*;

    #[test]
    fn test_document_shape() {
        let topology = topology_from(&[("sw1", "eth0", "sw2", "eth1")]);
        let xml = to_string(&topology).unwrap();

        assert!(xml.contains(r#"<graph edgedefault="undirected">"#));
        assert!(xml.contains(r#"attr.name="local_port""#));
        assert!(xml.contains(r#"attr.name="neighbor_port""#));
        assert!(xml.contains(r#"<node id="sw1"/>"#));
        assert!(xml.contains(r#"<edge id="e0" source="sw1" target="sw2">"#));
        assert!(xml.contains(r#"<data key="d0">eth0</data>"#));
        assert!(xml.contains(r#"<data key="d1">eth1</data>"#));
    }

    #[test]
    fn test_parallel_edges_have_unique_ids() {
        let topology = topology_from(&[
            ("sw1", "eth0", "sw2", "eth0"),
            ("sw1", "eth1", "sw2", "eth1"),
        ]);
        let xml = to_string(&topology).unwrap();
        assert!(xml.contains(r#"id="e0""#));
        assert!(xml.contains(r#"id="e1""#));

        let parsed = from_str(&xml).unwrap();
        assert_eq!(parsed.links_between("sw1", "sw2").count(), 2);
    }

    #[test]
    fn test_special_characters_roundtrip() {
        let topology = topology_from(&[("a&b", "<eth0>", "c\"d", "port 'x'")]);
        let parsed = from_str(&to_string(&topology).unwrap()).unwrap();
        assert_eq!(parsed, topology);
    }

    #[test]
    fn test_empty_graph_roundtrip() {
        let parsed = from_str(&to_string(&Topology::new()).unwrap()).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.link_count(), 0);
    }

    #[test]
    fn test_foreign_key_ids() {
        let xml = r#"<?xml version='1.0' encoding='utf-8'?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
  <key id="d1" for="edge" attr.name="neighbor_port" attr.type="string" />
  <key id="d0" for="edge" attr.name="local_port" attr.type="string" />
  <graph edgedefault="undirected">
    <node id="sw1" />
    <node id="sw2" />
    <node id="lonely" />
    <edge source="sw1" target="sw2" id="0">
      <data key="d0">Ethernet0</data>
      <data key="d1">Ethernet4</data>
    </edge>
    <edge source="sw1" target="sw3" id="1" />
  </graph>
</graphml>"#;

        let topology = from_str(xml).unwrap();
        assert_eq!(topology.device_count(), 4);
        assert!(topology.contains_device("lonely"));
        assert!(topology.contains_device("sw3"));

        let link = topology.links_between("sw1", "sw2").next().unwrap();
        assert_eq!(link.local.port, "Ethernet0");
        assert_eq!(link.remote.port, "Ethernet4");

        let bare = topology.links_between("sw1", "sw3").next().unwrap();
        assert_eq!(bare.local.port, "");
        assert_eq!(bare.remote.port, "");
    }

    #[test]
    fn test_edge_without_target_is_rejected() {
        let xml = r#"<graphml><graph><edge source="a"/></graph></graphml>"#;
        assert!(matches!(from_str(xml), Err(TopologyError::InvalidGraphMl(_))));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network_graph.graphml");
        let topology = topology_from(&[
            ("leaf1", "Ethernet0", "spine1", "Ethernet0"),
            ("spine1", "Ethernet0", "leaf1", "Ethernet0"),
            ("leaf1", "Ethernet4", "leaf1", "Ethernet8"),
        ]);

        write_file(&path, &topology).unwrap();
        assert_eq!(read_file(&path).unwrap(), topology);
    }

    fn arb_links() -> impl Strategy<Value = Vec<(usize, usize, String, String)>> {
        (1usize..1000).prop_flat_map(|devices| {
            prop::collection::vec(
                (
                    0..devices,
                    0..devices,
                    "[A-Za-z0-9/:&<>\"' -]{0,12}",
                    "[A-Za-z0-9/:&<>\"' -]{0,12}",
                ),
                0..200,
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_exchange_roundtrip(links in arb_links(), isolated in 0usize..5) {
            let mut topology = Topology::new();
            for (a, b, local_port, remote_port) in &links {
                let (local, remote) = (format!("dev{}", a), format!("dev{}", b));
                topology.insert_link(&local, local_port, &remote, remote_port);
            }
            for i in 0..isolated {
                topology.insert_device(&format!("isolated{}", i));
            }

            let parsed = from_str(&to_string(&topology).unwrap()).unwrap();
            prop_assert_eq!(parsed, topology);
        }
    }
}
