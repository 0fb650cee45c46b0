use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::types::{FlowKey, Payload};

/// Failure to produce flows from whatever external collection a `FlowSource`
/// wraps.
///
/// Extracting flows from a live capture or a `.pcap` file is out of scope;
/// this crate only consumes flows once demultiplexed.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to parse flow capture json: {0}")]
    InvalidJson(#[from] serde_path_to_error::Error<serde_json::Error>),
}

/// External collaborator boundary: anything that can hand back a set of
/// flows, each a `FlowKey` paired with its ordered payload list.
///
/// The pipeline only ever calls [`FlowSource::flows`]; how a given
/// implementation demultiplexes packets, reassembles streams, or parses a
/// capture file is entirely its own concern.
pub trait FlowSource {
    fn flows(&self) -> Result<BTreeMap<FlowKey, Vec<Payload>>, SourceError>;
}

/// A `FlowSource` backed by an in-memory map, for tests and callers that
/// already have flows assembled.
#[derive(Clone, Debug, Default)]
pub struct VecFlowSource {
    flows: BTreeMap<FlowKey, Vec<Payload>>,
}

impl VecFlowSource {
    pub fn new(flows: BTreeMap<FlowKey, Vec<Payload>>) -> Self {
        VecFlowSource { flows }
    }
}

impl FlowSource for VecFlowSource {
    fn flows(&self) -> Result<BTreeMap<FlowKey, Vec<Payload>>, SourceError> {
        Ok(self.flows.clone())
    }
}

/// On-disk shape consumed by [`JsonFlowSource`]: an array of
/// `{flow, payloads}` snapshots, each payload a list of byte values.
///
/// This is the crate's own interchange shape, not a capture tool's native
/// format; a caller bridging from one would translate to this first.
#[derive(Debug, Deserialize)]
struct FlowSnapshot {
    flow: FlowKey,
    payloads: Vec<Vec<u8>>,
}

/// A `FlowSource` that reads a JSON document of flow snapshots, reporting
/// malformed input with a field-path-qualified error via `serde_path_to_error`.
#[derive(Clone, Debug)]
pub struct JsonFlowSource {
    document: String,
}

impl JsonFlowSource {
    pub fn new(document: impl Into<String>) -> Self {
        JsonFlowSource {
            document: document.into(),
        }
    }
}

impl FlowSource for JsonFlowSource {
    fn flows(&self) -> Result<BTreeMap<FlowKey, Vec<Payload>>, SourceError> {
        let de = &mut serde_json::Deserializer::from_str(&self.document);
        let snapshots: Vec<FlowSnapshot> = serde_path_to_error::deserialize(de)?;
        let mut flows = BTreeMap::new();
        for snapshot in snapshots {
            flows.insert(snapshot.flow, snapshot.payloads);
        }
        Ok(flows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_source_round_trips() {
        let mut flows = BTreeMap::new();
        flows.insert(FlowKey::new("a", 1, "b", 2), vec![vec![0x01]]);
        let source = VecFlowSource::new(flows.clone());
        assert_eq!(source.flows().unwrap(), flows);
    }

    #[test]
    fn json_source_parses_snapshots() {
        let json = r#"[
            {"flow": {"src_addr": "10.0.0.1", "src_port": 502, "dst_addr": "10.0.0.2", "dst_port": 51000}, "payloads": [[1, 2], [1, 3]]}
        ]"#;
        let source = JsonFlowSource::new(json);
        let flows = source.flows().unwrap();
        assert_eq!(flows.len(), 1);
        let key = FlowKey::new("10.0.0.1", 502, "10.0.0.2", 51000);
        assert_eq!(flows[&key], vec![vec![1u8, 2], vec![1u8, 3]]);
    }

    #[test]
    fn json_source_reports_path_qualified_errors() {
        let json = r#"[{"flow": {"src_addr": "a", "src_port": "not-a-port", "dst_addr": "b", "dst_port": 1}, "payloads": []}]"#;
        let source = JsonFlowSource::new(json);
        let err = source.flows().unwrap_err();
        match err {
            SourceError::InvalidJson(inner) => {
                assert!(inner.path().to_string().contains("src_port"));
            }
            other => panic!("expected InvalidJson, got {other:?}"),
        }
    }
}
