use std::collections::BTreeMap;

use grameffsi::config::Config;
use grameffsi::field::FieldKind;
use grameffsi::pipeline::{self, index_by_flow};
use grameffsi::source::{FlowSource, JsonFlowSource, VecFlowSource};
use grameffsi::types::FlowKey;

fn modbus_like_flow() -> BTreeMap<FlowKey, Vec<Vec<u8>>> {
    let mut flows = BTreeMap::new();
    flows.insert(
        FlowKey::new("10.0.0.1", 502, "10.0.0.2", 51000),
        vec![
            vec![0x01, 0x02, b'h', b'e', b'l', b'l', b'o', 0x00],
            vec![0x01, 0x02, b'w', b'o', b'r', b'l', b'd', 0x00],
            vec![0x01, 0x02, b'w', b'o', b'r', b'l', b'd', 0x00],
        ],
    );
    flows
}

#[test]
fn end_to_end_run_over_a_vec_flow_source() {
    let source = VecFlowSource::new(modbus_like_flow());
    let config = Config::default();
    let report = pipeline::run(&source, &config).expect("pipeline run should succeed");

    assert_eq!(report.flows.len(), 1);
    assert!(report.skipped.is_empty());

    let by_flow = index_by_flow(&report);
    let flow = FlowKey::new("10.0.0.1", 502, "10.0.0.2", 51000);
    let flow_report = by_flow.get(&flow).expect("flow should be present");

    assert_eq!(flow_report.packet_count, 3);
    assert!(!flow_report.trie.is_empty());

    let kinds: Vec<FieldKind> = flow_report.field_tree.children.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FieldKind::Constant,
            FieldKind::Constant,
            FieldKind::Nullstr,
        ]
    );

    assert!(!report.global_trie.is_empty());
    assert!(!report.global_depth_summary.is_empty());
}

#[test]
fn flows_under_the_packet_floor_are_skipped_and_excluded_from_the_global_trie() {
    let mut flows = modbus_like_flow();
    flows.insert(
        FlowKey::new("10.0.0.3", 1234, "10.0.0.4", 80),
        vec![vec![0xFF]],
    );
    let source = VecFlowSource::new(flows);
    let config = Config::new(0.95, 10, 2).unwrap();
    let report = pipeline::run(&source, &config).unwrap();

    assert_eq!(report.flows.len(), 1);
    assert_eq!(report.skipped, vec![FlowKey::new("10.0.0.3", 1234, "10.0.0.4", 80)]);

    // the skipped flow's 0xFF byte never reaches the global trie
    let root_children = report.global_trie.children(report.global_trie.root);
    assert!(root_children
        .iter()
        .all(|&c| report.global_trie.node(c).byte != Some(0xFF)));
}

#[test]
fn json_flow_source_feeds_the_pipeline_the_same_as_a_vec_source() {
    let json = r#"[
        {
            "flow": {"src_addr": "10.0.0.1", "src_port": 502, "dst_addr": "10.0.0.2", "dst_port": 51000},
            "payloads": [[1, 2, 3], [1, 2, 4]]
        }
    ]"#;
    let source = JsonFlowSource::new(json);
    let flows = source.flows().unwrap();
    assert_eq!(flows.len(), 1);

    let config = Config::default();
    let report = pipeline::run(&source, &config).unwrap();
    assert_eq!(report.flows.len(), 1);
}
