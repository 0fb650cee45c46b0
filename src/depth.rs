use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::trie::{NodeId, NodeType, Trie};

/// One row of a depth summary: whether any node at this depth is constant,
/// and which byte values are constant there.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DepthRow {
    pub depth: usize,
    /// `true` iff at least one node at this depth is tagged [`NodeType::Constant`].
    pub has_constant: bool,
    /// Ascending, deduplicated byte values of every constant node at this depth.
    pub constant_bytes: Vec<u8>,
}

/// Breadth-first depth of every node, root at depth 0.
///
/// Shared by [`summarize`] and the CSV exporter, which both need a node's
/// depth without recomputing the BFS.
pub fn depths(trie: &Trie) -> BTreeMap<NodeId, usize> {
    let mut depth_of: BTreeMap<NodeId, usize> = BTreeMap::new();
    depth_of.insert(trie.root, 0);
    let mut queue = VecDeque::new();
    queue.push_back(trie.root);
    while let Some(node) = queue.pop_front() {
        let d = depth_of[&node];
        for &child in trie.children(node) {
            depth_of.entry(child).or_insert_with(|| {
                queue.push_back(child);
                d + 1
            });
        }
    }
    depth_of
}

/// Breadth-first per-depth constant/variable summary of an already-tagged trie.
///
/// The root is depth 0 and is excluded. Rows are emitted in increasing depth
/// order; `constant_bytes` is ascending per row.
pub fn summarize(trie: &Trie) -> Vec<DepthRow> {
    let depth_of = depths(trie);

    let mut has_node: BTreeSet<usize> = BTreeSet::new();
    let mut constants: BTreeMap<usize, BTreeSet<u8>> = BTreeMap::new();
    for node in trie.iter() {
        let Some(&depth) = depth_of.get(&node.id) else {
            continue;
        };
        if depth == 0 {
            continue;
        }
        has_node.insert(depth);
        if matches!(node.node_type, NodeType::Constant) {
            if let Some(byte) = node.byte {
                constants.entry(depth).or_default().insert(byte);
            }
        }
    }

    has_node
        .into_iter()
        .map(|depth| {
            let bytes: Vec<u8> = constants.get(&depth).cloned().unwrap_or_default().into_iter().collect();
            DepthRow {
                depth,
                has_constant: !bytes.is_empty(),
                constant_bytes: bytes,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::{build, tag};
    use crate::types::Payload;

    #[test]
    fn scenario_5_from_spec() {
        let p: Vec<Payload> = vec![
            vec![0x01, 0x02, 0xAA],
            vec![0x01, 0x02, 0xBB],
            vec![0x01, 0x02, 0xAA],
        ];
        let mut trie = build(&p, 10_000).unwrap();
        tag(&mut trie, 0.95);
        let rows = summarize(&trie);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], DepthRow { depth: 1, has_constant: true, constant_bytes: vec![0x01] });
        assert_eq!(rows[1], DepthRow { depth: 2, has_constant: true, constant_bytes: vec![0x02] });
        assert_eq!(rows[2], DepthRow { depth: 3, has_constant: false, constant_bytes: vec![] });
    }

    #[test]
    fn single_empty_payload_has_no_rows() {
        let p: Vec<Payload> = vec![vec![]];
        let mut trie = build(&p, 10_000).unwrap();
        tag(&mut trie, 0.95);
        assert!(summarize(&trie).is_empty());
    }
}
