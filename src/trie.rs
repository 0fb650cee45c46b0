use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::Payload;

/// Index of a [`TrieNode`] within its owning [`Trie`]'s arena.
///
/// Node ids are assigned by a monotone counter at build time;
/// they are stable for the lifetime of the `Trie` but are not meaningful
/// across separately built tries.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Whether a node is the trie's root, or has been tagged constant/variable.
///
/// Untagged nodes (immediately after [`build`]) report `Variable` as a
/// harmless default; call [`tag`] before trusting this field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum_macros::Display)]
pub enum NodeType {
    Root,
    Constant,
    Variable,
}

/// Returned by [`build`]/[`build_from_slices`]/[`build_global`] when inserting
/// a payload would grow the arena past the caller-supplied `max_nodes`
/// ceiling. Carries the node count observed at the point of refusal so the
/// caller can report it ([`crate::error::GrameffsiError::ResourceExhausted`]).
#[derive(Error, Clone, Copy, Debug, Eq, PartialEq)]
#[error("trie arena exceeded {approx_nodes} nodes")]
pub struct TrieOverflow {
    pub approx_nodes: usize,
}

/// One position along some common byte-prefix of the payloads that built the trie.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrieNode {
    pub id: NodeId,
    /// `None` iff this is the root.
    pub byte: Option<u8>,
    /// Number of payloads whose prefix reaches this node.
    pub count: u64,
    /// `count(self) / count(parent)`, or `1.0` for the root. `None` until tagged.
    pub ratio: Option<f64>,
    pub node_type: NodeType,
    parent: Option<NodeId>,
    /// Children in first-insertion order; byte values among them are distinct.
    children: Vec<NodeId>,
}

impl TrieNode {
    fn new(id: NodeId, byte: Option<u8>, parent: Option<NodeId>) -> Self {
        TrieNode {
            id,
            byte,
            count: 0,
            ratio: None,
            node_type: NodeType::Variable,
            parent,
            children: Vec::new(),
        }
    }
}

/// A message-format tree: an arena of [`TrieNode`]s plus the root's id.
///
/// Acyclic by construction — every non-root node has exactly one parent and
/// is reachable only via [`build`]'s single-child-per-byte insertion rule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    pub root: NodeId,
}

impl Trie {
    fn alloc(&mut self, byte: Option<u8>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TrieNode::new(id, byte, parent));
        id
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut TrieNode {
        &mut self.nodes[id.0]
    }

    /// Children of `id`, in first-insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Parent of `id`, or `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Total number of nodes in the arena (including the root).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates all nodes in arena (insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = &TrieNode> {
        self.nodes.iter()
    }

    fn child_with_byte(&self, parent: NodeId, byte: u8) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].byte == Some(byte))
    }

    /// Inserts one payload, rejecting growth past `max_nodes` with
    /// [`TrieOverflow`] rather than letting the arena grow unbounded.
    fn insert(&mut self, payload: &[u8], max_nodes: usize) -> Result<(), TrieOverflow> {
        let mut cursor = self.root;
        self.node_mut(cursor).count += 1;
        for &b in payload {
            let child = match self.child_with_byte(cursor, b) {
                Some(c) => c,
                None => {
                    if self.nodes.len() >= max_nodes {
                        return Err(TrieOverflow { approx_nodes: self.nodes.len() });
                    }
                    let c = self.alloc(Some(b), Some(cursor));
                    self.node_mut(cursor).children.push(c);
                    c
                }
            };
            cursor = child;
            self.node_mut(cursor).count += 1;
        }
        Ok(())
    }
}

/// Builds a prefix trie from one flow's payloads, in supplied order.
///
/// Empty payloads still increment the root's count and terminate there; no
/// padding is performed for payloads of unequal length.
pub fn build<'a>(
    payloads: impl IntoIterator<Item = &'a Payload>,
    max_nodes: usize,
) -> Result<Trie, TrieOverflow> {
    build_from_slices(payloads.into_iter().map(|p| p.as_slice()), max_nodes)
}

/// Same as [`build`] but accepts any iterator of byte slices — used by the
/// global trie builder to ingest the concatenation of every flow's payloads
/// without collecting them into one `Vec` first.
pub fn build_from_slices<'a>(
    payloads: impl IntoIterator<Item = &'a [u8]>,
    max_nodes: usize,
) -> Result<Trie, TrieOverflow> {
    let mut trie = Trie {
        nodes: Vec::new(),
        root: NodeId(0),
    };
    let root = trie.alloc(None, None);
    trie.root = root;

    let mut n = 0usize;
    for payload in payloads {
        trie.insert(payload, max_nodes)?;
        n += 1;
    }
    debug!(payloads = n, nodes = trie.len(), "built prefix trie");
    Ok(trie)
}

/// Builds the global trie by ingesting the concatenation of every
/// retained flow's payloads. This reuses [`build_from_slices`] verbatim — the
/// global trie is always built fresh from payloads, never merged from
/// already-built per-flow tries (see DESIGN.md's note on the rejected
/// merge-by-label approach).
pub fn build_global<'a>(
    flows: impl IntoIterator<Item = &'a Vec<Payload>>,
    max_nodes: usize,
) -> Result<Trie, TrieOverflow> {
    build_from_slices(
        flows
            .into_iter()
            .flat_map(|payloads| payloads.iter().map(|p| p.as_slice())),
        max_nodes,
    )
}

/// Tags every node of `trie` with `ratio` and [`NodeType`] using threshold `tau`.
///
/// The root is always `Root` with `ratio = 1.0`. For every other node,
/// `ratio = count(node) / count(parent)` (or `0.0` if the parent's count is
/// `0`), and `node_type = Constant` iff `ratio >= tau` (inclusive), else
/// `Variable`. Re-running this function is idempotent and the result does
/// not depend on the order payloads were inserted in.
pub fn tag(trie: &mut Trie, tau: f64) {
    let root = trie.root;
    trie.node_mut(root).ratio = Some(1.0);
    trie.node_mut(root).node_type = NodeType::Root;

    // Breadth-first so every parent is tagged before its children are visited;
    // ratios only read counts, so insertion order would also work, but BFS
    // keeps this function reusable by the depth summary without recomputation.
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(root);
    while let Some(parent) = queue.pop_front() {
        let parent_count = trie.node(parent).count;
        let children = trie.children(parent).to_vec();
        for child in children {
            let child_count = trie.node(child).count;
            let ratio = if parent_count > 0 {
                child_count as f64 / parent_count as f64
            } else {
                0.0
            };
            let node_type = if ratio >= tau {
                NodeType::Constant
            } else {
                NodeType::Variable
            };
            let node = trie.node_mut(child);
            node.ratio = Some(ratio);
            node.node_type = node_type;
            queue.push_back(child);
        }
    }
}
