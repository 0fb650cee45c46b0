use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{is_printable, u32_from_le_bytes, Payload};

/// Position of one packet during the heuristic walk: which payload, and how
/// far into it the cursor has advanced.
///
/// Cursors advance monotonically and never past their payload's end: the
/// walk prunes a cursor once it runs off the end of its payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cursor {
    pub packet_index: usize,
    pub offset: usize,
}

/// Structural role assigned to one field by the heuristic typer.
///
/// This is a closed, tagged variant, not an open-ended classification:
/// every field in a tree is exactly one of these kinds. `String` is the
/// data model's umbrella kind for `Lenstr`/`Nullstr`; the ordered tests
/// never emit it directly, only its two concrete forms.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum_macros::Display)]
pub enum FieldKind {
    Constant,
    String,
    Lenstr,
    Nullstr,
    Len4,
    Enumerated,
    Variable,
}

/// One field in a heuristic field tree.
///
/// `offset` and `size` are taken from the first active cursor when a test
/// matches; for string kinds, later packets may consume a different number
/// of bytes per the test's own per-cursor advancement rule, so `size` is informational
/// rather than authoritative for every packet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub offset: usize,
    pub size: usize,
    pub kind: FieldKind,
    /// `CONSTANT`'s byte, `LEN4`'s decoded value, or `ENUMERATED` branch
    /// discriminator; `None` for `LENSTR`/`NULLSTR`/`VARIABLE`.
    pub value: Option<u64>,
    /// Sequential children following this field (non-empty only inside an
    /// `ENUMERATED` branch's own continuation).
    pub children: Vec<FieldNode>,
    /// Present only for `ENUMERATED` nodes: discriminating byte -> subtree.
    pub branches: Option<BTreeMap<u8, FieldNode>>,
}

impl FieldNode {
    fn leaf(offset: usize, size: usize, kind: FieldKind, value: Option<u64>) -> Self {
        FieldNode {
            offset,
            size,
            kind,
            value,
            children: Vec::new(),
            branches: None,
        }
    }
}

/// The ordered sequence of fields inferred for one flow, rooted at offset 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldTree {
    pub children: Vec<FieldNode>,
}

/// Runs the heuristic field typer over one flow's payloads.
///
/// `enum_threshold` bounds the admissible branching factor for the
/// `ENUMERATED` test (test 5); see [`crate::config::Config::enum_threshold`].
pub fn build(payloads: &[Payload], enum_threshold: usize) -> FieldTree {
    let slices: Vec<&[u8]> = payloads.iter().map(|p| p.as_slice()).collect();
    let active: Vec<Cursor> = (0..slices.len())
        .map(|i| Cursor { packet_index: i, offset: 0 })
        .collect();
    let children = walk(&slices, active, enum_threshold);
    debug!(fields = children.len(), "built field tree");
    FieldTree { children }
}

/// Drops cursors already at end-of-payload, then applies the ordered tests
/// in a FIFO loop, appending one [`FieldNode`] per iteration until every
/// cursor is exhausted.
fn walk(packets: &[&[u8]], mut active: Vec<Cursor>, enum_threshold: usize) -> Vec<FieldNode> {
    let mut out = Vec::new();
    loop {
        active.retain(|c| c.offset < packets[c.packet_index].len());
        if active.is_empty() {
            return out;
        }

        if let Some(node) = test_constant(packets, &mut active) {
            out.push(node);
            continue;
        }
        if let Some(node) = test_lenstr(packets, &mut active) {
            out.push(node);
            continue;
        }
        if let Some(node) = test_nullstr(packets, &mut active) {
            out.push(node);
            continue;
        }
        if let Some(node) = test_len4(packets, &mut active) {
            out.push(node);
            continue;
        }
        if let Some(node) = test_enumerated(packets, &active, enum_threshold) {
            // ENUMERATED fully recurses into each branch until its cursors
            // are exhausted, so there is nothing left for this level's loop
            // to continue with.
            out.push(node);
            return out;
        }
        out.push(test_variable(packets, &mut active));
    }
}

fn current_byte(packets: &[&[u8]], c: &Cursor) -> u8 {
    packets[c.packet_index][c.offset]
}

/// Test 1: every active cursor sees the same byte.
fn test_constant(packets: &[&[u8]], active: &mut [Cursor]) -> Option<FieldNode> {
    let first = current_byte(packets, &active[0]);
    if active.iter().all(|c| current_byte(packets, c) == first) {
        let offset = active[0].offset;
        for c in active.iter_mut() {
            c.offset += 1;
        }
        Some(FieldNode::leaf(offset, 1, FieldKind::Constant, Some(first as u64)))
    } else {
        None
    }
}

/// Test 2: length-prefixed printable string, each cursor advancing by its
/// own packet's length.
fn test_lenstr(packets: &[&[u8]], active: &mut [Cursor]) -> Option<FieldNode> {
    let mut lengths = Vec::with_capacity(active.len());
    for c in active.iter() {
        let p = packets[c.packet_index];
        let len = current_byte(packets, c) as usize;
        let start = c.offset + 1;
        let end = start.checked_add(len)?;
        if end > p.len() {
            return None;
        }
        if !p[start..end].iter().all(|&b| is_printable(b)) {
            return None;
        }
        lengths.push(len);
    }
    let offset = active[0].offset;
    let size = 1 + lengths[0];
    for (c, len) in active.iter_mut().zip(lengths) {
        c.offset += 1 + len;
    }
    Some(FieldNode::leaf(offset, size, FieldKind::Lenstr, None))
}

/// Test 3: null-terminated printable string.
fn test_nullstr(packets: &[&[u8]], active: &mut [Cursor]) -> Option<FieldNode> {
    let mut lengths = Vec::with_capacity(active.len());
    for c in active.iter() {
        let p = packets[c.packet_index];
        let start = c.offset;
        let term = (start..p.len()).find(|&j| p[j] == 0)?;
        if !p[start..term].iter().all(|&b| is_printable(b)) {
            return None;
        }
        lengths.push(term - start);
    }
    let offset = active[0].offset;
    let size = lengths[0] + 1;
    for (c, len) in active.iter_mut().zip(lengths) {
        c.offset += len + 1;
    }
    Some(FieldNode::leaf(offset, size, FieldKind::Nullstr, None))
}

/// Test 4: 32-bit little-endian length, consistent with the remaining byte count.
fn test_len4(packets: &[&[u8]], active: &mut [Cursor]) -> Option<FieldNode> {
    if !active.iter().all(|c| c.offset + 4 <= packets[c.packet_index].len()) {
        return None;
    }
    let mut vals = Vec::with_capacity(active.len());
    for c in active.iter() {
        let p = packets[c.packet_index];
        let v = u32_from_le_bytes(&p[c.offset..c.offset + 4]);
        let remaining = (p.len() - (c.offset + 4)) as u32;
        if !(v == remaining || (remaining > 0 && v == remaining - 1)) {
            return None;
        }
        vals.push(v);
    }
    let offset = active[0].offset;
    let value = vals[0];
    for c in active.iter_mut() {
        c.offset += 4;
    }
    Some(FieldNode::leaf(offset, 4, FieldKind::Len4, Some(value as u64)))
}

/// Test 5: low-cardinality branch on the current byte.
///
/// Partitions `active` by byte value, recurses per branch, and returns a
/// single `ENUMERATED` node whose branches cover every active cursor exactly
/// once (disjoint on the discriminating byte, union equal to `active`).
fn test_enumerated(packets: &[&[u8]], active: &[Cursor], enum_threshold: usize) -> Option<FieldNode> {
    let mut by_byte: BTreeMap<u8, Vec<Cursor>> = BTreeMap::new();
    for &c in active {
        by_byte.entry(current_byte(packets, &c)).or_default().push(c);
    }
    let k = by_byte.len();
    if k <= 1 || k > enum_threshold {
        return None;
    }

    let offset = active[0].offset;
    let mut branches = BTreeMap::new();
    for (byte, cursors) in by_byte {
        let advanced: Vec<Cursor> = cursors
            .into_iter()
            .map(|c| Cursor { offset: c.offset + 1, ..c })
            .collect();
        let branch_offset = advanced[0].offset - 1;
        let continuation = walk(packets, advanced, enum_threshold);
        branches.insert(
            byte,
            FieldNode {
                offset: branch_offset,
                size: 1,
                kind: FieldKind::Constant,
                value: Some(byte as u64),
                children: continuation,
                branches: None,
            },
        );
    }

    Some(FieldNode {
        offset,
        size: 1,
        kind: FieldKind::Enumerated,
        value: None,
        children: Vec::new(),
        branches: Some(branches),
    })
}

/// Test 6: fallback for everything the other tests disqualify.
fn test_variable(packets: &[&[u8]], active: &mut [Cursor]) -> FieldNode {
    let offset = active[0].offset;
    for c in active.iter_mut() {
        c.offset += 1;
    }
    let _ = packets; // kept for symmetry with the other tests' signatures
    FieldNode::leaf(offset, 1, FieldKind::Variable, None)
}
