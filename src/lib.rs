//! grameffsi is a Rust library for inferring the message-format "grammar" of an
//! unknown binary network protocol from captured traffic.
//!
//! Given payloads grouped by flow, it builds byte-aligned prefix tries that reveal
//! which positions are fixed (magic numbers, opcodes) and which vary (payload,
//! variable-length fields), tags positions as constant or variable using a
//! frequency-ratio threshold, and separately runs a heuristic field typer that
//! walks synchronized packet cursors to assign structural roles such as
//! length-prefixed strings, null-terminated strings, and 32-bit length fields.
//!
//! Parsing pcap files and reassembling TCP flows into `{FlowKey -> Vec<Payload>}`
//! is deliberately out of scope: see [`source::FlowSource`] for the seam an
//! external collaborator implements to hand payloads to this crate.

// TODO: add example usage to library doc

/// Canonical flow identifiers and the payload type the rest of the crate builds on.
pub mod types;

/// Runtime configuration (threshold, enum threshold, minimum packets per flow).
pub mod config;

/// Error types shared by the pipeline and its collaborators.
pub mod error;

/// Per-flow and global prefix trie construction and constant/variable tagging.
///
/// See the per-flow builder, semantic tagger, and global builder of the
/// inference design this crate implements.
pub mod trie;

/// Breadth-first per-depth constant/variable summary of a tagged trie.
pub mod depth;

/// The heuristic field typer: walks synchronized cursors across a flow's
/// payloads and assigns CONSTANT/STRING/LENSTR/NULLSTR/LEN4/ENUMERATED/VARIABLE
/// field kinds.
pub mod field;

/// `FlowSource`, the external-collaborator boundary, plus reference
/// implementations for tests and offline replay of captured flows.
pub mod source;

/// The pipeline that sequences trie building, tagging, depth summaries, and
/// field typing over a `FlowSource` into a single `Report`.
pub mod pipeline;

/// CSV and human-readable rendering of tries and depth summaries.
pub mod export;

// Default values for Config and Default implementations.
const DEFAULT_THRESHOLD: f64 = 0.95;
const DEFAULT_ENUM_THRESHOLD: usize = 10;
const DEFAULT_MIN_PACKETS_PER_FLOW: usize = 2;
const DEFAULT_MAX_TRIE_NODES: usize = 1_000_000;
