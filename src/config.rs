use thiserror::Error;

use crate::{
    DEFAULT_ENUM_THRESHOLD, DEFAULT_MAX_TRIE_NODES, DEFAULT_MIN_PACKETS_PER_FLOW, DEFAULT_THRESHOLD,
};

/// Rejects a [`Config`] before any trie or field tree is built.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ConfigError {
    #[error("threshold must be within [0.0, 1.0], got {0}")]
    ThresholdOutOfRange(f64),
    #[error("enum_threshold must be >= 2, got {0}")]
    EnumThresholdTooSmall(usize),
}

/// The knobs the inference engine exposes.
///
/// `threshold` governs the [semantic tagger][crate::trie::tag],
/// `enum_threshold` bounds the [heuristic field typer][crate::field]'s
/// branching factor, `min_packets_per_flow` is the pipeline's per-flow
/// admission floor, and `max_trie_nodes` is the resource ceiling the
/// [trie builder][crate::trie::build] enforces per build.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Ratio at or above which a trie node is tagged `constant` (default `0.95`).
    pub threshold: f64,
    /// Maximum branching factor admissible for an `ENUMERATED` field (default `10`).
    pub enum_threshold: usize,
    /// Flows with fewer payloads than this are skipped entirely (default `2`).
    pub min_packets_per_flow: usize,
    /// Arena ceiling a single trie build may grow to before it is aborted with
    /// [`crate::error::GrameffsiError::ResourceExhausted`] (default `1_000_000`).
    pub max_trie_nodes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            threshold: DEFAULT_THRESHOLD,
            enum_threshold: DEFAULT_ENUM_THRESHOLD,
            min_packets_per_flow: DEFAULT_MIN_PACKETS_PER_FLOW,
            max_trie_nodes: DEFAULT_MAX_TRIE_NODES,
        }
    }
}

impl Config {
    /// Builds a `Config` with the default `max_trie_nodes` ceiling, rejecting
    /// out-of-range values. Use [`Config::with_max_trie_nodes`] to override
    /// the ceiling afterwards.
    pub fn new(
        threshold: f64,
        enum_threshold: usize,
        min_packets_per_flow: usize,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }
        if enum_threshold < 2 {
            return Err(ConfigError::EnumThresholdTooSmall(enum_threshold));
        }
        Ok(Config {
            threshold,
            enum_threshold,
            min_packets_per_flow,
            max_trie_nodes: DEFAULT_MAX_TRIE_NODES,
        })
    }

    /// Overrides the arena ceiling a trie build may grow to.
    pub fn with_max_trie_nodes(mut self, max_trie_nodes: usize) -> Self {
        self.max_trie_nodes = max_trie_nodes;
        self
    }
}
