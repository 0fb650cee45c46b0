use thiserror::Error;

use crate::config::ConfigError;
use crate::source::SourceError;

/// Top-level error for anything that can go wrong running the pipeline.
///
/// `EmptyInput` is deliberately not a variant here: an empty or
/// all-below-floor flow set is a normal, loggable outcome (an empty
/// [`Report`][crate::pipeline::Report]), not a fault.
#[derive(Error, Debug)]
pub enum GrameffsiError {
    /// The supplied [`Config`][crate::config::Config] was rejected before any
    /// build started.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The `FlowSource` collaborator failed to produce flows.
    #[error("flow source failed: {0}")]
    Source(#[from] SourceError),

    /// The node arena for a flow's trie could not grow further.
    #[error("resource exhausted building trie for flow {flow_key}: ~{approx_nodes} nodes")]
    ResourceExhausted {
        flow_key: String,
        approx_nodes: usize,
    },
}
