use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::depth::{self, DepthRow};
use crate::error::GrameffsiError;
use crate::field::{self, FieldTree};
use crate::source::FlowSource;
use crate::trie::{self, Trie};
use crate::types::FlowKey;

/// Everything inferred for one flow that cleared [`Config::min_packets_per_flow`].
#[derive(Clone, Debug, Serialize)]
pub struct FlowReport {
    pub flow: FlowKey,
    pub packet_count: usize,
    #[serde(skip)]
    pub trie: Trie,
    pub depth_summary: Vec<DepthRow>,
    pub field_tree: FieldTree,
}

/// Output of one end-to-end run: one report per admitted flow, plus the
/// global trie and its own depth summary across flows.
#[derive(Debug)]
pub struct Report {
    pub flows: Vec<FlowReport>,
    pub skipped: Vec<FlowKey>,
    pub global_trie: Trie,
    pub global_depth_summary: Vec<DepthRow>,
}

/// Runs the full inference pipeline: per-flow trie build + tag + depth
/// summary + field typing, then a fresh global trie over every admitted
/// flow's concatenated payloads, never a merge of the per-flow tries.
pub fn run(source: &dyn FlowSource, config: &Config) -> Result<Report, GrameffsiError> {
    let flows = source.flows()?;
    info!(flow_count = flows.len(), "loaded flows");

    let mut admitted: Vec<(FlowKey, Vec<crate::types::Payload>)> = Vec::new();
    let mut skipped = Vec::new();
    for (flow, payloads) in flows {
        if payloads.len() < config.min_packets_per_flow {
            warn!(%flow, packet_count = payloads.len(), floor = config.min_packets_per_flow, "skipping flow below packet floor");
            skipped.push(flow);
            continue;
        }
        admitted.push((flow, payloads));
    }

    let mut reports = Vec::with_capacity(admitted.len());
    for (flow, payloads) in &admitted {
        let mut trie = trie::build(payloads, config.max_trie_nodes).map_err(|e| {
            GrameffsiError::ResourceExhausted {
                flow_key: flow.to_string(),
                approx_nodes: e.approx_nodes,
            }
        })?;
        trie::tag(&mut trie, config.threshold);
        let depth_summary = depth::summarize(&trie);
        let field_tree = field::build(payloads, config.enum_threshold);
        info!(%flow, nodes = trie.len(), fields = field_tree.children.len(), "flow processed");
        reports.push(FlowReport {
            flow: flow.clone(),
            packet_count: payloads.len(),
            trie,
            depth_summary,
            field_tree,
        });
    }

    let all_payloads: Vec<Vec<crate::types::Payload>> =
        admitted.into_iter().map(|(_, payloads)| payloads).collect();
    let mut global_trie =
        trie::build_global(&all_payloads, config.max_trie_nodes).map_err(|e| {
            GrameffsiError::ResourceExhausted {
                flow_key: "<global>".to_string(),
                approx_nodes: e.approx_nodes,
            }
        })?;
    trie::tag(&mut global_trie, config.threshold);
    let global_depth_summary = depth::summarize(&global_trie);
    info!(nodes = global_trie.len(), "global trie built");

    Ok(Report {
        flows: reports,
        skipped,
        global_trie,
        global_depth_summary,
    })
}

/// Indexes a [`Report`]'s flow reports by flow key, for callers that need
/// random access instead of the original admission order.
pub fn index_by_flow(report: &Report) -> BTreeMap<&FlowKey, &FlowReport> {
    report.flows.iter().map(|r| (&r.flow, r)).collect()
}
