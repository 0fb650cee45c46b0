use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::process::ExitCode;

use grameffsi::config::Config;
use grameffsi::export::{depth_summary_to_table, trie_to_csv};
use grameffsi::pipeline;
use grameffsi::source::{FlowSource, JsonFlowSource, VecFlowSource};
use grameffsi::types::FlowKey;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::default();
    let source = match flow_source() {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error reading flows: {err}");
            return ExitCode::FAILURE;
        }
    };

    let report = match pipeline::run(source.as_ref(), &config) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error running pipeline: {err}");
            return ExitCode::FAILURE;
        }
    };

    for flow_report in &report.flows {
        println!("== flow {} ({} packets) ==", flow_report.flow, flow_report.packet_count);
        match trie_to_csv(&flow_report.trie) {
            Ok(csv) => print!("{csv}"),
            Err(err) => eprintln!("error exporting csv for {}: {err}", flow_report.flow),
        }
        print!("{}", depth_summary_to_table(&flow_report.depth_summary));
        println!();
    }

    for flow in &report.skipped {
        eprintln!("skipped flow {flow}: fewer packets than the configured floor");
    }

    println!("== global ==");
    match trie_to_csv(&report.global_trie) {
        Ok(csv) => print!("{csv}"),
        Err(err) => eprintln!("error exporting global csv: {err}"),
    }
    print!("{}", depth_summary_to_table(&report.global_depth_summary));

    ExitCode::SUCCESS
}

/// Builds a `FlowSource` from the first CLI argument (a path to a JSON flow
/// snapshot document), or falls back to a small bundled demo flow set so the
/// binary runs end-to-end with no arguments.
fn flow_source() -> io::Result<Box<dyn FlowSource>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let document = fs::read_to_string(path)?;
            Ok(Box::new(JsonFlowSource::new(document)))
        }
        None => Ok(Box::new(VecFlowSource::new(demo_flows()))),
    }
}

fn demo_flows() -> BTreeMap<FlowKey, Vec<Vec<u8>>> {
    let mut flows = BTreeMap::new();
    flows.insert(
        FlowKey::new("10.0.0.1", 502, "10.0.0.2", 51000),
        vec![
            vec![0x01, 0x02, b'h', b'e', b'l', b'l', b'o', 0x00],
            vec![0x01, 0x02, b'w', b'o', b'r', b'l', b'd', 0x00],
        ],
    );
    flows
}
