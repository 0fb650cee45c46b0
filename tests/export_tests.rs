use grameffsi::depth::summarize;
use grameffsi::export::{depth_summary_to_table, trie_to_csv};
use grameffsi::trie::{build, tag};
use grameffsi::types::Payload;

#[test]
fn csv_export_has_one_data_row_per_node_and_an_unambiguous_header() {
    let payloads: Vec<Payload> = vec![
        vec![0x01, 0x02, 0xAA],
        vec![0x01, 0x02, 0xBB],
        vec![0x01, 0x02, 0xAA],
    ];
    let mut trie = build(&payloads, 10_000).unwrap();
    tag(&mut trie, 0.95);

    let csv = trie_to_csv(&trie).expect("csv export should succeed");
    let mut lines = csv.lines();
    assert_eq!(lines.next().unwrap(), "node_id,depth,byte,count,ratio,type");
    assert_eq!(lines.count(), trie.len());
}

#[test]
fn depth_table_has_one_row_per_depth_in_ascending_order() {
    let payloads: Vec<Payload> = vec![vec![0x01, 0x02, 0xAA], vec![0x01, 0x02, 0xBB]];
    let mut trie = build(&payloads, 10_000).unwrap();
    tag(&mut trie, 0.95);
    let rows = summarize(&trie);
    let table = depth_summary_to_table(&rows);

    let depths: Vec<usize> = table
        .lines()
        .map(|line| line.split(" | ").next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(depths, vec![1, 2, 3]);
}
