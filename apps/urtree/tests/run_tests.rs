//! Input parsing and end-to-end runs into both sinks.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::collections::BTreeMap;
use std::io::Write;
use urtree::{
    JsonLinesSink, Order, RedbSink, RunOptions, group_records, parse_records, read_records, run,
};
use urtree_core::{NodeStats, TweetId};

/// Two groups: a small reply/quote tree and a lone post. One bad line.
const INPUT: &str = r#"
{"group_id": 1, "tweet_id": 10, "author_id": 1, "like_count": 4}
{"group_id": 1, "tweet_id": 11, "author_id": 2, "reply_parent_id": 10, "reply_count": 1, "like_count": 2}
{"group_id": 1, "tweet_id": 12, "author_id": 3, "reply_parent_id": 11}
{"group_id": 1, "tweet_id": 13, "author_id": 4, "quote_parent_id": 10, "like_count": 6}

{"group_id": 2, "tweet_id": 20, "author_id": 9, "retweet_count": 5}
{"group_id": 1, "tweet_id": 14, "author_id": 5, "reply_parent_id": 10, "quote_parent_id": 12}
"#;

const OPTIONS: RunOptions = RunOptions {
    workers: 2,
    batch_size: 2,
};

fn groups() -> BTreeMap<u64, Vec<urtree_core::RawRecord>> {
    let outcome = parse_records(INPUT.as_bytes()).unwrap();
    group_records(outcome.records, Order::LeafFirst).unwrap()
}

#[test]
fn test_parse_skips_blank_and_invalid_lines() {
    let outcome = parse_records(INPUT.as_bytes()).unwrap();
    assert_eq!(outcome.records.len(), 5);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.records[0].record.reply_count, 0);
}

#[test]
fn test_read_records_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(INPUT.as_bytes()).unwrap();

    let outcome = read_records(file.path()).unwrap();
    assert_eq!(outcome.records.len(), 5);
}

#[tokio::test]
async fn test_jsonl_output() {
    let mut sink = JsonLinesSink::new(Vec::new());
    let summary = run(groups(), &mut sink, OPTIONS).await.unwrap();

    assert_eq!(summary.groups, 2);
    assert_eq!(summary.records, 5);
    assert_eq!(summary.singletons, 1);
    assert_eq!(sink.written(), 5);

    let bytes = sink.into_inner().unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);

    // Keys appear in column order.
    let first: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(lines[0]).unwrap();
    let keys: Vec<&str> = first.keys().map(String::as_str).collect();
    assert_eq!(keys, NodeStats::COLUMNS.to_vec());

    let by_id: BTreeMap<u64, NodeStats> = lines
        .iter()
        .map(|line| {
            let stats: NodeStats = serde_json::from_str(line).unwrap();
            (stats.tweet_id.0, stats)
        })
        .collect();

    let root = &by_id[&10];
    assert_eq!(root.children, 1);
    assert_eq!(root.ur_children, 2);
    assert_eq!(root.descendants, 2);
    assert_eq!(root.ur_descendants, 3);
    assert_eq!(root.leaf_descendants, 1);
    assert_eq!(root.ur_leaf_descendants, 2);
    assert_eq!(root.t_like_count, 6);
    assert_eq!(root.ur_t_like_count, 12);
    assert_eq!(root.ur_t_authors, 4);

    let lone = &by_id[&20];
    assert_eq!(lone.ur_descendants, 0);
    assert_eq!(lone.t_retweet_count, 5);
    assert_eq!(lone.mean_retweet_count, 5.0);
}

#[tokio::test]
async fn test_redb_output_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.redb");

    let mut sink = RedbSink::open(&path).unwrap();
    run(groups(), &mut sink, OPTIONS).await.unwrap();
    let first = sink.get(TweetId(11)).unwrap().unwrap();
    drop(sink);

    let mut sink = RedbSink::open(&path).unwrap();
    run(groups(), &mut sink, OPTIONS).await.unwrap();

    assert_eq!(sink.len().unwrap(), 5);
    assert_eq!(sink.get(TweetId(11)).unwrap().unwrap(), first);
    assert_eq!(first.descendants, 1);
    assert_eq!(first.leaf_descendants, 1);
    assert!(sink.get(TweetId(14)).unwrap().is_none());
}

#[tokio::test]
async fn test_record_order_does_not_change_output() {
    let outcome = parse_records(INPUT.as_bytes()).unwrap();
    let leaf_first = group_records(outcome.records.clone(), Order::LeafFirst).unwrap();
    let input = group_records(outcome.records, Order::Input).unwrap();

    let mut a = JsonLinesSink::new(Vec::new());
    let mut b = JsonLinesSink::new(Vec::new());
    run(leaf_first, &mut a, OPTIONS).await.unwrap();
    run(input, &mut b, OPTIONS).await.unwrap();

    let parse = |bytes: Vec<u8>| -> BTreeMap<u64, NodeStats> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| {
                let stats: NodeStats = serde_json::from_str(line).unwrap();
                (stats.tweet_id.0, stats)
            })
            .collect()
    };
    let a = parse(a.into_inner().unwrap());
    let b = parse(b.into_inner().unwrap());

    assert_eq!(a.keys().collect::<Vec<_>>(), b.keys().collect::<Vec<_>>());
    for (id, stats) in &a {
        let other = &b[id];
        assert_eq!(stats.ur_descendants, other.ur_descendants);
        assert_eq!(stats.ur_t_like_count, other.ur_t_like_count);
        assert!((stats.ur_like_count_mad - other.ur_like_count_mad).abs() < 1e-9);
    }
}
