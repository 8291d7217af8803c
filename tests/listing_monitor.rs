//! Integration test: new-listing monitor state handling.

mod common;

use common::{FakeMarket, RecordingSink};
use krakenwatch::alerts::ListingLog;
use krakenwatch::monitor::{ListingMonitor, Monitor};
use krakenwatch::store::SeenPairs;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn listed_market() -> FakeMarket {
    let market = FakeMarket::new();
    market.add_pair("XXBTZUSD", "XXBT", "ZUSD");
    market.add_pair("XETHZUSD", "XETH", "ZUSD");
    market
}

fn monitor(
    dir: &Path,
    market: &FakeMarket,
    sink: &RecordingSink,
    alert_on_bootstrap: bool,
) -> ListingMonitor {
    ListingMonitor::new(
        Box::new(market.clone()),
        SeenPairs::load(dir.join("state/seen_pairs.json")).unwrap(),
        ListingLog::new(dir.join("kraken_newlistings.log")),
        Box::new(sink.clone()),
        alert_on_bootstrap,
    )
}

fn log_lines(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("kraken_newlistings.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn first_run_records_baseline_then_alerts_on_new_pairs() {
    let dir = tempdir().unwrap();
    let market = listed_market();
    let sink = RecordingSink::new();
    let mut watcher = monitor(dir.path(), &market, &sink, false);

    assert_eq!(watcher.tick().await.unwrap(), 0);
    assert!(sink.sent().is_empty());
    assert!(dir.path().join("state/seen_pairs.json").exists());
    assert_eq!(watcher.seen().len(), 2);

    market.add_pair("TAOUSD", "TAO", "ZUSD");
    market.add_pair("ADAUSD", "ADA", "ZUSD");
    assert_eq!(watcher.tick().await.unwrap(), 2);

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Kraken New Listing Alert");
    assert!(sent[0].body.contains("ADAUSD\nTAOUSD"));

    let lines = log_lines(dir.path());
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("NEW PAIR LISTED: ADAUSD"));

    // Nothing new on the following cycle.
    assert_eq!(watcher.tick().await.unwrap(), 0);
    assert_eq!(sink.sent().len(), 1);
}

#[tokio::test]
async fn bootstrap_alert_can_be_enabled() {
    let dir = tempdir().unwrap();
    let market = listed_market();
    let sink = RecordingSink::new();
    let mut watcher = monitor(dir.path(), &market, &sink, true);

    assert_eq!(watcher.tick().await.unwrap(), 2);
    assert_eq!(sink.sent().len(), 1);
}

#[tokio::test]
async fn restart_does_not_realert() {
    let dir = tempdir().unwrap();
    let market = listed_market();
    let sink = RecordingSink::new();

    let mut watcher = monitor(dir.path(), &market, &sink, false);
    watcher.tick().await.unwrap();
    market.add_pair("TAOUSD", "TAO", "ZUSD");
    watcher.tick().await.unwrap();
    drop(watcher);

    let mut restarted = monitor(dir.path(), &market, &sink, false);
    assert_eq!(restarted.seen().len(), 3);
    assert_eq!(restarted.tick().await.unwrap(), 0);
    assert_eq!(sink.sent().len(), 1);
}

#[tokio::test]
async fn failed_delivery_keeps_pairs_unseen_without_duplicate_log_lines() {
    let dir = tempdir().unwrap();
    let market = listed_market();
    let sink = RecordingSink::new();
    let mut watcher = monitor(dir.path(), &market, &sink, false);
    watcher.tick().await.unwrap();

    market.add_pair("TAOUSD", "TAO", "ZUSD");
    sink.set_failing(true);
    assert!(watcher.tick().await.is_err());
    assert_eq!(watcher.seen().len(), 2);

    sink.set_failing(false);
    assert_eq!(watcher.tick().await.unwrap(), 1);
    assert_eq!(watcher.seen().len(), 3);
    assert_eq!(log_lines(dir.path()).len(), 1);
}

#[tokio::test]
async fn empty_pair_list_is_ignored() {
    let dir = tempdir().unwrap();
    let market = FakeMarket::new();
    let sink = RecordingSink::new();
    let mut watcher = monitor(dir.path(), &market, &sink, false);

    assert_eq!(watcher.tick().await.unwrap(), 0);
    assert!(!watcher.seen().has_baseline());
}
