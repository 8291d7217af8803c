//! Integration test: oversold screen and monitor against a fake exchange.

mod common;

use common::{candles, rally, selloff, FakeMarket, RecordingSink};
use krakenwatch::alerts::AlertLedger;
use krakenwatch::config::Config;
use krakenwatch::monitor::{Monitor, OversoldMonitor};
use krakenwatch::signal::oversold::scan;
use std::time::Duration;
use tempfile::tempdir;

fn market() -> FakeMarket {
    let market = FakeMarket::new();

    // Oversold, near support, liquid and inside the price band.
    market.add_pair("SOLUSD", "SOL", "ZUSD");
    market.set_candles("SOLUSD", selloff());
    market.set_ticker("SOLUSD", 12.5, 450_000.0);

    // Oversold but priced outside the band.
    market.add_pair("XXBTZUSD", "XXBT", "ZUSD");
    market.set_candles("XXBTZUSD", selloff());
    market.set_ticker("XXBTZUSD", 64_000.0, 2_500_000.0);

    // Oversold but thinly traded.
    market.add_pair("DOTUSD", "DOT", "ZUSD");
    market.set_candles("DOTUSD", selloff());
    market.set_ticker("DOTUSD", 4.0, 90_000.0);

    // Trending up.
    market.add_pair("ADAUSD", "ADA", "ZUSD");
    market.set_candles("ADAUSD", rally());
    market.set_ticker("ADAUSD", 0.45, 9_000_000.0);

    // Stablecoin base and a non-USD quote are never scanned.
    market.add_pair("USDTZUSD", "USDT", "ZUSD");
    market.set_candles("USDTZUSD", selloff());
    market.add_pair("SOLEUR", "SOL", "ZEUR");
    market.set_candles("SOLEUR", selloff());

    // Too little history, and a pair whose chart request fails.
    market.add_pair("NEWUSD", "NEW", "ZUSD");
    market.set_candles("NEWUSD", candles((0..10).map(|i| 50.0 - i as f64)));
    market.add_pair("BROKENUSD", "BROKEN", "ZUSD");

    market
}

fn config() -> Config {
    Config::from_lookup(|_| None).unwrap()
}

#[tokio::test]
async fn scan_keeps_only_liquid_oversold_pairs_in_band() {
    let market = market();
    let cfg = config();

    let hits = scan(
        &market,
        &cfg.oversold.excluded_bases,
        cfg.oversold.ohlc_interval,
        &cfg.oversold.criteria,
        cfg.oversold.workers,
    )
    .await
    .unwrap();

    let pairs: Vec<&str> = hits.iter().map(|h| h.pair.as_str()).collect();
    assert_eq!(pairs, vec!["SOLUSD"]);

    let hit = &hits[0];
    assert!(hit.rsi < 30.0);
    assert!(hit.stoch_k < 20.0);
    assert_eq!(hit.last_price, 12.5);
    assert_eq!(hit.close, 182.0);
    assert_eq!(hit.support_low, 182.0);
}

#[tokio::test]
async fn ticker_is_only_requested_for_chart_matches() {
    let market = market();
    let cfg = config();

    scan(
        &market,
        &cfg.oversold.excluded_bases,
        cfg.oversold.ohlc_interval,
        &cfg.oversold.criteria,
        2,
    )
    .await
    .unwrap();

    assert_eq!(market.ticker_calls(), vec!["DOTUSD", "SOLUSD", "XXBTZUSD"]);
}

#[tokio::test]
async fn monitor_alerts_once_per_cooldown() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("alerted.json");
    let market = market();
    let sink = RecordingSink::new();
    let cfg = config();

    let ledger = AlertLedger::load(&ledger_path, Duration::from_secs(3600)).unwrap();
    let mut monitor = OversoldMonitor::new(
        Box::new(market.clone()),
        cfg.oversold.clone(),
        ledger,
        Box::new(sink.clone()),
    );

    assert_eq!(monitor.tick().await.unwrap(), 1);
    assert_eq!(monitor.tick().await.unwrap(), 0);
    assert_eq!(monitor.last_hits().len(), 1);

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Kraken Oversold Alert (1 pairs)");
    assert!(sent[0].body.contains("SOLUSD: RSI="));
    assert!(ledger_path.exists());

    // A restarted monitor still honours the cooldown.
    let ledger = AlertLedger::load(&ledger_path, Duration::from_secs(3600)).unwrap();
    let mut restarted = OversoldMonitor::new(
        Box::new(market),
        cfg.oversold.clone(),
        ledger,
        Box::new(sink.clone()),
    );
    assert_eq!(restarted.tick().await.unwrap(), 0);
    assert_eq!(sink.sent().len(), 1);
}

#[tokio::test]
async fn failed_delivery_is_retried_next_cycle() {
    let dir = tempdir().unwrap();
    let market = market();
    let sink = RecordingSink::new();
    sink.set_failing(true);

    let ledger = AlertLedger::load(dir.path().join("alerted.json"), Duration::from_secs(3600)).unwrap();
    let mut monitor = OversoldMonitor::new(
        Box::new(market),
        config().oversold,
        ledger,
        Box::new(sink.clone()),
    );

    assert!(monitor.tick().await.is_err());
    sink.set_failing(false);
    assert_eq!(monitor.tick().await.unwrap(), 1);
    assert_eq!(sink.sent().len(), 1);
}
