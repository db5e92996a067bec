//! Benchmarks for message parsing
//!
//! Target: <2us per trade frame (serde_json::Value + typed decode)

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use composite_price::exchanges::parsing::BinanceParser;

// Test data - real exchange message formats
const BINANCE_TRADE: &[u8] = br#"{"e":"trade","E":1672515782136,"s":"SOLBTC","t":12345,"p":"0.00105000","q":"12.50000000","T":1672515782136,"m":true,"M":true}"#;

const BINANCE_TRADE_LEGACY: &[u8] = br#"{"e":"trade","E":1672515782136,"s":"BTCUSDT","t":12345,"p":"25000.50","q":"0.001","b":88,"a":50,"T":1672515782136,"m":true,"M":true}"#;

const BINANCE_ACK: &[u8] = br#"{"result":null,"id":1}"#;

const BINANCE_MALFORMED: &[u8] = br#"{"e":"trade","E":1672515782136,"s":"SOLBTC","t":12345,"q":"1","T":1672515782136,"m":true}"#;

fn bench_trade_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("binance_parse");
    group.throughput(Throughput::Bytes(BINANCE_TRADE.len() as u64));

    group.bench_function("trade", |b| {
        b.iter(|| {
            let result = BinanceParser::parse(black_box(BINANCE_TRADE));
            black_box(result)
        })
    });

    group.bench_function("trade_with_order_ids", |b| {
        b.iter(|| {
            let result = BinanceParser::parse(black_box(BINANCE_TRADE_LEGACY));
            black_box(result)
        })
    });

    group.finish();
}

fn bench_control_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("binance_control");

    group.bench_function("ack", |b| {
        b.iter(|| {
            let result = BinanceParser::parse(black_box(BINANCE_ACK));
            black_box(result)
        })
    });

    group.bench_function("malformed", |b| {
        b.iter(|| {
            let result = BinanceParser::parse(black_box(BINANCE_MALFORMED));
            black_box(result)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_trade_parse, bench_control_parse);
criterion_main!(benches);
