//! Throughput Benchmark for pimobot
//!
//! This benchmark measures the hot paths a busy channel exercises: command
//! lookup, trigger parsing, relay frame parsing and full dispatch.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pimobot::chat::{Author, Channel, MemoryClient, Message};
use pimobot::config::BotConfig;
use pimobot::dispatch::{parse_command, Dispatcher};
use pimobot::protocol::{Frame, FrameParser};
use pimobot::Registry;
use std::sync::Arc;

/// Benchmark registry lookups
fn bench_resolve(c: &mut Criterion) {
    let registry = Registry::builtin(&BotConfig::default()).unwrap();

    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Elements(1));

    group.bench_function("primary", |b| {
        b.iter(|| registry.resolve(black_box("roll")).is_ok());
    });

    group.bench_function("synonym_mixed_case", |b| {
        b.iter(|| registry.resolve(black_box("SOURCE")).is_ok());
    });

    group.bench_function("miss", |b| {
        b.iter(|| registry.resolve(black_box("frobnicate")).is_err());
    });

    group.finish();
}

/// Benchmark trigger detection
fn bench_parse_command(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_command");
    group.throughput(Throughput::Elements(1));

    group.bench_function("command", |b| {
        b.iter(|| parse_command(black_box("!choose tea coffee rum"), '!'));
    });

    group.bench_function("chatter", |b| {
        b.iter(|| parse_command(black_box("anyone tried the new enviro board?"), '!'));
    });

    group.finish();
}

/// Benchmark relay frame parsing
fn bench_frames(c: &mut Criterion) {
    let mut wire = Vec::new();
    for i in 0..100 {
        Frame::Message {
            channel_id: "10".to_string(),
            author_id: i.to_string(),
            author_name: format!("sailor{}#1234", i),
            roles: vec!["@everyone".to_string()],
            text: format!("!add {} {} {}", i, i * 2, i * 3),
        }
        .serialize_into(&mut wire);
    }

    let mut group = c.benchmark_group("frames");
    group.throughput(Throughput::Bytes(wire.len() as u64));

    group.bench_function("parse_100_messages", |b| {
        let mut parser = FrameParser::new();
        b.iter(|| {
            let mut offset = 0;
            while let Ok(Some((frame, consumed))) = parser.parse(&wire[offset..]) {
                black_box(frame);
                offset += consumed;
            }
            offset
        });
    });

    group.finish();
}

/// Benchmark full dispatch against an in-memory client
fn bench_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let config = BotConfig::default();
    let dispatcher = Dispatcher::new(Arc::new(Registry::builtin(&config).unwrap()), &config);
    let client = MemoryClient::new();
    let author = Author::new("42", "sailor#1234");
    let channel = Channel::new("10", "general");

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    for text in ["!add 1 2 3.5", "!version", "!nope"] {
        let message = Message::new(author.clone(), channel.clone(), text);
        group.bench_function(text, |b| {
            b.iter(|| runtime.block_on(dispatcher.dispatch(&client, &message)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_resolve,
    bench_parse_command,
    bench_frames,
    bench_dispatch,
);

criterion_main!(benches);
