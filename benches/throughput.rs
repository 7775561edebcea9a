//! Throughput Benchmark for kvstore
//!
//! Measures the storage engine, the RESP decoder and the command dispatcher
//! separately, without any network I/O.

use bytes::{Bytes, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use kvstore::commands::CommandHandler;
use kvstore::protocol::{CommandFrame, RespParser};
use kvstore::storage::{DataType, Entry, StorageEngine};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn key(prefix: &str, i: u64) -> Bytes {
    Bytes::from(format!("{}:{}", prefix, i))
}

/// Benchmark storage writes at a few value sizes
fn bench_storage_set(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    let mut group = c.benchmark_group("storage_set");
    group.throughput(Throughput::Elements(1));

    for (label, size) in [("16b", 16), ("1kb", 1024), ("64kb", 64 * 1024)] {
        let value = Bytes::from(vec![b'x'; size]);
        group.bench_function(label, |b| {
            let mut i = 0u64;
            b.iter(|| {
                engine.set(key("key", i), value.clone(), DataType::String);
                i += 1;
            });
        });
    }

    group.finish();
}

/// Benchmark storage reads, hits and misses
fn bench_storage_get(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    for i in 0..100_000 {
        engine.set(key("key", i), key("value", i), DataType::String);
    }

    let mut group = c.benchmark_group("storage_get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("hit", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(engine.get(&key("key", i % 100_000)));
            i += 1;
        });
    });

    group.bench_function("miss", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(engine.get(&key("missing", i)));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark writes that carry a deadline
fn bench_storage_expiry(c: &mut Criterion) {
    let engine = Arc::new(StorageEngine::new());

    let mut group = c.benchmark_group("storage_expiry");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_with_deadline", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let deadline = Instant::now() + Duration::from_secs(3600);
            let entry = Entry::string(Bytes::from_static(b"value")).with_expiry(deadline);
            engine.set_entry(key("ttl", i), entry);
            i += 1;
        });
    });

    for i in 0..10_000 {
        engine.set(key("expire", i), Bytes::from_static(b"value"), DataType::String);
    }

    group.bench_function("expire_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let deadline = Instant::now() + Duration::from_secs(3600);
            black_box(engine.expire(&key("expire", i % 10_000), deadline));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access from plain threads
fn bench_storage_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("storage_concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_set_get", |b| {
        b.iter(|| {
            let engine = Arc::new(StorageEngine::new());
            let handles: Vec<_> = (0..4u64)
                .map(|t| {
                    let engine = Arc::clone(&engine);
                    thread::spawn(move || {
                        for i in 0..10_000u64 {
                            let k = key(&format!("t{}", t), i);
                            engine.set(k.clone(), Bytes::from_static(b"value"), DataType::String);
                            black_box(engine.get(&k));
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(engine.len());
        });
    });

    group.finish();
}

/// Benchmark decoding a pipelined burst of requests
fn bench_decode(c: &mut Criterion) {
    let parser = RespParser::new();

    let mut burst = Vec::new();
    for i in 0..100u64 {
        let frame: CommandFrame = [
            Bytes::from_static(b"SET"),
            key("key", i),
            Bytes::from_static(b"value"),
        ]
        .into_iter()
        .collect();
        kvstore::RespValue::from(frame).serialize_into(&mut burst);
    }

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(burst.len() as u64));

    group.bench_function("pipelined_100_set", |b| {
        b.iter(|| {
            let mut buf = BytesMut::from(&burst[..]);
            while let Ok(Some(value)) = parser.decode(&mut buf) {
                black_box(value);
            }
        });
    });

    group.finish();
}

/// Benchmark command dispatch through the registry
fn bench_dispatch(c: &mut Criterion) {
    let handler = CommandHandler::new(Arc::new(StorageEngine::new()));

    let set: CommandFrame = ["SET", "bench", "value"].into_iter().collect();
    let get: CommandFrame = ["GET", "bench"].into_iter().collect();

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set", |b| b.iter(|| black_box(handler.handle(&set))));
    group.bench_function("get", |b| b.iter(|| black_box(handler.handle(&get))));

    group.finish();
}

criterion_group!(
    benches,
    bench_storage_set,
    bench_storage_get,
    bench_storage_expiry,
    bench_storage_concurrent,
    bench_decode,
    bench_dispatch,
);

criterion_main!(benches);
