//! Performance benchmarks for the search index and entry store.
//!
//! Run with: cargo bench
//!
//! These benchmarks establish baseline performance metrics for:
//! - Ranked search at various index sizes
//! - Saving an entry to disk

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pocket_journal::entry::Entry;
use pocket_journal::search::SearchIndex;
use pocket_journal::store::{EntryStore, StoreOptions};
use tempfile::TempDir;

const WORDS: &[&str] = &[
    "morning", "coffee", "walk", "river", "project", "deadline", "friend", "dinner", "garden",
    "rain", "meeting", "book", "music", "quiet", "plan", "budget",
];

fn sample_entries(count: usize) -> Vec<Entry> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let mut content = format!("Notes for day {}\n", i);
            let mut n = i;
            while content.len() < 1024 {
                n = n.wrapping_mul(31).wrapping_add(7);
                content.push_str(WORDS[n % WORDS.len()]);
                content.push(' ');
            }
            let mut entry = Entry::new(start + Duration::minutes(i as i64), content);
            entry.refresh_derived();
            entry
        })
        .collect()
}

/// Benchmark search latency with various index sizes.
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for count in [100, 1000, 5000] {
        let mut index = SearchIndex::new();
        index.rebuild(sample_entries(count), 1);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("phrase", count), &index, |b, index| {
            b.iter(|| {
                let results = index.search(black_box("river walk"), black_box(20));
                black_box(results);
            });
        });
        group.bench_with_input(BenchmarkId::new("no_match", count), &index, |b, index| {
            b.iter(|| {
                let results = index.search(black_box("zeppelin"), black_box(20));
                black_box(results);
            });
        });
    }

    group.finish();
}

/// Benchmark rebuilding the index from already-loaded entries.
fn bench_rebuild(c: &mut Criterion) {
    let entries = sample_entries(1000);
    c.bench_function("rebuild_1000", |b| {
        b.iter(|| {
            let mut index = SearchIndex::new();
            index.rebuild(black_box(entries.clone()), 1);
            black_box(index.len());
        });
    });
}

/// Benchmark a single save, including the atomic write.
fn bench_save(c: &mut Criterion) {
    let temp_dir = TempDir::new().expect("create temp dir");
    let mut store =
        EntryStore::open(StoreOptions::new(temp_dir.path().join("entries"))).expect("open store");
    let mut entry = sample_entries(1).remove(0);

    c.bench_function("save_1kb", |b| {
        b.iter(|| {
            let path = store.save(black_box(&mut entry)).expect("save failed");
            black_box(path);
        });
    });
}

criterion_group!(benches, bench_search, bench_rebuild, bench_save);
criterion_main!(benches);
