use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use memex_index::{BackendConfig, IndexConfig, IndexMetadata, VectorIndex};
use memex_store::{CaptureRecord, RecordStore};
use tempfile::TempDir;

const DIM: usize = 8;

fn vector(seed: usize) -> Vec<f32> {
    let mut v = vec![0.0_f32; DIM];
    let mut x = seed as u64 ^ 0x9E3779B97F4A7C15;
    for slot in v.iter_mut() {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        *slot = (x % 1000) as f32 / 1000.0;
    }
    v
}

fn sample_record(i: usize) -> CaptureRecord {
    CaptureRecord::new(1_700_000_000_000 + i as i64, "Display_1", format!("capture body {i}"), "capture-v1")
}

fn sample_metadata(record: &CaptureRecord) -> IndexMetadata {
    IndexMetadata {
        timestamp: record.timestamp,
        timestamp_iso: record.timestamp_iso.clone(),
        screen_name: record.screen_name.clone(),
        text_length: record.text_length,
        word_count: record.word_count,
        data_type: record.data_type.clone(),
        source: record.source.clone(),
    }
}

/// Record-store put throughput (atomic write-to-temp-then-rename per file).
fn bench_record_store_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_store_put");

    for size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("put_{size}"), |b| {
            b.iter(|| {
                let dir = TempDir::new().unwrap();
                let store = RecordStore::open(dir.path()).unwrap();
                for i in 0..*size {
                    store.put(black_box(&sample_record(i))).expect("put should succeed");
                }
            });
        });
    }
    group.finish();
}

/// Record-store full scan throughput, the path `activity-graph` and the
/// sampling tools rely on.
fn bench_record_store_iter(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_store_iter");

    for size in [100, 1000, 5000].iter() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        for i in 0..*size {
            store.put(&sample_record(i)).unwrap();
        }

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("iter_{size}"), |b| {
            b.iter(|| {
                let mut count = 0;
                for record in store.iter(memex_store::RecordFilter::default()).unwrap() {
                    black_box(&record);
                    count += 1;
                }
                black_box(count);
            });
        });
    }
    group.finish();
}

/// Vector-index upsert throughput, in-memory vs the redb-backed adapter.
fn bench_index_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_upsert");

    for size in [10, 100, 1000].iter() {
        let records: Vec<CaptureRecord> = (0..*size).map(sample_record).collect();

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_function(format!("in_memory_{size}"), |b| {
            b.iter(|| {
                let index = VectorIndex::open(IndexConfig::new(DIM).with_backend(BackendConfig::InMemory)).unwrap();
                for (i, record) in records.iter().enumerate() {
                    index
                        .upsert(&record.id, black_box(&vector(i)), sample_metadata(record), record.text.clone())
                        .expect("upsert should succeed");
                }
            });
        });

        group.bench_function(format!("redb_{size}"), |b| {
            b.iter(|| {
                let dir = TempDir::new().unwrap();
                let index =
                    VectorIndex::open(IndexConfig::new(DIM).with_backend(BackendConfig::redb(dir.path().join("index.redb")))).unwrap();
                for (i, record) in records.iter().enumerate() {
                    index
                        .upsert(&record.id, black_box(&vector(i)), sample_metadata(record), record.text.clone())
                        .expect("upsert should succeed");
                }
            });
        });
    }
    group.finish();
}

/// Random single-id lookups against a pre-populated index.
fn bench_index_get_by_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_get_by_ids");

    let records: Vec<CaptureRecord> = (0..1000).map(sample_record).collect();
    let ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();

    let inmem = VectorIndex::open(IndexConfig::new(DIM).with_backend(BackendConfig::InMemory)).unwrap();
    for (i, record) in records.iter().enumerate() {
        inmem.upsert(&record.id, &vector(i), sample_metadata(record), record.text.clone()).unwrap();
    }

    group.bench_function("in_memory", |b| {
        let mut i = 0;
        b.iter(|| {
            let id = &ids[i % ids.len()];
            let _ = inmem.get_by_ids(black_box(std::slice::from_ref(id))).expect("get_by_ids should succeed");
            i += 1;
        });
    });
    group.finish();
}

criterion_group!(benches, bench_record_store_put, bench_record_store_iter, bench_index_upsert, bench_index_get_by_ids);
criterion_main!(benches);
