use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

use krill::index::{partition_path, IndexBuilder, IndexMerger, IndexReader};
use krill::query::QueryEvaluator;
use krill::{codec, tokenizer, IndexerConfig, QueryMode};

fn bench_tokenizer(c: &mut Criterion) {
    let text = "The quick brown fox jumps over the lazy dog, 42 times in a row; \
                every PASSAGE in the collection looks roughly like this one."
        .repeat(8);
    c.bench_function("tokenize_1kb", |b| {
        b.iter(|| tokenizer::tokenize(black_box(&text)))
    });
}

fn bench_varbyte(c: &mut Criterion) {
    let values: Vec<u32> = (0..128u32).map(|i| i * i + 1).collect();
    let mut encoded = Vec::new();
    for &v in &values {
        codec::encode_into(v, &mut encoded);
    }

    c.bench_function("varbyte_encode_block", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(encoded.len());
            for &v in black_box(&values) {
                codec::encode_into(v, &mut out);
            }
            out
        })
    });

    c.bench_function("varbyte_decode_block", |b| {
        b.iter(|| {
            let mut pos = 0;
            let mut sum = 0u64;
            for _ in 0..values.len() {
                sum += codec::decode_from(black_box(&encoded), &mut pos).unwrap() as u64;
            }
            sum
        })
    });
}

/// Build a small synthetic index so the query benches exercise the real
/// on-disk read path
fn build_fixture(dir: &Path) -> QueryEvaluator {
    let phase1 = dir.join("phase1");
    let mut builder = IndexBuilder::create(&phase1, IndexerConfig::default()).unwrap();
    let vocab = [
        "search", "engine", "index", "query", "ranking", "passage", "block", "cursor",
    ];
    for i in 0..2_000u32 {
        let mut content = String::new();
        for (j, word) in vocab.iter().enumerate() {
            if (i as usize + j) % (j + 2) == 0 {
                content.push_str(word);
                content.push(' ');
            }
        }
        content.push_str("filler text common to every document");
        builder.add_document(&format!("doc{i}"), &content).unwrap();
    }
    let summary = builder.finish().unwrap();

    let mut rows: Vec<(String, u32, u32)> = Vec::new();
    for k in 0..summary.partitions {
        let text = fs::read_to_string(partition_path(&phase1, k)).unwrap();
        for line in text.lines() {
            let mut fields = line.split('\t');
            rows.push((
                fields.next().unwrap().to_string(),
                fields.next().unwrap().parse().unwrap(),
                fields.next().unwrap().parse().unwrap(),
            ));
        }
    }
    rows.sort();
    let sorted = dir.join("postings_sorted.tsv");
    let mut file = fs::File::create(&sorted).unwrap();
    for (term, doc_id, tf) in rows {
        writeln!(file, "{}\t{}\t{}", term, doc_id, tf).unwrap();
    }

    let index_dir = dir.join("index");
    IndexMerger::create(&index_dir)
        .unwrap()
        .merge_file(&sorted)
        .unwrap();

    let reader = IndexReader::open_shared(&index_dir, phase1.join("doc_table.txt")).unwrap();
    QueryEvaluator::new(reader)
}

fn bench_queries(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let evaluator = build_fixture(tmp.path());

    c.bench_function("query_or_top10", |b| {
        b.iter(|| {
            evaluator
                .search(black_box("search engine ranking"), QueryMode::Or, 10)
                .unwrap()
        })
    });

    c.bench_function("query_and_top10", |b| {
        b.iter(|| {
            evaluator
                .search(black_box("search engine ranking"), QueryMode::And, 10)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_tokenizer, bench_varbyte, bench_queries);
criterion_main!(benches);
