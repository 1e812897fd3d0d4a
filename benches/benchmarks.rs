// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// Four hot paths:
//   1. Response parsing — fenced-block extraction from model output
//   2. Index search — exact inner-product scan over the corpus
//   3. Greedy matching — token-level similarity between embedding matrices
//   4. Export — suite flattening and CSV rendering

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use caseforge::core::parser::extract_json;
use caseforge::core::suite::TestSuite;
use caseforge::corpus::{CorpusEntry, EntryKind};
use caseforge::evaluator::greedy_match;
use caseforge::export::{flatten, to_csv};
use caseforge::index::{normalize_l2, EmbeddingIndex};

// ─── Helpers ────────────────────────────────────────────────────────────────

/// A chatty model response with one fenced suite of N cases.
fn fenced_response(cases: usize) -> String {
    let mut body = String::from("Here is the generated suite.\n\n```json\n{\"testCases\": [");
    for i in 0..cases {
        if i > 0 {
            body.push(',');
        }
        body.push_str(&format!(
            "{{\"name\": \"case {i}\", \"steps\": [\"open the page\", \"submit the form\"], \
             \"expected\": \"result {i} is shown\"}}"
        ));
    }
    body.push_str("]}\n```\n");
    body
}

fn suite_value(cases: usize) -> serde_json::Value {
    serde_json::from_str(&extract_json(&fenced_response(cases)).unwrap()).unwrap()
}

/// Deterministic normalized vectors with parallel metadata.
fn build_index(n: usize, dim: usize) -> EmbeddingIndex {
    let vectors: Vec<Vec<f32>> = (0..n)
        .map(|i| normalize_l2((0..dim).map(|j| ((i * dim + j) as f32).sin()).collect()))
        .collect();
    let entries: Vec<CorpusEntry> = (0..n)
        .map(|i| CorpusEntry {
            text: format!("{{\"name\": \"Usecase {i}\"}}"),
            kind: EntryKind::UseCase,
        })
        .collect();
    EmbeddingIndex::from_parts(vectors, entries).expect("parallel lengths")
}

/// A token-embedding matrix like the encoder produces.
fn token_matrix(tokens: usize, dim: usize, phase: f32) -> Vec<Vec<f32>> {
    (0..tokens)
        .map(|i| normalize_l2((0..dim).map(|j| ((i + j) as f32 * 0.1 + phase).sin()).collect()))
        .collect()
}

// ─── Benchmark: Response parsing ────────────────────────────────────────────

fn bench_parsing(c: &mut Criterion) {
    let bare = extract_json(&fenced_response(20)).expect("valid fence");
    let fenced = fenced_response(20);
    let mut chatty = String::from("First, a plan:\n\n```\nstep one\nstep two\n```\n\n");
    chatty.push_str(&fenced_response(20));

    let mut group = c.benchmark_group("parsing");

    group.bench_function("extract_bare_json", |b| {
        b.iter(|| extract_json(black_box(&bare)))
    });

    group.bench_function("extract_single_fence", |b| {
        b.iter(|| extract_json(black_box(&fenced)))
    });

    group.bench_function("extract_last_of_two_fences", |b| {
        b.iter(|| extract_json(black_box(&chatty)))
    });

    group.finish();
}

// ─── Benchmark: Index search ────────────────────────────────────────────────

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for n in [100usize, 1000] {
        let index = build_index(n, 3072);
        let query = normalize_l2((0..3072).map(|j| (j as f32).cos()).collect());

        group.bench_function(format!("top1_of_{n}"), |b| {
            b.iter(|| index.search(black_box(&query), 1))
        });

        group.bench_function(format!("top5_of_{n}"), |b| {
            b.iter(|| index.search(black_box(&query), 5))
        });
    }

    group.finish();
}

// ─── Benchmark: Greedy matching ─────────────────────────────────────────────

fn bench_greedy_match(c: &mut Criterion) {
    let reference = token_matrix(120, 384, 0.0);
    let candidate = token_matrix(150, 384, 0.5);

    c.bench_function("greedy_match_150x120_tokens", |b| {
        b.iter(|| greedy_match(black_box(&candidate), black_box(&reference)))
    });
}

// ─── Benchmark: CSV export ──────────────────────────────────────────────────

fn bench_export(c: &mut Criterion) {
    let suite = TestSuite::from_value(suite_value(50));

    let mut group = c.benchmark_group("export");

    group.bench_function("flatten_50_cases", |b| {
        b.iter(|| flatten(black_box(&suite)))
    });

    let rows = flatten(&suite);
    group.bench_function("to_csv_50_rows", |b| b.iter(|| to_csv(black_box(&rows))));

    group.finish();
}

// ─── Main ───────────────────────────────────────────────────────────────────

criterion_group!(
    benches,
    bench_parsing,
    bench_search,
    bench_greedy_match,
    bench_export,
);
criterion_main!(benches);
