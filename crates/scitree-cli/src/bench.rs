//! scitree Benchmark Binary
//!
//! Measures corpus assembly, full-matrix scoring and ranking on synthetic
//! corpora of different sizes (1,000, 10,000, 50,000 documents).
//! Run with: `cargo run --bin scitree-bench --release`

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Utc;
use scitree_core::Document;
use scitree_index::{Corpus, SectionRows};
use scitree_query::rank;

const DIM: usize = 384;
const NUM_QUERIES: usize = 50;
const TOP_K: usize = 10;

// ---------------------------------------------------------------------------
// Synthetic data generation
// ---------------------------------------------------------------------------

/// xorshift64*; deterministic so runs are comparable.
struct Rng(u64);

impl Rng {
    fn next_f32(&mut self) -> f32 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        let bits = self.0.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 40;
        bits as f32 / (1u64 << 24) as f32 - 0.5
    }

    fn unit_vector(&mut self) -> Vec<f32> {
        let mut v: Vec<f32> = (0..DIM).map(|_| self.next_f32()).collect();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(f32::EPSILON);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

fn generate_document(i: usize) -> Document {
    let year = 1995 + i % 30;
    let id = if year < 2007 {
        format!("astro-ph/{:02}{:02}{:03}", year % 100, 1 + i % 12, i % 1000)
    } else {
        format!("{:02}{:02}.{:05}", year % 100, 1 + i % 12, i % 100_000)
    };
    Document {
        id: id.clone(),
        abstract_text: format!("Synthetic abstract {i}."),
        conclusions: format!("Synthetic conclusions {i}."),
        source: id,
        title: format!("Paper {i}"),
        n_citation: (i % 500) as u64,
        ..Document::default()
    }
}

/// `n` documents with two sections each, except every third document which
/// has an abstract only.
fn generate_corpus(n: usize, rng: &mut Rng) -> (Vec<Document>, Vec<f32>, BTreeMap<String, SectionRows>) {
    let mut matrix = Vec::with_capacity(n * 2 * DIM);
    let mut mapping = BTreeMap::new();
    let mut documents = Vec::with_capacity(n);
    let mut row = 0;
    for i in 0..n {
        let mut doc = generate_document(i);
        if mapping.contains_key(&doc.id) {
            doc.id = format!("{}v{i}", doc.id);
        }
        matrix.extend(rng.unit_vector());
        let abstract_row = Some(row);
        row += 1;
        let conclusions = if i % 3 == 0 {
            None
        } else {
            matrix.extend(rng.unit_vector());
            row += 1;
            Some(row - 1)
        };
        mapping.insert(
            doc.id.clone(),
            SectionRows {
                abstract_row,
                conclusions,
            },
        );
        documents.push(doc);
    }
    (documents, matrix, mapping)
}

// ---------------------------------------------------------------------------
// Percentile computation
// ---------------------------------------------------------------------------

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    let idx = if idx == 0 { 0 } else { idx - 1 };
    sorted[idx.min(sorted.len() - 1)]
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn format_duration_us(us: f64) -> String {
    if us >= 1_000_000.0 {
        format!("{:.1} s", us / 1_000_000.0)
    } else if us >= 1_000.0 {
        format!("{:.1} ms", us / 1_000.0)
    } else {
        format!("{:.0} us", us)
    }
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1_024 * 1_024 {
        format!("{:.1} MB", bytes as f64 / (1_024.0 * 1_024.0))
    } else {
        format!("{:.0} KB", bytes as f64 / 1_024.0)
    }
}

fn format_scale(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{}M", n / 1_000_000)
    } else if n >= 1_000 {
        format!("{}K", n / 1_000)
    } else {
        n.to_string()
    }
}

// ---------------------------------------------------------------------------
// Benchmark results
// ---------------------------------------------------------------------------

type MetricRow = (&'static str, fn(&ScaleResult) -> f64);

#[derive(Default)]
struct ScaleResult {
    build_us: f64,
    score_p50_us: f64,
    score_p95_us: f64,
    score_p99_us: f64,
    rank_p50_us: f64,
    rank_p95_us: f64,
    rank_p99_us: f64,
    matrix_bytes: usize,
}

fn summarize(mut latencies: Vec<f64>) -> (f64, f64, f64) {
    latencies.sort_by(f64::total_cmp);
    (
        percentile(&latencies, 50.0),
        percentile(&latencies, 95.0),
        percentile(&latencies, 99.0),
    )
}

// ---------------------------------------------------------------------------
// Benchmark runner for a single scale
// ---------------------------------------------------------------------------

fn run_benchmark(n: usize) -> ScaleResult {
    let mut rng = Rng(0x9E37_79B9_7F4A_7C15 ^ n as u64);
    let (documents, matrix, mapping) = generate_corpus(n, &mut rng);
    let mut result = ScaleResult {
        matrix_bytes: matrix.len() * std::mem::size_of::<f32>(),
        ..ScaleResult::default()
    };

    // --- Corpus assembly (validation included) ---
    let start = Instant::now();
    let corpus = Corpus::from_parts(documents, matrix, DIM, mapping)
        .expect("synthetic corpus should be valid");
    result.build_us = start.elapsed().as_micros() as f64;

    let queries: Vec<Vec<f32>> = (0..NUM_QUERIES).map(|_| rng.unit_vector()).collect();

    // --- Best-section scoring ---
    let mut score_latencies = Vec::with_capacity(NUM_QUERIES);
    let mut scored = Vec::with_capacity(NUM_QUERIES);
    for query in &queries {
        let start = Instant::now();
        let hits = corpus
            .index
            .best_sections(query)
            .expect("query dimension matches the corpus");
        score_latencies.push(start.elapsed().as_micros() as f64);
        scored.push(hits);
    }
    (result.score_p50_us, result.score_p95_us, result.score_p99_us) = summarize(score_latencies);

    // --- Ranking ---
    let mut rank_latencies = Vec::with_capacity(NUM_QUERIES);
    for mut hits in scored {
        let start = Instant::now();
        rank(&mut hits, TOP_K);
        rank_latencies.push(start.elapsed().as_micros() as f64);
        assert!(hits.len() <= TOP_K);
    }
    (result.rank_p50_us, result.rank_p95_us, result.rank_p99_us) = summarize(rank_latencies);

    result
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let scales: &[usize] = &[1_000, 10_000, 50_000];

    println!();
    println!("scitree Benchmark");
    println!("=================");
    println!(
        "Platform: {} {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    println!("Date: {}", Utc::now().format("%Y-%m-%d"));
    println!("Embedding dimension: {DIM}");
    println!();

    eprint!("Warming up... ");
    let _ = run_benchmark(100);
    eprintln!("done.");
    println!();

    let mut results: Vec<(usize, ScaleResult)> = Vec::new();
    for &n in scales {
        eprint!("Benchmarking {} docs... ", n);
        let start = Instant::now();
        let result = run_benchmark(n);
        eprintln!("done in {:.1}s", start.elapsed().as_secs_f64());
        results.push((n, result));
    }

    println!();

    let col0 = 22;
    let colw = 14;

    print!("| {:col0$}", "Operation");
    for &n in scales {
        print!("| {:>colw$}", format!("{} docs", format_scale(n)));
    }
    println!("|");

    print!("|{}", "-".repeat(col0 + 1));
    for _ in scales {
        print!("|{}", "-".repeat(colw + 1));
    }
    println!("|");

    let rows: Vec<MetricRow> = vec![
        ("Corpus Build", |r: &ScaleResult| r.build_us),
        ("Score (p50)", |r: &ScaleResult| r.score_p50_us),
        ("Score (p95)", |r: &ScaleResult| r.score_p95_us),
        ("Score (p99)", |r: &ScaleResult| r.score_p99_us),
        ("Rank top-10 (p50)", |r: &ScaleResult| r.rank_p50_us),
        ("Rank top-10 (p95)", |r: &ScaleResult| r.rank_p95_us),
        ("Rank top-10 (p99)", |r: &ScaleResult| r.rank_p99_us),
    ];
    for (label, getter) in &rows {
        print!("| {:col0$}", label);
        for (_, r) in &results {
            print!("| {:>colw$}", format_duration_us(getter(r)));
        }
        println!("|");
    }

    print!("| {:col0$}", "Matrix Size");
    for (_, r) in &results {
        print!("| {:>colw$}", format_size(r.matrix_bytes));
    }
    println!("|");

    println!();
}
