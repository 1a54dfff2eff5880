use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use namesim_core::{
    AlignmentLattice, CostMatrix, LetterRules, PhonemeTokenizer, Trainer, WeightedEditDistance,
};

const PAIRS: &[(&str, &str)] = &[
    ("catherine", "katherine"),
    ("philip", "filip"),
    ("stephen", "steven"),
    ("smith", "smyth"),
    ("carl", "karl"),
    ("dallan", "allan"),
    ("ann", "roseanne"),
    ("quass", "quast"),
    ("mcdonald", "macdonald"),
    ("schwartz", "swartz"),
];

fn bench_best_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("best_path");
    let tokenizer = PhonemeTokenizer::new(Arc::new(LetterRules));
    let costs = CostMatrix::uniform(2, 10, 8);

    for &(a, b) in PAIRS.iter().take(4) {
        let (source, target) = (tokenizer.tokenize(a), tokenizer.tokenize(b));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{a}/{b}")), &(source, target), |bench, (s, t)| {
            let mut lattice = AlignmentLattice::new();
            bench.iter(|| black_box(lattice.compute_best_path(s, t, &costs)));
        });
    }

    group.finish();
}

fn bench_symmetric_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("symmetric_score");
    let tokenizer = PhonemeTokenizer::new(Arc::new(LetterRules));
    let distance = WeightedEditDistance::new(Arc::new(CostMatrix::uniform(2, 10, 8)), 1.0);
    let pairs: Vec<_> = PAIRS
        .iter()
        .map(|(a, b)| (tokenizer.tokenize(a), tokenizer.tokenize(b)))
        .collect();

    group.throughput(Throughput::Elements(pairs.len() as u64));
    group.bench_function("pairs", |bench| {
        bench.iter(|| {
            for (a, b) in &pairs {
                black_box(distance.symmetric_score(a, b));
            }
        });
    });

    group.finish();
}

fn bench_count_edits(c: &mut Criterion) {
    let tokenizer = PhonemeTokenizer::new(Arc::new(LetterRules));
    let names: Vec<(String, String)> = PAIRS
        .iter()
        .cycle()
        .take(1000)
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
    let pairs = Trainer::tokenize_pairs(&tokenizer, &names);
    let costs = CostMatrix::uniform(2, 10, 8);

    c.bench_function("count_edits_1000", |bench| {
        bench.iter(|| black_box(Trainer::count_edits(&pairs, &costs)));
    });
}

criterion_group!(benches, bench_best_path, bench_symmetric_score, bench_count_edits);
criterion_main!(benches);
