//! N-gram extraction benchmarks (spec.md §5, component C7): the
//! significance scan over an ingested codepoint sequence.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use substrate_core::config::EngineConfig;
use substrate_core::ngram::extract_significant_ngrams;

fn repeated_corpus(words: usize) -> Vec<u32> {
    let vocabulary = ["the", "cat", "sat", "on", "mat", "dog", "ran", "fast"];
    let mut codepoints = Vec::new();
    for i in 0..words {
        let word = vocabulary[i % vocabulary.len()];
        codepoints.extend(word.chars().map(|c| c as u32));
        codepoints.push(' ' as u32);
    }
    codepoints
}

fn bench_extract_significant_ngrams(c: &mut Criterion) {
    let config = EngineConfig::default();
    let sizes: &[usize] = &[100, 1_000, 10_000];
    let mut group = c.benchmark_group("extract_significant_ngrams");

    for &words in sizes {
        let codepoints = repeated_corpus(words);
        group.throughput(Throughput::Elements(codepoints.len() as u64));
        group.bench_with_input(BenchmarkId::new("words", words), &words, |b, _| {
            b.iter(|| black_box(extract_significant_ngrams(black_box(&codepoints), &config)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract_significant_ngrams);
criterion_main!(benches);
