//! End-to-end stochastic-walk benchmark (spec.md §4.11): the per-step
//! neighbour-weighting and softmax-sampling loop over an ingested graph.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use substrate_core::cancel::CancellationToken;
use substrate_core::config::EngineConfig;
use substrate_core::engine::Substrate;
use substrate_core::ingest::Ingestor;
use substrate_core::walk::{WalkEngine, WalkParams};

fn seeded_engine_with_corpus(corpus: &str) -> Substrate {
    let engine = Substrate::new(EngineConfig::default()).unwrap();
    engine.seed_atoms(corpus.chars().map(|c| c as u32)).unwrap();
    Ingestor::new(&engine)
        .ingest(corpus.as_bytes(), "bench", "text/plain", &CancellationToken::new())
        .unwrap();
    engine
}

fn bench_walk_run(c: &mut Criterion) {
    let corpus = "the quick brown fox jumps over the lazy dog the quick brown fox \
        runs past the lazy dog the dog barks at the quick brown fox near the old \
        barn while the lazy dog sleeps under the quick brown fox"
        .repeat(4);
    let engine = seeded_engine_with_corpus(&corpus);
    let walk = WalkEngine::new(&engine);

    let lengths: &[usize] = &[10, 50, 200];
    let mut group = c.benchmark_group("walk_run");
    for &max_tokens in lengths {
        let params = WalkParams {
            energy: Some(1000.0),
            max_tokens: Some(max_tokens),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("max_tokens", max_tokens), &max_tokens, |b, _| {
            b.iter(|| black_box(walk.run("the", &params, &CancellationToken::new()).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_walk_run);
criterion_main!(benches);
