//! CLI entrypoint for the semantic substrate engine harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use substrate_core::cancel::CancellationToken;
use substrate_core::config::EngineConfig;
use substrate_core::engine::Substrate;
use substrate_core::ingest::Ingestor;
use substrate_core::query::QueryEngine;
use substrate_core::walk::{WalkEngine, WalkParams};
use substrate_harness::verify_invariants;

/// Operator tooling for the semantic substrate engine.
#[derive(Debug, Parser)]
#[command(name = "substrate-harness")]
#[command(about = "CLI for seeding, ingesting, querying, walking, and verifying a substrate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Seed the Unicode-scalar foundation, then ingest zero or more text
    /// files, printing the resulting atom/composition/relation counts.
    Seed {
        /// Text files to ingest after seeding (each becomes one source,
        /// tagged with its own file path).
        #[arg(long)]
        ingest: Vec<PathBuf>,
    },
    /// Ingest a single file and print the resulting report as JSON.
    Ingest {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "text/plain")]
        mime: String,
    },
    /// Run `find_related`, `find_gravitational_truth`, or
    /// `answer_question` against a freshly ingested corpus.
    Query {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        related: Option<String>,
        #[arg(long)]
        gravitational: Option<String>,
        #[arg(long)]
        question: Option<String>,
        #[arg(long, default_value_t = 1500.0)]
        min_base_elo: f64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Run an energy-bounded stochastic walk from a prompt composition.
    Walk {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        prompt: String,
        #[arg(long, default_value_t = 1.0)]
        energy: f64,
        #[arg(long, default_value_t = 200)]
        max_tokens: usize,
    },
    /// Ingest a corpus and print a JSON invariant-violation report
    /// (spec.md §8's P-NORM/P-HILBERT/P-SEQ/P-ELO).
    Verify {
        #[arg(long)]
        corpus: PathBuf,
    },
}

fn build_engine(corpus_text: Option<&str>) -> Substrate {
    let engine = Substrate::new(EngineConfig::default()).expect("default config is valid");
    let text = corpus_text.unwrap_or_default();
    engine
        .seed_atoms(text.chars().map(|c| c as u32))
        .expect("seeding an unsealed store never fails on valid codepoints");
    engine
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Seed { ingest } => {
            let mut texts = Vec::new();
            for path in &ingest {
                texts.push(std::fs::read_to_string(path).expect("read ingest file"));
            }
            let combined: String = texts.join("\n");
            let engine = build_engine(Some(&combined));
            let ingestor = Ingestor::new(&engine);
            for (path, text) in ingest.iter().zip(texts.iter()) {
                let report = ingestor
                    .ingest(
                        text.as_bytes(),
                        &path.display().to_string(),
                        "text/plain",
                        &CancellationToken::new(),
                    )
                    .expect("ingest");
                println!("{}: {:?}", path.display(), report);
            }
            println!("atoms={}", engine.atoms.len());
        }
        Command::Ingest { input, mime } => {
            let text = std::fs::read_to_string(&input).expect("read input file");
            let engine = build_engine(Some(&text));
            let report = Ingestor::new(&engine)
                .ingest(
                    text.as_bytes(),
                    &input.display().to_string(),
                    &mime,
                    &CancellationToken::new(),
                )
                .expect("ingest");
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "atoms_processed": report.atoms_processed,
                "compositions_created": report.compositions_created,
                "relations_created": report.relations_created,
                "original_bytes": report.original_bytes,
                "stored_bytes": report.stored_bytes,
                "compression_ratio": report.compression_ratio,
            })).unwrap());
        }
        Command::Query {
            corpus,
            related,
            gravitational,
            question,
            min_base_elo,
            limit,
        } => {
            let text = std::fs::read_to_string(&corpus).expect("read corpus file");
            let engine = build_engine(Some(&text));
            Ingestor::new(&engine)
                .ingest(text.as_bytes(), "corpus", "text/plain", &CancellationToken::new())
                .expect("ingest corpus");
            let query = QueryEngine::new(&engine);

            if let Some(text) = related {
                let results = query.find_related(&text, limit).expect("find_related");
                for r in results {
                    println!("{}\tconsensus_elo={}\tobservations={}", r.text, r.consensus_elo, r.observations);
                }
            }
            if let Some(text) = gravitational {
                let results = query
                    .find_gravitational_truth(&text, min_base_elo, limit)
                    .expect("find_gravitational_truth");
                for r in results {
                    println!("{}\tscore={}\tbase_elo={}", r.text, r.score, r.base_elo);
                }
            }
            if let Some(question) = question {
                let answer = query.answer_question(&question).expect("answer_question");
                println!("{}\tscore={}", answer.text, answer.score);
            }
        }
        Command::Walk {
            corpus,
            prompt,
            energy,
            max_tokens,
        } => {
            let text = std::fs::read_to_string(&corpus).expect("read corpus file");
            let engine = build_engine(Some(&text));
            Ingestor::new(&engine)
                .ingest(text.as_bytes(), "corpus", "text/plain", &CancellationToken::new())
                .expect("ingest corpus");
            let params = WalkParams {
                energy: Some(energy),
                max_tokens: Some(max_tokens),
                ..Default::default()
            };
            let result = WalkEngine::new(&engine)
                .run(&prompt, &params, &CancellationToken::new())
                .expect("walk");
            println!("{}", result.text);
            eprintln!(
                "finish_reason={:?} steps={} energy_remaining={}",
                result.finish_reason, result.steps, result.energy_remaining
            );
        }
        Command::Verify { corpus } => {
            let text = std::fs::read_to_string(&corpus).expect("read corpus file");
            let engine = build_engine(Some(&text));
            Ingestor::new(&engine)
                .ingest(text.as_bytes(), "corpus", "text/plain", &CancellationToken::new())
                .expect("ingest corpus");
            let report = verify_invariants(&engine);
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
    }
}
