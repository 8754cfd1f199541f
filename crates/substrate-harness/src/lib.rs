//! Conformance testing harness for the semantic substrate engine.
//!
//! This crate provides:
//! - Fixture loading: JSON corpus/scenario definitions read by both the
//!   CLI and the test suite under `tests/`.
//! - A `harness` binary exposing `seed`, `ingest`, `query`, `walk`, and
//!   `verify` subcommands over a [`substrate_core::engine::Substrate`].
//! - An integration test (`tests/store_adapter_test.rs`) exercising
//!   `substrate_store::MemoryAdapter` directly as the reference
//!   `HostStoreAdapter`, independent of the engine's own in-memory stores.

#![forbid(unsafe_code)]

pub mod fixtures;
pub mod verify;

pub use fixtures::{IngestFixture, ScenarioFixture};
pub use verify::{VerificationReport, verify_invariants};
