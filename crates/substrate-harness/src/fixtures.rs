//! Fixture loading and management.
//!
//! A fixture is a small JSON document describing one corpus and the
//! assertions to run against it after ingestion — the shape the `harness
//! verify` subcommand and the scenario tests under `tests/` both consume.

use serde::{Deserialize, Serialize};

/// One document to ingest, tagged with its source identifier for
/// surgical-deletion tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFixture {
    pub source_identifier: String,
    pub mime: String,
    pub text: String,
}

/// A named end-to-end scenario: a corpus plus the expectations to check
/// after ingesting it (spec.md §8's end-to-end scenarios 1-6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFixture {
    pub name: String,
    pub documents: Vec<IngestFixture>,
    /// Composition text expected to exist with at least this many
    /// sequence occurrences, if any.
    #[serde(default)]
    pub expect_composition_occurrences: Option<(String, usize)>,
    /// Relation `(left, right)` text pair expected to exist with
    /// `observations >= expect_min_observations`.
    #[serde(default)]
    pub expect_relation: Option<(String, String)>,
    #[serde(default)]
    pub expect_min_observations: u64,
}

impl ScenarioFixture {
    /// Load a scenario set from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_round_trips_through_json() {
        let fixture = ScenarioFixture {
            name: "cat-sat-mat".into(),
            documents: vec![IngestFixture {
                source_identifier: "doc-1".into(),
                mime: "text/plain".into(),
                text: "the cat sat on the mat".into(),
            }],
            expect_composition_occurrences: Some(("the".into(), 2)),
            expect_relation: Some(("the".into(), "cat".into())),
            expect_min_observations: 1,
        };
        let json = fixture.to_json().unwrap();
        let parsed = ScenarioFixture::from_json(&json).unwrap();
        assert_eq!(parsed.name, fixture.name);
        assert_eq!(parsed.documents.len(), 1);
    }
}
