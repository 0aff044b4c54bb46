//! In-memory lookup sources backed by static JSON collections.
//!
//! Every source reads its file exactly once, at construction. A file that is
//! missing or malformed leaves the source with an empty collection; queries
//! against it answer the same way they would for a drug with no matches.

pub mod clinical;
pub mod literature;
pub mod market;
pub mod patent;

use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use clinical::{ClinicalSummary, ClinicalTrials, TrialRecord};
pub use literature::{Article, LiteratureSamples, LiteratureSummary};
pub use market::{MarketData, MarketInsight};
pub use patent::{Opportunity, PatentAssessment, PatentCoverage, PatentRecord, Patents};

pub trait ClinicalSource: Send + Sync {
    fn summarize(&self, drug_name: &str) -> ClinicalSummary;
}

pub trait PatentSource: Send + Sync {
    fn assess_opportunity(&self, drug_name: &str) -> PatentAssessment;
}

pub trait MarketSource: Send + Sync {
    fn insight(&self, segment: Option<&str>) -> MarketInsight;
}

pub trait LiteratureSource: Send + Sync {
    fn summarize_for_drug(&self, drug_name: &str) -> LiteratureSummary;
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let data = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&data).map_err(|source| LoadError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Loads a collection, falling back to `T::default()` when the file cannot be
/// read or parsed.
pub(crate) fn load_or_default<T: DeserializeOwned + Default>(path: &Path, source: &str) -> T {
    match read_json(path) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(source, error = %e, "data source unavailable, using empty collection");
            T::default()
        }
    }
}

/// Case-insensitive substring test. An empty needle mentions nothing.
pub(crate) fn mentions(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}
