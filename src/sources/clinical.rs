use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ClinicalSource, load_or_default};

const EXAMPLE_LIMIT: usize = 3;
const UNKNOWN_LABEL: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalSummary {
    pub drug: String,
    pub count: usize,
    pub phases: BTreeMap<String, usize>,
    pub statuses: BTreeMap<String, usize>,
    pub examples: Vec<TrialRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct TrialsFile {
    #[serde(default)]
    trials: Vec<TrialRecord>,
}

/// Clinical trial registry loaded from a `{"trials": [...]}` document.
#[derive(Debug, Default)]
pub struct ClinicalTrials {
    trials: Vec<TrialRecord>,
}

impl ClinicalTrials {
    pub fn load(path: &Path) -> Self {
        let payload: TrialsFile = load_or_default(path, "clinical");
        Self::from_records(payload.trials)
    }

    pub fn from_records(trials: Vec<TrialRecord>) -> Self {
        Self { trials }
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Trials whose `drug` field equals `drug_name`, ignoring case.
    pub fn find_trials(&self, drug_name: &str) -> Vec<TrialRecord> {
        if drug_name.is_empty() {
            return Vec::new();
        }
        let wanted = drug_name.to_lowercase();
        self.trials
            .iter()
            .filter(|t| t.drug.as_deref().unwrap_or_default().to_lowercase() == wanted)
            .cloned()
            .collect()
    }

    #[tracing::instrument(
        name = "source clinical.summarize",
        skip(self),
        fields(source = "clinical", clinical.count)
    )]
    pub fn summarize(&self, drug_name: &str) -> ClinicalSummary {
        let trials = self.find_trials(drug_name);

        let mut phases = BTreeMap::new();
        let mut statuses = BTreeMap::new();
        for trial in &trials {
            *phases.entry(label_or_unknown(&trial.phase)).or_insert(0) += 1;
            *statuses.entry(label_or_unknown(&trial.status)).or_insert(0) += 1;
        }

        tracing::Span::current().record("clinical.count", trials.len());

        ClinicalSummary {
            drug: drug_name.to_string(),
            count: trials.len(),
            phases,
            statuses,
            examples: trials.into_iter().take(EXAMPLE_LIMIT).collect(),
        }
    }
}

impl ClinicalSource for ClinicalTrials {
    fn summarize(&self, drug_name: &str) -> ClinicalSummary {
        ClinicalTrials::summarize(self, drug_name)
    }
}

fn label_or_unknown(label: &Option<String>) -> String {
    match label.as_deref() {
        Some(l) if !l.is_empty() => l.to_string(),
        _ => UNKNOWN_LABEL.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::write_fixture;
    use serde_json::json;
    use tempfile::TempDir;

    fn fixture() -> serde_json::Value {
        json!({
            "trials": [
                {
                    "id": "TEST001",
                    "drug": "TestDrug",
                    "indication": "Test Indication",
                    "phase": "Phase 2",
                    "status": "Completed",
                    "summary": "Test summary",
                    "results": "Test results",
                    "start_date": "2020-01-01",
                    "end_date": "2021-01-01"
                },
                {
                    "id": "TEST002",
                    "drug": "TestDrug",
                    "indication": "Another Indication",
                    "phase": "Phase 3",
                    "status": "Active",
                    "start_date": "2021-01-01",
                    "end_date": null
                },
                {
                    "id": "TEST003",
                    "drug": "OtherDrug",
                    "indication": "Other Indication",
                    "phase": "Phase 1",
                    "status": "Terminated"
                }
            ]
        })
    }

    fn load_fixture(dir: &TempDir) -> ClinicalTrials {
        ClinicalTrials::load(&write_fixture(dir, "clinical_trials.json", &fixture()))
    }

    #[test]
    fn test_load_valid_data() {
        let dir = TempDir::new().unwrap();
        let trials = load_fixture(&dir);
        assert_eq!(trials.len(), 3);
        assert_eq!(trials.trials[1].end_date, None);
    }

    #[test]
    fn test_load_missing_file() {
        let trials = ClinicalTrials::load(Path::new("nonexistent.json"));
        assert!(trials.is_empty());
    }

    #[test]
    fn test_find_trials_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let trials = load_fixture(&dir);

        let found = trials.find_trials("testdrug");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id.as_deref(), Some("TEST001"));
        assert!(trials.find_trials("Test").is_empty());
    }

    #[test]
    fn test_summarize_counts_phases_and_statuses() {
        let dir = TempDir::new().unwrap();
        let summary = load_fixture(&dir).summarize("TestDrug");

        assert_eq!(summary.drug, "TestDrug");
        assert_eq!(summary.count, 2);
        assert_eq!(summary.phases.get("Phase 2"), Some(&1));
        assert_eq!(summary.phases.get("Phase 3"), Some(&1));
        assert_eq!(summary.statuses.get("Completed"), Some(&1));
        assert_eq!(summary.statuses.get("Active"), Some(&1));
        assert_eq!(summary.examples.len(), 2);
    }

    #[test]
    fn test_summarize_no_matches() {
        let dir = TempDir::new().unwrap();
        let summary = load_fixture(&dir).summarize("NonExistentDrug");

        assert_eq!(summary.count, 0);
        assert!(summary.phases.is_empty());
        assert!(summary.statuses.is_empty());
        assert!(summary.examples.is_empty());
    }

    #[test]
    fn test_missing_labels_count_as_unknown() {
        let trials = ClinicalTrials::from_records(vec![
            TrialRecord {
                drug: Some("X".into()),
                phase: Some(String::new()),
                ..Default::default()
            },
            TrialRecord {
                drug: Some("x".into()),
                status: Some("Recruiting".into()),
                ..Default::default()
            },
        ]);
        let summary = trials.summarize("X");

        assert_eq!(summary.phases.get("unknown"), Some(&2));
        assert_eq!(summary.statuses.get("unknown"), Some(&1));
        assert_eq!(summary.statuses.get("Recruiting"), Some(&1));
    }

    #[test]
    fn test_summary_totals_agree_and_examples_are_capped() {
        let records: Vec<TrialRecord> = (0..7)
            .map(|i| TrialRecord {
                id: Some(format!("T{i}")),
                drug: Some("Metformin".into()),
                phase: (i % 2 == 0).then(|| "Phase 2".to_string()),
                status: Some(if i < 4 { "Completed" } else { "Recruiting" }.into()),
                ..Default::default()
            })
            .collect();
        let summary = ClinicalTrials::from_records(records).summarize("metformin");

        assert_eq!(summary.count, 7);
        assert_eq!(summary.phases.values().sum::<usize>(), summary.count);
        assert_eq!(summary.statuses.values().sum::<usize>(), summary.count);
        assert_eq!(summary.examples.len(), 3);
        assert_eq!(summary.examples[0].id.as_deref(), Some("T0"));
    }

    #[test]
    fn test_missing_source_matches_empty_result() {
        let missing = ClinicalTrials::load(Path::new("nonexistent.json")).summarize("TestDrug");
        let empty = ClinicalTrials::default().summarize("TestDrug");
        assert_eq!(missing, empty);
    }

    #[test]
    fn test_empty_drug_name_matches_nothing() {
        let trials = ClinicalTrials::from_records(vec![TrialRecord::default()]);
        assert_eq!(trials.summarize("").count, 0);
    }
}
