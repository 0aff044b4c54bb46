use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{PatentSource, load_or_default, mentions};

const BLOCKING_STATUSES: [&str; 2] = ["active", "granted"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<String>,
}

impl PatentRecord {
    fn searchable_text(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or_default(),
            self.claims_summary.as_deref().unwrap_or_default()
        )
    }

    fn is_blocking(&self) -> bool {
        let status = self.status.as_deref().unwrap_or_default().to_lowercase();
        BLOCKING_STATUSES.contains(&status.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opportunity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Opportunity::High => "High",
            Opportunity::Medium => "Medium",
            Opportunity::Low => "Low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageSentinel {
    #[serde(rename = "none_found")]
    NoneFound,
}

/// Either the `"none_found"` sentinel or a tally of matched patent statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatentCoverage {
    Statuses(BTreeMap<String, usize>),
    None(CoverageSentinel),
}

impl PatentCoverage {
    pub fn none_found() -> Self {
        PatentCoverage::None(CoverageSentinel::NoneFound)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatentAssessment {
    pub drug: String,
    pub patent_coverage: PatentCoverage,
    pub opportunity: Opportunity,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<PatentRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct PatentsFile {
    #[serde(default)]
    patents: Vec<PatentRecord>,
}

/// Patent landscape loaded from a `{"patents": [...]}` document.
#[derive(Debug, Default)]
pub struct Patents {
    patents: Vec<PatentRecord>,
}

impl Patents {
    pub fn load(path: &Path) -> Self {
        let payload: PatentsFile = load_or_default(path, "patent");
        Self::from_records(payload.patents)
    }

    pub fn from_records(patents: Vec<PatentRecord>) -> Self {
        Self { patents }
    }

    pub fn len(&self) -> usize {
        self.patents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patents.is_empty()
    }

    /// Naive match of the drug name against title and claims.
    pub fn search(&self, drug_name: &str) -> Vec<PatentRecord> {
        self.patents
            .iter()
            .filter(|p| mentions(&p.searchable_text(), drug_name))
            .cloned()
            .collect()
    }

    /// No coverage rates highest; any active or granted match rates lowest.
    #[tracing::instrument(
        name = "source patent.assess_opportunity",
        skip(self),
        fields(source = "patent", patent.matches, patent.opportunity)
    )]
    pub fn assess_opportunity(&self, drug_name: &str) -> PatentAssessment {
        let matches = self.search(drug_name);
        let span = tracing::Span::current();
        span.record("patent.matches", matches.len());

        if matches.is_empty() {
            span.record("patent.opportunity", "High");
            return PatentAssessment {
                drug: drug_name.to_string(),
                patent_coverage: PatentCoverage::none_found(),
                opportunity: Opportunity::High,
                matches,
            };
        }

        let mut statuses = BTreeMap::new();
        for patent in &matches {
            let status = patent.status.clone().unwrap_or_else(|| "unknown".to_string());
            *statuses.entry(status).or_insert(0) += 1;
        }

        let opportunity = if matches.iter().any(PatentRecord::is_blocking) {
            Opportunity::Low
        } else {
            Opportunity::Medium
        };
        span.record("patent.opportunity", opportunity.to_string());

        PatentAssessment {
            drug: drug_name.to_string(),
            patent_coverage: PatentCoverage::Statuses(statuses),
            opportunity,
            matches,
        }
    }
}

impl PatentSource for Patents {
    fn assess_opportunity(&self, drug_name: &str) -> PatentAssessment {
        Patents::assess_opportunity(self, drug_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::test_support::write_fixture;
    use serde_json::json;
    use tempfile::TempDir;

    fn patent(title: &str, claims: &str, status: &str) -> PatentRecord {
        PatentRecord {
            title: Some(title.into()),
            claims_summary: Some(claims.into()),
            status: Some(status.into()),
            ..Default::default()
        }
    }

    fn fixture_patents(dir: &TempDir) -> Patents {
        let path = write_fixture(
            dir,
            "patents.json",
            &json!({
                "patents": [
                    {
                        "patent_id": "US123456A1",
                        "title": "TestDrug compositions and methods",
                        "assignee": "TestCorp",
                        "status": "Active",
                        "claims_summary": "Compositions containing TestDrug for various conditions",
                        "relevance": "Directly covers TestDrug usage"
                    },
                    {
                        "patent_id": "US789012A1",
                        "title": "Novel pharmaceutical formulations",
                        "assignee": "BigPharma",
                        "status": "Expired",
                        "claims_summary": "General pharmaceutical formulations including TestDrug derivatives",
                        "relevance": "Derivative compounds only"
                    },
                    {
                        "patent_id": "WO2020001234A1",
                        "title": "Cancer treatment methods",
                        "assignee": "SmallBio",
                        "status": "Abandoned",
                        "claims_summary": "Methods for treating cancer with various compounds",
                        "relevance": "No specific TestDrug claims"
                    }
                ]
            }),
        );
        Patents::load(&path)
    }

    #[test]
    fn test_search_matches_title_and_claims() {
        let dir = TempDir::new().unwrap();
        let patents = fixture_patents(&dir);

        let found = patents.search("testdrug");
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].patent_id.as_deref(), Some("US789012A1"));
    }

    #[test]
    fn test_assess_no_matches_is_high() {
        let dir = TempDir::new().unwrap();
        let assessment = fixture_patents(&dir).assess_opportunity("Aspirin");

        assert_eq!(assessment.opportunity, Opportunity::High);
        assert_eq!(assessment.patent_coverage, PatentCoverage::none_found());
        assert!(assessment.matches.is_empty());

        let value = serde_json::to_value(&assessment).unwrap();
        assert_eq!(value["patent_coverage"], "none_found");
        assert!(value.get("matches").is_none());
    }

    #[test]
    fn test_assess_active_match_is_low() {
        let dir = TempDir::new().unwrap();
        let assessment = fixture_patents(&dir).assess_opportunity("TestDrug");

        assert_eq!(assessment.opportunity, Opportunity::Low);
        let PatentCoverage::Statuses(statuses) = &assessment.patent_coverage else {
            panic!("expected status tally");
        };
        assert_eq!(statuses.get("Active"), Some(&1));
        assert_eq!(statuses.get("Expired"), Some(&1));
        assert_eq!(assessment.matches.len(), 2);
    }

    #[test]
    fn test_assess_granted_match_is_low() {
        let patents = Patents::from_records(vec![patent("X salts", "", "GRANTED")]);
        assert_eq!(patents.assess_opportunity("x").opportunity, Opportunity::Low);
    }

    #[test]
    fn test_assess_inactive_matches_are_medium() {
        let patents = Patents::from_records(vec![
            patent("X formulations", "", "Expired"),
            patent("Other", "Methods using X", "Abandoned"),
        ]);
        let assessment = patents.assess_opportunity("X");

        assert_eq!(assessment.opportunity, Opportunity::Medium);
        assert_eq!(assessment.matches.len(), 2);
    }

    #[test]
    fn test_missing_status_counts_as_unknown() {
        let patents = Patents::from_records(vec![PatentRecord {
            title: Some("X".into()),
            ..Default::default()
        }]);
        let assessment = patents.assess_opportunity("X");

        assert_eq!(assessment.opportunity, Opportunity::Medium);
        assert_eq!(
            assessment.patent_coverage,
            PatentCoverage::Statuses(BTreeMap::from([("unknown".to_string(), 1)]))
        );
    }

    #[test]
    fn test_load_missing_file() {
        let patents = Patents::load(Path::new("nonexistent.json"));
        assert!(patents.is_empty());
        assert_eq!(
            patents.assess_opportunity("TestDrug").opportunity,
            Opportunity::High
        );
    }

    #[test]
    fn test_coverage_roundtrips_through_json() {
        let coverage: PatentCoverage = serde_json::from_str(r#""none_found""#).unwrap();
        assert_eq!(coverage, PatentCoverage::none_found());

        let coverage: PatentCoverage = serde_json::from_str(r#"{"Expired": 2}"#).unwrap();
        assert!(matches!(coverage, PatentCoverage::Statuses(ref m) if m["Expired"] == 2));
    }
}
