use serde::{Deserialize, Serialize};

use crate::sources::{ClinicalSummary, MarketInsight, PatentAssessment};

pub const CLINICAL_SECTION: &str = "Clinical Trials Summary";
pub const PATENT_SECTION: &str = "Patent Landscape";
pub const MARKET_SECTION: &str = "Market Insight";
pub const LITERATURE_SECTION: &str = "Literature Synthesis";
pub const CONCLUSION_SECTION: &str = "Conclusion";

/// The fixed set of report sections, keyed by their display labels on the
/// wire. Any other keys are ignored when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSections {
    #[serde(rename = "Clinical Trials Summary", skip_serializing_if = "Option::is_none")]
    pub clinical: Option<ClinicalSummary>,
    #[serde(rename = "Patent Landscape", skip_serializing_if = "Option::is_none")]
    pub patent: Option<PatentAssessment>,
    #[serde(rename = "Market Insight", skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketInsight>,
    #[serde(rename = "Literature Synthesis", skip_serializing_if = "Option::is_none")]
    pub literature: Option<String>,
    #[serde(rename = "Conclusion", skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
}

impl ReportSections {
    /// Labels of the sections that are present, in render order.
    pub fn present_labels(&self) -> Vec<&'static str> {
        [
            (CLINICAL_SECTION, self.clinical.is_some()),
            (PATENT_SECTION, self.patent.is_some()),
            (MARKET_SECTION, self.market.is_some()),
            (LITERATURE_SECTION, self.literature.is_some()),
            (CONCLUSION_SECTION, self.conclusion.is_some()),
        ]
        .into_iter()
        .filter_map(|(label, present)| present.then_some(label))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub drug: String,
    pub sections: ReportSections,
    pub report_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_keys_are_ignored() {
        let sections: ReportSections = serde_json::from_value(json!({
            "Section 1": "Content for section 1",
            "Conclusion": "Promising repurposing opportunity"
        }))
        .unwrap();

        assert_eq!(
            sections.conclusion.as_deref(),
            Some("Promising repurposing opportunity")
        );
        assert_eq!(sections.present_labels(), vec![CONCLUSION_SECTION]);
    }

    #[test]
    fn test_serializes_with_display_labels() {
        let sections = ReportSections {
            literature: Some("Found 1 article(s).".into()),
            conclusion: Some("Done".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&sections).unwrap();

        assert_eq!(value[LITERATURE_SECTION], "Found 1 article(s).");
        assert_eq!(value[CONCLUSION_SECTION], "Done");
        assert!(value.get(CLINICAL_SECTION).is_none());
    }

    #[test]
    fn test_empty_sections_have_no_labels() {
        assert!(ReportSections::default().present_labels().is_empty());
    }
}
