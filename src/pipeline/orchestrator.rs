use std::sync::Arc;

use opentelemetry::KeyValue;

use crate::error::AppError;
use crate::report::ReportWriter;
use crate::sources::{
    ClinicalSource, LiteratureSource, MarketInsight, MarketSource, Opportunity, PatentSource,
};
use crate::telemetry::metrics::{ANALYSES_TOTAL, ANALYSIS_DURATION, REPORT_SECTIONS};

use super::sections::{AnalysisResult, ReportSections};

/// Fans a drug name out to every lookup source and folds the answers into one
/// report. Sources are injected once and shared across calls.
#[derive(Clone)]
pub struct Analyzer {
    pub clinical: Arc<dyn ClinicalSource>,
    pub patent: Arc<dyn PatentSource>,
    pub market: Arc<dyn MarketSource>,
    pub literature: Arc<dyn LiteratureSource>,
    pub reporter: Arc<dyn ReportWriter>,
}

impl Analyzer {
    #[tracing::instrument(
        name = "pipeline analyze",
        skip(self),
        fields(
            analysis.clinical_count,
            analysis.opportunity,
            analysis.report_path,
            analysis.duration_ms,
        )
    )]
    pub fn analyze(&self, drug_name: &str) -> Result<AnalysisResult, AppError> {
        let start = std::time::Instant::now();
        let span = tracing::Span::current();

        let clinical = self.clinical.summarize(drug_name);
        let patent = self.patent.assess_opportunity(drug_name);
        let market = self.market.insight(None);
        let literature = self.literature.summarize_for_drug(drug_name);

        span.record("analysis.clinical_count", clinical.count);
        span.record("analysis.opportunity", patent.opportunity.to_string());

        let conclusion = conclusion(drug_name, patent.opportunity, &market);
        let sections = ReportSections {
            clinical: Some(clinical),
            patent: Some(patent),
            market: Some(market),
            literature: Some(literature.summary),
            conclusion: Some(conclusion),
        };

        let result = self
            .reporter
            .generate(&report_title(drug_name), &sections, None);

        let outcome = if result.is_ok() { "ok" } else { "error" };
        ANALYSES_TOTAL.add(1, &[KeyValue::new("outcome", outcome)]);

        let report_path = result?;
        let duration = start.elapsed();
        ANALYSIS_DURATION.record(duration.as_secs_f64(), &[]);
        REPORT_SECTIONS.record(sections.present_labels().len() as f64, &[]);

        span.record("analysis.report_path", report_path.display().to_string());
        span.record("analysis.duration_ms", duration.as_millis() as u64);

        tracing::info!(drug = %drug_name, report = %report_path.display(), "analysis complete");

        Ok(AnalysisResult {
            drug: drug_name.to_string(),
            sections,
            report_path: report_path.display().to_string(),
        })
    }
}

pub fn report_title(drug_name: &str) -> String {
    format!("{drug_name} - Oncology Repurposing Potential")
}

pub fn conclusion(drug_name: &str, opportunity: Opportunity, market: &MarketInsight) -> String {
    let gap_score = market
        .gap_score
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "{drug_name} shows signals from preclinical and epidemiology; clinical trials exist in oncology-related indications. \
         Patent coverage appears {opportunity}. Market gap score: {gap_score}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use serde_json::json;
    use tempfile::TempDir;

    use crate::error::AppResult;
    use crate::report::ReportRenderer;
    use crate::sources::test_support::write_fixture;
    use crate::sources::{
        ClinicalSummary, ClinicalTrials, LiteratureSamples, LiteratureSummary, MarketData,
        PatentAssessment, PatentCoverage, Patents,
    };

    #[derive(Default)]
    struct RecordingWriter {
        calls: Mutex<Vec<(String, ReportSections)>>,
    }

    impl ReportWriter for RecordingWriter {
        fn generate(
            &self,
            title: &str,
            sections: &ReportSections,
            _filename: Option<&str>,
        ) -> AppResult<PathBuf> {
            self.calls
                .lock()
                .unwrap()
                .push((title.to_string(), sections.clone()));
            Ok(PathBuf::from("/test/report.pdf"))
        }
    }

    struct FailingWriter;

    impl ReportWriter for FailingWriter {
        fn generate(&self, _: &str, _: &ReportSections, _: Option<&str>) -> AppResult<PathBuf> {
            Err(AppError::Render("disk full".into()))
        }
    }

    struct FixedClinical;
    impl ClinicalSource for FixedClinical {
        fn summarize(&self, drug_name: &str) -> ClinicalSummary {
            ClinicalSummary {
                drug: drug_name.to_string(),
                count: 2,
                ..Default::default()
            }
        }
    }

    struct FixedPatent;
    impl PatentSource for FixedPatent {
        fn assess_opportunity(&self, drug_name: &str) -> PatentAssessment {
            PatentAssessment {
                drug: drug_name.to_string(),
                patent_coverage: PatentCoverage::none_found(),
                opportunity: Opportunity::High,
                matches: Vec::new(),
            }
        }
    }

    struct FixedMarket;
    impl MarketSource for FixedMarket {
        fn insight(&self, segment: Option<&str>) -> MarketInsight {
            assert!(segment.is_none());
            serde_json::from_value(json!({"gap_score": 9.0})).unwrap()
        }
    }

    struct FixedLiterature;
    impl LiteratureSource for FixedLiterature {
        fn summarize_for_drug(&self, drug_name: &str) -> LiteratureSummary {
            LiteratureSummary {
                drug: drug_name.to_string(),
                summary: "Promising signals".to_string(),
                ..Default::default()
            }
        }
    }

    fn stub_analyzer(reporter: Arc<dyn ReportWriter>) -> Analyzer {
        Analyzer {
            clinical: Arc::new(FixedClinical),
            patent: Arc::new(FixedPatent),
            market: Arc::new(FixedMarket),
            literature: Arc::new(FixedLiterature),
            reporter,
        }
    }

    fn fixture_analyzer(data: &TempDir, reports: &Path) -> Analyzer {
        let clinical = write_fixture(
            data,
            "clinical_trials.json",
            &json!({"trials": [{
                "id": "X-001",
                "drug": "X",
                "indication": "Colorectal cancer prevention in high-risk adults",
                "phase": "Phase 2",
                "status": "Completed"
            }]}),
        );
        let patents = write_fixture(
            data,
            "patents.json",
            &json!({"patents": [{
                "patent_id": "US0000001",
                "title": "Use of X in oncology",
                "status": "Expired"
            }]}),
        );
        let market = write_fixture(
            data,
            "market_data.json",
            &json!({"market_insights": [{"segment": "Oncology", "gap_score": 7.5}]}),
        );
        let literature = write_fixture(
            data,
            "literature_samples.json",
            &json!({"articles": [{
                "pmid": "1",
                "title": "Metabolic modulators",
                "abstract": "X reduces tumour growth in mice",
                "year": 2020
            }]}),
        );

        Analyzer {
            clinical: Arc::new(ClinicalTrials::load(&clinical)),
            patent: Arc::new(Patents::load(&patents)),
            market: Arc::new(MarketData::load(&market)),
            literature: Arc::new(LiteratureSamples::load(&literature)),
            reporter: Arc::new(ReportRenderer::new(reports).unwrap()),
        }
    }

    #[test]
    fn test_analyze_with_stub_sources() {
        let writer = Arc::new(RecordingWriter::default());
        let analyzer = stub_analyzer(writer.clone());

        let result = analyzer.analyze("TestDrug").unwrap();

        assert_eq!(result.drug, "TestDrug");
        assert_eq!(result.report_path, "/test/report.pdf");
        assert_eq!(result.sections.clinical.as_ref().unwrap().count, 2);
        assert_eq!(
            result.sections.literature.as_deref(),
            Some("Promising signals")
        );

        let calls = writer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "TestDrug - Oncology Repurposing Potential");
        assert_eq!(calls[0].1, result.sections);
    }

    #[test]
    fn test_conclusion_interpolates_inputs() {
        let market: MarketInsight = serde_json::from_value(json!({"gap_score": 8.0})).unwrap();
        let text = conclusion("Metformin", Opportunity::Medium, &market);

        assert!(text.starts_with("Metformin shows signals"));
        assert!(text.contains("Patent coverage appears Medium."));
        assert!(text.ends_with("Market gap score: 8.0"));
    }

    #[test]
    fn test_conclusion_without_gap_score() {
        let text = conclusion("X", Opportunity::High, &MarketInsight::default());
        assert!(text.ends_with("Market gap score: N/A"));
    }

    #[test]
    fn test_render_failure_propagates() {
        let analyzer = stub_analyzer(Arc::new(FailingWriter));
        let err = analyzer.analyze("TestDrug").unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
    }

    #[test]
    fn test_analyze_end_to_end() {
        let data = TempDir::new().unwrap();
        let reports = TempDir::new().unwrap();
        let analyzer = fixture_analyzer(&data, reports.path());

        let result = analyzer.analyze("X").unwrap();
        let sections = &result.sections;

        assert_eq!(
            sections.present_labels(),
            vec![
                "Clinical Trials Summary",
                "Patent Landscape",
                "Market Insight",
                "Literature Synthesis",
                "Conclusion"
            ]
        );
        assert_eq!(sections.clinical.as_ref().unwrap().count, 1);
        assert_eq!(
            sections.patent.as_ref().unwrap().opportunity,
            Opportunity::Medium
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["sections"]["Market Insight"]["gap_score"], json!(7.5));
        assert!(
            value["sections"]["Literature Synthesis"]
                .as_str()
                .unwrap()
                .starts_with("Found 1 article(s).")
        );

        let conclusion = sections.conclusion.as_deref().unwrap();
        assert!(conclusion.contains("X"));
        assert!(conclusion.contains("Medium"));
        assert!(conclusion.contains("7.5"));

        let metadata = std::fs::metadata(&result.report_path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_analyze_with_empty_sources() {
        let reports = TempDir::new().unwrap();
        let analyzer = Analyzer {
            clinical: Arc::new(ClinicalTrials::load(Path::new("missing.json"))),
            patent: Arc::new(Patents::load(Path::new("missing.json"))),
            market: Arc::new(MarketData::load(Path::new("missing.json"))),
            literature: Arc::new(LiteratureSamples::load(Path::new("missing.json"))),
            reporter: Arc::new(ReportRenderer::new(reports.path()).unwrap()),
        };

        let result = analyzer.analyze("Nothing").unwrap();

        assert_eq!(result.sections.clinical.as_ref().unwrap().count, 0);
        assert_eq!(
            result.sections.patent.as_ref().unwrap().opportunity,
            Opportunity::High
        );
        assert_eq!(result.sections.market, Some(MarketInsight::default()));
        assert!(Path::new(&result.report_path).exists());
    }

    #[test]
    fn test_repeated_analysis_is_stable() {
        let data = TempDir::new().unwrap();
        let reports = TempDir::new().unwrap();
        let analyzer = fixture_analyzer(&data, reports.path());

        let first = analyzer.analyze("X").unwrap();
        let second = analyzer.analyze("X").unwrap();

        assert_eq!(
            serde_json::to_string(&first.sections).unwrap(),
            serde_json::to_string(&second.sections).unwrap()
        );
        assert_ne!(first.report_path, second.report_path);
    }
}
