//! PDF rendering of an analysis.
//!
//! Sections are rendered in a fixed order driven by the known labels, never
//! by iterating the input. Charts go through scratch PNG files that are
//! released once the document bytes exist.

pub mod chart;
pub mod layout;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::pipeline::ReportSections;
use crate::pipeline::sections::{
    CLINICAL_SECTION, CONCLUSION_SECTION, LITERATURE_SECTION, MARKET_SECTION, PATENT_SECTION,
};
use crate::sources::{ClinicalSummary, MarketInsight, PatentAssessment, TrialRecord};
use crate::telemetry::metrics::{REPORT_CHARTS, REPORT_SIZE_BYTES};

use chart::{BAR_PALETTE, CHART_DPI, MAX_CATEGORIES, PIE_PALETTE, ScratchImage, palette_color};
use layout::{DARK_BLUE, Fonts, PageCursor};

const TITLE_SIZE: f32 = 18.0;
const HEADER_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 10.0;
const LEGEND_SIZE: f32 = 9.0;
const TABLE_ROW_LIMIT: usize = 5;
const INDICATION_LIMIT: usize = 30;
const TABLE_WIDTHS_MM: [f32; 4] = [30.48, 63.5, 25.4, 33.02];

pub trait ReportWriter: Send + Sync {
    fn generate(
        &self,
        title: &str,
        sections: &ReportSections,
        filename: Option<&str>,
    ) -> AppResult<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct ReportRenderer {
    out_dir: PathBuf,
    scratch_dir: Option<PathBuf>,
}

impl ReportRenderer {
    /// Creates the output directory if it does not exist yet.
    pub fn new(out_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let out_dir = out_dir.into();
        std::fs::create_dir_all(&out_dir)?;
        Ok(Self {
            out_dir,
            scratch_dir: None,
        })
    }

    /// Writes chart scratch files into `dir` instead of the system temp
    /// directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    #[tracing::instrument(
        name = "report generate",
        skip(self, sections),
        fields(
            report.sections = sections.present_labels().len(),
            report.pages,
            report.charts,
            report.bytes,
        )
    )]
    pub fn generate(
        &self,
        title: &str,
        sections: &ReportSections,
        filename: Option<&str>,
    ) -> AppResult<PathBuf> {
        let filename = filename.map_or_else(default_filename, str::to_string);
        let out_path = self.out_dir.join(filename);

        let mut builder = ReportBuilder::new(title, self.scratch_dir.as_deref())?;
        builder.header(title);

        if let Some(clinical) = &sections.clinical {
            builder.clinical(clinical)?;
        }
        if let Some(patent) = &sections.patent {
            builder.patent(patent)?;
        }
        if let Some(market) = &sections.market {
            builder.market(market);
        }
        if let Some(literature) = &sections.literature {
            builder.plain(LITERATURE_SECTION, literature);
        }
        if let Some(conclusion) = &sections.conclusion {
            builder.plain(CONCLUSION_SECTION, conclusion);
        }

        let pages = builder.cursor.pages();
        let charts = builder.scratch.len();
        let (bytes, scratch) = builder.finish()?;
        std::fs::write(&out_path, &bytes)?;

        for image in scratch {
            image.release();
        }

        let span = tracing::Span::current();
        span.record("report.pages", pages);
        span.record("report.charts", charts);
        span.record("report.bytes", bytes.len());
        REPORT_SIZE_BYTES.record(bytes.len() as f64, &[]);
        REPORT_CHARTS.add(charts as u64, &[]);

        tracing::info!(path = %out_path.display(), pages, charts, "report written");

        Ok(out_path)
    }
}

impl ReportWriter for ReportRenderer {
    fn generate(
        &self,
        title: &str,
        sections: &ReportSections,
        filename: Option<&str>,
    ) -> AppResult<PathBuf> {
        ReportRenderer::generate(self, title, sections, filename)
    }
}

/// `report_<UTC timestamp>_<token>.pdf`; the token keeps concurrent reports
/// generated within the same second apart.
pub fn default_filename() -> String {
    let token: String = std::iter::repeat_with(fastrand::alphanumeric)
        .take(6)
        .collect();
    format!(
        "report_{}_{}.pdf",
        Utc::now().format("%Y%m%d%H%M%S"),
        token.to_lowercase()
    )
}

/// Indication text for the trials table, cut at 30 characters.
pub fn truncate_indication(indication: Option<&str>) -> String {
    match indication {
        Some(text) if text.chars().count() > INDICATION_LIMIT => {
            let head: String = text.chars().take(INDICATION_LIMIT).collect();
            format!("{head}...")
        }
        Some(text) => text.to_string(),
        None => "N/A".to_string(),
    }
}

pub fn trial_rows(examples: &[TrialRecord]) -> Vec<Vec<String>> {
    let header = ["Trial ID", "Indication", "Phase", "Status"]
        .iter()
        .map(|h| h.to_string())
        .collect();

    std::iter::once(header)
        .chain(examples.iter().take(TABLE_ROW_LIMIT).map(|trial| {
            vec![
                or_na(&trial.id),
                truncate_indication(trial.indication.as_deref()),
                or_na(&trial.phase),
                or_na(&trial.status),
            ]
        }))
        .collect()
}

fn or_na(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "N/A".to_string())
}

fn or_na_number(value: &Option<serde_json::Number>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "N/A".to_string())
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn status_counts(patent: &PatentAssessment) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in &patent.matches {
        let status = record.status.clone().unwrap_or_else(|| "Unknown".to_string());
        *counts.entry(status).or_insert(0) += 1;
    }
    counts
}

struct ReportBuilder {
    cursor: PageCursor,
    fonts: Fonts,
    scratch_dir: Option<PathBuf>,
    scratch: Vec<ScratchImage>,
}

impl ReportBuilder {
    fn new(title: &str, scratch_dir: Option<&Path>) -> AppResult<Self> {
        let (cursor, fonts) = PageCursor::new(title)?;
        Ok(Self {
            cursor,
            fonts,
            scratch_dir: scratch_dir.map(Path::to_path_buf),
            scratch: Vec::new(),
        })
    }

    fn header(&mut self, title: &str) {
        self.cursor
            .colored_line(title, TITLE_SIZE, &self.fonts.bold, DARK_BLUE);
        self.cursor.space(4.0);
        let generated = format!("Generated: {} UTC", Utc::now().format("%Y-%m-%d %H:%M:%S"));
        self.cursor.line(&generated, BODY_SIZE, &self.fonts.regular);
        self.cursor.space(7.0);
    }

    fn section_header(&mut self, label: &str) {
        self.cursor.space(5.0);
        self.cursor
            .colored_line(label, HEADER_SIZE, &self.fonts.bold, DARK_BLUE);
        self.cursor.space(2.0);
    }

    fn body(&mut self, text: &str) {
        self.cursor.paragraph(text, BODY_SIZE, &self.fonts.regular);
    }

    fn chart(
        &mut self,
        title: &str,
        raster: &image::RgbImage,
        legend: Vec<(String, [u8; 3])>,
    ) -> AppResult<()> {
        let scratch = ScratchImage::write(raster, self.scratch_dir.as_deref())?;
        let embedded = scratch.load();
        self.scratch.push(scratch);
        let embedded = embedded?;

        self.cursor.line(title, BODY_SIZE + 1.0, &self.fonts.bold);
        self.cursor.image(&embedded, CHART_DPI);
        for (label, color) in legend {
            self.cursor
                .legend_entry(&label, color, LEGEND_SIZE, &self.fonts.regular);
        }
        self.cursor.space(4.0);
        Ok(())
    }

    fn clinical(&mut self, clinical: &ClinicalSummary) -> AppResult<()> {
        self.section_header(CLINICAL_SECTION);
        self.body(&format!(
            "Total Trials: {}\nPhase Distribution: {}\nStatus Distribution: {}",
            clinical.count,
            to_json(&clinical.phases),
            to_json(&clinical.statuses)
        ));
        self.cursor.space(4.0);

        if !clinical.phases.is_empty() {
            let total: usize = clinical.phases.values().sum();
            let legend = clinical
                .phases
                .iter()
                .enumerate()
                .map(|(i, (phase, count))| {
                    let share = *count as f64 * 100.0 / total as f64;
                    (
                        format!("{phase}: {count} ({share:.1}%)"),
                        palette_color(&PIE_PALETTE, i),
                    )
                })
                .collect();
            self.chart(
                "Clinical Trial Phase Distribution",
                &chart::pie_chart(&clinical.phases),
                legend,
            )?;
        }

        if !clinical.examples.is_empty() {
            let rows = trial_rows(&clinical.examples);
            self.cursor.table(&rows, &TABLE_WIDTHS_MM, &self.fonts);
            self.cursor.space(4.0);
        }
        Ok(())
    }

    fn patent(&mut self, patent: &PatentAssessment) -> AppResult<()> {
        self.section_header(PATENT_SECTION);
        self.body(&format!(
            "Opportunity Level: {}\nPatent Coverage: {}",
            patent.opportunity,
            to_json(&patent.patent_coverage)
        ));
        self.cursor.space(4.0);

        if !patent.matches.is_empty() {
            let counts = chart::fold_categories(&status_counts(patent), MAX_CATEGORIES);
            let legend = counts
                .iter()
                .enumerate()
                .map(|(i, (status, count))| {
                    (format!("{status}: {count}"), palette_color(&BAR_PALETTE, i))
                })
                .collect();
            self.chart(
                "Patent Status Distribution",
                &chart::bar_chart(&counts),
                legend,
            )?;
        }
        Ok(())
    }

    fn market(&mut self, market: &MarketInsight) {
        self.section_header(MARKET_SECTION);
        self.body(&format!(
            "Segment: {}\nGap Score: {}/10\nMarket Size: ${}M\nStrategy: {}\n\nRationale: {}",
            or_na(&market.segment),
            or_na_number(&market.gap_score),
            or_na_number(&market.estimated_addressable_market_usd_m),
            or_na(&market.recommended_strategy),
            or_na(&market.rationale),
        ));
        self.cursor.space(4.0);
    }

    fn plain(&mut self, label: &str, text: &str) {
        self.section_header(label);
        self.body(text);
        self.cursor.space(4.0);
    }

    /// Returns the document bytes along with the scratch charts still to be
    /// released.
    fn finish(self) -> AppResult<(Vec<u8>, Vec<ScratchImage>)> {
        let bytes = self.cursor.finish()?;
        Ok((bytes, self.scratch))
    }
}
