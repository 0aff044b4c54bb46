pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod routes;
pub mod sources;
pub mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

pub use config::Config;

use error::AppResult;
use pipeline::Analyzer;
use report::ReportRenderer;
use sources::{ClinicalTrials, LiteratureSamples, MarketData, Patents};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub analyzer: Arc<Analyzer>,
    pub reports_dir: PathBuf,
}

impl AppState {
    /// Loads every data collection once and wires the analyzer to a renderer
    /// writing into `config.reports_dir`.
    pub fn from_config(config: Config) -> AppResult<Self> {
        let clinical = ClinicalTrials::load(&config.clinical_data_path);
        let patents = Patents::load(&config.patent_data_path);
        let market = MarketData::load(&config.market_data_path);
        let literature = LiteratureSamples::load(&config.literature_data_path);

        tracing::info!(
            trials = clinical.len(),
            patents = patents.len(),
            market_segments = ?market.segments(),
            articles = literature.len(),
            "Data sources loaded"
        );

        let reporter = ReportRenderer::new(&config.reports_dir)?;
        let reports_dir = reporter.out_dir().to_path_buf();

        let analyzer = Analyzer {
            clinical: Arc::new(clinical),
            patent: Arc::new(patents),
            market: Arc::new(market),
            literature: Arc::new(literature),
            reporter: Arc::new(reporter),
        };

        Ok(Self {
            config,
            analyzer: Arc::new(analyzer),
            reports_dir,
        })
    }
}
