pub mod orchestrator;
pub mod sections;

pub use orchestrator::Analyzer;
pub use sections::{AnalysisResult, ReportSections};
