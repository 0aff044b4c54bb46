use axum::{Json, body::Bytes, extract::State};
use serde::Deserialize;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::pipeline::AnalysisResult;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeBody {
    pub drug: Option<String>,
}

impl AnalyzeBody {
    /// Lenient parse: anything that is not an object with a `drug` string
    /// counts as a missing drug.
    fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

pub async fn analyze(State(state): State<AppState>, body: Bytes) -> AppResult<Json<AnalysisResult>> {
    let drug = AnalyzeBody::parse(&body)
        .drug
        .map(|drug| drug.trim().to_string())
        .filter(|drug| !drug.is_empty())
        .ok_or_else(|| AppError::Validation("Please provide 'drug' in JSON body".into()))?;

    let analyzer = state.analyzer.clone();
    let result = tokio::task::spawn_blocking(move || analyzer.analyze(&drug))
        .await
        .map_err(|e| AppError::Internal(format!("analysis task failed: {e}")))??;

    Ok(Json(result))
}
