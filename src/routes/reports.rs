use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::AppState;
use crate::error::{AppError, AppResult};

const NOT_FOUND: &str = "File not found";

pub async fn download_report(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !is_plain_filename(&filename) {
        tracing::warn!(filename = %filename, "rejected report path");
        return Err(AppError::NotFound(NOT_FOUND.into()));
    }

    let path = state.reports_dir.join(&filename);
    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => {}
        Ok(_) => return Err(AppError::NotFound(NOT_FOUND.into())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(NOT_FOUND.into()));
        }
        Err(e) => return Err(e.into()),
    }
    let bytes = tokio::fs::read(&path).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains(['/', '\\'])
        && !name.contains("..")
        && !name.contains('"')
}
