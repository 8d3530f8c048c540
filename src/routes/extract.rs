use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::info;

use crate::extraction::{self, ExtractionResult};
use crate::models::AppState;
use crate::storage::TempUpload;
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/extract-text/", post(extract_text))
        .route("/extract-text", post(extract_text))
        .with_state(state)
}

pub async fn extract_text(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ExtractionResult>> {
    let mut multipart = multipart.map_err(|_| AppError::BadRequest("No file provided".to_string()))?;

    let mut upload = None;
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let mut spooled = TempUpload::create(state.config.upload.spool_dir.as_deref(), filename)?;
        while let Some(chunk) = field.chunk().await? {
            spooled.write_chunk(&chunk).await?;
        }
        upload = Some(spooled);
        break;
    }

    let Some(mut upload) = upload else {
        return Err(AppError::BadRequest("No file provided".to_string()));
    };

    let extension = extraction::extension_of(upload.filename());
    info!(filename = %upload.filename(), extension = %extension, size = upload.len(), "Received upload");

    let bytes = upload.read_all().await?;
    let result = extraction::extract_blocking(bytes, extension).await;

    info!(filename = %upload.filename(), is_error = result.is_error(), "Extraction finished");
    Ok(Json(result))
}
