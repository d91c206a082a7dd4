use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

/// `GET /fileinfo`: every known file as a JSON array.
pub async fn file_info(State(state): State<AppState>, method: Method, uri: Uri) -> AppResult<Response> {
    tracing::info!(path = %uri.path(), method = %method, source = state.listing.name(), "received HTTP request");
    if method != Method::GET {
        return Err(AppError::MethodNotAllowed);
    }

    let files = state.listing.list().await.map_err(|e| {
        tracing::error!(error = %e, "couldn't scan files");
        AppError::Internal(e)
    })?;
    let body = serde_json::to_vec(&files).map_err(|e| {
        tracing::error!(error = %e, "couldn't encode to JSON");
        AppError::Internal(e.into())
    })?;
    tracing::debug!(files = files.len(), "listing served");

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}
