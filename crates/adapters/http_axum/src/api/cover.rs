//! JSON REST handlers for cover entities.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use irhub_app::ports::{Blaster, DocumentStore};
use irhub_domain::cover::CoverStatus;

use super::parse_device_id;
use crate::error::ApiError;
use crate::state::AppState;

pub enum CoverResponse {
    Ok(Json<CoverStatus>),
}

impl IntoResponse for CoverResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices/{id}/cover`
pub async fn status<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
) -> Result<CoverResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let status = state.service.lock().await.cover_status(device_id)?;
    Ok(CoverResponse::Ok(Json(status)))
}

/// `POST /api/devices/{id}/cover/open`
pub async fn open<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
) -> Result<CoverResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let status = state.service.lock().await.cover_open(device_id).await?;
    Ok(CoverResponse::Ok(Json(status)))
}

/// `POST /api/devices/{id}/cover/close`
pub async fn close<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
) -> Result<CoverResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let status = state.service.lock().await.cover_close(device_id).await?;
    Ok(CoverResponse::Ok(Json(status)))
}

/// `POST /api/devices/{id}/cover/stop`
pub async fn stop<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
) -> Result<CoverResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let status = state.service.lock().await.cover_stop(device_id).await?;
    Ok(CoverResponse::Ok(Json(status)))
}
