//! JSON REST handlers for light entities.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use irhub_app::ports::{Blaster, DocumentStore};
use irhub_domain::light::{LightStatus, TurnOn};

use super::parse_device_id;
use crate::error::ApiError;
use crate::state::AppState;

pub enum LightResponse {
    Ok(Json<LightStatus>),
}

impl IntoResponse for LightResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices/{id}/light`
pub async fn status<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
) -> Result<LightResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let status = state.service.lock().await.light_status(device_id)?;
    Ok(LightResponse::Ok(Json(status)))
}

/// `POST /api/devices/{id}/light/turn_on`
///
/// The body is optional; `{}` or no body just powers the light on.
pub async fn turn_on<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
    body: Option<Json<TurnOn>>,
) -> Result<LightResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let status = state
        .service
        .lock()
        .await
        .light_turn_on(device_id, &request)
        .await?;
    Ok(LightResponse::Ok(Json(status)))
}

/// `POST /api/devices/{id}/light/turn_off`
pub async fn turn_off<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
) -> Result<LightResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let status = state
        .service
        .lock()
        .await
        .light_turn_off(device_id)
        .await?;
    Ok(LightResponse::Ok(Json(status)))
}
