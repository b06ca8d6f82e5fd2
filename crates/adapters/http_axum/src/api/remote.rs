//! JSON REST handlers for the remote view of a device.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use irhub_app::ports::{Blaster, DocumentStore};
use irhub_app::services::dispatcher::BatchReport;
use irhub_app::services::remote_service::{RemoteStatus, SendBatch};

use super::parse_device_id;
use crate::error::ApiError;
use crate::state::AppState;

fn one_repeat() -> u32 {
    1
}

/// Request body for a multi-command send.
#[derive(Deserialize)]
pub struct SendRequest {
    pub commands: Vec<String>,
    #[serde(default = "one_repeat")]
    pub num_repeats: u32,
    #[serde(default)]
    pub delay_secs: Option<f64>,
}

pub enum StatusResponse {
    Ok(Json<RemoteStatus>),
}

impl IntoResponse for StatusResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

pub enum SendResponse {
    Ok(Json<BatchReport>),
}

impl IntoResponse for SendResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices/{id}/remote`
pub async fn status<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
) -> Result<StatusResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let status = state.service.lock().await.remote_status(device_id)?;
    Ok(StatusResponse::Ok(Json(status)))
}

/// `POST /api/devices/{id}/remote/send`
pub async fn send<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
    Json(req): Json<SendRequest>,
) -> Result<SendResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let batch = SendBatch {
        commands: req.commands,
        num_repeats: req.num_repeats,
        delay_secs: req.delay_secs,
    };
    let report = state
        .service
        .lock()
        .await
        .send_batch(device_id, batch)
        .await?;
    Ok(SendResponse::Ok(Json(report)))
}
