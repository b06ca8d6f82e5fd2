//! JSON handlers for the four command services.
//!
//! Bodies carry `device_id` and `command_name` like the other service calls
//! of a home hub, rather than path parameters.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use irhub_app::ports::{Blaster, DocumentStore};
use irhub_app::services::learning::{DEFAULT_LEARN_TIMEOUT_SECS, LearnOutcome, LearnRequest};
use irhub_app::services::remote_service::AddCommand;
use irhub_domain::command::{CommandType, IrCommand};

use super::parse_device_id;
use crate::error::ApiError;
use crate::state::AppState;

fn default_timeout() -> u64 {
    DEFAULT_LEARN_TIMEOUT_SECS
}

fn one_repeat() -> u32 {
    1
}

fn parse_command_type(raw: Option<&str>) -> Result<CommandType, ApiError> {
    raw.map_or(Ok(CommandType::Ir), |raw| Ok(raw.parse()?))
}

/// Request body for `learn_command`.
#[derive(Deserialize)]
pub struct LearnCommandRequest {
    pub device_id: String,
    pub command_name: String,
    #[serde(default)]
    pub command_type: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Request body for `add_command`.
#[derive(Deserialize)]
pub struct AddCommandRequest {
    pub device_id: String,
    pub command_name: String,
    pub code: String,
    #[serde(default)]
    pub command_type: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Request body for `delete_command`.
#[derive(Deserialize)]
pub struct DeleteCommandRequest {
    pub device_id: String,
    pub command_name: String,
}

/// Request body for `send_command`.
#[derive(Deserialize)]
pub struct SendCommandRequest {
    pub device_id: String,
    pub command_name: String,
    #[serde(default = "one_repeat")]
    pub num_repeats: u32,
}

#[derive(Serialize)]
struct PendingBody {
    status: &'static str,
}

/// Possible responses from `learn_command`.
pub enum LearnResponse {
    Created(Json<IrCommand>),
    /// The capture worked but the code must be supplied with `add_command`.
    ManualEntryRequired,
}

impl IntoResponse for LearnResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::ManualEntryRequired => (
                StatusCode::ACCEPTED,
                Json(PendingBody {
                    status: "manual_entry_required",
                }),
            )
                .into_response(),
        }
    }
}

/// Possible responses from `add_command`.
pub enum AddResponse {
    Created(Json<IrCommand>),
}

impl IntoResponse for AddResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from `delete_command` and `send_command`.
pub enum DoneResponse {
    NoContent,
}

impl IntoResponse for DoneResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `POST /api/services/learn_command`
pub async fn learn_command<S, B>(
    State(state): State<AppState<S, B>>,
    Json(req): Json<LearnCommandRequest>,
) -> Result<LearnResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&req.device_id)?;
    let request = LearnRequest {
        name: req.command_name,
        command_type: parse_command_type(req.command_type.as_deref())?,
        timeout_secs: req.timeout,
        icon: req.icon,
    };
    // The lock is released while the blaster listens.
    let pending = state.service.lock().await.prepare_learn(device_id, request)?;
    let captured = pending.capture().await?;
    let outcome = state.service.lock().await.finish_learn(captured).await?;
    Ok(match outcome {
        LearnOutcome::Learned(command) => LearnResponse::Created(Json(command)),
        LearnOutcome::ManualEntryRequired => LearnResponse::ManualEntryRequired,
    })
}

/// `POST /api/services/add_command`
pub async fn add_command<S, B>(
    State(state): State<AppState<S, B>>,
    Json(req): Json<AddCommandRequest>,
) -> Result<AddResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&req.device_id)?;
    let request = AddCommand {
        name: req.command_name,
        code: req.code,
        command_type: parse_command_type(req.command_type.as_deref())?,
        icon: req.icon,
    };
    let command = state
        .service
        .lock()
        .await
        .add_command(device_id, request)
        .await?;
    Ok(AddResponse::Created(Json(command)))
}

/// `POST /api/services/delete_command`
pub async fn delete_command<S, B>(
    State(state): State<AppState<S, B>>,
    Json(req): Json<DeleteCommandRequest>,
) -> Result<DoneResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&req.device_id)?;
    state
        .service
        .lock()
        .await
        .delete_command(device_id, &req.command_name)
        .await?;
    Ok(DoneResponse::NoContent)
}

/// `POST /api/services/send_command`
pub async fn send_command<S, B>(
    State(state): State<AppState<S, B>>,
    Json(req): Json<SendCommandRequest>,
) -> Result<DoneResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&req.device_id)?;
    state
        .service
        .lock()
        .await
        .send_command(device_id, &req.command_name, req.num_repeats)
        .await?;
    Ok(DoneResponse::NoContent)
}
