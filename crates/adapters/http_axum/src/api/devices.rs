//! JSON REST handlers for devices and their configuration.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use irhub_app::ports::{Blaster, DocumentStore};
use irhub_domain::command::IrCommand;
use irhub_domain::device::{DeviceType, VirtualDevice};
use irhub_domain::entity_config::{EntityConfig, EntityKind};
use irhub_domain::error::NotFoundError;

use super::parse_device_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a device.
#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    #[serde(alias = "ir_blaster_entity_id")]
    pub blaster: String,
}

/// Request body for switching the device type.
#[derive(Deserialize)]
pub struct SetTypeRequest {
    pub device_type: String,
}

/// Request body for updating a command in place.
#[derive(Deserialize)]
pub struct UpdateCommandRequest {
    /// New icon; empty or `null` clears it.
    pub icon: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<VirtualDevice>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from endpoints returning one device.
pub enum DeviceResponse {
    Ok(Json<VirtualDevice>),
    Created(Json<VirtualDevice>),
}

impl IntoResponse for DeviceResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Possible responses from the command update endpoint.
pub enum CommandResponse {
    Ok(Json<IrCommand>),
}

impl IntoResponse for CommandResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list<S, B>(State(state): State<AppState<S, B>>) -> Result<ListResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let devices = state.service.lock().await.list_devices();
    Ok(ListResponse::Ok(Json(devices)))
}

/// `GET /api/devices/{id}`
pub async fn get<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
) -> Result<DeviceResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let device = state.service.lock().await.get_device(device_id)?;
    Ok(DeviceResponse::Ok(Json(device)))
}

/// `POST /api/devices`
pub async fn create<S, B>(
    State(state): State<AppState<S, B>>,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<DeviceResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let mut service = state.service.lock().await;
    let created = service.create_device(&req.name, &req.blaster).await?;
    Ok(DeviceResponse::Created(Json(created)))
}

/// `DELETE /api/devices/{id}`
pub async fn delete<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let removed = state.service.lock().await.remove_device(device_id).await?;
    if !removed {
        return Err(NotFoundError {
            entity: "Device",
            id,
        }
        .into());
    }
    Ok(DeleteResponse::NoContent)
}

/// `PUT /api/devices/{id}/type`
pub async fn set_type<S, B>(
    State(state): State<AppState<S, B>>,
    Path(id): Path<String>,
    Json(req): Json<SetTypeRequest>,
) -> Result<DeviceResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let device_type: DeviceType = req.device_type.parse()?;
    let device = state
        .service
        .lock()
        .await
        .set_device_type(device_id, device_type)
        .await?;
    Ok(DeviceResponse::Ok(Json(device)))
}

/// `PUT /api/devices/{id}/entities/{entity_type}`
pub async fn set_entity_config<S, B>(
    State(state): State<AppState<S, B>>,
    Path((id, entity_type)): Path<(String, String)>,
    Json(config): Json<EntityConfig>,
) -> Result<DeviceResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let kind: EntityKind = entity_type.parse()?;
    let device = state
        .service
        .lock()
        .await
        .set_entity_config(device_id, kind, config)
        .await?;
    Ok(DeviceResponse::Ok(Json(device)))
}

/// `PATCH /api/devices/{id}/commands/{name}`
pub async fn update_command<S, B>(
    State(state): State<AppState<S, B>>,
    Path((id, name)): Path<(String, String)>,
    Json(req): Json<UpdateCommandRequest>,
) -> Result<CommandResponse, ApiError>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    let device_id = parse_device_id(&id)?;
    let command = state
        .service
        .lock()
        .await
        .update_command_icon(device_id, &name, req.icon)
        .await?;
    Ok(CommandResponse::Ok(Json(command)))
}
