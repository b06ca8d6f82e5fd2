//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod cover;
#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod light;
#[allow(clippy::missing_errors_doc)]
pub mod remote;
#[allow(clippy::missing_errors_doc)]
pub mod services;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, patch, post, put};

use irhub_app::ports::{Blaster, DocumentStore};
use irhub_domain::error::NotFoundError;
use irhub_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Parse a device id from a path or body. A malformed id cannot name an
/// existing device, so it is reported as not found.
pub(crate) fn parse_device_id(raw: &str) -> Result<DeviceId, ApiError> {
    DeviceId::from_str(raw).map_err(|_| {
        ApiError::from(NotFoundError {
            entity: "Device",
            id: raw.to_string(),
        })
    })
}

/// Build the `/api` sub-router.
pub fn routes<S, B>() -> Router<AppState<S, B>>
where
    S: DocumentStore + 'static,
    B: Blaster + 'static,
{
    Router::new()
        // Devices
        .route(
            "/devices",
            get(devices::list::<S, B>).post(devices::create::<S, B>),
        )
        .route(
            "/devices/{id}",
            get(devices::get::<S, B>).delete(devices::delete::<S, B>),
        )
        .route("/devices/{id}/type", put(devices::set_type::<S, B>))
        .route(
            "/devices/{id}/entities/{entity_type}",
            put(devices::set_entity_config::<S, B>),
        )
        .route(
            "/devices/{id}/commands/{name}",
            patch(devices::update_command::<S, B>),
        )
        // Remote
        .route("/devices/{id}/remote", get(remote::status::<S, B>))
        .route("/devices/{id}/remote/send", post(remote::send::<S, B>))
        // Light
        .route("/devices/{id}/light", get(light::status::<S, B>))
        .route("/devices/{id}/light/turn_on", post(light::turn_on::<S, B>))
        .route("/devices/{id}/light/turn_off", post(light::turn_off::<S, B>))
        // Cover
        .route("/devices/{id}/cover", get(cover::status::<S, B>))
        .route("/devices/{id}/cover/open", post(cover::open::<S, B>))
        .route("/devices/{id}/cover/close", post(cover::close::<S, B>))
        .route("/devices/{id}/cover/stop", post(cover::stop::<S, B>))
        // Services
        .route(
            "/services/learn_command",
            post(services::learn_command::<S, B>),
        )
        .route("/services/add_command", post(services::add_command::<S, B>))
        .route(
            "/services/delete_command",
            post(services::delete_command::<S, B>),
        )
        .route(
            "/services/send_command",
            post(services::send_command::<S, B>),
        )
}
