//! API endpoints
//!
//! Este módulo contiene los endpoints de la API.

pub mod bookings;
pub mod vehicles;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Crear el router principal de la API
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/vehicle", vehicles::create_vehicle_router())
        .nest("/booking", bookings::create_booking_router())
        .nest("/webhook", webhooks::create_webhook_router())
}
