//! Handlers de Vehicles
//!
//! Este módulo expone el catálogo de vehículos. Es de solo lectura: el
//! estado de reserva lo mutan únicamente las operaciones de booking.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::models::vehicle::{VehicleFilters, VehicleResponse};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles))
        .route("/:id", get(get_vehicle))
}

/// Obtener todos los vehículos con filtros
async fn list_vehicles(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> AppResult<Json<Vec<VehicleResponse>>> {
    let vehicles = state.catalog.list(&filters).await?;
    Ok(Json(vehicles.into_iter().map(VehicleResponse::from).collect()))
}

/// Obtener un vehículo por ID
async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VehicleResponse>> {
    let vehicle = state
        .catalog
        .find_by_id(id)
        .await?
        .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

    Ok(Json(VehicleResponse::from(vehicle)))
}
