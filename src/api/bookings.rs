//! Handlers de Bookings
//!
//! Este módulo maneja el flujo de reservas: cotización, creación,
//! checkout y la confirmación de respaldo que consulta la página de
//! retorno del pago.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::{BookingResponse, CreateBookingRequest, QuoteRequest, ServiceType};
use crate::services::payment_service::{CheckoutSessionResponse, ConfirmationResult};
use crate::services::pricing_service::PriceBreakdownResponse;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/quote", post(quote_booking))
        .route("/", post(create_booking))
        .route("/:id", get(get_booking))
        .route("/:id/checkout", post(create_checkout))
        .route("/:id/confirm", get(confirm_booking))
        .route("/:id/cancel", post(cancel_booking))
}

/// Response de cotización
#[derive(Debug, Serialize)]
struct QuoteResponse {
    vehicle_id: String,
    vehicle_name: String,
    service_type: ServiceType,
    breakdown: PriceBreakdownResponse,
}

/// Cotizar una reserva sin persistir nada
async fn quote_booking(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> AppResult<Json<QuoteResponse>> {
    request.validate().map_err(AppError::Validation)?;

    let (vehicle, service_type, breakdown) = state.bookings.quote(&request).await?;

    Ok(Json(QuoteResponse {
        vehicle_id: vehicle.id.to_string(),
        vehicle_name: vehicle.name,
        service_type,
        breakdown: PriceBreakdownResponse::from(&breakdown),
    }))
}

/// Crear una nueva reserva (Pending, con el vehículo reservado)
async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<BookingResponse>)> {
    request.validate().map_err(AppError::Validation)?;

    let booking = state.bookings.create(&request).await?;
    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// Obtener una reserva por ID
async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let booking = state.bookings.get(id).await?;
    Ok(Json(BookingResponse::from(booking)))
}

/// Crear la sesión de checkout en el gateway para una reserva
async fn create_checkout(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CheckoutSessionResponse>> {
    let session = state.payments.create_checkout_session(id).await?;
    Ok(Json(session))
}

/// Confirmación de respaldo desde la página de retorno del pago.
///
/// Devuelve 200 tanto para CONFIRMED como para PENDING; PENDING no es un
/// error, el cliente simplemente vuelve a consultar.
async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = state.payments.confirm_fallback(id).await?;

    let body = match result {
        ConfirmationResult::Confirmed(booking) | ConfirmationResult::AlreadyConfirmed(booking) => json!({
            "status": "CONFIRMED",
            "booking": BookingResponse::from(booking),
        }),
        ConfirmationResult::PaymentPending => json!({
            "status": "PENDING",
            "message": "Payment not completed yet. Poll again shortly",
        }),
    };

    Ok(Json(body))
}

/// Cancelar una reserva Pending
async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let booking = state.bookings.cancel(id).await?;
    Ok(Json(BookingResponse::from(booking)))
}
