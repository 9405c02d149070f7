//! Handlers de Webhooks
//!
//! Este módulo recibe las notificaciones asíncronas del gateway de pagos.
//! El body llega crudo porque la firma cubre los bytes exactos.

use axum::{
    body::Bytes,
    http::HeaderMap,
    extract::State,
    routing::post,
    Json, Router,
};
use serde_json::json;

use crate::services::payment_service::WebhookOutcome;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_webhook_router() -> Router<AppState> {
    Router::new().route("/payment", post(handle_payment_webhook))
}

/// Procesar un webhook del gateway de pagos
async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok());

    let outcome = state.payments.handle_webhook(signature, &body).await?;

    let body = match outcome {
        WebhookOutcome::Confirmed(booking_id) => json!({
            "received": true,
            "outcome": "confirmed",
            "booking_id": booking_id.to_string(),
        }),
        WebhookOutcome::PaymentFailed(booking_id) => json!({
            "received": true,
            "outcome": "payment_failed",
            "booking_id": booking_id.to_string(),
        }),
        WebhookOutcome::Ignored(event_type) => json!({
            "received": true,
            "outcome": "ignored",
            "event_type": event_type,
        }),
    };

    Ok(Json(body))
}
