//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Vehicle {0} is not available")]
    VehicleUnavailable(Uuid),

    #[error("Booking {0} not found")]
    BookingNotFound(Uuid),

    #[error("Checkout session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid checkout session: {0}")]
    InvalidSession(String),

    #[error("Invalid payment gateway credentials: {0}")]
    InvalidGatewayCredentials(String),

    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                eprintln!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => {
                eprintln!("Validation error: {}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Validation Error".to_string(),
                        message: "The provided data is invalid".to_string(),
                        details: Some(json!(e)),
                        code: Some("VALIDATION_ERROR".to_string()),
                    },
                )
            }

            AppError::NotFound(msg) => {
                eprintln!("Resource not found: {}", msg);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error: "Not Found".to_string(),
                        message: msg,
                        details: None,
                        code: Some("NOT_FOUND".to_string()),
                    },
                )
            }

            AppError::Conflict(msg) => {
                eprintln!("Conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Conflict".to_string(),
                        message: msg,
                        details: None,
                        code: Some("CONFLICT".to_string()),
                    },
                )
            }

            AppError::BadRequest(msg) => {
                eprintln!("Bad request: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Bad Request".to_string(),
                        message: msg,
                        details: None,
                        code: Some("BAD_REQUEST".to_string()),
                    },
                )
            }

            AppError::Internal(msg) => {
                eprintln!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }

            AppError::ExternalApi(msg) => {
                eprintln!("External API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse {
                        error: "External API Error".to_string(),
                        message: "An error occurred while communicating with external service".to_string(),
                        details: Some(json!({ "external_api_error": msg })),
                        code: Some("EXTERNAL_API_ERROR".to_string()),
                    },
                )
            }

            AppError::VehicleUnavailable(id) => {
                eprintln!("Vehicle unavailable: {}", id);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Vehicle Unavailable".to_string(),
                        message: "The requested vehicle is not available for booking".to_string(),
                        details: Some(json!({ "vehicle_id": id.to_string() })),
                        code: Some("VEHICLE_UNAVAILABLE".to_string()),
                    },
                )
            }

            AppError::BookingNotFound(id) => {
                eprintln!("Booking not found: {}", id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse {
                        error: "Booking Not Found".to_string(),
                        message: format!("Booking with id '{}' not found", id),
                        details: None,
                        code: Some("BOOKING_NOT_FOUND".to_string()),
                    },
                )
            }

            AppError::SessionNotFound(id) => {
                eprintln!("Session not found: {}", id);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Session Not Found".to_string(),
                        message: "The checkout session does not exist. Please restart the checkout".to_string(),
                        details: Some(json!({ "session_id": id })),
                        code: Some("SESSION_NOT_FOUND".to_string()),
                    },
                )
            }

            AppError::InvalidSession(msg) => {
                eprintln!("Invalid session: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Invalid Session".to_string(),
                        message: "The checkout session is invalid. Please restart the checkout".to_string(),
                        details: Some(json!({ "reason": msg })),
                        code: Some("INVALID_SESSION".to_string()),
                    },
                )
            }

            AppError::InvalidGatewayCredentials(msg) => {
                eprintln!("Invalid gateway credentials: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorResponse {
                        error: "Invalid Gateway Credentials".to_string(),
                        message: "The payment gateway rejected the configured credentials".to_string(),
                        details: Some(json!({ "gateway_error": msg })),
                        code: Some("INVALID_GATEWAY_CREDENTIALS".to_string()),
                    },
                )
            }

            AppError::InvalidSignature(msg) => {
                eprintln!("Invalid webhook signature: {}", msg);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: "Invalid Signature".to_string(),
                        message: "The webhook signature could not be verified".to_string(),
                        details: None,
                        code: Some("INVALID_SIGNATURE".to_string()),
                    },
                )
            }

            AppError::InvalidTransition { from, to } => {
                eprintln!("Invalid transition: {} -> {}", from, to);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Invalid Transition".to_string(),
                        message: format!("Cannot transition booking from {} to {}", from, to),
                        details: None,
                        code: Some("INVALID_TRANSITION".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

/// Función helper para crear errores internos
pub fn internal_error(message: &str) -> AppError {
    AppError::Internal(message.to_string())
}
