//! Modelo de Booking
//!
//! Este módulo contiene el struct Booking y sus variantes para la API.
//! Una reserva se crea una sola vez en Pending/Pending; a partir de ahí
//! solo muta por las transiciones del ciclo de vida (nunca se borra,
//! la cancelación es un estado).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Tipo de servicio - columna TEXT `service_type`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    AirportTransfer,
    Trip,
    Rental,
}

/// Estado de la reserva - columna TEXT `status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

/// Estado del pago - columna TEXT `payment_status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

/// Booking principal - mapea exactamente a la tabla bookings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub service_type: ServiceType,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_hours: Option<i32>,
    pub total_amount: Decimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub gateway_session_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request para crear una nueva reserva
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub vehicle_id: Uuid,

    #[validate(length(min = 2, max = 100))]
    pub customer_name: String,

    #[validate(email)]
    pub customer_email: String,

    #[validate(length(min = 5, max = 30))]
    pub customer_phone: Option<String>,

    /// Tipo de servicio explícito. Los clientes legacy pueden omitirlo y
    /// mandar `service_label` en texto libre.
    pub service_type: Option<ServiceType>,

    #[validate(length(max = 100))]
    pub service_label: Option<String>,

    #[validate(length(min = 2, max = 200))]
    pub pickup_location: String,

    #[validate(length(min = 2, max = 200))]
    pub dropoff_location: String,

    pub start_date: NaiveDate,

    pub start_time: NaiveTime,

    #[validate(range(min = 1, max = 72))]
    pub duration_hours: Option<i32>,
}

/// Request para cotizar una reserva sin persistir nada
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct QuoteRequest {
    pub vehicle_id: Uuid,

    pub service_type: Option<ServiceType>,

    #[validate(length(max = 100))]
    pub service_label: Option<String>,

    #[validate(length(min = 2, max = 200))]
    pub pickup_location: String,

    #[validate(length(min = 2, max = 200))]
    pub dropoff_location: String,

    pub start_time: NaiveTime,

    #[validate(range(min = 1, max = 72))]
    pub duration_hours: Option<i32>,
}

/// Response de reserva para la API
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub vehicle_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub service_type: ServiceType,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub start_date: String,
    pub start_time: String,
    pub duration_hours: Option<i32>,
    pub total_amount: String,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub gateway_session_id: Option<String>,
    pub created_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.to_string(),
            vehicle_id: booking.vehicle_id.to_string(),
            customer_name: booking.customer_name,
            customer_email: booking.customer_email,
            service_type: booking.service_type,
            pickup_location: booking.pickup_location,
            dropoff_location: booking.dropoff_location,
            start_date: booking.start_date.to_string(),
            start_time: booking.start_time.format("%H:%M").to_string(),
            duration_hours: booking.duration_hours,
            total_amount: booking.total_amount.to_string(),
            status: booking.status,
            payment_status: booking.payment_status,
            gateway_session_id: booking.gateway_session_id,
            created_at: booking.created_at.to_rfc3339(),
        }
    }
}
