//! Repositorios de persistencia
//!
//! Este módulo define los contratos de persistencia del core y sus
//! implementaciones PostgreSQL. Toda transición de estado es un UPDATE
//! condicional sobre el estado previo esperado; el caller decide qué
//! significa perder la condición.

pub mod booking_repository;
pub mod vehicle_repository;

pub use booking_repository::BookingRepository;
pub use vehicle_repository::VehicleRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::models::vehicle::{Vehicle, VehicleFilters};
use crate::utils::errors::AppResult;

/// Contrato de persistencia del catálogo de vehículos
#[async_trait]
pub trait VehicleStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>>;

    async fn list(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>>;

    /// Reservar el vehículo solo si sigue disponible. Devuelve `false` si
    /// otro booking ganó la reserva.
    async fn try_reserve(&self, id: Uuid) -> AppResult<bool>;

    /// Liberar el vehículo solo si sigue reservado.
    async fn release(&self, id: Uuid) -> AppResult<bool>;
}

/// Contrato de persistencia de reservas
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &Booking) -> AppResult<()>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>>;

    /// Registrar la sesión de checkout y el total autoritativo. Condicional:
    /// solo sobre reservas Pending sin pago realizado; un pago Failed
    /// re-entra en Pending. Devuelve `false` si la condición no se cumple.
    async fn attach_session(&self, id: Uuid, session_id: &str, total_amount: Decimal) -> AppResult<bool>;

    /// Transición de confirmación, exactamente-una-vez. Condicional: nunca
    /// sobre un pago ya Paid ni sobre una reserva Cancelled. Devuelve
    /// `true` solo para el caller que realizó la transición.
    async fn try_mark_paid(&self, id: Uuid, gateway_payment_id: &str) -> AppResult<bool>;

    /// Marcar el pago como fallido. Condicional: solo desde Pending.
    async fn try_mark_payment_failed(&self, id: Uuid) -> AppResult<bool>;

    /// Cancelar la reserva. Condicional: solo desde Pending.
    async fn try_cancel(&self, id: Uuid) -> AppResult<bool>;

    /// Reservas Pending impagas creadas antes del corte (para el barrido)
    async fn find_expired_pending(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>>;

    /// Reservas canceladas cuyo vehículo sigue reservado y cuya gracia ya
    /// venció (para la política de liberación diferida)
    async fn find_cancelled_with_reserved_vehicle(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>>;
}
