//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle del catálogo y su ficha de
//! precios. El catálogo es de solo lectura para el core de bookings;
//! el único campo que el core muta es `status` (reserva/liberación).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use uuid::Uuid;

/// Estado del vehículo - columna TEXT `status`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Available,
    Reserved,
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub price_airport_transfer: Option<Decimal>,
    pub price_trip_base: Option<Decimal>,
    pub price_6_hours: Option<Decimal>,
    pub price_12_hours: Option<Decimal>,
    pub price_per_hour: Option<Decimal>,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ficha de precios de un vehículo - lo único que el motor de precios conoce
#[derive(Debug, Clone, Default)]
pub struct PriceSheet {
    pub airport_transfer: Option<Decimal>,
    pub trip_base: Option<Decimal>,
    pub six_hours: Option<Decimal>,
    pub twelve_hours: Option<Decimal>,
    pub per_hour: Option<Decimal>,
}

impl From<&Vehicle> for PriceSheet {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            airport_transfer: vehicle.price_airport_transfer,
            trip_base: vehicle.price_trip_base,
            six_hours: vehicle.price_6_hours,
            twelve_hours: vehicle.price_12_hours,
            per_hour: vehicle.price_per_hour,
        }
    }
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Deserialize)]
pub struct VehicleFilters {
    pub status: Option<VehicleStatus>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Response de vehículo para la API
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price_airport_transfer: Option<String>,
    pub price_trip_base: Option<String>,
    pub price_6_hours: Option<String>,
    pub price_12_hours: Option<String>,
    pub price_per_hour: Option<String>,
    pub status: VehicleStatus,
    pub created_at: String,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id.to_string(),
            name: vehicle.name,
            category: vehicle.category,
            price_airport_transfer: vehicle.price_airport_transfer.map(|p| p.to_string()),
            price_trip_base: vehicle.price_trip_base.map(|p| p.to_string()),
            price_6_hours: vehicle.price_6_hours.map(|p| p.to_string()),
            price_12_hours: vehicle.price_12_hours.map(|p| p.to_string()),
            price_per_hour: vehicle.price_per_hour.map(|p| p.to_string()),
            status: vehicle.status,
            created_at: vehicle.created_at.to_rfc3339(),
        }
    }
}
