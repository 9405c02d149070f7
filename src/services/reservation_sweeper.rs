//! Barrido de reservas expiradas
//!
//! Este módulo corre fuera del camino de los requests: cancela reservas
//! impagas abandonadas (checkouts que nunca volvieron) para que ningún
//! vehículo quede reservado indefinidamente, y libera los vehículos de
//! reservas canceladas cuando vence el período de gracia configurado.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::PricingConfig;
use crate::repositories::{BookingStore, VehicleStore};
use crate::services::booking_service::BookingService;

pub struct ReservationSweeper {
    bookings: Arc<dyn BookingStore>,
    vehicles: Arc<dyn VehicleStore>,
    booking_service: Arc<BookingService>,
    config: PricingConfig,
}

impl ReservationSweeper {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        vehicles: Arc<dyn VehicleStore>,
        booking_service: Arc<BookingService>,
        config: PricingConfig,
    ) -> Self {
        Self {
            bookings,
            vehicles,
            booking_service,
            config,
        }
    }

    /// Loop del barrido; pensado para correr en un task de fondo
    pub async fn run(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.sweep_interval_seconds));
        loop {
            interval.tick().await;
            if let Err(e) = self.sweep_once().await {
                log::error!("❌ Error en el barrido de reservas: {}", e);
            }
        }
    }

    /// Una pasada del barrido. Expuesto aparte para poder testearlo.
    pub async fn sweep_once(&self) -> crate::utils::errors::AppResult<()> {
        self.expire_abandoned().await?;
        self.release_after_grace().await?;
        Ok(())
    }

    async fn expire_abandoned(&self) -> crate::utils::errors::AppResult<()> {
        let cutoff = Utc::now() - chrono::Duration::minutes(self.config.reservation_ttl_minutes);
        let expired = self.bookings.find_expired_pending(cutoff).await?;

        if !expired.is_empty() {
            log::info!("🧹 Barrido: {} reservas impagas expiradas", expired.len());
        }

        for booking in &expired {
            // La transición sigue siendo condicional: si el pago llegó entre
            // la consulta y este punto, expire() pierde y no toca nada
            if let Err(e) = self.booking_service.expire(booking).await {
                log::error!("❌ No se pudo expirar el booking {}: {}", booking.id, e);
            }
        }
        Ok(())
    }

    async fn release_after_grace(&self) -> crate::utils::errors::AppResult<()> {
        if self.config.release_grace_minutes == 0 {
            // Liberación inmediata al cancelar; nada que hacer aquí
            return Ok(());
        }

        let cutoff = Utc::now() - chrono::Duration::minutes(self.config.release_grace_minutes);
        let candidates = self.bookings.find_cancelled_with_reserved_vehicle(cutoff).await?;

        for booking in &candidates {
            if self.vehicles.release(booking.vehicle_id).await? {
                log::info!(
                    "🔓 Vehículo {} liberado tras la gracia del booking cancelado {}",
                    booking.vehicle_id,
                    booking.id
                );
            }
        }
        Ok(())
    }
}
