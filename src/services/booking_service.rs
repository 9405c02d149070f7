//! Ciclo de vida de reservas
//!
//! Este módulo es el dueño de las transiciones de estado de Booking y
//! Vehicle: creación con reserva del vehículo, confirmación de pago
//! exactamente-una-vez, fallo de pago y cancelación con liberación.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::models::booking::{
    Booking, BookingStatus, CreateBookingRequest, PaymentStatus, QuoteRequest, ServiceType,
};
use crate::models::vehicle::{PriceSheet, Vehicle};
use crate::repositories::{BookingStore, VehicleStore};
use crate::services::classifier_service::ServiceClassifier;
use crate::services::notification_service::Notifier;
use crate::services::pricing_service::{PriceBreakdown, PricingEngine};
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct BookingService {
    bookings: Arc<dyn BookingStore>,
    vehicles: Arc<dyn VehicleStore>,
    engine: PricingEngine,
    classifier: Arc<dyn ServiceClassifier>,
    notifier: Arc<dyn Notifier>,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        vehicles: Arc<dyn VehicleStore>,
        engine: PricingEngine,
        classifier: Arc<dyn ServiceClassifier>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            bookings,
            vehicles,
            engine,
            classifier,
            notifier,
        }
    }

    pub fn engine(&self) -> &PricingEngine {
        &self.engine
    }

    /// Resolver el tipo de servicio: enum explícito del caller, o la
    /// heurística legacy de texto si el request viene sin él
    fn resolve_service_type(
        &self,
        explicit: Option<ServiceType>,
        label: Option<&str>,
        pickup: &str,
        dropoff: &str,
    ) -> ServiceType {
        match explicit {
            Some(service_type) => service_type,
            None => self.classifier.classify(label, pickup, dropoff),
        }
    }

    /// Buscar una reserva por id
    pub async fn get(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(AppError::BookingNotFound(booking_id))
    }

    /// Cotizar una reserva sin persistir nada
    pub async fn quote(&self, request: &QuoteRequest) -> AppResult<(Vehicle, ServiceType, PriceBreakdown)> {
        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &request.vehicle_id.to_string()))?;

        let service_type = self.resolve_service_type(
            request.service_type,
            request.service_label.as_deref(),
            &request.pickup_location,
            &request.dropoff_location,
        );

        let breakdown = self.engine.price(
            &PriceSheet::from(&vehicle),
            service_type,
            &request.pickup_location,
            &request.dropoff_location,
            request.start_time,
            request.duration_hours,
        );

        Ok((vehicle, service_type, breakdown))
    }

    /// Crear una reserva Pending/Pending y reservar el vehículo.
    ///
    /// La reserva del vehículo es el update condicional que decide el
    /// ganador entre creaciones casi simultáneas; si el insert posterior
    /// falla se libera el vehículo como compensación.
    pub async fn create(&self, request: &CreateBookingRequest) -> AppResult<Booking> {
        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &request.vehicle_id.to_string()))?;

        let service_type = self.resolve_service_type(
            request.service_type,
            request.service_label.as_deref(),
            &request.pickup_location,
            &request.dropoff_location,
        );

        let breakdown = self.engine.price(
            &PriceSheet::from(&vehicle),
            service_type,
            &request.pickup_location,
            &request.dropoff_location,
            request.start_time,
            request.duration_hours,
        );

        if !self.vehicles.try_reserve(vehicle.id).await? {
            return Err(AppError::VehicleUnavailable(vehicle.id));
        }

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            vehicle_id: vehicle.id,
            customer_name: request.customer_name.clone(),
            customer_email: request.customer_email.clone(),
            customer_phone: request.customer_phone.clone(),
            service_type,
            pickup_location: request.pickup_location.clone(),
            dropoff_location: request.dropoff_location.clone(),
            start_date: request.start_date,
            start_time: request.start_time,
            duration_hours: request.duration_hours,
            total_amount: breakdown.total,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            gateway_session_id: None,
            gateway_payment_id: None,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.bookings.insert(&booking).await {
            log::error!("❌ Error persistiendo booking, liberando vehículo {}: {}", vehicle.id, e);
            if let Err(release_err) = self.vehicles.release(vehicle.id).await {
                log::error!("❌ No se pudo liberar el vehículo {}: {}", vehicle.id, release_err);
            }
            return Err(e);
        }

        log::info!(
            "✅ Booking {} creado ({:?}, total {}) - vehículo {} reservado",
            booking.id,
            booking.service_type,
            booking.total_amount,
            vehicle.id
        );
        Ok(booking)
    }

    /// Confirmar el pago de una reserva, exactamente una vez.
    ///
    /// Idempotente: el caller que pierde el update condicional recibe la
    /// reserva ya pagada sin re-notificar. Seguro ante el webhook y el
    /// fallback del cliente corriendo en paralelo.
    pub async fn confirm_payment(&self, booking_id: Uuid, gateway_payment_id: &str) -> AppResult<Booking> {
        let transitioned = self.bookings.try_mark_paid(booking_id, gateway_payment_id).await?;

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(AppError::BookingNotFound(booking_id))?;

        if transitioned {
            log::info!("✅ Booking {} confirmado y pagado ({})", booking_id, gateway_payment_id);
            self.notify_confirmation(&booking).await;
            return Ok(booking);
        }

        match (booking.payment_status, booking.status) {
            // El otro trigger ya confirmó: éxito idempotente, sin re-notificar
            (PaymentStatus::Paid, _) => Ok(booking),
            (_, BookingStatus::Cancelled) => Err(AppError::InvalidTransition {
                from: "CANCELLED".to_string(),
                to: "CONFIRMED".to_string(),
            }),
            _ => Err(AppError::Conflict(
                "Booking changed concurrently during payment confirmation".to_string(),
            )),
        }
    }

    /// Marcar el pago como fallido (la reserva sigue Pending y cancelable)
    pub async fn fail_payment(&self, booking_id: Uuid) -> AppResult<Booking> {
        let transitioned = self.bookings.try_mark_payment_failed(booking_id).await?;

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(AppError::BookingNotFound(booking_id))?;

        if transitioned {
            log::warn!("⚠️ Pago fallido para booking {}", booking_id);
        }
        Ok(booking)
    }

    /// Cancelar una reserva Pending y liberar el vehículo según la política
    /// configurada (inmediata, o diferida al barrido tras la gracia)
    pub async fn cancel(&self, booking_id: Uuid) -> AppResult<Booking> {
        let transitioned = self.bookings.try_cancel(booking_id).await?;

        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(AppError::BookingNotFound(booking_id))?;

        if !transitioned {
            return Err(AppError::InvalidTransition {
                from: format!("{:?}", booking.status).to_uppercase(),
                to: "CANCELLED".to_string(),
            });
        }

        if self.engine.config().release_grace_minutes == 0 {
            if self.vehicles.release(booking.vehicle_id).await? {
                log::info!("🔓 Vehículo {} liberado tras cancelar booking {}", booking.vehicle_id, booking_id);
            }
        } else {
            log::info!(
                "⏳ Vehículo {} queda reservado {} min de gracia tras cancelar booking {}",
                booking.vehicle_id,
                self.engine.config().release_grace_minutes,
                booking_id
            );
        }

        Ok(booking)
    }

    /// Expirar una reserva impaga abandonada (usado por el barrido).
    /// Devuelve `true` si esta llamada realizó la cancelación.
    pub async fn expire(&self, booking: &Booking) -> AppResult<bool> {
        if !self.bookings.try_cancel(booking.id).await? {
            return Ok(false);
        }

        // Reserva abandonada: el vehículo se libera sin período de gracia
        if self.vehicles.release(booking.vehicle_id).await? {
            log::info!(
                "⏰ Booking {} expirado sin pago - vehículo {} liberado",
                booking.id,
                booking.vehicle_id
            );
        }
        Ok(true)
    }

    async fn notify_confirmation(&self, booking: &Booking) {
        let data = json!({
            "booking_id": booking.id.to_string(),
            "customer_name": booking.customer_name,
            "pickup_location": booking.pickup_location,
            "dropoff_location": booking.dropoff_location,
            "start_date": booking.start_date.to_string(),
            "start_time": booking.start_time.format("%H:%M").to_string(),
            "total_amount": booking.total_amount.to_string(),
        });

        // Best-effort: un booking pagado jamás se revierte por un email
        let result = self
            .notifier
            .send(&booking.customer_email, "booking_confirmed", &data)
            .await;
        if !result.success {
            log::warn!(
                "⚠️ No se pudo notificar la confirmación del booking {}: {}",
                booking.id,
                result.error.unwrap_or_default()
            );
        }
    }
}
