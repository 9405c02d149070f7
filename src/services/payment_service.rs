//! Reconciliación de pagos
//!
//! Este módulo es el puente entre el gateway de pagos y el ciclo de vida
//! de reservas. Garantiza que una reserva se confirme exactamente una vez
//! sin importar cuál de los dos triggers independientes llegue primero:
//! el webhook asíncrono del gateway o el poll síncrono de la página de
//! retorno del cliente.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::clients::stripe_client::{
    verify_webhook_signature, CreateSessionRequest, GatewayWebhookEvent, LineItem, PaymentGateway,
};
use crate::config::EnvironmentConfig;
use crate::models::booking::{Booking, BookingStatus, PaymentStatus, ServiceType};
use crate::models::vehicle::PriceSheet;
use crate::repositories::{BookingStore, VehicleStore};
use crate::services::booking_service::BookingService;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::money::to_minor_units;

/// Tipos de evento del gateway que este servicio procesa
const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";
const EVENT_ASYNC_PAYMENT_FAILED: &str = "checkout.session.async_payment_failed";

/// Response de creación de sesión de checkout
#[derive(Debug, Serialize)]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub redirect_url: String,
}

/// Resultado del poll de confirmación del cliente
#[derive(Debug)]
pub enum ConfirmationResult {
    /// Esta llamada realizó (o encontró recién hecha) la confirmación
    Confirmed(Booking),
    /// La reserva ya estaba pagada; no se re-procesó nada
    AlreadyConfirmed(Booking),
    /// El gateway aún no reporta el pago; el cliente puede seguir haciendo poll
    PaymentPending,
}

/// Resultado del procesamiento de un webhook
#[derive(Debug)]
pub enum WebhookOutcome {
    Confirmed(Uuid),
    PaymentFailed(Uuid),
    Ignored(String),
}

pub struct PaymentService {
    bookings: Arc<dyn BookingStore>,
    vehicles: Arc<dyn VehicleStore>,
    booking_service: Arc<BookingService>,
    gateway: Arc<dyn PaymentGateway>,
    config: EnvironmentConfig,
}

impl PaymentService {
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        vehicles: Arc<dyn VehicleStore>,
        booking_service: Arc<BookingService>,
        gateway: Arc<dyn PaymentGateway>,
        config: EnvironmentConfig,
    ) -> Self {
        Self {
            bookings,
            vehicles,
            booking_service,
            gateway,
            config,
        }
    }

    /// Crear la sesión de checkout de una reserva.
    ///
    /// El precio se re-deriva SIEMPRE de los parámetros persistidos de la
    /// reserva; nunca se confía en un total provisto por el cliente. Si el
    /// total persistido quedó desfasado de la cotización original se
    /// parchea aquí, antes de crear la sesión - después de creada la
    /// sesión el total es inmutable.
    pub async fn create_checkout_session(&self, booking_id: Uuid) -> AppResult<CheckoutSessionResponse> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(AppError::BookingNotFound(booking_id))?;

        if booking.payment_status == PaymentStatus::Paid {
            return Err(AppError::Conflict("Booking is already paid".to_string()));
        }
        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::InvalidTransition {
                from: "CANCELLED".to_string(),
                to: "CHECKOUT".to_string(),
            });
        }

        let vehicle = self
            .vehicles
            .find_by_id(booking.vehicle_id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &booking.vehicle_id.to_string()))?;

        let breakdown = self.booking_service.engine().price(
            &PriceSheet::from(&vehicle),
            booking.service_type,
            &booking.pickup_location,
            &booking.dropoff_location,
            booking.start_time,
            booking.duration_hours,
        );

        if breakdown.total != booking.total_amount {
            log::warn!(
                "⚠️ Total del booking {} desfasado ({} -> {}), se parchea antes de crear la sesión",
                booking_id,
                booking.total_amount,
                breakdown.total
            );
        }

        let mut line_items = vec![LineItem {
            name: format!("{} - {}", vehicle.name, service_label(&booking)),
            amount_minor: to_minor_units(breakdown.subtotal + breakdown.tax)?,
            quantity: 1,
        }];
        if breakdown.night_surcharge > rust_decimal::Decimal::ZERO {
            line_items.push(LineItem {
                name: "Night pickup surcharge".to_string(),
                amount_minor: to_minor_units(breakdown.night_surcharge)?,
                quantity: 1,
            });
        }

        let session = self
            .gateway
            .create_session(&CreateSessionRequest {
                currency: self.booking_service.engine().config().currency.clone(),
                line_items,
                success_url: self.config.checkout_success_url.clone(),
                cancel_url: self.config.checkout_cancel_url.clone(),
                booking_id,
            })
            .await?;

        let attached = self
            .bookings
            .attach_session(booking_id, &session.session_id, breakdown.total)
            .await?;
        if !attached {
            return Err(AppError::Conflict(
                "Booking state changed while creating the checkout session".to_string(),
            ));
        }

        log::info!("💳 Sesión {} creada para booking {}", session.session_id, booking_id);
        Ok(CheckoutSessionResponse {
            session_id: session.session_id,
            redirect_url: session.redirect_url,
        })
    }

    /// Procesar un webhook del gateway.
    ///
    /// La firma se verifica ANTES de tocar cualquier reserva; un webhook
    /// sin firma válida se rechaza sin mutación. Procesar sin verificar
    /// solo está permitido con el flag explícito de desarrollo, que la
    /// configuración rechaza en producción.
    pub async fn handle_webhook(&self, signature_header: Option<&str>, payload: &[u8]) -> AppResult<WebhookOutcome> {
        match self.config.stripe_webhook_secret.as_deref() {
            Some(secret) => {
                let header = signature_header
                    .ok_or_else(|| AppError::InvalidSignature("missing Stripe-Signature header".to_string()))?;
                verify_webhook_signature(secret, header, payload, Utc::now().timestamp())?;
            }
            None => {
                if !self.config.allow_unverified_webhooks {
                    return Err(AppError::InvalidSignature(
                        "no webhook secret configured and unverified webhooks are not allowed".to_string(),
                    ));
                }
                log::warn!("⚠️ Webhook procesado SIN verificar firma (modo desarrollo)");
            }
        }

        let event: GatewayWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| AppError::BadRequest(format!("Malformed webhook payload: {}", e)))?;

        match event.event_type.as_str() {
            EVENT_CHECKOUT_COMPLETED => {
                let booking_id = booking_id_from_metadata(&event)?;
                let payment_id = event
                    .data
                    .object
                    .payment_intent
                    .unwrap_or_else(|| event.data.object.id.clone());
                self.booking_service.confirm_payment(booking_id, &payment_id).await?;
                Ok(WebhookOutcome::Confirmed(booking_id))
            }
            EVENT_ASYNC_PAYMENT_FAILED => {
                let booking_id = booking_id_from_metadata(&event)?;
                self.booking_service.fail_payment(booking_id).await?;
                Ok(WebhookOutcome::PaymentFailed(booking_id))
            }
            other => {
                log::debug!("Webhook '{}' ignorado", other);
                Ok(WebhookOutcome::Ignored(other.to_string()))
            }
        }
    }

    /// Confirmación síncrona desde la página de retorno del cliente.
    ///
    /// Existe porque la entrega del webhook no está garantizada al momento
    /// del redirect. Solo confirma si el GATEWAY reporta la sesión como
    /// pagada, y lo hace por el mismo embudo idempotente que el webhook.
    pub async fn confirm_fallback(&self, booking_id: Uuid) -> AppResult<ConfirmationResult> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(AppError::BookingNotFound(booking_id))?;

        if booking.payment_status == PaymentStatus::Paid {
            return Ok(ConfirmationResult::AlreadyConfirmed(booking));
        }

        let session_id = booking
            .gateway_session_id
            .clone()
            .ok_or_else(|| AppError::SessionNotFound(format!("booking {} has no checkout session", booking_id)))?;

        let session = self.gateway.retrieve_session(&session_id).await?;

        if session.payment_status.is_paid() {
            let payment_id = session.payment_intent_id.unwrap_or(session_id);
            let booking = self.booking_service.confirm_payment(booking_id, &payment_id).await?;
            Ok(ConfirmationResult::Confirmed(booking))
        } else {
            // No es un error: el cliente puede volver a consultar
            Ok(ConfirmationResult::PaymentPending)
        }
    }
}

fn booking_id_from_metadata(event: &GatewayWebhookEvent) -> AppResult<Uuid> {
    let raw = event
        .data
        .object
        .metadata
        .get("booking_id")
        .ok_or_else(|| AppError::BadRequest("Webhook session has no booking_id metadata".to_string()))?;
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid booking_id in metadata: {}", raw)))
}

fn service_label(booking: &Booking) -> String {
    match booking.service_type {
        ServiceType::AirportTransfer => "Airport transfer".to_string(),
        ServiceType::Trip => "One-way trip".to_string(),
        ServiceType::Rental => match booking.duration_hours {
            Some(hours) => format!("Rental ({} hours)", hours),
            None => "Rental".to_string(),
        },
    }
}
