//! Tests del ciclo de vida de reservas: creación con reserva del
//! vehículo, confirmación exactamente-una-vez, cancelación y expiración.

mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;

use common::*;
use luxury_booking::config::PricingConfig;
use luxury_booking::models::booking::{BookingStatus, PaymentStatus};
use luxury_booking::models::vehicle::VehicleStatus;
use luxury_booking::services::ReservationSweeper;
use luxury_booking::utils::errors::AppError;

#[tokio::test]
async fn test_create_reserves_vehicle_and_prices_booking() {
    let ctx = setup();
    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    let booking = ctx
        .booking_service
        .create(&airport_transfer_request(vehicle.id))
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.payment_status, PaymentStatus::Pending);
    // recogida en aeropuerto, 14:00: tarifa completa sin recargo
    assert_eq!(booking.total_amount, dec!(80));
    assert_eq!(ctx.vehicles.status_of(vehicle.id), VehicleStatus::Reserved);
}

#[tokio::test]
async fn test_create_night_airport_dropoff_pricing() {
    let ctx = setup();
    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    let booking = ctx
        .booking_service
        .create(&night_airport_dropoff_request(vehicle.id))
        .await
        .unwrap();

    // hacia el aeropuerto a las 05:00: 80 - 10 de descuento + 10 de recargo
    assert_eq!(booking.total_amount, dec!(80));
}

#[tokio::test]
async fn test_create_fails_when_vehicle_reserved() {
    let ctx = setup();
    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    ctx.booking_service
        .create(&airport_transfer_request(vehicle.id))
        .await
        .unwrap();

    let result = ctx
        .booking_service
        .create(&airport_transfer_request(vehicle.id))
        .await;

    assert!(matches!(result, Err(AppError::VehicleUnavailable(_))));
    // el segundo intento no dejó escrituras
    assert_eq!(ctx.bookings.count(), 1);
}

#[tokio::test]
async fn test_cancel_releases_vehicle() {
    let ctx = setup();
    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    let booking = ctx
        .booking_service
        .create(&airport_transfer_request(vehicle.id))
        .await
        .unwrap();

    let cancelled = ctx.booking_service.cancel(booking.id).await.unwrap();

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(ctx.vehicles.status_of(vehicle.id), VehicleStatus::Available);
}

#[tokio::test]
async fn test_cancel_confirmed_booking_fails_closed() {
    let ctx = setup();
    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    let booking = ctx
        .booking_service
        .create(&airport_transfer_request(vehicle.id))
        .await
        .unwrap();
    ctx.booking_service
        .confirm_payment(booking.id, "pi_test_1")
        .await
        .unwrap();

    let result = ctx.booking_service.cancel(booking.id).await;

    assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
    // una reserva confirmada nunca libera el vehículo por cancel
    assert_eq!(ctx.vehicles.status_of(vehicle.id), VehicleStatus::Reserved);
}

#[tokio::test]
async fn test_confirm_payment_is_idempotent() {
    let ctx = setup();
    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    let booking = ctx
        .booking_service
        .create(&airport_transfer_request(vehicle.id))
        .await
        .unwrap();

    let first = ctx
        .booking_service
        .confirm_payment(booking.id, "pi_test_1")
        .await
        .unwrap();
    let second = ctx
        .booking_service
        .confirm_payment(booking.id, "pi_test_1")
        .await
        .unwrap();

    assert_eq!(first.status, BookingStatus::Confirmed);
    assert_eq!(first.payment_status, PaymentStatus::Paid);
    assert_eq!(second.status, BookingStatus::Confirmed);
    assert_eq!(second.payment_status, PaymentStatus::Paid);
    // una sola notificación entre ambas llamadas
    assert_eq!(ctx.notifier.send_count(), 1);
}

#[tokio::test]
async fn test_concurrent_confirms_transition_exactly_once() {
    let ctx = setup();
    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    let booking = ctx
        .booking_service
        .create(&airport_transfer_request(vehicle.id))
        .await
        .unwrap();

    let service_a = Arc::clone(&ctx.booking_service);
    let service_b = Arc::clone(&ctx.booking_service);
    let id = booking.id;

    let (a, b) = tokio::join!(
        tokio::spawn(async move { service_a.confirm_payment(id, "pi_webhook").await }),
        tokio::spawn(async move { service_b.confirm_payment(id, "pi_fallback").await }),
    );

    assert!(a.unwrap().is_ok());
    assert!(b.unwrap().is_ok());

    let final_state = ctx.booking_service.get(id).await.unwrap();
    assert_eq!(final_state.status, BookingStatus::Confirmed);
    assert_eq!(final_state.payment_status, PaymentStatus::Paid);
    // exactamente una transición => exactamente una notificación
    assert_eq!(ctx.notifier.send_count(), 1);
}

#[tokio::test]
async fn test_payment_failed_keeps_booking_cancellable() {
    let ctx = setup();
    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    let booking = ctx
        .booking_service
        .create(&airport_transfer_request(vehicle.id))
        .await
        .unwrap();

    let failed = ctx.booking_service.fail_payment(booking.id).await.unwrap();
    assert_eq!(failed.payment_status, PaymentStatus::Failed);
    assert_eq!(failed.status, BookingStatus::Pending);

    let cancelled = ctx.booking_service.cancel(booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_sweeper_expires_abandoned_reservation() {
    let ctx = setup();
    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    let booking = ctx
        .booking_service
        .create(&airport_transfer_request(vehicle.id))
        .await
        .unwrap();
    ctx.bookings.backdate(booking.id, 45);

    let sweeper = ReservationSweeper::new(
        ctx.bookings.clone(),
        ctx.vehicles.clone(),
        ctx.booking_service.clone(),
        ctx.pricing.clone(),
    );
    sweeper.sweep_once().await.unwrap();

    let swept = ctx.booking_service.get(booking.id).await.unwrap();
    assert_eq!(swept.status, BookingStatus::Cancelled);
    assert_eq!(ctx.vehicles.status_of(vehicle.id), VehicleStatus::Available);
}

#[tokio::test]
async fn test_sweeper_ignores_fresh_and_paid_bookings() {
    let ctx = setup();
    let fresh_vehicle = test_vehicle();
    let paid_vehicle = test_vehicle();
    ctx.vehicles.insert(fresh_vehicle.clone());
    ctx.vehicles.insert(paid_vehicle.clone());

    let fresh = ctx
        .booking_service
        .create(&airport_transfer_request(fresh_vehicle.id))
        .await
        .unwrap();

    let paid = ctx
        .booking_service
        .create(&airport_transfer_request(paid_vehicle.id))
        .await
        .unwrap();
    ctx.booking_service
        .confirm_payment(paid.id, "pi_test_paid")
        .await
        .unwrap();
    ctx.bookings.backdate(paid.id, 45);

    let sweeper = ReservationSweeper::new(
        ctx.bookings.clone(),
        ctx.vehicles.clone(),
        ctx.booking_service.clone(),
        ctx.pricing.clone(),
    );
    sweeper.sweep_once().await.unwrap();

    assert_eq!(
        ctx.booking_service.get(fresh.id).await.unwrap().status,
        BookingStatus::Pending
    );
    assert_eq!(
        ctx.booking_service.get(paid.id).await.unwrap().status,
        BookingStatus::Confirmed
    );
    assert_eq!(ctx.vehicles.status_of(paid_vehicle.id), VehicleStatus::Reserved);
}

#[tokio::test]
async fn test_cancel_with_grace_period_defers_release_to_sweeper() {
    let mut pricing = PricingConfig::default();
    pricing.release_grace_minutes = 5;
    let ctx = setup_with(pricing, test_config(Some("whsec_test"), false));

    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    let booking = ctx
        .booking_service
        .create(&airport_transfer_request(vehicle.id))
        .await
        .unwrap();
    ctx.booking_service.cancel(booking.id).await.unwrap();

    // con gracia configurada el vehículo sigue reservado tras cancelar
    assert_eq!(ctx.vehicles.status_of(vehicle.id), VehicleStatus::Reserved);

    let sweeper = ReservationSweeper::new(
        ctx.bookings.clone(),
        ctx.vehicles.clone(),
        ctx.booking_service.clone(),
        ctx.pricing.clone(),
    );

    // antes de vencer la gracia el barrido no libera
    sweeper.sweep_once().await.unwrap();
    assert_eq!(ctx.vehicles.status_of(vehicle.id), VehicleStatus::Reserved);

    // vencida la gracia, libera
    ctx.bookings.backdate(booking.id, 10);
    sweeper.sweep_once().await.unwrap();
    assert_eq!(ctx.vehicles.status_of(vehicle.id), VehicleStatus::Available);
}

#[tokio::test]
async fn test_legacy_request_without_service_type_is_classified() {
    let ctx = setup();
    let vehicle = test_vehicle();
    ctx.vehicles.insert(vehicle.clone());

    let mut request = airport_transfer_request(vehicle.id);
    request.service_type = None;
    request.service_label = Some("One way".to_string());

    let booking = ctx.booking_service.create(&request).await.unwrap();

    assert_eq!(
        booking.service_type,
        luxury_booking::models::booking::ServiceType::AirportTransfer
    );
    assert_eq!(booking.total_amount, dec!(80));
}
