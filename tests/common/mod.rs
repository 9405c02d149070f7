//! Soporte compartido de tests: fakes en memoria detrás de los mismos
//! contratos que usan las implementaciones PostgreSQL.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sha2::Sha256;
use uuid::Uuid;

use luxury_booking::clients::stripe_client::{
    CreateSessionRequest, GatewayPaymentStatus, GatewaySession, GatewaySessionStatus, PaymentGateway,
};
use luxury_booking::config::{EnvironmentConfig, PricingConfig};
use luxury_booking::models::booking::{
    Booking, BookingStatus, CreateBookingRequest, PaymentStatus, ServiceType,
};
use luxury_booking::models::vehicle::{Vehicle, VehicleFilters, VehicleStatus};
use luxury_booking::repositories::{BookingStore, VehicleStore};
use luxury_booking::services::classifier_service::LegacyTextClassifier;
use luxury_booking::services::notification_service::{Notifier, NotifyResult};
use luxury_booking::services::{BookingService, PaymentService, PricingEngine};
use luxury_booking::utils::errors::{AppError, AppResult};

// ---------------------------------------------------------------------------
// Stores en memoria

pub struct InMemoryVehicleStore {
    vehicles: Mutex<HashMap<Uuid, Vehicle>>,
}

impl InMemoryVehicleStore {
    pub fn new() -> Self {
        Self {
            vehicles: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, vehicle: Vehicle) {
        self.vehicles.lock().unwrap().insert(vehicle.id, vehicle);
    }

    pub fn status_of(&self, id: Uuid) -> VehicleStatus {
        self.vehicles.lock().unwrap().get(&id).unwrap().status
    }
}

#[async_trait]
impl VehicleStore for InMemoryVehicleStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.vehicles.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self, _filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        Ok(self.vehicles.lock().unwrap().values().cloned().collect())
    }

    async fn try_reserve(&self, id: Uuid) -> AppResult<bool> {
        let mut vehicles = self.vehicles.lock().unwrap();
        match vehicles.get_mut(&id) {
            Some(vehicle) if vehicle.status == VehicleStatus::Available => {
                vehicle.status = VehicleStatus::Reserved;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, id: Uuid) -> AppResult<bool> {
        let mut vehicles = self.vehicles.lock().unwrap();
        match vehicles.get_mut(&id) {
            Some(vehicle) if vehicle.status == VehicleStatus::Reserved => {
                vehicle.status = VehicleStatus::Available;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub struct InMemoryBookingStore {
    bookings: Mutex<HashMap<Uuid, Booking>>,
    vehicles: Arc<InMemoryVehicleStore>,
}

impl InMemoryBookingStore {
    pub fn new(vehicles: Arc<InMemoryVehicleStore>) -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
            vehicles,
        }
    }

    pub fn count(&self) -> usize {
        self.bookings.lock().unwrap().len()
    }

    /// Retrotraer created_at/updated_at para simular el paso del tiempo
    pub fn backdate(&self, id: Uuid, minutes: i64) {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings.get_mut(&id).unwrap();
        booking.created_at = booking.created_at - chrono::Duration::minutes(minutes);
        booking.updated_at = booking.updated_at - chrono::Duration::minutes(minutes);
    }

    /// Corromper el total persistido, como un caller legacy que escribió
    /// un monto desfasado
    pub fn tamper_total(&self, id: Uuid, total: Decimal) {
        let mut bookings = self.bookings.lock().unwrap();
        bookings.get_mut(&id).unwrap().total_amount = total;
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: &Booking) -> AppResult<()> {
        self.bookings.lock().unwrap().insert(booking.id, booking.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        Ok(self.bookings.lock().unwrap().get(&id).cloned())
    }

    async fn attach_session(&self, id: Uuid, session_id: &str, total_amount: Decimal) -> AppResult<bool> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) if b.status == BookingStatus::Pending && b.payment_status != PaymentStatus::Paid => {
                b.gateway_session_id = Some(session_id.to_string());
                b.total_amount = total_amount;
                b.payment_status = PaymentStatus::Pending;
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn try_mark_paid(&self, id: Uuid, gateway_payment_id: &str) -> AppResult<bool> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b)
                if b.payment_status != PaymentStatus::Paid && b.status != BookingStatus::Cancelled =>
            {
                b.payment_status = PaymentStatus::Paid;
                b.status = BookingStatus::Confirmed;
                b.gateway_payment_id = Some(gateway_payment_id.to_string());
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn try_mark_payment_failed(&self, id: Uuid) -> AppResult<bool> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b)
                if b.payment_status == PaymentStatus::Pending && b.status == BookingStatus::Pending =>
            {
                b.payment_status = PaymentStatus::Failed;
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn try_cancel(&self, id: Uuid) -> AppResult<bool> {
        let mut bookings = self.bookings.lock().unwrap();
        match bookings.get_mut(&id) {
            Some(b) if b.status == BookingStatus::Pending => {
                b.status = BookingStatus::Cancelled;
                b.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_expired_pending(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        Ok(self
            .bookings
            .lock()
            .unwrap()
            .values()
            .filter(|b| {
                b.status == BookingStatus::Pending
                    && b.payment_status != PaymentStatus::Paid
                    && b.created_at < cutoff
            })
            .cloned()
            .collect())
    }

    async fn find_cancelled_with_reserved_vehicle(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        let bookings = self.bookings.lock().unwrap();
        let result = bookings
            .values()
            .filter(|b| b.status == BookingStatus::Cancelled && b.updated_at < cutoff)
            .filter(|b| self.vehicles.status_of(b.vehicle_id) == VehicleStatus::Reserved)
            .filter(|b| {
                !bookings.values().any(|other| {
                    other.vehicle_id == b.vehicle_id
                        && other.id != b.id
                        && matches!(other.status, BookingStatus::Pending | BookingStatus::Confirmed)
                })
            })
            .cloned()
            .collect();
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Notifier contador

pub struct CountingNotifier {
    pub sends: AtomicUsize,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self {
            sends: AtomicUsize::new(0),
        }
    }

    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for CountingNotifier {
    async fn send(&self, _to: &str, _template: &str, _data: &serde_json::Value) -> NotifyResult {
        self.sends.fetch_add(1, Ordering::SeqCst);
        NotifyResult::ok()
    }
}

// ---------------------------------------------------------------------------
// Gateway simulado

pub struct MockGateway {
    sessions: Mutex<HashMap<String, GatewaySessionStatus>>,
    pub created: Mutex<Vec<CreateSessionRequest>>,
    pub retrieve_calls: AtomicUsize,
    counter: AtomicUsize,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            retrieve_calls: AtomicUsize::new(0),
            counter: AtomicUsize::new(0),
        }
    }

    /// Simular que el cliente completó el pago en el checkout hosteado
    pub fn mark_paid(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions.get_mut(session_id).unwrap();
        session.payment_status = GatewayPaymentStatus::Paid;
        session.session_status = "complete".to_string();
        session.payment_intent_id = Some(format!("pi_{}", session_id));
    }

    pub fn last_request(&self) -> CreateSessionRequest {
        self.created.lock().unwrap().last().unwrap().clone()
    }

    pub fn retrieve_count(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_session(&self, request: &CreateSessionRequest) -> AppResult<GatewaySession> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = format!("cs_test_{}", n);

        self.sessions.lock().unwrap().insert(
            session_id.clone(),
            GatewaySessionStatus {
                session_id: session_id.clone(),
                payment_status: GatewayPaymentStatus::Unpaid,
                session_status: "open".to_string(),
                payment_intent_id: None,
            },
        );
        self.created.lock().unwrap().push(request.clone());

        Ok(GatewaySession {
            session_id: session_id.clone(),
            redirect_url: format!("https://checkout.test/{}", session_id),
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> AppResult<GatewaySessionStatus> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Armado del contexto

pub struct TestContext {
    pub vehicles: Arc<InMemoryVehicleStore>,
    pub bookings: Arc<InMemoryBookingStore>,
    pub notifier: Arc<CountingNotifier>,
    pub gateway: Arc<MockGateway>,
    pub booking_service: Arc<BookingService>,
    pub payment_service: Arc<PaymentService>,
    pub pricing: PricingConfig,
}

pub fn setup() -> TestContext {
    setup_with(PricingConfig::default(), test_config(Some("whsec_test"), false))
}

pub fn setup_with(pricing: PricingConfig, env: EnvironmentConfig) -> TestContext {
    let vehicles = Arc::new(InMemoryVehicleStore::new());
    let bookings = Arc::new(InMemoryBookingStore::new(vehicles.clone()));
    let notifier = Arc::new(CountingNotifier::new());
    let gateway = Arc::new(MockGateway::new());

    let booking_service = Arc::new(BookingService::new(
        bookings.clone(),
        vehicles.clone(),
        PricingEngine::new(pricing.clone()),
        Arc::new(LegacyTextClassifier),
        notifier.clone(),
    ));

    let payment_service = Arc::new(PaymentService::new(
        bookings.clone(),
        vehicles.clone(),
        booking_service.clone(),
        gateway.clone(),
        env,
    ));

    TestContext {
        vehicles,
        bookings,
        notifier,
        gateway,
        booking_service,
        payment_service,
        pricing,
    }
}

pub fn test_config(webhook_secret: Option<&str>, allow_unverified: bool) -> EnvironmentConfig {
    EnvironmentConfig {
        environment: "test".to_string(),
        port: 0,
        host: "localhost".to_string(),
        cors_origins: vec![],
        stripe_secret_key: "sk_test_fake".to_string(),
        stripe_webhook_secret: webhook_secret.map(str::to_string),
        stripe_api_base: "https://api.stripe.test".to_string(),
        allow_unverified_webhooks: allow_unverified,
        checkout_success_url: "https://booking.test/success".to_string(),
        checkout_cancel_url: "https://booking.test/cancel".to_string(),
        notify_api_url: None,
        notify_api_key: None,
        notify_from_email: "bookings@booking.test".to_string(),
    }
}

pub fn test_vehicle() -> Vehicle {
    let now = Utc::now();
    Vehicle {
        id: Uuid::new_v4(),
        name: "Mercedes-Benz S580".to_string(),
        category: "sedan".to_string(),
        price_airport_transfer: Some(dec!(80)),
        price_trip_base: Some(dec!(100)),
        price_6_hours: Some(dec!(360)),
        price_12_hours: Some(dec!(720)),
        price_per_hour: Some(dec!(60)),
        status: VehicleStatus::Available,
        created_at: now,
        updated_at: now,
    }
}

pub fn airport_transfer_request(vehicle_id: Uuid) -> CreateBookingRequest {
    CreateBookingRequest {
        vehicle_id,
        customer_name: "Amelia Tan".to_string(),
        customer_email: "amelia@example.com".to_string(),
        customer_phone: Some("+6591234567".to_string()),
        service_type: Some(ServiceType::AirportTransfer),
        service_label: None,
        pickup_location: "Changi Airport Terminal 1".to_string(),
        dropoff_location: "Marina Bay Sands".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        duration_hours: None,
    }
}

pub fn night_airport_dropoff_request(vehicle_id: Uuid) -> CreateBookingRequest {
    CreateBookingRequest {
        pickup_location: "Marina Bay Sands".to_string(),
        dropoff_location: "Changi Airport Terminal 1".to_string(),
        start_time: NaiveTime::from_hms_opt(5, 0, 0).unwrap(),
        ..airport_transfer_request(vehicle_id)
    }
}

// ---------------------------------------------------------------------------
// Payloads de webhook

pub fn completed_event_payload(booking_id: Uuid, session_id: &str) -> Vec<u8> {
    serde_json::json!({
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "payment_intent": format!("pi_{}", session_id),
                "metadata": { "booking_id": booking_id.to_string() },
            }
        }
    })
    .to_string()
    .into_bytes()
}

pub fn async_failed_event_payload(booking_id: Uuid, session_id: &str) -> Vec<u8> {
    serde_json::json!({
        "type": "checkout.session.async_payment_failed",
        "data": {
            "object": {
                "id": session_id,
                "metadata": { "booking_id": booking_id.to_string() },
            }
        }
    })
    .to_string()
    .into_bytes()
}

/// Firmar un payload igual que lo hace el gateway
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let timestamp = Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
