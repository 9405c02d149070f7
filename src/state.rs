//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Todo colaborador externo (gateway de
//! pagos, notificador) entra ya construido e inyectado desde `main`.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::EnvironmentConfig;
use crate::repositories::VehicleStore;
use crate::services::{BookingService, PaymentService};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub catalog: Arc<dyn VehicleStore>,
    pub bookings: Arc<BookingService>,
    pub payments: Arc<PaymentService>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: EnvironmentConfig,
        catalog: Arc<dyn VehicleStore>,
        bookings: Arc<BookingService>,
        payments: Arc<PaymentService>,
    ) -> Self {
        Self {
            pool,
            config,
            catalog,
            bookings,
            payments,
        }
    }
}
