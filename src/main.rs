use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Json, Router};
use dotenvy::dotenv;
use serde_json::json;
use tokio::signal;
use tracing::{error, info};

use luxury_booking::api;
use luxury_booking::clients::stripe_client::{PaymentGateway, StripeClient};
use luxury_booking::config::{EnvironmentConfig, PricingConfig};
use luxury_booking::database::{create_pool, run_migrations};
use luxury_booking::middleware::cors::cors_middleware;
use luxury_booking::repositories::{BookingRepository, BookingStore, VehicleRepository, VehicleStore};
use luxury_booking::services::classifier_service::LegacyTextClassifier;
use luxury_booking::services::notification_service::{EmailApiNotifier, LogOnlyNotifier, Notifier};
use luxury_booking::services::{BookingService, PaymentService, PricingEngine, ReservationSweeper};
use luxury_booking::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚘 Luxury Booking - API de reservas y pagos");
    info!("============================================");

    // Configuración: valida credenciales del gateway ANTES de servir tráfico
    let config = EnvironmentConfig::default();
    if let Err(e) = config.validate() {
        error!("❌ Configuración inválida: {}", e);
        return Err(anyhow::anyhow!("Configuración inválida: {}", e));
    }
    let pricing = PricingConfig::from_env();

    // Inicializar base de datos
    let pool = match create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    run_migrations(&pool).await?;

    // Construir e inyectar los colaboradores del core
    let catalog: Arc<dyn VehicleStore> = Arc::new(VehicleRepository::new(pool.clone()));
    let bookings_store: Arc<dyn BookingStore> = Arc::new(BookingRepository::new(pool.clone()));

    let notifier: Arc<dyn Notifier> = match &config.notify_api_url {
        Some(url) => Arc::new(EmailApiNotifier::new(
            url.clone(),
            config.notify_api_key.clone(),
            config.notify_from_email.clone(),
        )),
        None => Arc::new(LogOnlyNotifier),
    };

    let booking_service = Arc::new(BookingService::new(
        bookings_store.clone(),
        catalog.clone(),
        PricingEngine::new(pricing.clone()),
        Arc::new(LegacyTextClassifier),
        notifier,
    ));

    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeClient::new(
        config.stripe_api_base.clone(),
        config.stripe_secret_key.clone(),
    ));

    let payment_service = Arc::new(PaymentService::new(
        bookings_store.clone(),
        catalog.clone(),
        booking_service.clone(),
        gateway,
        config.clone(),
    ));

    // Barrido de reservas expiradas, fuera del camino de los requests
    let sweeper = ReservationSweeper::new(
        bookings_store.clone(),
        catalog.clone(),
        booking_service.clone(),
        pricing.clone(),
    );
    tokio::spawn(sweeper.run());

    // Crear router de la API
    let app_state = AppState::new(pool, config.clone(), catalog, booking_service, payment_service);

    let app = Router::new()
        .route("/health", get(health_endpoint))
        .nest("/api", api::create_api_router())
        .layer(cors_middleware())
        .with_state(app_state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("🚗 Endpoints - Vehicle:");
    info!("   GET  /api/vehicle - Listar catálogo");
    info!("   GET  /api/vehicle/:id - Obtener vehículo");
    info!("📅 Endpoints - Booking:");
    info!("   POST /api/booking/quote - Cotizar reserva");
    info!("   POST /api/booking - Crear reserva");
    info!("   GET  /api/booking/:id - Obtener reserva");
    info!("   POST /api/booking/:id/checkout - Crear sesión de pago");
    info!("   GET  /api/booking/:id/confirm - Confirmación de respaldo");
    info!("   POST /api/booking/:id/cancel - Cancelar reserva");
    info!("💳 Endpoints - Pagos:");
    info!("   POST /api/webhook/payment - Webhook del gateway");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Endpoint de health check
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "service": "luxury-booking",
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
