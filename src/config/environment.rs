//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;

use crate::utils::errors::{AppError, AppResult};

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    // Gateway de pagos (Stripe Checkout)
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_api_base: String,
    /// Permite procesar webhooks sin verificar la firma. SOLO para desarrollo;
    /// `validate()` rechaza este flag en producción.
    pub allow_unverified_webhooks: bool,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    // Notificaciones por email (opcional; sin URL se degradan a logs)
    pub notify_api_url: Option<String>,
    pub notify_api_key: Option<String>,
    pub notify_from_email: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").expect("ENVIRONMENT must be set"),
            port: env::var("PORT")
                .expect("PORT must be set")
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").expect("HOST must be set"),
            cors_origins: env::var("CORS_ORIGINS")
                .expect("CORS_ORIGINS must be set")
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").expect("STRIPE_SECRET_KEY must be set"),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").ok(),
            stripe_api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            allow_unverified_webhooks: env::var("ALLOW_UNVERIFIED_WEBHOOKS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            checkout_success_url: env::var("CHECKOUT_SUCCESS_URL")
                .expect("CHECKOUT_SUCCESS_URL must be set"),
            checkout_cancel_url: env::var("CHECKOUT_CANCEL_URL")
                .expect("CHECKOUT_CANCEL_URL must be set"),
            notify_api_url: env::var("NOTIFY_API_URL").ok(),
            notify_api_key: env::var("NOTIFY_API_KEY").ok(),
            notify_from_email: env::var("NOTIFY_FROM_EMAIL")
                .unwrap_or_else(|_| "bookings@luxuryfleet.example".to_string()),
        }
    }
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Validar la configuración al arrancar el proceso.
    ///
    /// Las credenciales del gateway se validan una sola vez aquí con un error
    /// fatal claro, nunca de forma perezosa por request.
    pub fn validate(&self) -> AppResult<()> {
        if self.stripe_secret_key.trim().is_empty() {
            return Err(AppError::InvalidGatewayCredentials(
                "STRIPE_SECRET_KEY is empty".to_string(),
            ));
        }
        if !self.stripe_secret_key.starts_with("sk_") {
            return Err(AppError::InvalidGatewayCredentials(
                "STRIPE_SECRET_KEY does not look like a secret key (expected sk_ prefix)".to_string(),
            ));
        }
        if self.is_production() {
            if self.allow_unverified_webhooks {
                return Err(AppError::Internal(
                    "ALLOW_UNVERIFIED_WEBHOOKS cannot be enabled in production".to_string(),
                ));
            }
            if self.stripe_webhook_secret.as_deref().map(str::trim).filter(|s| !s.is_empty()).is_none() {
                return Err(AppError::Internal(
                    "STRIPE_WEBHOOK_SECRET must be set in production".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
