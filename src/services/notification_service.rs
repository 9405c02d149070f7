//! Servicio de notificaciones
//!
//! Este módulo maneja el envío de emails de confirmación. Desde la
//! perspectiva del core es fire-and-forget: un fallo de notificación se
//! loguea y jamás revierte una confirmación de pago.

use async_trait::async_trait;
use serde_json::json;

/// Resultado de un intento de notificación
#[derive(Debug, Clone)]
pub struct NotifyResult {
    pub success: bool,
    pub error: Option<String>,
}

impl NotifyResult {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Contrato de envío de notificaciones
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, template: &str, data: &serde_json::Value) -> NotifyResult;
}

/// Notificador que publica contra una API de email HTTP
pub struct EmailApiNotifier {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from_email: String,
}

impl EmailApiNotifier {
    pub fn new(api_url: String, api_key: Option<String>, from_email: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_url,
            api_key,
            from_email,
        }
    }
}

#[async_trait]
impl Notifier for EmailApiNotifier {
    async fn send(&self, to: &str, template: &str, data: &serde_json::Value) -> NotifyResult {
        let body = json!({
            "from": self.from_email,
            "to": to,
            "template": template,
            "data": data,
        });

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                log::info!("📧 Notificación '{}' enviada a {}", template, to);
                NotifyResult::ok()
            }
            Ok(response) => {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                log::warn!("⚠️ Email API devolvió {}: {}", status, error_text);
                NotifyResult::failed(format!("email API returned {}", status))
            }
            Err(e) => {
                log::warn!("⚠️ Error enviando notificación: {}", e);
                NotifyResult::failed(e.to_string())
            }
        }
    }
}

/// Notificador de desarrollo: solo loguea, siempre "exitoso"
pub struct LogOnlyNotifier;

#[async_trait]
impl Notifier for LogOnlyNotifier {
    async fn send(&self, to: &str, template: &str, _data: &serde_json::Value) -> NotifyResult {
        log::info!("📧 [dev] Notificación '{}' para {} (sin API de email configurada)", template, to);
        NotifyResult::ok()
    }
}
