//! Cliente del gateway de pagos (Stripe Checkout)
//!
//! Este módulo implementa el cliente HTTP contra la API de Stripe y la
//! verificación de firma de webhooks. El resto del sistema habla con el
//! trait `PaymentGateway`; el cliente se construye una sola vez en el
//! arranque con credenciales ya validadas y se inyecta, nunca se crea un
//! singleton a nivel de módulo.

use std::collections::HashMap;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Tolerancia máxima entre el timestamp firmado y el reloj local
const SIGNATURE_TOLERANCE_SECONDS: i64 = 300;

/// Línea de cobro de la sesión de checkout
#[derive(Debug, Clone)]
pub struct LineItem {
    pub name: String,
    pub amount_minor: i64,
    pub quantity: u32,
}

/// Request de creación de sesión de checkout
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub currency: String,
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub booking_id: Uuid,
}

/// Sesión de checkout creada en el gateway
#[derive(Debug, Clone)]
pub struct GatewaySession {
    pub session_id: String,
    pub redirect_url: String,
}

/// Estado de pago reportado por el gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl GatewayPaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, Self::Paid | Self::NoPaymentRequired)
    }

    fn parse(raw: &str) -> Self {
        match raw {
            "paid" => Self::Paid,
            "no_payment_required" => Self::NoPaymentRequired,
            _ => Self::Unpaid,
        }
    }
}

/// Estado de una sesión de checkout consultada en el gateway
#[derive(Debug, Clone)]
pub struct GatewaySessionStatus {
    pub session_id: String,
    pub payment_status: GatewayPaymentStatus,
    pub session_status: String,
    pub payment_intent_id: Option<String>,
}

/// Contrato del gateway de pagos
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: &CreateSessionRequest) -> AppResult<GatewaySession>;

    async fn retrieve_session(&self, session_id: &str) -> AppResult<GatewaySessionStatus>;
}

/// Payload de un evento de webhook del gateway
#[derive(Debug, Deserialize)]
pub struct GatewayWebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: GatewayWebhookData,
}

#[derive(Debug, Deserialize)]
pub struct GatewayWebhookData {
    pub object: GatewaySessionObject,
}

#[derive(Debug, Deserialize)]
pub struct GatewaySessionObject {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StripeSessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    payment_intent: Option<String>,
}

/// Cliente HTTP contra la API de Stripe
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(api_base: String, secret_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base,
            secret_key,
        }
    }

    fn map_error_status(status: reqwest::StatusCode, body: String, session_id: Option<&str>) -> AppError {
        match status.as_u16() {
            401 | 403 => AppError::InvalidGatewayCredentials(body),
            404 => match session_id {
                Some(id) => AppError::SessionNotFound(id.to_string()),
                None => AppError::ExternalApi(format!("Stripe returned 404: {}", body)),
            },
            _ => AppError::ExternalApi(format!("Stripe returned {}: {}", status, body)),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_session(&self, request: &CreateSessionRequest) -> AppResult<GatewaySession> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);

        // La API de Stripe es form-encoded con claves indexadas
        let mut params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            ("client_reference_id".to_string(), request.booking_id.to_string()),
            ("metadata[booking_id]".to_string(), request.booking_id.to_string()),
        ];
        for (i, item) in request.line_items.iter().enumerate() {
            params.push((format!("line_items[{}][quantity]", i), item.quantity.to_string()));
            params.push((
                format!("line_items[{}][price_data][currency]", i),
                request.currency.clone(),
            ));
            params.push((
                format!("line_items[{}][price_data][unit_amount]", i),
                item.amount_minor.to_string(),
            ));
            params.push((
                format!("line_items[{}][price_data][product_data][name]", i),
                item.name.clone(),
            ));
        }

        log::info!("💳 Creando sesión de checkout para booking {}", request.booking_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Stripe request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Stripe rechazó la creación de sesión: {} {}", status, error_text);
            return Err(Self::map_error_status(status, error_text, None));
        }

        let session: StripeSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Failed to parse Stripe response: {}", e)))?;

        let redirect_url = session
            .url
            .ok_or_else(|| AppError::ExternalApi("Stripe session has no redirect URL".to_string()))?;

        Ok(GatewaySession {
            session_id: session.id,
            redirect_url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> AppResult<GatewaySessionStatus> {
        let url = format!("{}/v1/checkout/sessions/{}", self.api_base, session_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Stripe request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::map_error_status(status, error_text, Some(session_id)));
        }

        let session: StripeSessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Failed to parse Stripe response: {}", e)))?;

        Ok(GatewaySessionStatus {
            session_id: session.id,
            payment_status: GatewayPaymentStatus::parse(session.payment_status.as_deref().unwrap_or("")),
            session_status: session.status.unwrap_or_else(|| "unknown".to_string()),
            payment_intent_id: session.payment_intent,
        })
    }
}

/// Verificar la firma `Stripe-Signature` de un webhook.
///
/// El header trae `t=<timestamp>,v1=<hex hmac>`; la firma cubre
/// `"{t}.{payload}"` con HMAC-SHA256 del secret configurado.
pub fn verify_webhook_signature(
    secret: &str,
    signature_header: &str,
    payload: &[u8],
    now_timestamp: i64,
) -> AppResult<()> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in signature_header.split(',') {
        let mut kv = part.trim().splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(value)) => {
                timestamp = value.parse().ok();
            }
            (Some("v1"), Some(value)) => {
                if let Ok(decoded) = hex::decode(value) {
                    signatures.push(decoded);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::InvalidSignature("missing timestamp in signature header".to_string()))?;
    if signatures.is_empty() {
        return Err(AppError::InvalidSignature("missing v1 signature in header".to_string()));
    }

    if (now_timestamp - timestamp).abs() > SIGNATURE_TOLERANCE_SECONDS {
        return Err(AppError::InvalidSignature("signature timestamp outside tolerance".to_string()));
    }

    let mut signed_payload = Vec::with_capacity(payload.len() + 16);
    signed_payload.extend_from_slice(timestamp.to_string().as_bytes());
    signed_payload.push(b'.');
    signed_payload.extend_from_slice(payload);

    for signature in &signatures {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| AppError::InvalidSignature("invalid webhook secret".to_string()))?;
        mac.update(&signed_payload);
        if mac.verify_slice(signature).is_ok() {
            return Ok(());
        }
    }

    Err(AppError::InvalidSignature("no matching v1 signature".to_string()))
}
