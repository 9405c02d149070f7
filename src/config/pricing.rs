//! Constantes de pricing
//!
//! Este módulo concentra todas las constantes de negocio del cálculo de
//! precios. Cada valor puede sobreescribirse por variable de entorno y
//! tiene un default documentado; el resto del código no contiene números
//! mágicos de pricing.

use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Configuración del motor de precios y de las políticas de reserva
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Descuento fijo para traslados CON DESTINO al aeropuerto
    pub airport_dropoff_discount: Decimal,
    /// Recargo fijo para recogidas en la ventana nocturna
    pub night_surcharge: Decimal,
    /// Inicio de la ventana nocturna (hora local, 24h, inclusive)
    pub night_start_hour: u32,
    /// Fin de la ventana nocturna (hora local, 24h, exclusivo)
    pub night_end_hour: u32,
    /// Tasa de impuesto aplicada al subtotal pre-recargo (0 = sin impuesto)
    pub tax_rate: Decimal,
    /// Moneda de cobro en el gateway (código ISO en minúsculas)
    pub currency: String,
    // Fallbacks cuando la ficha de precios del vehículo no define el campo
    pub default_price_airport_transfer: Decimal,
    pub default_price_trip_base: Decimal,
    pub default_price_6_hours: Decimal,
    pub default_price_12_hours: Decimal,
    pub default_price_per_hour: Decimal,
    // Políticas de reserva
    /// Minutos que una reserva impaga puede vivir antes de expirar
    pub reservation_ttl_minutes: i64,
    /// Minutos de gracia antes de liberar el vehículo de una reserva cancelada
    /// (0 = liberación inmediata al cancelar)
    pub release_grace_minutes: i64,
    /// Intervalo del barrido de expiración en segundos
    pub sweep_interval_seconds: u64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            airport_dropoff_discount: dec!(10),
            night_surcharge: dec!(10),
            night_start_hour: 23,
            night_end_hour: 7,
            tax_rate: Decimal::ZERO,
            currency: "usd".to_string(),
            default_price_airport_transfer: dec!(100),
            default_price_trip_base: dec!(100),
            default_price_6_hours: dec!(360),
            default_price_12_hours: dec!(720),
            default_price_per_hour: dec!(60),
            reservation_ttl_minutes: 30,
            release_grace_minutes: 0,
            sweep_interval_seconds: 60,
        }
    }
}

impl PricingConfig {
    /// Cargar la configuración desde el entorno, con los defaults documentados
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            airport_dropoff_discount: decimal_var("AIRPORT_DROPOFF_DISCOUNT", defaults.airport_dropoff_discount),
            night_surcharge: decimal_var("NIGHT_SURCHARGE", defaults.night_surcharge),
            night_start_hour: int_var("NIGHT_START_HOUR", defaults.night_start_hour),
            night_end_hour: int_var("NIGHT_END_HOUR", defaults.night_end_hour),
            tax_rate: decimal_var("BOOKING_TAX_RATE", defaults.tax_rate),
            currency: env::var("BOOKING_CURRENCY").unwrap_or(defaults.currency),
            default_price_airport_transfer: decimal_var(
                "DEFAULT_PRICE_AIRPORT_TRANSFER",
                defaults.default_price_airport_transfer,
            ),
            default_price_trip_base: decimal_var("DEFAULT_PRICE_TRIP_BASE", defaults.default_price_trip_base),
            default_price_6_hours: decimal_var("DEFAULT_PRICE_6_HOURS", defaults.default_price_6_hours),
            default_price_12_hours: decimal_var("DEFAULT_PRICE_12_HOURS", defaults.default_price_12_hours),
            default_price_per_hour: decimal_var("DEFAULT_PRICE_PER_HOUR", defaults.default_price_per_hour),
            reservation_ttl_minutes: int_var("RESERVATION_TTL_MINUTES", defaults.reservation_ttl_minutes),
            release_grace_minutes: int_var("RELEASE_GRACE_MINUTES", defaults.release_grace_minutes),
            sweep_interval_seconds: int_var("SWEEP_INTERVAL_SECONDS", defaults.sweep_interval_seconds),
        }
    }

    /// Verificar si una hora local cae dentro de la ventana nocturna
    pub fn is_night_hour(&self, hour: u32) -> bool {
        hour >= self.night_start_hour || hour < self.night_end_hour
    }
}

fn decimal_var(name: &str, default: Decimal) -> Decimal {
    env::var(name)
        .ok()
        .and_then(|v| Decimal::from_str(&v).ok())
        .unwrap_or(default)
}

fn int_var<T: FromStr + Copy>(name: &str, default: T) -> T {
    env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_night_window_default() {
        let config = PricingConfig::default();
        assert!(config.is_night_hour(23));
        assert!(config.is_night_hour(0));
        assert!(config.is_night_hour(1));
        assert!(config.is_night_hour(6));
        assert!(!config.is_night_hour(7));
        assert!(!config.is_night_hour(14));
        assert!(!config.is_night_hour(22));
    }
}
