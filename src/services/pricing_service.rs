//! Motor de precios
//!
//! Este módulo calcula el desglose de precio de una reserva a partir de la
//! ficha de precios del vehículo y los parámetros del viaje. Es una función
//! pura: sin I/O, sin efectos, determinista. TODO precio que se muestre,
//! persista o cobre sale de aquí; ningún otro módulo reimplementa reglas.

use chrono::{NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::PricingConfig;
use crate::models::booking::ServiceType;
use crate::models::vehicle::PriceSheet;
use crate::services::classifier_service::is_airport_location;

/// Desglose de precio de una reserva
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub base_price: Decimal,
    pub overage_hours: i32,
    pub overage_price: Decimal,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub night_surcharge: Decimal,
    pub total: Decimal,
}

/// Desglose serializado para la API (montos como strings decimales)
#[derive(Debug, Serialize)]
pub struct PriceBreakdownResponse {
    pub base_price: String,
    pub overage_hours: i32,
    pub overage_price: String,
    pub subtotal: String,
    pub tax: String,
    pub night_surcharge: String,
    pub total: String,
}

impl From<&PriceBreakdown> for PriceBreakdownResponse {
    fn from(breakdown: &PriceBreakdown) -> Self {
        Self {
            base_price: breakdown.base_price.to_string(),
            overage_hours: breakdown.overage_hours,
            overage_price: breakdown.overage_price.to_string(),
            subtotal: breakdown.subtotal.to_string(),
            tax: breakdown.tax.to_string(),
            night_surcharge: breakdown.night_surcharge.to_string(),
            total: breakdown.total.to_string(),
        }
    }
}

/// Motor de precios
#[derive(Debug, Clone)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Calcular el desglose de precio de una reserva
    pub fn price(
        &self,
        sheet: &PriceSheet,
        service_type: ServiceType,
        pickup_location: &str,
        dropoff_location: &str,
        start_time: NaiveTime,
        duration_hours: Option<i32>,
    ) -> PriceBreakdown {
        let (base_price, overage_hours, overage_price) = match service_type {
            ServiceType::AirportTransfer => {
                let rate = self.airport_transfer_rate(sheet, pickup_location, dropoff_location);
                (rate, 0, Decimal::ZERO)
            }
            ServiceType::Trip => {
                let rate = sheet.trip_base.unwrap_or(self.config.default_price_trip_base);
                (rate, 0, Decimal::ZERO)
            }
            ServiceType::Rental => self.rental_price(sheet, duration_hours.unwrap_or(0)),
        };

        let subtotal = base_price + overage_price;
        let tax = (subtotal * self.config.tax_rate).round_dp(2);
        let night_surcharge = if self.config.is_night_hour(start_time.hour()) {
            self.config.night_surcharge
        } else {
            Decimal::ZERO
        };

        PriceBreakdown {
            base_price,
            overage_hours,
            overage_price,
            subtotal,
            tax,
            night_surcharge,
            total: subtotal + tax + night_surcharge,
        }
    }

    /// Tarifa de traslado de aeropuerto según la dirección del viaje.
    ///
    /// Viajes HACIA el aeropuerto llevan un descuento fijo; viajes DESDE el
    /// aeropuerto (y los casos ambiguos) cobran la tarifa completa.
    fn airport_transfer_rate(&self, sheet: &PriceSheet, pickup: &str, dropoff: &str) -> Decimal {
        let rate = sheet
            .airport_transfer
            .unwrap_or(self.config.default_price_airport_transfer);

        let pickup_is_airport = is_airport_location(pickup);
        let dropoff_is_airport = is_airport_location(dropoff);

        if dropoff_is_airport && !pickup_is_airport {
            (rate - self.config.airport_dropoff_discount).max(Decimal::ZERO)
        } else {
            rate
        }
    }

    /// Tarifa de rental por tramos con horas extra.
    ///
    /// Los límites exactos (6 y 12 horas) cobran la tarifa plana del tramo,
    /// no la fórmula de horas extra.
    fn rental_price(&self, sheet: &PriceSheet, duration_hours: i32) -> (Decimal, i32, Decimal) {
        let six = sheet.six_hours.unwrap_or(self.config.default_price_6_hours);
        let twelve = sheet.twelve_hours.unwrap_or(self.config.default_price_12_hours);
        let per_hour = sheet.per_hour.unwrap_or(self.config.default_price_per_hour);

        if duration_hours <= 6 {
            (six, 0, Decimal::ZERO)
        } else if duration_hours <= 12 {
            let overage = duration_hours - 6;
            (six, overage, Decimal::from(overage) * per_hour)
        } else {
            let overage = duration_hours - 12;
            (twelve, overage, Decimal::from(overage) * per_hour)
        }
    }
}
