//! Clasificación de tipo de servicio
//!
//! Este módulo contiene la heurística de texto que clasifica reservas
//! legacy que no mandan un `service_type` explícito. Los callers nuevos
//! SIEMPRE mandan el enum; esta estrategia existe aislada detrás de
//! `ServiceClassifier` para poder borrarla cuando migren todos.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::booking::ServiceType;

/// Palabras que marcan una ubicación como aeropuerto (en minúsculas)
const AIRPORT_KEYWORDS: &[&str] = &["airport", "terminal", "aeropuerto", "aeroport"];

/// Tabla mantenida de nombres de aeropuertos frecuentes en el producto
const AIRPORT_NAMES: &[&str] = &[
    "changi",
    "seletar",
    "heathrow",
    "gatwick",
    "charles de gaulle",
    "schiphol",
    "suvarnabhumi",
    "don mueang",
    "kuala lumpur international",
    "soekarno-hatta",
    "ngurah rai",
    "hong kong international",
    "incheon",
    "narita",
    "haneda",
];

lazy_static! {
    /// Códigos estilo IATA como palabra aislada en mayúsculas ("SIN", "T1 JFK")
    static ref IATA_CODE: Regex = Regex::new(
        r"\b(SIN|XSP|JFK|LHR|LGW|CDG|AMS|BKK|DMK|KUL|CGK|DPS|HKG|ICN|NRT|HND)\b"
    )
    .unwrap();
}

/// Verificar si una ubicación de texto libre parece un aeropuerto
pub fn is_airport_location(location: &str) -> bool {
    let normalized = location.to_lowercase();
    if AIRPORT_KEYWORDS.iter().any(|kw| normalized.contains(kw)) {
        return true;
    }
    if AIRPORT_NAMES.iter().any(|name| normalized.contains(name)) {
        return true;
    }
    IATA_CODE.is_match(location)
}

/// Estrategia de clasificación de servicio para requests sin enum explícito
pub trait ServiceClassifier: Send + Sync {
    fn classify(&self, service_label: Option<&str>, pickup: &str, dropoff: &str) -> ServiceType;
}

/// Clasificador legacy por texto libre.
///
/// Reglas: una etiqueta de "one way" con alguna ubicación de aeropuerto es
/// un traslado de aeropuerto; one-way sin aeropuerto es un trip; todo lo
/// demás es rental por horas.
pub struct LegacyTextClassifier;

impl LegacyTextClassifier {
    fn is_one_way_label(label: &str) -> bool {
        let normalized = label.to_lowercase();
        normalized.contains("one way")
            || normalized.contains("one-way")
            || normalized.contains("trip")
            || normalized.contains("airport")
            || normalized.contains("transfer")
    }
}

impl ServiceClassifier for LegacyTextClassifier {
    fn classify(&self, service_label: Option<&str>, pickup: &str, dropoff: &str) -> ServiceType {
        let one_way = service_label
            .map(Self::is_one_way_label)
            .unwrap_or(false);

        if one_way {
            if is_airport_location(pickup) || is_airport_location(dropoff) {
                ServiceType::AirportTransfer
            } else {
                ServiceType::Trip
            }
        } else {
            ServiceType::Rental
        }
    }
}
