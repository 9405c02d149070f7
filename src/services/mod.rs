//! Services module
//!
//! Este módulo contiene la lógica de negocio de la aplicación: el motor
//! de precios, el ciclo de vida de reservas, la reconciliación de pagos,
//! las notificaciones y el barrido de reservas expiradas.

pub mod booking_service;
pub mod classifier_service;
pub mod notification_service;
pub mod payment_service;
pub mod pricing_service;
pub mod reservation_sweeper;

pub use booking_service::BookingService;
pub use payment_service::PaymentService;
pub use pricing_service::PricingEngine;
pub use reservation_sweeper::ReservationSweeper;
