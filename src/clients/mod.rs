//! Clientes de APIs externas
//!
//! Este módulo contiene los clientes HTTP hacia servicios de terceros.

pub mod stripe_client;
