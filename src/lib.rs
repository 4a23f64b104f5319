//! Geolocator - IPv4 geolocation service backed by a tiered lookup chain
//!
//! A lookup walks a local in-process cache, a shared cache and an authoritative
//! provider in that order, and repopulates the faster tiers in the background.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **metrics**: Prometheus metrics export
//! - **full**: All features enabled
//!
//! # Architecture
//! - `cache`: Record stores for the local and shared tiers
//! - `services`: Authoritative providers, the lookup chain and repair scheduling
//! - `storage`: Record and key types
//! - `api`: HTTP services and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging and panic reporting

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod metrics_core;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
