//! Mode routing
//!
//! The only execution mode is the HTTP server.

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "server")]
pub use server::run_server;
