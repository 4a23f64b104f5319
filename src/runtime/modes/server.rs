//! Server mode
//!
//! This module contains the HTTP server startup logic.
//! It configures and starts the HTTP server with all necessary routes.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::Result;
use std::time::Duration;
use tracing::warn;

use crate::api::middleware::{RequestIdMiddleware, TimingMiddleware};
use crate::api::services::{AppStartTime, geoip_routes, health_routes};
use crate::config::StaticConfig;
use crate::runtime::lifetime;

/// 最大 worker 数
const MAX_WORKERS: usize = 32;

/// All routes mounted under the configured prefix
pub fn app_routes(route_prefix: &str) -> actix_web::Scope {
    web::scope(route_prefix.trim_end_matches('/'))
        .service(geoip_routes())
        .service(health_routes())
}

/// Run the HTTP server
///
/// This function:
/// 1. Records startup time
/// 2. Builds the lookup chain and its tiers
/// 3. Configures and starts the HTTP server
/// 4. On SIGINT/SIGTERM drains repair tasks, then stops the workers
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: &StaticConfig) -> Result<()> {
    let app_start_time = AppStartTime::now();

    let startup = lifetime::startup::prepare_server_startup(config)
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let chain = startup.chain.clone();
    let metrics = startup.metrics.clone();
    let route_prefix = config.server.route_prefix.clone();

    let cpu_count = config.server.cpu_count.clamp(1, MAX_WORKERS);
    warn!("Using {} CPU cores for the server", cpu_count);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TimingMiddleware::new(metrics.clone(), &route_prefix)) // 最外层，记录请求延迟
            .wrap(RequestIdMiddleware) // 为每个请求关联 request_id
            .wrap(Compress::default())
            .app_data(web::Data::new(chain.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .wrap(
                DefaultHeaders::new()
                    .add(("Connection", "keep-alive"))
                    .add(("Keep-Alive", "timeout=30, max=1000"))
                    .add(("Cache-Control", "no-cache, no-store, must-revalidate")),
            )
            .service(app_routes(&route_prefix))
    })
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_millis(5000))
    .client_disconnect_timeout(Duration::from_millis(1000))
    .workers(cpu_count)
    .disable_signals();

    // Bind to Unix socket or TCP address
    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let server = {
        #[cfg(unix)]
        {
            if let Some(ref socket_path) = config.server.unix_socket {
                warn!("Starting server on Unix socket: {}", socket_path);
                if std::path::Path::new(socket_path).exists() {
                    std::fs::remove_file(socket_path)?;
                }
                server.bind_uds(socket_path)?
            } else {
                warn!("Starting server at http://{}", bind_address);
                server.bind(&bind_address)?
            }
        }

        #[cfg(not(unix))]
        {
            warn!("Starting server at http://{}", bind_address);
            server.bind(&bind_address)?
        }
    }
    .run();

    let drain_timeout = Duration::from_secs(config.repair.shutdown_timeout_secs);

    // Wait for server or shutdown signal
    lifetime::shutdown::run_until_shutdown(
        server,
        lifetime::shutdown::wait_for_signal(),
        startup.repairs.clone(),
        drain_timeout,
    )
    .await?;

    Ok(())
}
