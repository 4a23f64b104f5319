use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::Server;
use tokio::signal;
use tracing::{info, warn};

use crate::services::RepairScheduler;

/// 等待 SIGTERM 或 Ctrl+C
///
/// actix 自身的信号处理已关闭，停止顺序由 [`run_until_shutdown`] 控制
pub async fn wait_for_signal() {
    let sigint = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = sigint => info!("Received SIGINT (Ctrl+C)"),
        _ = sigterm => info!("Received SIGTERM"),
    }
}

/// 运行 HTTP 服务直到 `shutdown` 完成
///
/// 回填任务跑在 worker 的运行时上，worker 退出会丢弃尚未完成的任务，
/// 所以先排空回填，再优雅停止 worker。
pub async fn run_until_shutdown<S>(
    server: Server,
    shutdown: S,
    repairs: Arc<RepairScheduler>,
    drain_timeout: Duration,
) -> std::io::Result<()>
where
    S: Future<Output = ()>,
{
    let handle = server.handle();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        res = &mut server => {
            res?;
            drain_repairs(&repairs, drain_timeout).await;
            return Ok(());
        }
        _ = shutdown => {}
    }

    info!("Shutdown requested, draining repair tasks before stopping workers...");
    drain_repairs(&repairs, drain_timeout).await;

    let stopping = handle.stop(true);
    let (res, ()) = tokio::join!(server, stopping);
    info!("HTTP workers stopped");
    res
}

/// 等待回填任务完成；超时的任务随进程退出被丢弃
pub async fn drain_repairs(repairs: &RepairScheduler, drain_timeout: Duration) {
    let pending = repairs.in_flight();
    if repairs.drain(drain_timeout).await {
        info!("All repair tasks completed ({} drained)", pending);
    } else {
        warn!(
            "Repair tasks did not finish within {} seconds, abandoning {}",
            drain_timeout.as_secs(),
            repairs.in_flight()
        );
    }
}
