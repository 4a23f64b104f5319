use anyhow::{Context, Result, bail};
use colored::Colorize;
use tracing::info;

use geolocator::config::{
    self, DEFAULT_CONFIG_PATH, StaticConfig, args::parse_config_path, args::wants_sample_config,
};
use geolocator::runtime::modes::run_server;
use geolocator::system::{init_logging, install_panic_hook};

#[actix_web::main]
async fn main() -> Result<()> {
    install_panic_hook();

    // 加载 .env（可选）
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    if wants_sample_config(&args) {
        print!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    }

    let config_path = parse_config_path(&args).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    config::init_config_from(&config_path);
    let app_config = config::get_config();

    if let Err(problems) = config::validate_config(&app_config) {
        eprintln!("{}", "[ERROR] Invalid configuration:".red().bold());
        for problem in &problems {
            eprintln!("  - {}", problem);
        }
        bail!("{} configuration problem(s) in {}", problems.len(), config_path);
    }

    // WorkerGuard 必须存活到进程结束，否则缓冲的日志会丢失
    let _log_guard = init_logging(&app_config).map_err(|e| {
        eprintln!("{}", e.format_colored());
        anyhow::anyhow!(e)
    })?;

    info!(
        "geolocator {} starting (config: {})",
        env!("CARGO_PKG_VERSION"),
        config_path
    );

    run_server(&app_config)
        .await
        .context("Server terminated with an error")
}
