//! Command-line argument parsing
//!
//! The server takes no subcommands; only the configuration file path and a
//! sample-config switch are recognized.

/// Parse configuration file path from command-line arguments
///
/// Supports multiple formats:
/// - `-c path` / `--config path`
/// - `-c=path` / `--config=path`
///
/// # Examples
/// ```
/// use geolocator::config::args::parse_config_path;
/// let args = vec!["program".to_string(), "-c".to_string(), "custom.toml".to_string()];
/// assert_eq!(parse_config_path(&args), Some("custom.toml".to_string()));
/// ```
pub fn parse_config_path(args: &[String]) -> Option<String> {
    let mut i = 1; // Skip program name
    while i < args.len() {
        let arg = &args[i];

        if (arg == "-c" || arg == "--config") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }

        if let Some(path) = arg.strip_prefix("-c=") {
            return Some(path.to_string());
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }

        i += 1;
    }

    None
}

/// Whether `--generate-config` was passed
///
/// When set, the binary prints a sample TOML configuration and exits.
pub fn wants_sample_config(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| a == "--generate-config")
}
