use geolocator::errors::{GeolocatorError, Result};
use std::error::Error;

#[cfg(test)]
mod error_creation_tests {
    use super::*;

    #[test]
    fn test_invalid_key_error() {
        let error = GeolocatorError::invalid_key("'abc' is not a valid IPv4 address");

        assert!(matches!(error, GeolocatorError::InvalidKey(_)));
        assert!(error.to_string().contains("Invalid Key"));
        assert!(error.to_string().contains("'abc'"));
    }

    #[test]
    fn test_tier_unavailable_error() {
        let error = GeolocatorError::tier_unavailable("shared tier read failed");

        assert!(matches!(error, GeolocatorError::TierUnavailable(_)));
        assert!(error.to_string().contains("Tier Unavailable"));
    }

    #[test]
    fn test_repair_failed_error() {
        let error = GeolocatorError::repair_failed("writing 8.8.8.8 into local tier failed");

        assert!(matches!(error, GeolocatorError::RepairFailed(_)));
        assert_eq!(error.message(), "writing 8.8.8.8 into local tier failed");
    }

    #[test]
    fn test_upstream_error() {
        let error = GeolocatorError::upstream("upstream returned HTTP 429");

        assert!(matches!(error, GeolocatorError::Upstream(_)));
        assert!(error.to_string().contains("Upstream Error"));
    }
}

#[cfg(test)]
mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "crash.log missing");
        let error: GeolocatorError = io_error.into();

        assert!(matches!(error, GeolocatorError::FileOperation(_)));
        assert!(error.message().contains("crash.log missing"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: GeolocatorError = json_error.into();

        assert!(matches!(error, GeolocatorError::Serialization(_)));
    }

    #[test]
    fn test_question_mark_propagation() {
        fn parse(raw: &str) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(raw)?)
        }

        assert!(parse(r#"{"ip":"8.8.8.8"}"#).is_ok());
        assert!(matches!(
            parse("][").unwrap_err(),
            GeolocatorError::Serialization(_)
        ));
    }

    #[test]
    fn test_is_std_error() {
        let error = GeolocatorError::lookup_failed("no data");
        let dyn_error: &dyn Error = &error;
        assert!(dyn_error.source().is_none());
        assert_eq!(dyn_error.to_string(), "Lookup Failed: no data");
    }
}

#[cfg(test)]
mod error_format_tests {
    use super::*;

    #[test]
    fn test_format_simple() {
        let error = GeolocatorError::cache_plugin_not_found("Unknown store type: 'memcached'");
        assert_eq!(
            error.format_simple(),
            "Cache Plugin Not Found: Unknown store type: 'memcached'"
        );
    }

    #[cfg(feature = "server")]
    #[test]
    fn test_format_colored_contains_code() {
        let error = GeolocatorError::provider_config("Cannot open MaxMind database");
        let colored = error.format_colored();
        assert!(colored.contains("E007"));
        assert!(colored.contains("Cannot open MaxMind database"));
    }
}
