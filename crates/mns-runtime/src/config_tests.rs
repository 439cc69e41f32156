//! Tests for client configuration.

use super::*;
use std::io::Write;

const ENDPOINT: &str = "https://1234.mns.cn-hangzhou.aliyuncs.com";

mod defaults_tests {
    use super::*;

    /// Verify defaults match the service's documented limits
    #[test]
    fn test_new_uses_defaults() {
        let config = ClientConfig::new(ENDPOINT);

        assert_eq!(config.timeout(), Duration::from_secs(35));
        assert_eq!(config.max_connections_per_host, 512);
        assert_eq!(config.queue_qps_limit, 2000);
        assert_eq!(config.topic_qps_limit, 2000);
        assert_eq!(config.qps_window_seconds, 5);
        assert!(config.validate().is_ok());
    }

    /// Verify a zero QPS override keeps the default ceiling
    #[test]
    fn test_zero_qps_override_ignored() {
        let config = ClientConfig::new(ENDPOINT)
            .with_queue_qps_limit(0)
            .with_topic_qps_limit(50);

        assert_eq!(config.queue_qps_limit, 2000);
        assert_eq!(config.topic_qps_limit, 50);
    }

    /// Verify the configured proxy takes precedence
    #[test]
    fn test_configured_proxy_preferred() {
        let config = ClientConfig::new(ENDPOINT).with_proxy("http://proxy.internal:3128");
        assert_eq!(
            config.resolve_proxy().as_deref(),
            Some("http://proxy.internal:3128")
        );
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn test_empty_endpoint_rejected() {
        let result = ClientConfig::new("  ").validate();
        assert!(matches!(result, Err(ConfigurationError::Missing { .. })));
    }

    #[test]
    fn test_unparseable_endpoint_rejected() {
        let result = ClientConfig::new("not a url").validate();
        assert!(matches!(result, Err(ConfigurationError::Invalid { .. })));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = ClientConfig::new(ENDPOINT)
            .with_timeout(Duration::from_secs(0))
            .validate();
        assert!(matches!(result, Err(ConfigurationError::Invalid { .. })));
    }

    #[test]
    fn test_zero_window_rejected() {
        let result = ClientConfig::new(ENDPOINT)
            .with_qps_window_seconds(0)
            .validate();
        assert!(matches!(result, Err(ConfigurationError::Invalid { .. })));
    }
}

mod credential_tests {
    use super::*;

    /// Verify a configured key pair becomes a static provider
    #[tokio::test]
    async fn test_static_credentials_from_config() {
        let config = ClientConfig::new(ENDPOINT)
            .with_credentials("config-key", "config-secret")
            .with_security_token("config-token");

        let credential = config.credential_provider().credential().await.unwrap();
        assert_eq!(credential.access_key_id(), "config-key");
        assert_eq!(credential.access_key_secret(), "config-secret");
        assert_eq!(credential.security_token(), Some("config-token"));
    }

    /// Verify secrets never appear in debug output
    #[test]
    fn test_debug_redacts_secret() {
        let config = ClientConfig::new(ENDPOINT).with_credentials("config-key", "config-secret");
        let debug = format!("{:?}", config);

        assert!(debug.contains("config-key"));
        assert!(!debug.contains("config-secret"));
    }
}

mod loading_tests {
    use super::*;

    /// File and environment loading share process state, so both run here
    #[test]
    fn test_load_from_file_then_environment() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "endpoint: {}\ntimeout_seconds: 10\nqueue_qps_limit: 100",
            ENDPOINT
        )
        .unwrap();

        std::env::remove_var("MNS__TOPIC_QPS_LIMIT");
        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.endpoint, ENDPOINT);
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.queue_qps_limit, 100);
        assert_eq!(config.topic_qps_limit, 2000);
        assert_eq!(config.max_connections_per_host, 512);

        std::env::set_var("MNS__TOPIC_QPS_LIMIT", "300");
        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.topic_qps_limit, 300);
        std::env::remove_var("MNS__TOPIC_QPS_LIMIT");
    }

    /// Verify a missing required file is an error
    #[test]
    fn test_load_missing_file_fails() {
        let result = ClientConfig::load(Some(Path::new("/nonexistent/mns-config.yaml")));
        assert!(matches!(result, Err(ConfigurationError::Parsing { .. })));
    }
}
