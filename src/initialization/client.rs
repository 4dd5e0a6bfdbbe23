//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::Config;
use crate::error_handling::InitializationError;

/// Initializes the shared HTTP client used for every script download.
///
/// Creates a `reqwest::Client` configured with:
/// - Separate connect and read timeouts from the configuration
/// - An idle-connection pool sized to the worker width
/// - Optional proxy applied to all schemes
/// - Certificate verification disabled when `insecure` is set
///
/// User-Agent, cookie and the extra header are per-request concerns and are
/// added by the fetch layer.
///
/// # Errors
///
/// Returns `InitializationError::InvalidProxy` if the proxy URL is rejected, or
/// `InitializationError::HttpClientError` if client creation fails.
pub fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, InitializationError> {
    let mut builder = ClientBuilder::new()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .read_timeout(Duration::from_secs(config.read_timeout_secs))
        .pool_max_idle_per_host(config.max_concurrency.max(1))
        .danger_accept_invalid_certs(config.insecure);

    if let Some(proxy_url) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| InitializationError::InvalidProxy(format!("{proxy_url}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    Ok(Arc::new(builder.build()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client_defaults() {
        let config = Config::default();
        assert!(init_client(&config).is_ok());
    }

    #[test]
    fn test_init_client_with_proxy() {
        let config = Config {
            proxy: Some("http://127.0.0.1:8080".to_string()),
            insecure: true,
            ..Default::default()
        };
        assert!(init_client(&config).is_ok());
    }

    #[test]
    fn test_init_client_rejects_bad_proxy() {
        let config = Config {
            proxy: Some("not a proxy url".to_string()),
            ..Default::default()
        };
        let err = init_client(&config).expect_err("malformed proxy must fail");
        assert!(matches!(err, InitializationError::InvalidProxy(_)));
    }

    #[test]
    fn test_init_client_ignores_blank_proxy() {
        let config = Config {
            proxy: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(init_client(&config).is_ok());
    }
}
