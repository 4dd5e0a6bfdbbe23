//! Per-request headers.

use log::warn;
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT, COOKIE, USER_AGENT};

use crate::config::{Config, SCRIPT_ACCEPT_HEADER, USER_AGENTS};
use crate::error_handling::ConfigError;

/// Headers added to every script request on top of the client defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    extra_header: Option<(HeaderName, HeaderValue)>,
    cookie: Option<HeaderValue>,
}

impl RequestOptions {
    /// Builds the options from the configuration. A malformed header or
    /// cookie is logged and dropped.
    pub fn from_config(config: &Config) -> Self {
        let extra_header = config
            .header
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .and_then(|h| match parse_extra_header(h) {
                Ok(pair) => Some(pair),
                Err(e) => {
                    warn!("{e}; header ignored");
                    None
                }
            });

        let cookie = config
            .cookie
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .and_then(|c| match HeaderValue::from_str(c.trim()) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Cookie contains invalid header characters; cookie ignored");
                    None
                }
            });

        Self {
            extra_header,
            cookie,
        }
    }

    /// Applies a rotating User-Agent, the script Accept header, and the
    /// configured extra header and cookie.
    pub fn apply_to_request_builder(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> reqwest::RequestBuilder {
        let user_agent = USER_AGENTS
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let mut builder = builder
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, SCRIPT_ACCEPT_HEADER);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie.clone());
        }
        if let Some((name, value)) = &self.extra_header {
            builder = builder.header(name.clone(), value.clone());
        }
        builder
    }
}

/// Parses a `Name: value` header.
pub fn parse_extra_header(raw: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let invalid = || ConfigError::InvalidHeader(raw.to_string());
    let (name, value) = raw.split_once(':').ok_or_else(invalid)?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extra_header() {
        let (name, value) = parse_extra_header("X-Api-Key: abc:def").unwrap();
        assert_eq!(name.as_str(), "x-api-key");
        assert_eq!(value.to_str().unwrap(), "abc:def");
    }

    #[test]
    fn test_parse_extra_header_rejects_malformed() {
        assert!(parse_extra_header("no colon here").is_err());
        assert!(parse_extra_header("bad name: v").is_err());
        assert!(parse_extra_header("X-Ok: line\nbreak").is_err());
    }

    #[test]
    fn test_request_options_drop_invalid_header() {
        let config = Config {
            header: Some("garbage".to_string()),
            cookie: Some("sid=1".to_string()),
            ..Default::default()
        };
        let opts = RequestOptions::from_config(&config);
        assert!(opts.extra_header.is_none());
        assert_eq!(opts.cookie.as_ref().unwrap().to_str().unwrap(), "sid=1");
    }

    #[test]
    fn test_apply_to_request_builder_sets_headers() {
        let config = Config {
            header: Some("X-Test: 1".to_string()),
            cookie: Some("sid=abc".to_string()),
            ..Default::default()
        };
        let opts = RequestOptions::from_config(&config);
        let request = opts
            .apply_to_request_builder(reqwest::Client::new().get("https://a.com/x.js"))
            .build()
            .unwrap();
        let headers = request.headers();
        assert_eq!(headers[ACCEPT], SCRIPT_ACCEPT_HEADER);
        assert_eq!(headers["x-test"], "1");
        assert_eq!(headers[COOKIE], "sid=abc");
        let ua = headers[USER_AGENT].to_str().unwrap();
        assert!(USER_AGENTS.contains(&ua));
    }
}
