//! Outbound HTTP client shared by all tool handlers.
//!
//! The static credential is attached to every request as a bearer token.
//! Timeouts are enforced here, per request.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::error::ToolError;
use crate::core::{Error, Result};

/// Authenticated client for the wrapped API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    /// Build a client that authorizes every request with `credential`.
    pub fn new(credential: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {credential}"))
            .map_err(|_| Error::config("API key contains characters not allowed in a header"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// `GET url?query` and decode the JSON body.
    ///
    /// Non-2xx statuses become [`ToolError::Upstream`].
    #[instrument(skip_all, fields(url = %url))]
    pub async fn get_json<Q>(&self, url: Url, query: &Q) -> std::result::Result<Value, ToolError>
    where
        Q: Serialize + ?Sized,
    {
        let response = self.http.get(url).query(query).send().await?;

        let status = response.status();
        debug!(%status, "Upstream responded");
        if !status.is_success() {
            return Err(ToolError::Upstream {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_header_breaking_credential() {
        let err = ApiClient::new("bad\nkey", Duration::from_secs(1), "test").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_debug_does_not_leak_credential() {
        let client = ApiClient::new("super_secret_key", Duration::from_secs(1), "test").unwrap();
        let debug_str = format!("{client:?}");
        assert!(!debug_str.contains("super_secret_key"));
    }
}
