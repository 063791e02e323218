//! Process-wide server context and its lifecycle.
//!
//! The context is acquired once from [`Config`] before the server starts
//! serving, shared read-only as `Arc<ServerContext>` with every handler, and
//! released exactly once when the serving scope ends, whichever way it ends.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::Config;
use super::error::{Error, Result};
use crate::domains::tools::{ApiClient, ToolRegistry};

// ============================================================================
// Base URL table
// ============================================================================

/// Mapping from tool name (or the `"default"` sentinel) to a base URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseUrls(HashMap<String, String>);

impl BaseUrls {
    /// Key of the fallback entry.
    pub const DEFAULT_KEY: &'static str = "default";

    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, url: impl Into<String>) -> Self {
        self.insert(key, url);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, url: impl Into<String>) {
        self.0.insert(key.into(), url.into());
    }

    /// Base URL for `tool`: its own entry, else the default entry.
    pub fn resolve(&self, tool: &str) -> Option<&str> {
        self.get(tool).or_else(|| self.get(Self::DEFAULT_KEY))
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

// ============================================================================
// Credential
// ============================================================================

/// Static API credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

// ============================================================================
// Server context
// ============================================================================

/// Immutable configuration handed to every tool invocation.
#[derive(Debug)]
pub struct ServerContext {
    credential: Credential,
    base_urls: BaseUrls,
    client: ApiClient,
    released: AtomicBool,
}

impl ServerContext {
    pub fn new(credential: Credential, base_urls: BaseUrls, client: ApiClient) -> Self {
        Self {
            credential,
            base_urls,
            client,
            released: AtomicBool::new(false),
        }
    }

    /// Acquire the context from resolved configuration.
    ///
    /// Fails when the credential is empty, a base URL does not parse, or the
    /// HTTP client cannot be built.
    pub fn acquire(config: &Config) -> Result<Self> {
        let credential = config
            .api
            .credential
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::config(
                    "API key is not set. Pass --api-key, set MCP_API_KEY, \
                     or add MCP_API_KEY to the .env file",
                )
            })?;

        for (key, url) in config.api.base_urls.iter() {
            Url::parse(url).map_err(|e| {
                Error::config(format!("invalid API URL for '{key}' ({url}): {e}"))
            })?;
        }

        let client = ApiClient::new(
            credential,
            Duration::from_secs(config.api.timeout_secs),
            &config.api.user_agent,
        )?;

        info!(
            timeout_secs = config.api.timeout_secs,
            "Server context acquired (API key: set)"
        );

        Ok(Self::new(
            Credential::new(credential),
            config.api.base_urls.clone(),
            client,
        ))
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn base_urls(&self) -> &BaseUrls {
        &self.base_urls
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Check that every registered tool has a base URL.
    pub fn ensure_routable(&self, registry: &ToolRegistry) -> Result<()> {
        for name in registry.tool_names() {
            if self.base_urls.resolve(name).is_none() {
                return Err(Error::config(format!("no API URL configured for '{name}'")));
            }
            debug!(tool = name, url = ?self.base_urls.resolve(name), "Tool routed");
        }
        Ok(())
    }

    /// Release the context. Returns `true` only for the call that released it.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!("Server context released");
        true
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Scope
// ============================================================================

/// Releases the context when dropped.
///
/// Dropping covers normal return, early error return, panics unwinding
/// through the scope, and cancellation of the future holding it.
pub struct ContextScope {
    context: Arc<ServerContext>,
}

impl ContextScope {
    pub fn new(context: Arc<ServerContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.context
    }

    /// Run `body` with the context, releasing it afterwards on every path.
    pub async fn run<F, Fut, T>(context: Arc<ServerContext>, body: F) -> T
    where
        F: FnOnce(Arc<ServerContext>) -> Fut,
        Fut: Future<Output = T>,
    {
        let scope = Self::new(context);
        body(Arc::clone(scope.context())).await
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        self.context.release();
    }
}
