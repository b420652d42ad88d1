//! Server-side vendor defaults.
//!
//! Values here are used whenever the matching per-source field is empty, so a
//! deployment can ship a key without every user entering one.

/// Environment variables read by [`ServerConfig::from_env`].
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_API_HOST_ENV: &str = "OPENAI_API_HOST";
pub const OPENAI_API_ORG_ENV: &str = "OPENAI_API_ORG_ID";
pub const HELICONE_API_KEY_ENV: &str = "HELICONE_API_KEY";

/// Fallback credentials and host for the OpenAI vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub api_key: Option<String>,
    pub api_host: Option<String>,
    pub organization_id: Option<String>,
    pub proxy_key: Option<String>,
}

impl ServerConfig {
    /// Read the server defaults from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let config = Self {
            api_key: get(OPENAI_API_KEY_ENV),
            api_host: get(OPENAI_API_HOST_ENV),
            organization_id: get(OPENAI_API_ORG_ENV),
            proxy_key: get(HELICONE_API_KEY_ENV),
        };
        tracing::debug!(
            has_server_key = config.has_server_key(),
            api_host = ?config.api_host,
            "Loaded server vendor defaults"
        );
        config
    }

    /// Whether a server-side API key is available.
    pub fn has_server_key(&self) -> bool {
        self.api_key.is_some()
    }
}
