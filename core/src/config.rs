//! Credentials and endpoint settings for one blog.

use std::fmt;

use serde::Deserialize;

use crate::error::BlogError;

pub const DEFAULT_HOST: &str = "https://blog.hatena.ne.jp";

pub const ENV_HATENA_ID: &str = "HATENA_ID";
pub const ENV_BLOG_ID: &str = "HATENA_BLOG_ID";
pub const ENV_API_KEY: &str = "HATENA_API_KEY";
pub const ENV_HOST: &str = "HATENA_HOST";

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

/// Everything needed to address and authenticate against one blog.
///
/// `host` is only overridden in tests or when pointing at a mock server.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub hatena_id: String,
    pub blog_id: String,
    pub api_key: String,
    #[serde(default = "default_host")]
    pub host: String,
}

impl Config {
    pub fn new(hatena_id: &str, blog_id: &str, api_key: &str) -> Self {
        Self {
            hatena_id: hatena_id.to_string(),
            blog_id: blog_id.to_string(),
            api_key: api_key.to_string(),
            host: default_host(),
        }
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.trim_end_matches('/').to_string();
        self
    }

    /// Read `HATENA_ID`, `HATENA_BLOG_ID`, `HATENA_API_KEY` and the optional
    /// `HATENA_HOST` from the process environment.
    pub fn from_env() -> Result<Self, BlogError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, BlogError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| BlogError::Config(format!("{key} is not set")))
        };
        let config = Self::new(
            &required(ENV_HATENA_ID)?,
            &required(ENV_BLOG_ID)?,
            &required(ENV_API_KEY)?,
        );
        Ok(match lookup(ENV_HOST).filter(|v| !v.is_empty()) {
            Some(host) => config.with_host(&host),
            None => config,
        })
    }

    /// `{host}/{hatena_id}/{blog_id}/atom`
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/{}/atom",
            self.host.trim_end_matches('/'),
            self.hatena_id,
            self.blog_id
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("hatena_id", &self.hatena_id)
            .field("blog_id", &self.blog_id)
            .field("api_key", &"<redacted>")
            .field("host", &self.host)
            .finish()
    }
}
