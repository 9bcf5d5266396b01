//! Endpoint assembly for the coaching service.

use url::Url;

use crate::error::CoachError;
use crate::storage::CoachConfig;

/// A configured coach endpoint: base URL plus request path and auth shape.
#[derive(Debug, Clone)]
pub struct CoachEndpoint {
    pub base_url: String,
    pub path: String,
    pub api_key_header: String,
    pub api_key_prefix: String,
}

impl CoachEndpoint {
    /// Assemble the full request URL for `path`.
    ///
    /// The base may itself carry a path prefix (reverse proxies); `path`
    /// is appended rather than replacing it.
    pub fn url(&self, path: &str) -> Result<Url, CoachError> {
        let base = Url::parse(&self.base_url)?;
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    /// The configured primary request URL.
    pub fn primary_url(&self) -> Result<Url, CoachError> {
        self.url(&self.path)
    }

    /// Header value for the stored API key.
    pub fn auth_value(&self, api_key: &str) -> String {
        format!("{}{}", self.api_key_prefix, api_key)
    }
}

impl From<&CoachConfig> for CoachEndpoint {
    fn from(config: &CoachConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            path: config.path.clone(),
            api_key_header: config.api_key_header.clone(),
            api_key_prefix: config.api_key_prefix.clone(),
        }
    }
}
