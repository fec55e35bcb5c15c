//! Configuration for server access.

use serde::{Deserialize, Serialize};
use url::Url;

use vaultsync_common::{Error, Result};

/// Default server location.
const DEFAULT_BASE_URL: &str = "https://api.vaultsync.app";
/// Versioned API path below the base URL.
const DEFAULT_API_PATH: &str = "api/v1";
/// Product name sent in the client-identity header.
const DEFAULT_PRODUCT_NAME: &str = "VaultSync";

/// Configuration for the authenticated gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server base URL. A stored override takes precedence.
    pub base_url: String,
    /// Versioned API path joined under the base URL.
    pub api_path: String,
    /// Product name reported to the server.
    pub product_name: String,
    /// Client version reported to the server.
    pub client_version: String,
    /// Server major version this client speaks.
    pub supported_server_major: u64,
    /// Newest vault schema version this client can open.
    pub max_vault_version: u32,
    /// Per-request timeout applied by the HTTP transport.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            product_name: DEFAULT_PRODUCT_NAME.to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            supported_server_major: 1,
            max_vault_version: 1,
            request_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Parse a configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("Invalid API config: {}", e)))
    }

    /// Value of the client-identity header, `<product>/<version>`.
    pub fn client_identity(&self) -> String {
        format!("{}/{}", self.product_name, self.client_version)
    }

    /// Resolve `endpoint` under the versioned API path of `base_url`.
    ///
    /// # Errors
    /// - Returns error if `base_url` is not an absolute URL
    pub fn endpoint_url(&self, base_url: &str, endpoint: &str) -> Result<Url> {
        let mut base = Url::parse(base_url)
            .map_err(|e| Error::InvalidInput(format!("Invalid server URL '{}': {}", base_url, e)))?;

        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let relative = format!(
            "{}/{}",
            self.api_path.trim_matches('/'),
            endpoint.trim_start_matches('/')
        );
        base.join(&relative)
            .map_err(|e| Error::InvalidInput(format!("Invalid endpoint '{}': {}", endpoint, e)))
    }
}
