//! Configuration types for the ActiveESP system
//!
//! This module defines the credentials handed to provider factories and the
//! top-level configuration that selects a provider.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::SubscriberPolicy;

/// Credentials used to construct a provider
///
/// Every field an adapter can read is listed explicitly. Adapters outside
/// this workspace may read `extra`.
///
/// # Security
///
/// The Debug implementation does NOT expose the API key or password.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// API key (MailChimp, and the data center it encodes)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL override without a trailing slash
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Application ID (iContact)
    #[serde(default)]
    pub app_id: Option<String>,

    /// Account username (iContact)
    #[serde(default)]
    pub username: Option<String>,

    /// Account or application password (iContact)
    #[serde(default)]
    pub password: Option<String>,

    /// API version sent with each request (iContact)
    #[serde(default)]
    pub api_version: Option<String>,

    /// Account ID, skips the account lookup (iContact)
    #[serde(default)]
    pub account_id: Option<String>,

    /// Client folder ID, skips the folder lookup (iContact)
    #[serde(default)]
    pub client_folder_id: Option<String>,

    /// Additional provider-specific values
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .field("endpoint", &self.endpoint)
            .field("app_id", &self.app_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("api_version", &self.api_version)
            .field("account_id", &self.account_id)
            .field("client_folder_id", &self.client_folder_id)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Credentials {
    /// Create empty credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Credentials holding only an API key
    pub fn api_key(api_key: impl Into<String>) -> Self {
        Self::new().with_api_key(api_key)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_client_folder_id(mut self, client_folder_id: impl Into<String>) -> Self {
        self.client_folder_id = Some(client_folder_id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Overlay every field present in `other` onto these credentials
    pub fn merge(&mut self, other: Credentials) {
        fn overlay(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }

        overlay(&mut self.api_key, other.api_key);
        overlay(&mut self.endpoint, other.endpoint);
        overlay(&mut self.app_id, other.app_id);
        overlay(&mut self.username, other.username);
        overlay(&mut self.password, other.password);
        overlay(&mut self.api_version, other.api_version);
        overlay(&mut self.account_id, other.account_id);
        overlay(&mut self.client_folder_id, other.client_folder_id);
        self.extra.extend(other.extra);
    }

    /// Fetch a required field, failing with a configuration error
    pub fn require<'a>(
        provider: &str,
        field: &str,
        value: Option<&'a str>,
    ) -> Result<&'a str, crate::Error> {
        value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| crate::Error::config(format!("{provider} requires the {field} credential")))
    }
}

/// Main ActiveESP configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EspConfig {
    /// Provider selector (e.g., "mail_chimp", "icontact")
    pub provider: String,

    /// Credentials passed to the provider factory
    #[serde(default)]
    pub credentials: Credentials,

    /// Whether subscribers need a name to be valid
    #[serde(default)]
    pub requires_name: bool,
}

impl EspConfig {
    /// Create a configuration for a provider selector
    pub fn new(provider: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            provider: provider.into(),
            credentials,
            requires_name: false,
        }
    }

    /// Require subscriber names
    pub fn with_requires_name(mut self, requires_name: bool) -> Self {
        self.requires_name = requires_name;
        self
    }

    /// Subscriber validation policy derived from this configuration
    pub fn policy(&self) -> SubscriberPolicy {
        SubscriberPolicy {
            requires_name: self.requires_name,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.provider.trim().is_empty() {
            return Err(crate::Error::config("Provider selector cannot be empty"));
        }

        if let Some(endpoint) = &self.credentials.endpoint
            && !endpoint.starts_with("https://")
            && !endpoint.starts_with("http://")
        {
            return Err(crate::Error::config(format!(
                "Endpoint must use HTTP or HTTPS scheme. Got: {endpoint}"
            )));
        }

        Ok(())
    }

    /// Load configuration from `ESP_*` environment variables
    ///
    /// - `ESP_PROVIDER` (required)
    /// - `ESP_API_KEY`, `ESP_ENDPOINT`
    /// - `ESP_APP_ID`, `ESP_USERNAME`, `ESP_PASSWORD`, `ESP_API_VERSION`
    /// - `ESP_ACCOUNT_ID`, `ESP_CLIENT_FOLDER_ID`
    /// - `ESP_REQUIRES_NAME` (`true`/`1`)
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, crate::Error> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = var("ESP_PROVIDER")
            .ok_or_else(|| crate::Error::config("ESP_PROVIDER is required"))?;

        let credentials = Credentials {
            api_key: var("ESP_API_KEY"),
            endpoint: var("ESP_ENDPOINT"),
            app_id: var("ESP_APP_ID"),
            username: var("ESP_USERNAME"),
            password: var("ESP_PASSWORD"),
            api_version: var("ESP_API_VERSION"),
            account_id: var("ESP_ACCOUNT_ID"),
            client_folder_id: var("ESP_CLIENT_FOLDER_ID"),
            extra: HashMap::new(),
        };

        let requires_name = var("ESP_REQUIRES_NAME")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let config = Self {
            provider,
            credentials,
            requires_name,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::{assert_err, assert_ok};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_merge_overlays_present_fields() {
        let mut credentials = Credentials::api_key("old-us1").with_app_id("app");
        credentials.merge(Credentials::api_key("new-us2").with_extra("region", "eu"));

        assert_eq!(credentials.api_key.as_deref(), Some("new-us2"));
        assert_eq!(credentials.app_id.as_deref(), Some("app"));
        assert_eq!(credentials.extra.get("region").map(String::as_str), Some("eu"));
    }

    #[test]
    fn test_secrets_not_exposed_in_debug() {
        let credentials = Credentials::api_key("secret_key_12345")
            .with_password("hunter2")
            .with_username("testuser");

        let debug_str = format!("{:?}", credentials);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(!debug_str.contains("hunter2"));
        assert!(debug_str.contains("testuser"));
    }

    #[test]
    fn test_require_rejects_missing_and_empty() {
        let credentials = Credentials::api_key("");
        assert!(Credentials::require("mail_chimp", "api_key", credentials.api_key.as_deref()).is_err());
        assert!(Credentials::require("icontact", "app_id", credentials.app_id.as_deref()).is_err());
        assert_eq!(
            Credentials::require("icontact", "app_id", Some("app")).unwrap(),
            "app"
        );
    }

    #[test]
    fn test_from_lookup() {
        let config = EspConfig::from_lookup(lookup(&[
            ("ESP_PROVIDER", "icontact"),
            ("ESP_APP_ID", "1234567890"),
            ("ESP_USERNAME", "testuser"),
            ("ESP_PASSWORD", "password"),
            ("ESP_API_VERSION", "2.0"),
            ("ESP_REQUIRES_NAME", "true"),
        ]))
        .unwrap();

        assert_eq!(config.provider, "icontact");
        assert_eq!(config.credentials.app_id.as_deref(), Some("1234567890"));
        assert_eq!(config.credentials.api_key, None);
        assert!(config.policy().requires_name);
    }

    #[test]
    fn test_from_lookup_requires_provider() {
        let result = EspConfig::from_lookup(lookup(&[("ESP_API_KEY", "abc123-us4")]));
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_validate_endpoint_scheme() {
        let config = EspConfig::new(
            "mail_chimp",
            Credentials::api_key("abc").with_endpoint("ftp://example.com"),
        );
        assert_err!(config.validate());

        let config = EspConfig::new("mail_chimp", Credentials::api_key("abc"));
        assert_ok!(config.validate());

        let config = EspConfig::new(" ", Credentials::api_key("abc"));
        assert_err!(config.validate());
    }

    #[test]
    fn test_deserialize_from_json() {
        let config: EspConfig = serde_json::from_value(serde_json::json!({
            "provider": "mail_chimp",
            "credentials": { "api_key": "abc123-us4" }
        }))
        .unwrap();

        assert_eq!(config.provider, "mail_chimp");
        assert_eq!(config.credentials.api_key.as_deref(), Some("abc123-us4"));
        assert!(!config.requires_name);
    }
}
