// # MailChimp Provider
//
// This crate provides a MailChimp provider implementation for ActiveESP,
// targeting version 1.3 of the MailChimp API.
//
// ## Implementation Status
//
// - ✅ `subscribe` (listSubscribe, a list is required)
// - ✅ `unsubscribe` (listUnsubscribe)
// - ✅ `lists` (lists)
// - ❌ `is_subscribed`, `find_subscriber` (fail with MethodNotImplemented)
// - ✅ HTTP timeout configured (30 seconds)
// - ❌ NO retry logic, NO caching, NO background tasks
//
// ## Wire Format
//
// Every call is a POST to `{endpoint}/?method={method}` whose body is the
// URL-escaped JSON of the parameters plus `apikey`. Responses are JSON and
// may be bare fragments such as `true`. An object carrying an `error` key
// is a failure reported by MailChimp inside a 200 response.
//
// ## Data Center
//
// The API key ends in the data center it belongs to (`…-us4`), and the
// endpoint host is prefixed with it: `https://us4.api.mailchimp.com/1.3`.
//
// ## Security Requirements
//
// - API key NEVER appears in logs or Debug output
// - Provider MUST fail fast if the key is empty

use async_trait::async_trait;
use esp_core::config::Credentials;
use esp_core::domain::{List, Subscriber};
use esp_core::traits::{EspProvider, ProviderBase, ProviderFactory};
use esp_core::{Error, ProviderRegistry, Result};
use serde_json::{Value, json};
use std::time::Duration;

/// Selector this provider registers under
pub const PROVIDER_NAME: &str = "mail_chimp";

/// MailChimp API version targeted by this crate
const MAILCHIMP_API_VERSION: &str = "1.3";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// API methods used by this provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiMethod {
    ListSubscribe,
    ListUnsubscribe,
    Lists,
}

impl ApiMethod {
    fn as_str(self) -> &'static str {
        match self {
            ApiMethod::ListSubscribe => "listSubscribe",
            ApiMethod::ListUnsubscribe => "listUnsubscribe",
            ApiMethod::Lists => "lists",
        }
    }
}

/// Data center prefix encoded in an API key
///
/// `"abc123-us4"` yields `"us4."`; a key without a hyphen yields `""`.
pub fn dc_from_api_key(api_key: &str) -> String {
    match api_key.rsplit_once('-') {
        Some((_, dc)) if !dc.is_empty() => format!("{dc}."),
        _ => String::new(),
    }
}

/// MailChimp provider
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
pub struct MailChimpProvider {
    /// API key and endpoint override
    base: ProviderBase,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for MailChimpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailChimpProvider")
            .field("base", &self.base)
            .field("endpoint", &self.endpoint())
            .finish()
    }
}

impl MailChimpProvider {
    /// Create a new MailChimp provider
    ///
    /// # Parameters
    ///
    /// - `api_key`: MailChimp API key, including its data center suffix
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_credentials(&Credentials::api_key(api_key))
    }

    /// Create a provider from credentials
    ///
    /// Reads `api_key` (required) and `endpoint` (optional override).
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        Credentials::require(PROVIDER_NAME, "api_key", credentials.api_key.as_deref())?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base: ProviderBase::from_credentials(credentials),
            client,
        })
    }

    /// Data center prefix derived from the API key
    pub fn data_center(&self) -> String {
        dc_from_api_key(self.api_key())
    }

    fn api_key(&self) -> &str {
        self.base.api_key.as_deref().unwrap_or_default()
    }

    fn default_endpoint(&self) -> String {
        format!(
            "https://{}api.mailchimp.com/{}",
            self.data_center(),
            MAILCHIMP_API_VERSION
        )
    }

    /// Perform one API call
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: The decoded response, which may still carry an `error`
    /// - `Err(Error::Backend)`: Non-2xx status or undecodable body
    /// - `Err(Error::Http)`: Transport failure
    async fn call(&self, method: ApiMethod, params: Value) -> Result<Value> {
        let url = format!("{}/?method={}", self.endpoint(), method.as_str());

        let mut body = json!({ "apikey": self.api_key() });
        if let (Some(body), Value::Object(params)) = (body.as_object_mut(), params) {
            body.extend(params);
        }
        let payload = urlencoding::encode(&body.to_string()).into_owned();

        tracing::debug!("Calling MailChimp method {}", method.as_str());

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(payload)
            .send()
            .await
            .map_err(|e| Error::http(format!("MailChimp request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read MailChimp response: {e}")))?;

        if !status.is_success() {
            tracing::warn!("MailChimp {} returned status {}", method.as_str(), status);
            return Err(Error::backend(PROVIDER_NAME, status.as_u16(), text));
        }

        match serde_json::from_str(&text) {
            Ok(json) => Ok(json),
            Err(_) => Err(Error::backend(PROVIDER_NAME, status.as_u16(), text)),
        }
    }
}

/// Message of an error object returned inside a successful response
fn api_error(response: &Value) -> Option<String> {
    let error = response.get("error")?;
    let message = error.as_str().map_or_else(|| error.to_string(), str::to_string);
    Some(match response.get("code") {
        Some(code) => format!("{message} (code {code})"),
        None => message,
    })
}

/// Provider identifiers arrive as strings or numbers
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl EspProvider for MailChimpProvider {
    /// Subscribe to a list with `listSubscribe`
    ///
    /// MailChimp identifies list members by email address, so a subscriber
    /// without an ID gets its email as ID.
    async fn subscribe(&self, mut subscriber: Subscriber, list: Option<&List>) -> Result<Subscriber> {
        let list = list
            .ok_or_else(|| Error::invalid_input("MailChimp subscriptions require a list"))?;
        let list_id = list.require_id()?;

        tracing::info!("Subscribing to MailChimp list {}", list_id);

        let response = self
            .call(
                ApiMethod::ListSubscribe,
                json!({
                    "id": list_id,
                    "email_address": subscriber.email,
                    "merge_vars": {
                        "FNAME": subscriber.first_name.as_deref().unwrap_or_default(),
                        "LNAME": subscriber.last_name.as_deref().unwrap_or_default(),
                    },
                }),
            )
            .await?;

        if let Some(message) = api_error(&response) {
            tracing::warn!("MailChimp refused subscription to list {}: {}", list_id, message);
            return Err(Error::could_not_subscribe(list_id, message));
        }
        if response != Value::Bool(true) {
            return Err(Error::could_not_subscribe(
                list_id,
                format!("unexpected response: {response}"),
            ));
        }

        if subscriber.id.is_none() {
            subscriber.id = Some(subscriber.email.clone());
        }
        Ok(subscriber)
    }

    /// Unsubscribe from a list with `listUnsubscribe`
    async fn unsubscribe(&self, subscriber: &Subscriber, list: &List) -> Result<()> {
        let list_id = list.require_id()?;

        tracing::info!("Unsubscribing from MailChimp list {}", list_id);

        let response = self
            .call(
                ApiMethod::ListUnsubscribe,
                json!({
                    "id": list_id,
                    "email_address": subscriber.email,
                }),
            )
            .await?;

        if let Some(message) = api_error(&response) {
            tracing::warn!("MailChimp refused unsubscription from list {}: {}", list_id, message);
            return Err(Error::could_not_unsubscribe(list_id, message));
        }
        if response != Value::Bool(true) {
            return Err(Error::could_not_unsubscribe(
                list_id,
                format!("unexpected response: {response}"),
            ));
        }

        Ok(())
    }

    /// Retrieve lists with `lists`
    ///
    /// ```json
    /// { "total": 1, "data": [{ "id": "b1234", "name": "Newsletter" }] }
    /// ```
    async fn lists(&self) -> Result<Vec<List>> {
        let response = self.call(ApiMethod::Lists, json!({})).await?;

        if let Some(message) = api_error(&response) {
            return Err(Error::provider(PROVIDER_NAME, message));
        }

        let data = response["data"].as_array().ok_or_else(|| {
            Error::provider(PROVIDER_NAME, "Invalid response format: data is not an array")
        })?;

        Ok(data
            .iter()
            .map(|list| List {
                id: id_string(&list["id"]),
                name: list["name"].as_str().map(str::to_string),
            })
            .collect())
    }

    fn endpoint(&self) -> String {
        self.base.resolve_endpoint(&[Some(&self.default_endpoint())])
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating MailChimp providers
pub struct MailChimpFactory;

impl ProviderFactory for MailChimpFactory {
    fn create(&self, credentials: &Credentials) -> Result<Box<dyn EspProvider>> {
        Ok(Box::new(MailChimpProvider::from_credentials(credentials)?))
    }
}

/// Register the MailChimp provider with a registry
///
/// # Example
///
/// ```rust
/// use esp_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// esp_provider_mailchimp::register(&registry);
/// assert!(registry.has_provider("mail_chimp"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(MailChimpFactory));
}
