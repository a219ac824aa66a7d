// # iContact Provider
//
// This crate provides an iContact provider implementation for ActiveESP,
// targeting version 2.0 of the iContact API.
//
// ## Implementation Status
//
// - ✅ `find_subscriber` (GET contacts)
// - ✅ `subscribe` (POST contacts, then POST subscriptions when a list is given)
// - ✅ `unsubscribe` (POST subscriptions/{list}_{contact})
// - ✅ `lists` (GET lists)
// - ❌ `is_subscribed` (fails with MethodNotImplemented)
// - ✅ HTTP timeout configured (30 seconds)
// - ❌ NO retry logic, NO response caching, NO background tasks
//
// ## Account Resolution
//
// Every resource lives under `/a/{accountId}/c/{clientFolderId}`. Both IDs
// should be supplied with the credentials. When they are not, the first
// account from `GET /a` and the first client folder from `GET /a/{a}/c` are
// looked up on first use and kept for the lifetime of the provider.
//
// ## Security Requirements
//
// - Password NEVER appears in logs or Debug output
// - Provider MUST fail fast if app ID, username or password is missing

use async_trait::async_trait;
use esp_core::config::Credentials;
use esp_core::domain::{List, Subscriber, SubscriberQuery};
use esp_core::traits::{EspProvider, ProviderBase, ProviderFactory};
use esp_core::{Error, ProviderRegistry, Result};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::OnceCell;

/// Selector this provider registers under
pub const PROVIDER_NAME: &str = "icontact";

/// Default iContact API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://app.icontact.com/icp";

/// API version sent when the credentials name none
const DEFAULT_API_VERSION: &str = "2.0";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Identifiers come back as numbers or strings depending on the resource
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Contact {
    contact_id: Option<RawId>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl From<Contact> for Subscriber {
    fn from(contact: Contact) -> Self {
        Subscriber {
            id: contact.contact_id.map(String::from),
            email: contact.email.unwrap_or_default(),
            first_name: contact.first_name.filter(|s| !s.is_empty()),
            last_name: contact.last_name.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ContactsResponse {
    #[serde(default)]
    contacts: Vec<Contact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawList {
    list_id: Option<RawId>,
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListsResponse {
    #[serde(default)]
    lists: Vec<RawList>,
}

/// iContact provider
///
/// # Security
///
/// The Debug implementation does NOT expose the password.
pub struct IContactProvider {
    /// Endpoint override
    base: ProviderBase,

    /// Application ID registered with iContact
    app_id: String,

    /// Username of the account associated with the application
    username: String,

    /// Application password
    password: String,

    /// API version header value
    api_version: String,

    /// Account ID, supplied or looked up once
    account_id: OnceCell<String>,

    /// Client folder ID, supplied or looked up once
    client_folder_id: OnceCell<String>,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl std::fmt::Debug for IContactProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IContactProvider")
            .field("endpoint", &self.endpoint())
            .field("app_id", &self.app_id)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("api_version", &self.api_version)
            .field("account_id", &self.account_id.get())
            .field("client_folder_id", &self.client_folder_id.get())
            .finish()
    }
}

impl IContactProvider {
    /// Create a provider from credentials
    ///
    /// # Parameters
    ///
    /// - `credentials`: `app_id`, `username` and `password` are required;
    ///   `api_version`, `account_id`, `client_folder_id` and `endpoint` are
    ///   optional
    ///
    /// No request is made here; missing account and folder IDs are looked up
    /// on first use.
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        let app_id = Credentials::require(PROVIDER_NAME, "app_id", credentials.app_id.as_deref())?;
        let username =
            Credentials::require(PROVIDER_NAME, "username", credentials.username.as_deref())?;
        let password =
            Credentials::require(PROVIDER_NAME, "password", credentials.password.as_deref())?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {e}")))?;

        let supplied = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        Ok(Self {
            base: ProviderBase::from_credentials(credentials),
            app_id: app_id.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            api_version: supplied(&credentials.api_version)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            account_id: OnceCell::new_with(supplied(&credentials.account_id)),
            client_folder_id: OnceCell::new_with(supplied(&credentials.client_folder_id)),
            client,
        })
    }

    /// Raw account information for the credentials (`GET /a`)
    pub async fn account(&self) -> Result<Value> {
        self.call(Method::GET, "/a", &[], None).await
    }

    /// Raw client folders of the account (`GET /a/{account}/c`)
    pub async fn client_folders(&self) -> Result<Value> {
        let account_id = self.account_id().await?;
        self.call(Method::GET, &format!("/a/{account_id}/c"), &[], None)
            .await
    }

    /// Account ID, looked up from the first account when not supplied
    pub async fn account_id(&self) -> Result<&str> {
        self.account_id
            .get_or_try_init(|| async {
                tracing::info!("Looking up iContact account ID");
                let response = self.account().await?;
                first_id(&response, "accounts", "accountId")
            })
            .await
            .map(String::as_str)
    }

    /// Client folder ID, looked up from the first folder when not supplied
    pub async fn client_folder_id(&self) -> Result<&str> {
        self.client_folder_id
            .get_or_try_init(|| async {
                tracing::info!("Looking up iContact client folder ID");
                let response = self.client_folders().await?;
                first_id(&response, "clientfolders", "clientFolderId")
            })
            .await
            .map(String::as_str)
    }

    /// `/a/{account}/c/{folder}` prefix shared by every resource
    async fn folder_path(&self) -> Result<String> {
        let account_id = self.account_id().await?;
        let client_folder_id = self.client_folder_id().await?;
        Ok(format!("/a/{account_id}/c/{client_folder_id}"))
    }

    /// Perform one API request
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: The decoded response body
    /// - `Err(Error::Backend)`: Non-2xx status or undecodable body
    /// - `Err(Error::Http)`: Transport failure
    async fn call(
        &self,
        method: Method,
        resource: &str,
        query: &[(&str, &str)],
        body: Option<Value>,
    ) -> Result<Value> {
        let url = format!("{}{}", self.endpoint(), resource);

        tracing::debug!("iContact {} {}", method, resource);

        let mut request = self
            .client
            .request(method, &url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("API-Version", &self.api_version)
            .header("API-AppId", &self.app_id)
            .header("API-Username", &self.username)
            .header("API-Password", &self.password);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("iContact request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read iContact response: {e}")))?;

        if !status.is_success() {
            tracing::warn!("iContact {} returned status {}", resource, status);
            return Err(Error::backend(PROVIDER_NAME, status.as_u16(), text));
        }

        match serde_json::from_str(&text) {
            Ok(json) => Ok(json),
            Err(_) => Err(Error::backend(PROVIDER_NAME, status.as_u16(), text)),
        }
    }
}

/// First `key` of the first entry in `collection`
fn first_id(response: &Value, collection: &str, key: &str) -> Result<String> {
    response[collection]
        .as_array()
        .and_then(|entries| entries.first())
        .and_then(|entry| match &entry[key] {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| Error::provider(PROVIDER_NAME, format!("No {key} in {collection} response")))
}

/// Warnings or errors reported in a response body, joined into one message
fn messages(response: &Value, key: &str) -> Option<String> {
    match &response[key] {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) if !items.is_empty() => Some(
            items
                .iter()
                .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
                .collect::<Vec<_>>()
                .join("; "),
        ),
        _ => None,
    }
}

/// Decode a response body, failing on `errors` reported inside a 2xx response
fn decode<T: serde::de::DeserializeOwned>(response: Value) -> Result<T> {
    if let Some(errors) = messages(&response, "errors") {
        tracing::warn!("iContact reported errors: {}", errors);
        return Err(Error::provider(PROVIDER_NAME, errors));
    }
    Ok(serde_json::from_value(response)?)
}

#[async_trait]
impl EspProvider for IContactProvider {
    /// Create the contact, then subscribe it to the list when one is given
    ///
    /// A contact that previously unsubscribed from a list cannot be
    /// subscribed to it again; iContact reports this as a warning. Warnings
    /// or errors on the subscription step fail with `CouldNotSubscribeToList`.
    async fn subscribe(&self, mut subscriber: Subscriber, list: Option<&List>) -> Result<Subscriber> {
        let folder = self.folder_path().await?;

        tracing::info!("Creating iContact contact");

        let response = self
            .call(
                Method::POST,
                &format!("{folder}/contacts"),
                &[],
                Some(json!([{
                    "email": subscriber.email,
                    "firstName": subscriber.first_name,
                    "lastName": subscriber.last_name,
                }])),
            )
            .await?;

        let warnings = messages(&response, "warnings");
        let contact_id = decode::<ContactsResponse>(response)?
            .contacts
            .into_iter()
            .next()
            .and_then(|contact| contact.contact_id)
            .map(String::from)
            .ok_or_else(|| {
                Error::provider(
                    PROVIDER_NAME,
                    warnings.unwrap_or_else(|| "No contact returned".to_string()),
                )
            })?;
        subscriber.id = Some(contact_id.clone());

        if let Some(list) = list {
            let list_id = list.require_id()?;

            tracing::info!("Subscribing iContact contact {} to list {}", contact_id, list_id);

            let response = self
                .call(
                    Method::POST,
                    &format!("{folder}/subscriptions"),
                    &[],
                    Some(json!([{
                        "listId": list_id,
                        "contactId": contact_id,
                        "status": "normal",
                    }])),
                )
                .await?;

            if let Some(message) =
                messages(&response, "warnings").or_else(|| messages(&response, "errors"))
            {
                tracing::warn!("iContact refused subscription to list {}: {}", list_id, message);
                return Err(Error::could_not_subscribe(list_id, message));
            }
        }

        Ok(subscriber)
    }

    async fn unsubscribe(&self, subscriber: &Subscriber, list: &List) -> Result<()> {
        let list_id = list.require_id()?;
        let contact_id = subscriber
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::invalid_input("Subscriber ID is required to unsubscribe"))?;
        let folder = self.folder_path().await?;

        tracing::info!("Unsubscribing iContact contact {} from list {}", contact_id, list_id);

        let response = self
            .call(
                Method::POST,
                &format!("{folder}/subscriptions/{list_id}_{contact_id}"),
                &[],
                Some(json!({ "status": "unsubscribed" })),
            )
            .await?;

        if let Some(message) = messages(&response, "warnings").or_else(|| messages(&response, "errors")) {
            tracing::warn!("iContact refused unsubscription from list {}: {}", list_id, message);
            return Err(Error::could_not_unsubscribe(list_id, message));
        }

        Ok(())
    }

    /// Search contacts by any combination of email, names and contact ID
    async fn find_subscriber(&self, query: &SubscriberQuery) -> Result<Vec<Subscriber>> {
        let folder = self.folder_path().await?;

        let params: Vec<(&str, &str)> = [
            ("email", query.email.as_deref()),
            ("firstName", query.first_name.as_deref()),
            ("lastName", query.last_name.as_deref()),
            ("contactId", query.id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect();

        let response = self
            .call(Method::GET, &format!("{folder}/contacts"), &params, None)
            .await?;

        Ok(decode::<ContactsResponse>(response)?
            .contacts
            .into_iter()
            .map(Subscriber::from)
            .collect())
    }

    async fn lists(&self) -> Result<Vec<List>> {
        let folder = self.folder_path().await?;
        let response = self
            .call(Method::GET, &format!("{folder}/lists"), &[], None)
            .await?;

        Ok(decode::<ListsResponse>(response)?
            .lists
            .into_iter()
            .map(|list| List {
                id: list.list_id.map(String::from),
                name: list.name,
            })
            .collect())
    }

    fn endpoint(&self) -> String {
        self.base.resolve_endpoint(&[Some(DEFAULT_ENDPOINT)])
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

/// Factory for creating iContact providers
pub struct IContactFactory;

impl ProviderFactory for IContactFactory {
    fn create(&self, credentials: &Credentials) -> Result<Box<dyn EspProvider>> {
        Ok(Box::new(IContactProvider::from_credentials(credentials)?))
    }
}

/// Register the iContact provider with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(IContactFactory));
}
