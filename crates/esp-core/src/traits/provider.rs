// # ESP Provider Trait
//
// Defines the interface every email service provider adapter implements.
//
// ## Implementations
//
// - MailChimp: `esp-provider-mailchimp` crate
// - iContact: `esp-provider-icontact` crate
//
// ## Usage
//
// ```rust,ignore
// use esp_core::domain::{List, Subscriber};
// use esp_core::EspProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* EspProvider implementation */;
//
//     let subscriber = Subscriber::new("user@example.com").with_name("Brian Morton");
//     let subscriber = provider.subscribe(subscriber, Some(&List::new("123"))).await?;
//     println!("subscribed as {:?}", subscriber.id);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::config::Credentials;
use crate::domain::{List, Subscriber, SubscriberQuery};
use crate::error::{Error, Result};

/// Trait for email service provider implementations
///
/// Every operation has a default that fails with
/// [`Error::MethodNotImplemented`], so an adapter only overrides what its
/// backend supports. Calling an operation the adapter left out is an
/// error, never a silent no-op.
///
/// # Thread Safety
///
/// Implementations must be thread-safe: one shared instance is handed to
/// every caller of a configuration. State memoized after construction
/// (for example looked-up account identifiers) must use single-assignment
/// cells so concurrent first use is idempotent.
///
/// # Requests
///
/// Each operation performs its own HTTP round trips and returns. Adapters
/// do not retry, batch, cache responses, or spawn tasks.
#[async_trait]
pub trait EspProvider: Send + Sync + std::fmt::Debug {
    /// Create the subscriber and optionally add them to a list
    ///
    /// # Returns
    ///
    /// - `Ok(Subscriber)`: The subscriber with the provider ID populated
    /// - `Err(Error::CouldNotSubscribeToList)`: The contact exists but the
    ///   backend refused the list subscription
    async fn subscribe(&self, subscriber: Subscriber, list: Option<&List>) -> Result<Subscriber> {
        let _ = (subscriber, list);
        Err(Error::not_implemented(self.provider_name(), "subscribe"))
    }

    /// Remove the subscriber from a list
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The subscriber was removed
    /// - `Err(Error::CouldNotUnsubscribeFromList)`: The backend reported
    ///   warnings or errors
    async fn unsubscribe(&self, subscriber: &Subscriber, list: &List) -> Result<()> {
        let _ = (subscriber, list);
        Err(Error::not_implemented(self.provider_name(), "unsubscribe"))
    }

    /// Whether the subscriber is subscribed (to a list, when given)
    async fn is_subscribed(&self, subscriber: &Subscriber, list: Option<&List>) -> Result<bool> {
        let _ = (subscriber, list);
        Err(Error::not_implemented(self.provider_name(), "is_subscribed"))
    }

    /// Find subscribers matching a query
    ///
    /// Order is whatever the backend returns. No matches is an empty vector.
    async fn find_subscriber(&self, query: &SubscriberQuery) -> Result<Vec<Subscriber>> {
        let _ = query;
        Err(Error::not_implemented(self.provider_name(), "find_subscriber"))
    }

    /// All lists available to the account
    async fn lists(&self) -> Result<Vec<List>> {
        Err(Error::not_implemented(self.provider_name(), "lists"))
    }

    /// Base URL requests are sent to, without a trailing slash
    fn endpoint(&self) -> String;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// The selector the provider registers under (e.g., "mail_chimp")
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing providers from credentials
pub trait ProviderFactory: Send + Sync {
    /// Create a provider instance from credentials
    ///
    /// Construction must not perform network requests; lookups a backend
    /// needs happen lazily on first use.
    fn create(&self, credentials: &Credentials) -> Result<Box<dyn EspProvider>>;
}

/// Fields every provider carries
///
/// # Security
///
/// The Debug implementation does NOT expose the API key.
#[derive(Clone, Default)]
pub struct ProviderBase {
    /// API key, when the backend uses one
    pub api_key: Option<String>,
    /// Instance-level endpoint override
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for ProviderBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBase")
            .field("api_key", &self.api_key.as_ref().map(|_| "<REDACTED>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ProviderBase {
    /// Take the shared fields from credentials
    pub fn from_credentials(credentials: &Credentials) -> Self {
        Self {
            api_key: credentials.api_key.clone(),
            endpoint: credentials.endpoint.clone(),
        }
    }

    /// Resolve the endpoint against the type-level defaults
    ///
    /// `defaults` lists the adapter's own default first, then each more
    /// general default it falls back to.
    pub fn resolve_endpoint(&self, defaults: &[Option<&str>]) -> String {
        resolve_endpoint(self.endpoint.as_deref(), defaults)
    }
}

/// Pick the first declared endpoint: instance override, then each default in
/// order, then the empty string
///
/// Trailing slashes are stripped so resources can be appended with `/`.
pub fn resolve_endpoint(instance: Option<&str>, defaults: &[Option<&str>]) -> String {
    std::iter::once(instance)
        .chain(defaults.iter().copied())
        .flatten()
        .find(|endpoint| !endpoint.is_empty())
        .map(|endpoint| endpoint.trim_end_matches('/').to_string())
        .unwrap_or_default()
}
