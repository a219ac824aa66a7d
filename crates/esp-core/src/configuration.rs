// # ESP Configuration
//
// Holds the provider selector, the credentials, and the shared provider
// instance built from them.
//
// ## Lifecycle
//
// ```text
// unconfigured
//   └─ set_provider ──────────► selector only (get_provider → None)
//        └─ set_credentials ──► configured (built on next get_provider)
//             └─ get_provider ► memoized
//                  └─ set_provider / set_credentials ► needs rebuild
// ```
//
// `set_provider_instance` skips the selector and credentials entirely and
// installs a caller-built provider as the shared one.
//
// ## Usage
//
// ```rust,ignore
// use esp_core::{Credentials, EspConfiguration};
//
// let esp = EspConfiguration::new(registry);
// let provider = esp.configure(|c| {
//     c.set_provider("mail_chimp");
//     c.set_credentials(Credentials::api_key("12345678901234567890-us4"));
// })?;
// ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{Credentials, EspConfig};
use crate::domain::SubscriberPolicy;
use crate::error::{Error, Result};
use crate::registry::ProviderRegistry;
use crate::traits::EspProvider;

#[derive(Default)]
struct ConfigState {
    selector: Option<String>,
    credentials: Option<Credentials>,
    shared: Option<Arc<dyn EspProvider>>,
    policy: SubscriberPolicy,
}

/// Configuration producing the single shared provider
///
/// Domain entities receive a reference to this object and delegate to the
/// provider it hands out.
///
/// # Thread Safety
///
/// State sits behind a mutex, so the configuration can be shared across
/// tasks. The lock is never held across an await point; the provider is
/// returned as an `Arc` and used after the lock is released.
pub struct EspConfiguration {
    registry: Arc<ProviderRegistry>,
    state: Mutex<ConfigState>,
}

impl std::fmt::Debug for EspConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("EspConfiguration")
            .field("selector", &state.selector)
            .field("credentials", &state.credentials)
            .field("shared", &state.shared)
            .field("policy", &state.policy)
            .finish()
    }
}

impl EspConfiguration {
    /// Create an unconfigured instance backed by a provider registry
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            state: Mutex::new(ConfigState::default()),
        }
    }

    /// Create a configured instance from an `EspConfig`
    pub fn from_config(registry: Arc<ProviderRegistry>, config: EspConfig) -> Result<Self> {
        config.validate()?;
        let esp = Self::new(registry);
        esp.set_requires_name(config.requires_name);
        esp.set_provider(config.provider);
        esp.set_credentials(config.credentials);
        Ok(esp)
    }

    /// The registry selectors are resolved against
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Apply a block of configuration calls, then rebuild the shared provider
    pub fn configure(&self, block: impl FnOnce(&Self)) -> Result<Option<Arc<dyn EspProvider>>> {
        block(self);
        self.reset_provider();
        self.get_provider()
    }

    /// Record which provider to use and drop any previously built instance
    pub fn set_provider(&self, name: impl Into<String>) {
        let name = name.into();
        tracing::debug!("Provider selector set to {}", name);
        let mut state = self.lock();
        state.selector = Some(name);
        state.shared = None;
    }

    /// Merge credentials into the current ones and drop any built instance
    pub fn set_credentials(&self, credentials: Credentials) {
        let mut state = self.lock();
        match state.credentials.as_mut() {
            Some(current) => current.merge(credentials),
            None => state.credentials = Some(credentials),
        }
        state.shared = None;
    }

    /// Replace the credentials outright and drop any built instance
    pub fn replace_credentials(&self, credentials: Credentials) {
        let mut state = self.lock();
        state.credentials = Some(credentials);
        state.shared = None;
    }

    /// Current provider selector
    pub fn provider_selector(&self) -> Option<String> {
        self.lock().selector.clone()
    }

    /// Current credentials
    pub fn credentials(&self) -> Option<Credentials> {
        self.lock().credentials.clone()
    }

    /// Toggle whether subscribers need a name to be valid
    pub fn set_requires_name(&self, requires_name: bool) {
        self.lock().policy.requires_name = requires_name;
    }

    /// Subscriber validation policy
    pub fn policy(&self) -> SubscriberPolicy {
        self.lock().policy
    }

    /// Install a caller-built provider as the shared instance
    pub fn set_provider_instance(&self, provider: Arc<dyn EspProvider>) {
        tracing::debug!("Installing {} provider instance", provider.provider_name());
        self.lock().shared = Some(provider);
    }

    /// Drop the shared instance so the next access rebuilds it
    pub fn reset_provider(&self) {
        self.lock().shared = None;
    }

    /// The shared provider, built on first access
    ///
    /// # Returns
    ///
    /// - `Ok(Some(provider))`: The memoized or freshly built provider
    /// - `Ok(None)`: The selector or the credentials are missing
    /// - `Err(Error::ProviderNotSupported)`: The selector is not registered
    /// - `Err(Error)`: The factory rejected the credentials
    pub fn get_provider(&self) -> Result<Option<Arc<dyn EspProvider>>> {
        let mut state = self.lock();

        if let Some(shared) = &state.shared {
            return Ok(Some(Arc::clone(shared)));
        }

        let Some(selector) = state.selector.clone() else {
            return Ok(None);
        };
        self.registry.ensure_supported(&selector)?;

        let Some(credentials) = state.credentials.as_ref() else {
            tracing::debug!("Provider {} selected but no credentials set", selector);
            return Ok(None);
        };

        let provider: Arc<dyn EspProvider> =
            Arc::from(self.registry.create_provider(&selector, credentials)?);
        tracing::info!("Instantiated shared {} provider", provider.provider_name());

        state.shared = Some(Arc::clone(&provider));
        Ok(Some(provider))
    }

    /// The shared provider, or `ProviderNotConfigured` when there is none
    pub fn require_provider(&self) -> Result<Arc<dyn EspProvider>> {
        self.get_provider()?.ok_or(Error::ProviderNotConfigured)
    }

    fn lock(&self) -> MutexGuard<'_, ConfigState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
