//! Plugin-based provider registry
//!
//! The registry maps provider selector names to factories, so adapters are
//! found through an explicit table instead of hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use esp_core::registry::ProviderRegistry;
//! use esp_core::config::Credentials;
//!
//! let registry = ProviderRegistry::new();
//! registry.register_provider("mail_chimp", Box::new(MailChimpFactory));
//!
//! let provider = registry.create_provider("mail_chimp", &Credentials::api_key("abc123-us4"))?;
//! ```
//!
//! ## Registration
//!
//! Adapter crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("mail_chimp", Box::new(MailChimpFactory));
//! }
//! ```

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::traits::{EspProvider, ProviderFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Provider registry for plugin-based provider creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered provider factories
    providers: RwLock<HashMap<String, Box<dyn ProviderFactory>>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.list_providers())
            .finish()
    }
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory
    ///
    /// Registering a name twice replaces the earlier factory.
    ///
    /// # Parameters
    ///
    /// - `name`: Provider selector (e.g., "mail_chimp", "icontact")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn ProviderFactory>) {
        let name = name.into();
        tracing::debug!("Registering provider: {}", name);
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name, factory);
    }

    /// Create a provider by selector
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn EspProvider>)`: Created provider instance
    /// - `Err(Error::ProviderNotSupported)`: If no factory is registered under `name`
    /// - `Err(Error)`: If the factory rejects the credentials
    pub fn create_provider(
        &self,
        name: &str,
        credentials: &Credentials,
    ) -> Result<Box<dyn EspProvider>> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(name)
            .ok_or_else(|| Error::not_supported(name))?;

        factory.create(credentials)
    }

    /// Fail with `ProviderNotSupported` unless `name` is registered
    pub fn ensure_supported(&self, name: &str) -> Result<()> {
        if self.has_provider(name) {
            Ok(())
        } else {
            Err(Error::not_supported(name))
        }
    }

    /// List all registered provider selectors, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider selector is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}
