// # List
//
// A named subscription list on the provider.

use serde::{Deserialize, Serialize};

use crate::configuration::EspConfiguration;
use crate::domain::Subscriber;
use crate::error::{Error, Result};

/// A subscription list managed by a provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    /// Identifier assigned by the provider
    pub id: Option<String>,
    /// Display name
    pub name: Option<String>,
}

/// Every settable list field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListAttributes {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<ListAttributes> for List {
    fn from(attributes: ListAttributes) -> Self {
        Self {
            id: attributes.id,
            name: attributes.name,
        }
    }
}

impl List {
    /// Create a list reference from its provider identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The list identifier, or `InvalidInput` when an operation needs one
    pub fn require_id(&self) -> Result<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::invalid_input("List ID is required"))
    }

    // Accessing commonly used API calls

    /// Add the given subscriber to this list
    pub async fn subscribe(
        &self,
        esp: &EspConfiguration,
        subscriber: Subscriber,
    ) -> Result<Subscriber> {
        esp.require_provider()?.subscribe(subscriber, Some(self)).await
    }

    /// Remove the given subscriber from this list
    pub async fn unsubscribe(&self, esp: &EspConfiguration, subscriber: &Subscriber) -> Result<()> {
        esp.require_provider()?.unsubscribe(subscriber, self).await
    }
}
