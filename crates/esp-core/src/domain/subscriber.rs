// # Subscriber
//
// A subscriber is one email contact stored within a provider's system.
//
// At the very least an email address is required for a valid subscriber.
// When a name is also necessary, the `requires_name` flag of the
// `SubscriberPolicy` tells the validator to check for one as well.
//
// ## Usage
//
// ```rust
// use esp_core::domain::{Subscriber, SubscriberPolicy};
//
// let subscriber = Subscriber::new("billie.joe@example.com")
//     .with_first_name("Billie Joe")
//     .with_last_name("Armstrong");
//
// assert_eq!(subscriber.name(), "Billie Joe Armstrong");
// assert!(subscriber.is_valid(&SubscriberPolicy::default()));
// ```

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::configuration::EspConfiguration;
use crate::domain::List;
use crate::error::{Error, Result};

/// Validation rules applied to subscribers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberPolicy {
    /// Forces a first or last name to be present for a subscriber to be valid
    #[serde(default)]
    pub requires_name: bool,
}

impl SubscriberPolicy {
    /// Policy that requires a name
    pub fn requiring_name() -> Self {
        Self {
            requires_name: true,
        }
    }
}

/// An email contact managed by a provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Identifier assigned by the provider
    pub id: Option<String>,
    /// Email address
    pub email: String,
    /// First name (may hold several words)
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
}

/// Every settable subscriber field
///
/// `name`, when present, is split into first and last name after the
/// explicit `first_name`/`last_name` fields have been applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriberAttributes {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<SubscriberAttributes> for Subscriber {
    fn from(attributes: SubscriberAttributes) -> Self {
        let mut subscriber = Subscriber {
            id: attributes.id,
            email: attributes.email,
            first_name: attributes.first_name,
            last_name: attributes.last_name,
        };
        if let Some(name) = attributes.name {
            subscriber.set_name(&name);
        }
        subscriber
    }
}

impl Subscriber {
    /// Create a subscriber with only an email address
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    /// Set the provider identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the first name
    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Set the last name
    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Set first and last name from a full name
    pub fn with_name(mut self, full_name: &str) -> Self {
        self.set_name(full_name);
        self
    }

    /// Full name: the present parts of first and last name joined by a space
    pub fn name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Assign first and last names from a full name
    ///
    /// The last whitespace-delimited word becomes the last name and every
    /// preceding word, joined by a single space, becomes the first name.
    pub fn set_name(&mut self, full_name: &str) {
        let mut names: Vec<&str> = full_name.split_whitespace().collect();
        self.last_name = names.pop().map(str::to_string);
        self.first_name = if names.is_empty() {
            None
        } else {
            Some(names.join(" "))
        };
    }

    /// Whether either the first or the last name is present
    pub fn has_name(&self) -> bool {
        self.has_first_name() || self.has_last_name()
    }

    /// Whether the first name is present and not blank
    pub fn has_first_name(&self) -> bool {
        is_present(self.first_name.as_deref())
    }

    /// Whether the last name is present and not blank
    pub fn has_last_name(&self) -> bool {
        is_present(self.last_name.as_deref())
    }

    /// Whether the subscriber passes both email and name validation
    pub fn is_valid(&self, policy: &SubscriberPolicy) -> bool {
        self.is_valid_email() && self.is_valid_name(policy)
    }

    /// Whether the email address matches the email grammar
    pub fn is_valid_email(&self) -> bool {
        ValidateEmail::validate_email(&self.email)
    }

    /// Whether the name satisfies the policy
    pub fn is_valid_name(&self, policy: &SubscriberPolicy) -> bool {
        !policy.requires_name || self.has_name()
    }

    /// Describe why validation fails, if it does
    pub fn validation_error(&self, policy: &SubscriberPolicy) -> Option<String> {
        if !self.is_valid_email() {
            Some(format!("{} is not a valid email address", self.email))
        } else if !self.is_valid_name(policy) {
            Some(format!("a name is required for {}", self.email))
        } else {
            None
        }
    }

    // Accessing commonly used API calls

    /// Create the subscriber with the configured provider
    ///
    /// Fails with `ProviderNotConfigured` when no provider is available and
    /// with `SubscriberInvalid` when the subscriber breaks the configured
    /// policy. No request is sent in either case.
    pub async fn create(self, esp: &EspConfiguration) -> Result<Subscriber> {
        let provider = esp.require_provider()?;
        if let Some(reason) = self.validation_error(&esp.policy()) {
            return Err(Error::subscriber_invalid(reason));
        }
        provider.subscribe(self, None).await
    }

    /// Add the subscriber to the provider and optionally to a list
    pub async fn subscribe(
        self,
        esp: &EspConfiguration,
        list: Option<&List>,
    ) -> Result<Subscriber> {
        esp.require_provider()?.subscribe(self, list).await
    }

    /// Remove the subscriber from a list
    pub async fn unsubscribe(&self, esp: &EspConfiguration, list: &List) -> Result<()> {
        esp.require_provider()?.unsubscribe(self, list).await
    }

    /// Find subscribers matching a query
    pub async fn find(esp: &EspConfiguration, query: &SubscriberQuery) -> Result<Vec<Subscriber>> {
        esp.require_provider()?.find_subscriber(query).await
    }
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Search parameters for `find_subscriber`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl SubscriberQuery {
    /// Query by email address
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    /// Query by provider identifier
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Narrow by first name
    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    /// Narrow by last name
    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Whether no criteria are set
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }
}
