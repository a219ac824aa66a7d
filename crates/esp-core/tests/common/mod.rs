//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal test doubles that verify the provider
//! contract without talking to a real backend.

#![allow(dead_code)]

use esp_core::config::Credentials;
use esp_core::domain::{List, Subscriber, SubscriberQuery};
use esp_core::error::{Error, Result};
use esp_core::traits::{EspProvider, ProviderFactory};
use esp_core::{EspConfiguration, ProviderRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One call observed by a mock provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Subscribe {
        email: String,
        list_id: Option<String>,
    },
    Unsubscribe {
        email: String,
        list_id: Option<String>,
    },
    Find(SubscriberQuery),
    Lists,
}

/// A mock provider that records calls and assigns sequential ids
#[derive(Debug)]
pub struct MockEspProvider {
    /// API key the provider was built with
    pub api_key: Option<String>,
    calls: Arc<Mutex<Vec<Call>>>,
    next_id: AtomicUsize,
    /// Stored subscribers returned by find_subscriber
    pub stored: Vec<Subscriber>,
    /// When set, list subscriptions fail with this message
    pub reject_lists: Option<String>,
}

impl MockEspProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            calls: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicUsize::new(1),
            stored: Vec::new(),
            reject_lists: None,
        }
    }

    /// Create a mock that returns `stored` from find_subscriber
    pub fn with_stored(mut self, stored: Vec<Subscriber>) -> Self {
        self.stored = stored;
        self
    }

    /// Create a mock whose list subscriptions fail
    pub fn rejecting_lists(mut self, message: &str) -> Self {
        self.reject_lists = Some(message.to_string());
        self
    }

    /// Get the calls recorded so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl EspProvider for MockEspProvider {
    async fn subscribe(&self, mut subscriber: Subscriber, list: Option<&List>) -> Result<Subscriber> {
        self.record(Call::Subscribe {
            email: subscriber.email.clone(),
            list_id: list.and_then(|l| l.id.clone()),
        });

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        subscriber.id = Some(id.to_string());

        if let (Some(list), Some(message)) = (list, &self.reject_lists) {
            return Err(Error::could_not_subscribe(list.require_id()?, message.clone()));
        }

        Ok(subscriber)
    }

    async fn unsubscribe(&self, subscriber: &Subscriber, list: &List) -> Result<()> {
        self.record(Call::Unsubscribe {
            email: subscriber.email.clone(),
            list_id: list.id.clone(),
        });
        Ok(())
    }

    async fn find_subscriber(&self, query: &SubscriberQuery) -> Result<Vec<Subscriber>> {
        self.record(Call::Find(query.clone()));
        Ok(self
            .stored
            .iter()
            .filter(|s| query.email.as_ref().is_none_or(|email| &s.email == email))
            .cloned()
            .collect())
    }

    async fn lists(&self) -> Result<Vec<List>> {
        self.record(Call::Lists);
        Ok(vec![List::new("1").with_name("Newsletter")])
    }

    fn endpoint(&self) -> String {
        "https://mock.invalid".to_string()
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A factory that counts how many providers it has built
#[derive(Clone, Default)]
pub struct CountingFactory {
    created: Arc<AtomicUsize>,
}

impl CountingFactory {
    /// Get the number of providers created
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ProviderFactory for CountingFactory {
    fn create(&self, credentials: &Credentials) -> Result<Box<dyn EspProvider>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockEspProvider::new(credentials.api_key.clone())))
    }
}

/// Registry with the counting factory registered as "mock"
pub fn mock_registry() -> (Arc<ProviderRegistry>, CountingFactory) {
    let factory = CountingFactory::default();
    let registry = ProviderRegistry::new();
    registry.register_provider("mock", Box::new(factory.clone()));
    (Arc::new(registry), factory)
}

/// Configuration with a mock provider instance installed directly
pub fn configured_with(provider: MockEspProvider) -> (EspConfiguration, Arc<MockEspProvider>) {
    let (registry, _) = mock_registry();
    let esp = EspConfiguration::new(registry);
    let provider = Arc::new(provider);
    esp.set_provider_instance(provider.clone());
    (esp, provider)
}

/// A subscriber that passes validation
pub fn valid_subscriber() -> Subscriber {
    Subscriber::new("kerplunk1@example.com")
        .with_first_name("Billie Joe")
        .with_last_name("Armstrong")
}
