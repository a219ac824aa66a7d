//! Minimal embedding example for active-esp
//!
//! This example registers a custom in-process provider, selects it through
//! the configuration, and drives it through the List and Subscriber
//! entities. No network access is needed.

use active_esp::{
    Credentials, EspConfiguration, EspProvider, Error, List, ProviderFactory, ProviderRegistry,
    Result, Subscriber, SubscriberQuery,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Custom provider that keeps contacts and subscriptions in memory
#[derive(Debug, Default)]
struct EmbeddedProvider {
    next_id: AtomicUsize,
    contacts: Mutex<Vec<Subscriber>>,
    subscriptions: Mutex<HashMap<String, Vec<String>>>,
}

impl EmbeddedProvider {
    fn contacts(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.contacts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscriptions(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<String>>> {
        self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl EspProvider for EmbeddedProvider {
    async fn subscribe(&self, mut subscriber: Subscriber, list: Option<&List>) -> Result<Subscriber> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        subscriber.id = Some(id.to_string());
        println!("[Embedded] Created contact {} ({})", id, subscriber.email);
        self.contacts().push(subscriber.clone());

        if let Some(list) = list {
            let list_id = list.require_id()?;
            self.subscriptions()
                .entry(list_id.to_string())
                .or_default()
                .push(id.to_string());
            println!("[Embedded] Subscribed {} to list {}", id, list_id);
        }

        Ok(subscriber)
    }

    async fn unsubscribe(&self, subscriber: &Subscriber, list: &List) -> Result<()> {
        let list_id = list.require_id()?;
        let contact_id = subscriber
            .id
            .clone()
            .ok_or_else(|| Error::invalid_input("Subscriber ID is required"))?;

        let mut subscriptions = self.subscriptions();
        let members = subscriptions.entry(list_id.to_string()).or_default();
        if !members.contains(&contact_id) {
            return Err(Error::could_not_unsubscribe(list_id, "not subscribed"));
        }
        members.retain(|member| member != &contact_id);
        println!("[Embedded] Unsubscribed {} from list {}", contact_id, list_id);
        Ok(())
    }

    async fn find_subscriber(&self, query: &SubscriberQuery) -> Result<Vec<Subscriber>> {
        Ok(self
            .contacts()
            .iter()
            .filter(|s| query.email.as_ref().is_none_or(|email| &s.email == email))
            .filter(|s| query.id.is_none() || s.id == query.id)
            .cloned()
            .collect())
    }

    async fn lists(&self) -> Result<Vec<List>> {
        Ok(vec![List::new("1").with_name("Embedded Newsletter")])
    }

    fn endpoint(&self) -> String {
        "memory://embedded".to_string()
    }

    fn provider_name(&self) -> &'static str {
        "embedded"
    }
}

struct EmbeddedFactory;

impl ProviderFactory for EmbeddedFactory {
    fn create(&self, _credentials: &Credentials) -> Result<Box<dyn EspProvider>> {
        Ok(Box::new(EmbeddedProvider::default()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== Embedded active-esp Example ===\n");

    // Register the custom provider next to the built-in ones
    println!("1. Registering embedded provider...");
    let registry = ProviderRegistry::new();
    active_esp::mailchimp::register(&registry);
    registry.register_provider("embedded", Box::new(EmbeddedFactory));
    println!("   Available providers: {:?}", registry.list_providers());

    // Select it
    println!("2. Configuring...");
    let esp = EspConfiguration::new(Arc::new(registry));
    esp.set_requires_name(true);
    esp.configure(|c| {
        c.set_provider("embedded");
        c.set_credentials(Credentials::new());
    })?;

    // Invalid subscribers never reach the provider
    println!("3. Creating an unnamed subscriber (rejected)...");
    match Subscriber::new("user@example.com").create(&esp).await {
        Err(Error::SubscriberInvalid(reason)) => println!("   Rejected: {reason}"),
        other => println!("   Unexpected: {other:?}"),
    }

    println!("4. Subscribing through the list...");
    let list = List::new("1");
    let subscriber = list
        .subscribe(
            &esp,
            Subscriber::new("user@example.com").with_name("Brian Morton"),
        )
        .await?;
    println!("   {} is contact {:?}", subscriber.name(), subscriber.id);

    println!("5. Finding the subscriber...");
    let found = Subscriber::find(&esp, &SubscriberQuery::by_email("user@example.com")).await?;
    println!("   Found {} match(es)", found.len());

    println!("6. Unsubscribing...");
    subscriber.unsubscribe(&esp, &list).await?;

    println!("7. Asking for something the provider lacks...");
    let provider = esp.require_provider()?;
    if let Err(e) = provider.is_subscribed(&subscriber, Some(&list)).await {
        println!("   {e}");
    }

    println!("\n=== Embedding Successful ===");
    println!("Key Points:");
    println!("- Configuration is an explicit object, not global state");
    println!("- Providers are plugged in by name through the registry");
    println!("- Unimplemented operations fail loudly");

    Ok(())
}
