//! Contract Test: Configuration & Shared Provider Lifecycle
//!
//! Constraints verified:
//! - No provider is built until both selector and credentials are known
//! - The built provider is memoized and shared
//! - Any configuration change invalidates the shared provider
//! - Unknown selectors fail with ProviderNotSupported
//!
//! If this test fails, callers may see stale credentials or a provider per call.

mod common;

use common::*;
use esp_core::{Credentials, EspConfiguration, EspProvider, Error};
use std::sync::Arc;

#[test]
fn selector_without_credentials_yields_no_provider() {
    let (registry, factory) = mock_registry();
    let esp = EspConfiguration::new(registry);

    esp.set_provider("mock");

    assert!(esp.get_provider().unwrap().is_none());
    assert_eq!(factory.created(), 0, "nothing should be built yet");
}

#[test]
fn credentials_without_selector_yield_no_provider() {
    let (registry, factory) = mock_registry();
    let esp = EspConfiguration::new(registry);

    esp.set_credentials(Credentials::api_key("abc123-us4"));

    assert!(esp.get_provider().unwrap().is_none());
    assert_eq!(factory.created(), 0);
}

#[test]
fn selector_and_credentials_build_one_shared_provider() {
    let (registry, factory) = mock_registry();
    let esp = EspConfiguration::new(registry);

    esp.set_provider("mock");
    esp.set_credentials(Credentials::api_key("abc123-us4"));

    let first = esp.get_provider().unwrap().expect("provider built");
    let second = esp.get_provider().unwrap().expect("provider memoized");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(factory.created(), 1);
    assert_eq!(first.provider_name(), "mock");
}

#[test]
fn changing_credentials_builds_a_new_provider() {
    let (registry, factory) = mock_registry();
    let esp = EspConfiguration::new(registry);

    esp.set_provider("mock");
    esp.set_credentials(Credentials::api_key("abc123-us4"));
    let before = esp.get_provider().unwrap().unwrap();

    esp.set_credentials(Credentials::api_key("def456-us9"));
    let after = esp.get_provider().unwrap().unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(factory.created(), 2);
}

#[test]
fn changing_selector_builds_a_new_provider() {
    let (registry, factory) = mock_registry();
    let esp = EspConfiguration::new(registry);

    esp.set_provider("mock");
    esp.set_credentials(Credentials::api_key("abc123-us4"));
    let before = esp.get_provider().unwrap().unwrap();

    esp.set_provider("mock");
    let after = esp.get_provider().unwrap().unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(factory.created(), 2);
}

#[test]
fn unknown_selector_is_not_supported() {
    let (registry, _) = mock_registry();
    let esp = EspConfiguration::new(registry);

    esp.set_provider("not_a_real_provider");
    let result = esp.get_provider();
    assert!(matches!(
        result,
        Err(Error::ProviderNotSupported(ref name)) if name == "not_a_real_provider"
    ));

    esp.set_credentials(Credentials::api_key("abc123-us4"));
    assert!(matches!(
        esp.get_provider(),
        Err(Error::ProviderNotSupported(_))
    ));
}

#[test]
fn installed_instance_bypasses_selector() {
    let (esp, provider) = configured_with(MockEspProvider::new(None));

    assert_eq!(esp.provider_selector(), None);
    let shared = esp.get_provider().unwrap().expect("installed provider");
    assert_eq!(shared.provider_name(), provider.provider_name());
}

#[test]
fn configuration_change_drops_installed_instance() {
    let (esp, _provider) = configured_with(MockEspProvider::new(None));

    esp.set_credentials(Credentials::api_key("abc123-us4"));

    // No selector to rebuild from
    assert!(esp.get_provider().unwrap().is_none());
}

#[test]
fn configure_resets_even_without_changes() {
    let (registry, factory) = mock_registry();
    let esp = EspConfiguration::new(registry);

    let first = esp
        .configure(|c| {
            c.set_provider("mock");
            c.set_credentials(Credentials::api_key("abc123-us4"));
        })
        .unwrap()
        .unwrap();
    let second = esp.configure(|_| {}).unwrap().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(factory.created(), 2);
}

#[tokio::test]
async fn shared_provider_is_usable_across_tasks() {
    let (registry, factory) = mock_registry();
    let esp = Arc::new(EspConfiguration::new(registry));
    esp.set_provider("mock");
    esp.set_credentials(Credentials::api_key("abc123-us4"));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let esp = Arc::clone(&esp);
            tokio::spawn(async move { esp.require_provider().unwrap().lists().await })
        })
        .collect();

    for handle in handles {
        let lists = handle.await.unwrap().unwrap();
        assert_eq!(lists.len(), 1);
    }

    assert_eq!(factory.created(), 1, "all tasks share one provider");
}
