// # active-esp
//
// Integration facade for ActiveESP.
//
// This crate is a THIN layer: it re-exports `esp-core` and registers the
// built-in provider adapters enabled through Cargo features.
//
// ## Features
//
// - `mailchimp` (default): MailChimp API 1.3, selector `mail_chimp`
// - `icontact` (default): iContact API 2.0, selector `icontact`
//
// ## Example
//
// ```rust,ignore
// use active_esp::{Credentials, List, Subscriber};
//
// let esp = active_esp::configuration();
// esp.configure(|c| {
//     c.set_provider("mail_chimp");
//     c.set_credentials(Credentials::api_key("12345678901234567890-us4"));
// })?;
//
// let subscriber = Subscriber::new("user@example.com").with_name("Brian Morton");
// List::new("b1234").subscribe(&esp, subscriber).await?;
// ```

use std::sync::Arc;

pub use esp_core::*;

#[cfg(feature = "icontact")]
pub use esp_provider_icontact as icontact;
#[cfg(feature = "mailchimp")]
pub use esp_provider_mailchimp as mailchimp;

/// Registry with every provider enabled at compile time
pub fn default_registry() -> Arc<ProviderRegistry> {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "mailchimp")]
    {
        tracing::debug!("Registering MailChimp provider");
        esp_provider_mailchimp::register(&registry);
    }

    #[cfg(feature = "icontact")]
    {
        tracing::debug!("Registering iContact provider");
        esp_provider_icontact::register(&registry);
    }

    Arc::new(registry)
}

/// Unconfigured configuration over the default registry
pub fn configuration() -> EspConfiguration {
    EspConfiguration::new(default_registry())
}

/// Configuration built from `ESP_*` environment variables
///
/// See [`EspConfig::from_env`] for the variables read.
pub fn configure_from_env() -> Result<EspConfiguration> {
    EspConfiguration::from_config(default_registry(), EspConfig::from_env()?)
}

/// Configuration built through an arbitrary variable lookup
pub fn configure_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<EspConfiguration> {
    EspConfiguration::from_config(default_registry(), EspConfig::from_lookup(lookup)?)
}
