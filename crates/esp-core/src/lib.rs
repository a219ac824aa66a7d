// # esp-core
//
// Core library for the ActiveESP email service provider abstraction.
//
// ## Architecture Overview
//
// This library provides one domain model and one set of operations over
// many email service provider APIs:
// - **Subscriber / List**: Domain entities with validation rules
// - **EspProvider**: Trait every provider adapter implements
// - **ProviderRegistry**: Plugin-based table of provider factories
// - **EspConfiguration**: Selector + credentials, producing one shared provider
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core contract is separate from adapters
// 2. **Plugin-Based**: Providers are registered by name, no hard-coded if-else
// 3. **Library-First**: No globals; configuration is an explicit object
// 4. **Fail Loudly**: Unimplemented operations and backend warnings are errors

pub mod config;
pub mod configuration;
pub mod domain;
pub mod error;
pub mod registry;
pub mod traits;

// Re-export core types for convenience
pub use config::{Credentials, EspConfig};
pub use configuration::EspConfiguration;
pub use domain::{List, Subscriber, SubscriberAttributes, SubscriberPolicy, SubscriberQuery};
pub use error::{Error, Result};
pub use registry::ProviderRegistry;
pub use traits::{EspProvider, ProviderBase, ProviderFactory};
