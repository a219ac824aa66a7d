//! Core traits for the ActiveESP system
//!
//! This module defines the abstract interface that all provider adapters follow.
//!
//! - [`EspProvider`]: Subscribe, unsubscribe, find, and list via a provider API
//! - [`ProviderFactory`]: Build a provider from credentials

pub mod provider;

pub use provider::{EspProvider, ProviderBase, ProviderFactory, resolve_endpoint};
