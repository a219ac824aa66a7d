//! Domain entities shared by every provider
//!
//! - [`Subscriber`]: one email contact
//! - [`List`]: one named subscription list

pub mod list;
pub mod subscriber;

pub use list::{List, ListAttributes};
pub use subscriber::{Subscriber, SubscriberAttributes, SubscriberPolicy, SubscriberQuery};
