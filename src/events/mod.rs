// Publish/subscribe registry for payment domain occurrences
// Subscribers are isolated from each other and from the publisher: a
// failing subscriber is logged and skipped, never propagated.

pub mod event;
pub mod manager;
pub mod metrics;

pub use event::{Event, EventName};
pub use manager::{EventManager, SubscriptionHandle, DEFAULT_HISTORY_CAPACITY};
pub use metrics::EventMetrics;
