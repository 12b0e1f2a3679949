//! Fixed-window, in-memory rate limiting keyed by client id.
//!
//! The store is intentionally lightweight and process-local: it is created
//! by the server's composition root and passed to the route layer, so there
//! is no hidden module-global state. Nothing is persisted; counters are lost
//! on restart and are not shared between instances.

mod record;
mod state;

pub use record::{RateLimitRecord, RateLimitStatus};
pub use state::RateLimiter;
