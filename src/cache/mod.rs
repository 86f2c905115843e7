//! Policy-driven cache for materialized results.

mod clock;
mod policy;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{CachePolicy, CachePolicyEngine, Expiration};
pub use store::{CacheStats, ResultCache};
