pub mod analytics;
pub mod clock;
pub mod fixed_window;
pub mod limiter;
pub mod middleware;
pub mod store;

pub use analytics::{AnalyticsSink, DecisionEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use fixed_window::{Decision, FixedWindow};
pub use limiter::RateLimiter;
pub use middleware::{rate_limit_middleware, RateLimitGuard};
pub use store::{CounterStore, MemoryCounterStore};
