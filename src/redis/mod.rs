pub mod analytics;
pub mod client;
pub mod counters;

pub use analytics::RedisAnalytics;
pub use client::{create_client, health_check};
pub use counters::RedisCounterStore;
