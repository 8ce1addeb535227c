// Library Gate

pub mod api;
pub mod authz;
pub mod config;
pub mod db;
pub mod errors;
pub mod media;
pub mod observability;
pub mod rate_limit;
pub mod redis;

pub use config::Config;
pub use errors::{AppError, Result};
