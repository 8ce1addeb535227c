pub mod admin;
pub mod health;
pub mod imagekit;
pub mod routes;

pub use routes::{create_router, health_router, AppState};
