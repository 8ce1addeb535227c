pub mod gate;
pub mod middleware;

pub use gate::{check_admin, AccessDecision, PgRoleLookup, RoleLookup, SessionUser};
pub use middleware::{require_admin, session_middleware, AdminGate};
