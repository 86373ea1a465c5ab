// Middleware module - activity logging, CORS and login rate limiting

pub mod activity_log;
pub mod cors;
pub mod rate_limit;

pub use cors::create_cors_layer;
pub use rate_limit::{LoginRateLimiter, create_login_limiter};
