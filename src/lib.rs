//! Budget office API library.
//!
//! Back-office budget and expense tracking: departments hold budgets,
//! budgets fund bills, bills are categorized, and file attachments are
//! stored per record.

pub mod api;

// Re-export api modules at crate root so binaries and tests share the
// same paths the route modules use internally.
pub use api::middleware;
pub use api::models;
pub use api::routes;
pub use api::services;
pub use api::storage;
