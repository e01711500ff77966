pub mod analyze;
pub mod auth;
pub mod health;
pub mod vault;
