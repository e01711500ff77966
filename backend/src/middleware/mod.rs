pub mod auth;
pub mod locale;

pub use auth::{AuthState, CurrentUser, auth_middleware};
pub use locale::locale_middleware;
