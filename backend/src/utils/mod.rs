pub mod crypto;
pub mod error;
pub mod i18n;
pub mod jwt;
pub mod sql;

pub use crypto::VaultCipher;
pub use error::{ApiError, ApiResult};
pub use i18n::{extract_locale_from_header, get_locale, with_locale};
pub use jwt::{Claims, JwtUtil};
