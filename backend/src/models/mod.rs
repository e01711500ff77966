pub mod analysis;
pub mod target;
pub mod user;
pub mod vault;

pub use analysis::*;
pub use target::*;
pub use user::*;
pub use vault::*;
