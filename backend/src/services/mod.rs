pub mod analysis_service;
pub mod auth_service;
pub mod introspection_service;
pub mod llm;
pub mod mysql_client;
pub mod mysql_pool_manager;
pub mod user_service;
pub mod vault_service;

pub use analysis_service::AnalysisService;
pub use auth_service::AuthService;
pub use llm::LLMService;
pub use mysql_client::{MySQLClient, TargetDatabase, TargetError};
pub use mysql_pool_manager::MySQLPoolManager;
pub use user_service::UserService;
pub use vault_service::VaultService;
