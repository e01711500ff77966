use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

fn default_mysql_port() -> u16 {
    3306
}

fn default_ssh_port() -> u16 {
    22
}

/// Connection details of a MariaDB/MySQL database to analyze
#[derive(Clone, Serialize, Deserialize, Validate, ToSchema, PartialEq)]
#[validate(schema(function = "validate_ssh_settings"))]
pub struct TargetConnection {
    #[validate(length(min = 1, message = "host is required"))]
    pub host: String,
    #[serde(default = "default_mysql_port")]
    pub port: u16,
    #[validate(length(min = 1, message = "user is required"))]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[validate(length(min = 1, message = "database is required"))]
    pub database: String,
    #[serde(default)]
    pub use_ssh: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_config: Option<SshConfig>,
}

#[derive(Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SshConfig {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

fn validate_ssh_settings(conn: &TargetConnection) -> Result<(), ValidationError> {
    if !conn.use_ssh {
        return Ok(());
    }
    let Some(ssh) = &conn.ssh_config else {
        return Err(ValidationError::new("ssh_config_required"));
    };
    if ssh.host.trim().is_empty() || ssh.user.trim().is_empty() {
        return Err(ValidationError::new("ssh_host_and_user_required"));
    }
    let has_secret = ssh.password.as_deref().is_some_and(|p| !p.is_empty())
        || ssh.private_key.as_deref().is_some_and(|k| !k.is_empty());
    if !has_secret {
        return Err(ValidationError::new("ssh_password_or_key_required"));
    }
    Ok(())
}

impl TargetConnection {
    /// `user@host:port/database`, never includes secrets
    pub fn display_name(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl std::fmt::Debug for TargetConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("use_ssh", &self.use_ssh)
            .field("ssh_config", &self.ssh_config)
            .finish()
    }
}

impl std::fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("private_key", &self.private_key.as_ref().map(|_| "***"))
            .finish()
    }
}
