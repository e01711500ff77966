use bcrypt::verify;
use std::sync::Arc;

use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UserResponse};
use crate::services::user_service::UserService;
use crate::utils::{ApiError, ApiResult, JwtUtil};

pub struct AuthService {
    user_service: Arc<UserService>,
    jwt_util: Arc<JwtUtil>,
}

impl AuthService {
    pub fn new(user_service: Arc<UserService>, jwt_util: Arc<JwtUtil>) -> Self {
        Self { user_service, jwt_util }
    }

    pub async fn register(&self, req: RegisterRequest) -> ApiResult<UserResponse> {
        let user = self.user_service.create_user(&req).await?;
        Ok(user.into())
    }

    pub async fn login(&self, req: LoginRequest) -> ApiResult<LoginResponse> {
        let user = self
            .user_service
            .find_by_email(&req.email)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Login attempt for unknown email: {}", req.email);
                ApiError::invalid_credentials()
            })?;

        let valid = verify(&req.password, &user.password_hash)
            .map_err(|e| ApiError::internal_error(format!("Failed to verify password: {}", e)))?;

        if !valid {
            tracing::warn!("Invalid password for user {}", user.id);
            return Err(ApiError::invalid_credentials());
        }

        let token = self.jwt_util.generate_token(user.id, &user.email)?;
        tracing::info!("User {} logged in", user.id);

        Ok(LoginResponse { token, user: user.into() })
    }

    pub async fn current_user(&self, user_id: i64) -> ApiResult<UserResponse> {
        self.user_service.get_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::create_test_db;

    async fn auth_service() -> AuthService {
        let pool = create_test_db().await;
        AuthService::new(Arc::new(UserService::new(pool)), Arc::new(JwtUtil::new("test-secret", 3600)))
    }

    fn register_req(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "correct horse".to_string(),
            full_name: Some("Ada Lovelace".to_string()),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest { email: email.to_string(), password: password.to_string() }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let svc = auth_service().await;
        let user = svc.register(register_req("Ada@Example.com")).await.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.full_name.as_deref(), Some("Ada Lovelace"));

        let login = svc.login(login_req("ADA@example.com", "correct horse")).await.unwrap();
        assert_eq!(login.user.id, user.id);
        assert!(!login.token.is_empty());

        let me = svc.current_user(user.id).await.unwrap();
        assert_eq!(me.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let svc = auth_service().await;
        svc.register(register_req("dup@example.com")).await.unwrap();
        let err = svc.register(register_req("DUP@example.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::EmailTaken));
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let svc = auth_service().await;
        svc.register(register_req("ada@example.com")).await.unwrap();

        let wrong_password = svc.login(login_req("ada@example.com", "nope")).await;
        assert!(matches!(wrong_password, Err(ApiError::InvalidCredentials)));

        let unknown = svc.login(login_req("bob@example.com", "correct horse")).await;
        assert!(matches!(unknown, Err(ApiError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_current_user_missing() {
        let svc = auth_service().await;
        assert!(matches!(svc.current_user(404).await, Err(ApiError::ResourceNotFound(_))));
    }
}
