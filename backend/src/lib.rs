// Translations are loaded from backend/locales at compile time
rust_i18n::i18n!("locales", fallback = "en");

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use sqlx::SqlitePool;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{Config, StaticConfig};
use crate::services::{
    AnalysisService, AuthService, LLMService, MySQLPoolManager, UserService, VaultService,
};
use crate::utils::{JwtUtil, VaultCipher};

/// Shared state handed to every handler
pub struct AppState {
    pub config: Config,
    pub auth_service: Arc<AuthService>,
    pub vault_service: Arc<VaultService>,
    pub analysis_service: Arc<AnalysisService>,
    pub llm_service: Arc<LLMService>,
    pub jwt_util: Arc<JwtUtil>,
}

impl AppState {
    /// Wire services from configuration and an already-migrated database
    pub fn from_config(config: Config, pool: SqlitePool) -> anyhow::Result<Self> {
        let llm_service = Arc::new(LLMService::from_config(&config.llm)?);
        if !llm_service.is_available() {
            tracing::warn!("LLM advisors unavailable (disabled or no API key); reports will carry errors");
        }
        Ok(Self::with_llm(config, pool, llm_service))
    }

    /// Same as `from_config` with an explicit LLM service
    pub fn with_llm(config: Config, pool: SqlitePool, llm_service: Arc<LLMService>) -> Self {
        let jwt_util = Arc::new(JwtUtil::new(&config.auth.jwt_secret, config.auth.jwt_expires_in));
        let user_service = Arc::new(UserService::new(pool.clone()));
        let auth_service = Arc::new(AuthService::new(user_service, jwt_util.clone()));
        let vault_service =
            Arc::new(VaultService::new(pool, VaultCipher::new(&config.vault.secret)));
        let pool_manager = Arc::new(MySQLPoolManager::new(Duration::from_secs(
            config.analysis.connect_timeout_secs,
        )));
        let analysis_service = Arc::new(AnalysisService::new(
            llm_service.clone(),
            pool_manager,
            vault_service.clone(),
            config.target.clone(),
            config.analysis.sample_limit,
        ));

        Self {
            config,
            auth_service,
            vault_service,
            analysis_service,
            llm_service,
            jwt_util,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::vault::list_items,
        handlers::vault::create_item,
        handlers::vault::get_item,
        handlers::vault::delete_item,
        handlers::analyze::analyze,
        handlers::analyze::analyze_schema,
    ),
    components(schemas(
        handlers::health::HealthResponse,
        models::RegisterRequest,
        models::LoginRequest,
        models::LoginResponse,
        models::UserResponse,
        models::TargetConnection,
        models::SshConfig,
        models::CreateVaultItemRequest,
        models::VaultItemSummary,
        models::VaultItemDetail,
        models::AnalyzeRequest,
        models::AnalyzeSchemaRequest,
        models::AnalysisResponse,
        models::AdvisorReport,
        models::AdvisorStatus,
        models::SchemaOverview,
        utils::error::ApiErrorResponse,
    )),
    tags(
        (name = "Health", description = "Service status"),
        (name = "Authentication", description = "Registration and login"),
        (name = "Vault", description = "Encrypted connection profiles"),
        (name = "Analysis", description = "Query analysis against a target database"),
    ),
    modifiers(&SecurityAddon),
    info(title = "QueryVault API", description = "SQL query analysis with LLM advisors")
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn build_router(state: Arc<AppState>, static_config: &StaticConfig) -> Router {
    let auth_state = middleware::AuthState { jwt_util: state.jwt_util.clone() };

    let public_routes = Router::new()
        .route("/api/health", get(handlers::health::health))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/vault",
            get(handlers::vault::list_items).post(handlers::vault::create_item),
        )
        .route(
            "/api/vault/:id",
            get(handlers::vault::get_item).delete(handlers::vault::delete_item),
        )
        .route("/api/analyze", post(handlers::analyze::analyze))
        .route("/api/analyze-schema", post(handlers::analyze::analyze_schema))
        .route_layer(axum_middleware::from_fn_with_state(auth_state, middleware::auth_middleware));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    if static_config.enabled {
        let web_root = std::path::Path::new(&static_config.web_root);
        tracing::info!("Serving static files from {}", web_root.display());
        app = app.fallback_service(
            ServeDir::new(web_root).not_found_service(ServeFile::new(web_root.join("index.html"))),
        );
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::locale_middleware))
}
