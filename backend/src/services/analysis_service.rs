//! Query analysis orchestration
//!
//! connect → schema / EXPLAIN / sample rows → four advisors → merged payload.
//! Advisor failures never fail the request; they are embedded in the
//! advisor's report.

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::models::{
    AdvisorReport, AdvisorStatus, AnalysisResponse, AnalyzeRequest, AnalyzeSchemaRequest,
    SchemaOverview, TargetConnection,
};
use crate::services::introspection_service;
use crate::services::llm::{
    CostAdvisorReq, CostAdvisorResp, DataValidatorReq, DataValidatorResp, LLMError, LLMService,
    QueryOptimizerReq, QueryOptimizerResp, SchemaAdvisorReq, SchemaAdvisorResp, UnsafeQueryReq,
    UnsafeQueryResp,
};
use crate::services::mysql_client::TargetDatabase;
use crate::services::mysql_pool_manager::MySQLPoolManager;
use crate::services::vault_service::VaultService;
use crate::utils::sql::{contains_forbidden_keyword, is_select_only};
use crate::utils::{ApiError, ApiResult};

pub struct AnalysisService {
    llm: Arc<LLMService>,
    pool_manager: Arc<MySQLPoolManager>,
    vault: Arc<VaultService>,
    default_target: Option<TargetConnection>,
    sample_limit: u32,
}

fn error_details(err: &LLMError) -> Value {
    let mut details = json!({ "error": err.to_string() });
    if let Some(raw) = err.raw_text() {
        details["raw_text"] = Value::String(raw.to_string());
    }
    details
}

fn to_details<T: Serialize>(resp: &T) -> Value {
    serde_json::to_value(resp).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

impl AnalysisService {
    pub fn new(
        llm: Arc<LLMService>,
        pool_manager: Arc<MySQLPoolManager>,
        vault: Arc<VaultService>,
        default_target: Option<TargetConnection>,
        sample_limit: u32,
    ) -> Self {
        Self { llm, pool_manager, vault, default_target, sample_limit }
    }

    /// Inline connection, then vault profile, then the configured default
    pub async fn resolve_target(
        &self,
        user_id: i64,
        database: Option<TargetConnection>,
        profile_id: Option<i64>,
    ) -> ApiResult<TargetConnection> {
        let target = if let Some(conn) = database {
            conn
        } else if let Some(id) = profile_id {
            self.vault.get_connection(user_id, id).await?
        } else if let Some(conn) = &self.default_target {
            conn.clone()
        } else {
            return Err(ApiError::TargetMissing);
        };

        if target.use_ssh {
            tracing::warn!("Refusing SSH target {}", target.display_name());
            return Err(ApiError::SshNotSupported);
        }
        Ok(target)
    }

    pub async fn analyze(&self, user_id: i64, req: AnalyzeRequest) -> ApiResult<AnalysisResponse> {
        let sql = validate_query(&req.sql)?;

        if req.run_in_sandbox {
            tracing::info!("Running query in sandbox mode");
        }

        let target = self.resolve_target(user_id, req.database, req.profile_id).await?;
        let db = self.pool_manager.get_client(&target).await?;

        Ok(self.analyze_with(&db, sql).await)
    }

    /// Everything after the target is connected
    pub async fn analyze_with(&self, db: &dyn TargetDatabase, sql: &str) -> AnalysisResponse {
        tracing::info!("Analyzing query on {}", db.database_name());

        let (schema_context, explain_plan, sample_rows) = tokio::join!(
            introspection_service::schema_context(db, sql),
            introspection_service::explain(db, sql),
            introspection_service::sample_rows(db, sql, self.sample_limit),
        );

        let (optimizer, cost, schema_adv, data_val) = tokio::join!(
            self.optimize(sql, &schema_context, &explain_plan, &sample_rows),
            self.cost_report(sql, &explain_plan),
            self.schema_report(sql, &schema_context),
            self.data_report(sql, &sample_rows),
        );

        let analysis = merge_reports(optimizer, cost, schema_adv, data_val);
        let optimized_query = analysis
            .get("optimized_query")
            .and_then(Value::as_str)
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(sql)
            .to_string();

        AnalysisResponse {
            original_query: sql.to_string(),
            schema_context,
            explain_plan,
            sample_rows,
            analysis,
            optimized_query,
            database_used: db.database_name().to_string(),
        }
    }

    pub async fn analyze_schema(&self, user_id: i64, req: AnalyzeSchemaRequest) -> ApiResult<SchemaOverview> {
        let target = self.resolve_target(user_id, req.database, req.profile_id).await?;
        let db = self.pool_manager.get_client(&target).await?;
        Ok(self.schema_overview(&db).await)
    }

    pub async fn schema_overview(&self, db: &dyn TargetDatabase) -> SchemaOverview {
        SchemaOverview {
            database: db.database_name().to_string(),
            tables: introspection_service::full_schema(db).await,
        }
    }

    // ========================================================================
    // Advisors
    // ========================================================================

    /// Optimizer details; on failure the original query stands in for the rewrite
    async fn optimize(&self, sql: &str, schema: &Value, explain: &Value, sample_rows: &Value) -> Value {
        let req = QueryOptimizerReq {
            sql: sql.to_string(),
            schema: schema.clone(),
            explain: explain.clone(),
            sample_rows: sample_rows.clone(),
        };
        match self.llm.analyze::<_, QueryOptimizerResp>(&req).await {
            Ok(resp) => to_details(&resp),
            Err(e) => {
                let mut details = error_details(&e);
                details["optimized_query"] = Value::String(sql.to_string());
                details
            },
        }
    }

    async fn cost_report(&self, sql: &str, explain: &Value) -> AdvisorReport {
        let req = CostAdvisorReq { sql: sql.to_string(), explain: explain.clone() };
        let result = self.llm.analyze::<_, CostAdvisorResp>(&req).await;
        report("cost_advisor", sql, result)
    }

    pub async fn schema_report(&self, sql: &str, schema: &Value) -> AdvisorReport {
        if contains_forbidden_keyword(sql) {
            let req = UnsafeQueryReq { sql: sql.to_string() };
            return match self.llm.analyze::<_, UnsafeQueryResp>(&req).await {
                Ok(resp) => AdvisorReport {
                    agent: "schema_advisor".to_string(),
                    status: AdvisorStatus::Unsafe,
                    query: sql.to_string(),
                    safe_query: Some(resp.safe_preview),
                    details: json!({ "reasoning": resp.explanation }),
                },
                Err(e) => with_null_safe_query(report::<()>("schema_advisor", sql, Err(e))),
            };
        }

        let req = SchemaAdvisorReq { sql: sql.to_string(), schema: schema.clone() };
        let result = self.llm.analyze::<_, SchemaAdvisorResp>(&req).await;
        with_null_safe_query(report("schema_advisor", sql, result))
    }

    async fn data_report(&self, sql: &str, sample_rows: &Value) -> AdvisorReport {
        let req = DataValidatorReq { sql: sql.to_string(), sample_rows: sample_rows.clone() };
        let result = self.llm.analyze::<_, DataValidatorResp>(&req).await;
        report("data_validator", sql, result)
    }
}

fn report<T: Serialize>(agent: &str, sql: &str, result: Result<T, LLMError>) -> AdvisorReport {
    let (status, details) = match result {
        Ok(resp) => (AdvisorStatus::Success, to_details(&resp)),
        Err(e) => (AdvisorStatus::Error, error_details(&e)),
    };
    AdvisorReport { agent: agent.to_string(), status, query: sql.to_string(), safe_query: None, details }
}

fn with_null_safe_query(mut report: AdvisorReport) -> AdvisorReport {
    report.safe_query = Some(None);
    report
}

/// Trimmed query, or the 400 the request deserves
pub fn validate_query(sql: &str) -> ApiResult<&str> {
    let query = sql.trim();
    if query.is_empty() {
        return Err(ApiError::EmptyQuery);
    }
    if !is_select_only(query) {
        return Err(ApiError::sql_safety_violation(query));
    }
    Ok(query)
}

/// Optimizer details at the top level, the other advisors under `ai_details`
pub fn merge_reports(
    optimizer: Value,
    cost: AdvisorReport,
    schema: AdvisorReport,
    data: AdvisorReport,
) -> Value {
    let mut analysis = match optimizer {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("result".to_string(), other);
            map
        },
    };

    analysis.insert(
        "ai_details".to_string(),
        json!({
            "cost_advisor": cost,
            "schema_advisor": schema,
            "data_validator": data,
        }),
    );
    Value::Object(analysis)
}
