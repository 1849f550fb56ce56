use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use feed_rank::api::{
    explain_request, rank_request, ApiExplainRequest, ApiExplainResponse, ApiRankRequest,
    ApiRankResponse,
};
use feed_rank::config::{ConfigFile, RankingConfig};
use feed_rank::scoring::{DiversityConfig, RankingPipeline};

#[derive(Clone)]
struct AppState {
    default_profile: Arc<Profile>,
    tenants: Arc<HashMap<String, Arc<Profile>>>,
}

struct Profile {
    config: RankingConfig,
    pipeline: RankingPipeline,
}

impl Profile {
    fn new(config: RankingConfig) -> Self {
        Self {
            pipeline: RankingPipeline::new(config.clone()),
            config,
        }
    }
}

#[derive(Deserialize)]
struct TenantQuery {
    tenant: Option<String>,
}

impl AppState {
    fn profile(&self, tenant: Option<&str>) -> Result<Arc<Profile>, (StatusCode, String)> {
        match tenant {
            None => Ok(self.default_profile.clone()),
            Some(tenant) => self.tenants.get(tenant).cloned().ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    format!("unknown tenant profile: {}", tenant),
                )
            }),
        }
    }
}

pub async fn serve(
    args: crate::ServeArgs,
    file: ConfigFile,
    default_config: RankingConfig,
) -> Result<(), String> {
    let mut tenants = HashMap::new();
    for tenant in file.profiles.keys() {
        match file.resolve(Some(tenant)) {
            Ok(config) => {
                tenants.insert(tenant.clone(), Arc::new(Profile::new(config)));
            }
            Err(err) => warn!(tenant = %tenant, error = %err, "skipping invalid tenant profile"),
        }
    }

    let state = AppState {
        default_profile: Arc::new(Profile::new(default_config)),
        tenants: Arc::new(tenants),
    };

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/rank", post(rank_handler))
        .route("/api/explain", post(explain_handler))
        .route("/api/config/diversity", get(diversity_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;
    info!(%addr, "feed ranking server listening");
    axum::serve(listener, app)
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn rank_handler(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
    Json(request): Json<ApiRankRequest>,
) -> Result<Json<ApiRankResponse>, (StatusCode, String)> {
    let profile = state.profile(query.tenant.as_deref())?;
    let item_count = request.items.len();
    let response = rank_request(&profile.pipeline, request, Utc::now());
    info!(
        tenant = ?query.tenant,
        items = item_count,
        skipped = response.skipped.len(),
        "ranked feed request"
    );
    Ok(Json(response))
}

async fn explain_handler(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
    Json(request): Json<ApiExplainRequest>,
) -> Result<Json<ApiExplainResponse>, (StatusCode, String)> {
    let profile = state.profile(query.tenant.as_deref())?;
    let response = explain_request(&profile.pipeline, request, Utc::now())
        .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
    Ok(Json(response))
}

async fn diversity_handler(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<DiversityConfig>, (StatusCode, String)> {
    let profile = state.profile(query.tenant.as_deref())?;
    Ok(Json(profile.config.diversity.clone()))
}
