use crate::config::Config;
use crate::db_storage::LeadStorage;
use crate::errors::AppError;
use crate::models::{
    EnrichLeadsRequest, EnrichLeadsResponse, RescoreRequest, RescoreResponse, RunSearchRequest,
    RunSearchResponse, SaveSearchRequest, SaveSearchResponse, SearchRun,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use moka::future::Cache;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Guard cache suppressing concurrent duplicate search runs per user.
    pub running_searches_cache: Cache<String, i64>,
    /// Company-profile cache for enrichment responses, keyed by normalized
    /// company URL. Values are checksummed `ValidatedCacheEntry` strings.
    pub company_profile_cache: Cache<String, String>,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "leadscout-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/searches/run
///
/// Ingestion entry point: executes one provider search run for the acting
/// user and reports how many records were received, imported, and skipped.
pub async fn run_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunSearchRequest>,
) -> Result<Json<RunSearchResponse>, AppError> {
    tracing::info!(
        "POST /searches/run - user: {}, provider: {}",
        req.user_id,
        req.provider
    );

    let outcome = crate::ingestion::run_search_workflow(state, req).await?;

    Ok(Json(RunSearchResponse {
        success: true,
        run_id: outcome.run_id,
        received: outcome.received,
        imported: outcome.imported,
        skipped: outcome.skipped,
    }))
}

/// POST /api/v1/searches/saved
///
/// Persists a named parameter set that later runs can replay via
/// `saved_search_id`.
pub async fn save_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveSearchRequest>,
) -> Result<(StatusCode, Json<SaveSearchResponse>), AppError> {
    tracing::info!("POST /searches/saved - user: {}", req.user_id);

    crate::ingestion::validate_params(&req.params)?;
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Search name cannot be empty".to_string()));
    }

    let params = serde_json::to_value(&req.params)
        .map_err(|e| AppError::Internal(format!("Failed to serialize params: {}", e)))?;

    let storage = LeadStorage::new(state.db.clone());
    let id = storage
        .insert_saved_search(req.user_id, req.name.trim(), &params)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SaveSearchResponse { success: true, id }),
    ))
}

/// POST /api/v1/leads/enrich
///
/// Runs the company-enrichment pipeline for the given leads (or every
/// never-enriched lead when no ids are passed).
pub async fn enrich_leads(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EnrichLeadsRequest>,
) -> Result<Json<EnrichLeadsResponse>, AppError> {
    tracing::info!(
        "POST /leads/enrich - user: {}, explicit ids: {}",
        req.user_id,
        req.lead_ids.as_ref().map(|ids| ids.len()).unwrap_or(0)
    );

    let outcome =
        crate::enrichment::run_enrichment_workflow(state, req.user_id, req.lead_ids).await?;

    Ok(Json(EnrichLeadsResponse {
        success: true,
        requested: outcome.requested,
        fetched: outcome.fetched,
        enriched: outcome.enriched,
    }))
}

/// POST /api/v1/leads/rescore
///
/// Bulk recompute of scores over already-stored leads.
pub async fn rescore_leads(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RescoreRequest>,
) -> Result<Json<RescoreResponse>, AppError> {
    tracing::info!("POST /leads/rescore - user: {}", req.user_id);

    let storage = LeadStorage::new(state.db.clone());
    let outcome = crate::enrichment::rescore_all_leads(&storage, req.user_id).await?;

    Ok(Json(RescoreResponse {
        success: true,
        scanned: outcome.scanned,
        updated: outcome.updated,
    }))
}

/// GET /api/v1/runs/:id
///
/// Run status/outcome readback; a run is always completed, failed, or
/// still visibly running, never silently vanished.
pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SearchRun>, AppError> {
    tracing::info!("GET /runs/{}", id);

    let storage = LeadStorage::new(state.db.clone());
    let run = storage.get_run(id).await?;

    Ok(Json(run))
}
