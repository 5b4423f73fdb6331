//! Search-run ingestion pipeline.
//!
//! One inbound request executes one sequential unit of work: validate,
//! record the run, execute the provider search, normalize, dedup, score,
//! insert, and resolve the run record. The dedup index lives only for the
//! duration of the invocation.

use crate::db_storage::LeadStorage;
use crate::dedup::DedupIndex;
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::models::{RunSearchRequest, ScoredLead, SearchParams};
use crate::normalize::normalize_job_record;
use crate::scoring::score_lead;
use crate::services::JobSearchService;
use std::sync::Arc;
use uuid::Uuid;

/// The one provider identifier this deployment accepts.
pub const SUPPORTED_PROVIDER: &str = "linkedin-jobs";

/// Outcome of one ingestion run.
#[derive(Debug)]
pub struct SearchRunOutcome {
    pub run_id: Uuid,
    pub received: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// Rejects structurally invalid search parameters before any work happens.
pub fn validate_params(params: &SearchParams) -> Result<(), AppError> {
    if params.job_titles.iter().all(|t| t.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "At least one job title is required".to_string(),
        ));
    }
    Ok(())
}

/// Resolves the effective search parameters for a run request: a saved
/// search replay takes precedence, otherwise the inline params are used.
async fn resolve_params(
    storage: &LeadStorage,
    req: &RunSearchRequest,
) -> Result<SearchParams, AppError> {
    if let Some(saved_id) = req.saved_search_id {
        let saved = storage.get_saved_search(req.user_id, saved_id).await?;
        return serde_json::from_value(saved.params).map_err(|e| {
            AppError::Internal(format!("Saved search {} has corrupt params: {}", saved_id, e))
        });
    }

    req.params
        .clone()
        .ok_or_else(|| AppError::BadRequest("Missing search parameters".to_string()))
}

/// Complete ingestion workflow for one search request.
///
/// Validation failures reject before a run record exists; once the record
/// is created the run always resolves to completed or failed.
pub async fn run_search_workflow(
    state: Arc<AppState>,
    req: RunSearchRequest,
) -> Result<SearchRunOutcome, AppError> {
    if req.provider != SUPPORTED_PROVIDER {
        return Err(AppError::BadRequest(format!(
            "Unsupported provider '{}'; expected '{}'",
            req.provider, SUPPORTED_PROVIDER
        )));
    }

    let storage = LeadStorage::new(state.db.clone());
    let params = resolve_params(&storage, &req).await?;
    validate_params(&params)?;

    // Suppress concurrent duplicate runs for the same user. The storage
    // unique key is the real backstop; this just fails fast.
    let guard_key = format!("{}:{}", req.user_id, req.provider);
    if state.running_searches_cache.get(&guard_key).await.is_some() {
        return Err(AppError::BadRequest(
            "A search run is already in progress for this user".to_string(),
        ));
    }
    state.running_searches_cache.insert(guard_key.clone(), 1).await;

    let params_json = serde_json::to_value(&params)
        .map_err(|e| AppError::Internal(format!("Failed to serialize params: {}", e)))?;
    let run_id = storage.insert_run(req.user_id, &req.provider, &params_json).await?;
    tracing::info!("Search run {} started for user {}", run_id, req.user_id);

    let result = execute_search_run(&state, &storage, req.user_id, &params).await;
    state.running_searches_cache.invalidate(&guard_key).await;

    match result {
        Ok((received, imported, skipped)) => {
            storage
                .mark_run_completed(run_id, received, imported, skipped)
                .await?;
            tracing::info!(
                "Search run {} completed: {} received, {} imported, {} skipped",
                run_id,
                received,
                imported,
                skipped
            );
            Ok(SearchRunOutcome {
                run_id,
                received,
                imported,
                skipped,
            })
        }
        Err(e) => {
            let message = e.to_string();
            if let Err(mark_err) = storage.mark_run_failed(run_id, &message).await {
                tracing::error!(
                    "Failed to mark run {} as failed: {} (original error: {})",
                    run_id,
                    mark_err,
                    message
                );
            }
            Err(e)
        }
    }
}

async fn execute_search_run(
    state: &Arc<AppState>,
    storage: &LeadStorage,
    user_id: Uuid,
    params: &SearchParams,
) -> Result<(usize, usize, usize), AppError> {
    tracing::info!("Step 1: Executing provider search");
    let service = JobSearchService::new(&state.config);
    let records = service.search(params).await?;
    let received = records.len();

    tracing::info!("Step 2: Normalizing {} raw record(s)", received);
    let mut candidates = Vec::with_capacity(received);
    let mut unidentifiable = 0usize;
    for record in &records {
        match normalize_job_record(record) {
            Some(lead) => candidates.push(lead),
            None => unidentifiable += 1,
        }
    }
    if unidentifiable > 0 {
        tracing::warn!(
            "{} record(s) had no resolvable or synthesizable URL and were dropped",
            unidentifiable
        );
    }

    tracing::info!("Step 3: Filtering against existing leads");
    let index = DedupIndex::new(storage.existing_urls(user_id).await?);
    let (fresh, skipped) = index.partition_new(candidates);

    tracing::info!(
        "Step 4: Scoring and inserting {} new lead(s) ({} duplicate(s) skipped)",
        fresh.len(),
        skipped
    );
    let scored: Vec<ScoredLead> = fresh
        .into_iter()
        .map(|lead| {
            let score = score_lead(&lead.score_input());
            ScoredLead { lead, score }
        })
        .collect();

    let imported = storage.insert_leads(user_id, &scored).await? as usize;

    Ok((received, imported, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_job_titles_are_rejected() {
        let params = SearchParams {
            job_titles: vec!["  ".to_string()],
            locations: vec![],
            posted_within: None,
            limit: None,
            sort: None,
        };
        assert!(validate_params(&params).is_err());

        let empty = SearchParams {
            job_titles: vec![],
            locations: vec![],
            posted_within: None,
            limit: None,
            sort: None,
        };
        assert!(validate_params(&empty).is_err());
    }

    #[test]
    fn real_titles_pass_validation() {
        let params = SearchParams {
            job_titles: vec!["Staff Engineer".to_string()],
            locations: vec!["Denver".to_string()],
            posted_within: None,
            limit: Some(25),
            sort: None,
        };
        assert!(validate_params(&params).is_ok());
    }
}
