use crate::scoring::LeadScoreInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// ============ Canonical records ============

/// A raw record as returned by either provider actor: an open, untyped
/// mapping with no guaranteed schema. Discarded after normalization.
pub type RawProviderRecord = Value;

/// Canonical form of one scraped job posting, produced once per raw record
/// during a search run and immutable thereafter.
///
/// `url` is the primary natural key used for deduplication; `external_id`
/// is the secondary identifier a URL can be synthesized from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLead {
    pub title: String,
    pub company: Option<String>,
    pub company_url: Option<String>,
    pub company_linkedin_url: Option<String>,
    pub company_description: Option<String>,
    pub company_size: Option<String>,
    pub company_website: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub posted_at: Option<String>,
    pub source: String,
    pub external_id: Option<String>,
    pub recruiter_name: Option<String>,
}

impl NormalizedLead {
    /// Score projection at ingestion time: only the job-side fields exist,
    /// with no company location, funding, or enrichment payload yet.
    pub fn score_input(&self) -> LeadScoreInput {
        LeadScoreInput {
            job_location: self.location.clone(),
            company_size: self.company_size.clone(),
            job_description: self.description.clone(),
            ..Default::default()
        }
    }
}

/// A normalized lead paired with its ingestion-time score, ready for
/// insertion.
#[derive(Debug, Clone)]
pub struct ScoredLead {
    pub lead: NormalizedLead,
    pub score: i32,
}

/// Company fields derived from an enrichment record, applied onto the
/// matched lead row. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct DerivedCompanyFields {
    pub company_size: Option<String>,
    pub company_industry: Option<String>,
    pub company_location: Option<String>,
    pub company_description: Option<String>,
    pub company_website: Option<String>,
}

// ============ Database Models ============

/// A stored lead: one job posting plus its associated company, owned by one
/// user account.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lead {
    /// Unique identifier for the lead.
    pub id: Uuid,
    /// Owning user account.
    pub user_id: Uuid,
    /// Job title; `"Job"` when the source record carried none.
    pub title: String,
    /// Company name.
    pub company_name: Option<String>,
    /// Company page URL from the source record.
    pub company_url: Option<String>,
    /// LinkedIn company URL or slug, the primary enrichment match key.
    pub company_linkedin_url: Option<String>,
    /// Company description (source or enrichment derived).
    pub company_description: Option<String>,
    /// Canonical size bucket ("1-10" … "501+").
    pub company_size: Option<String>,
    /// Company website.
    pub company_website: Option<String>,
    /// Company headquarters location, enrichment derived.
    pub company_location: Option<String>,
    /// Industry labels, enrichment derived.
    pub company_industry: Option<String>,
    /// Funding / revenue string consulted by the scorer.
    pub company_funding: Option<String>,
    /// Job location as posted.
    pub location: Option<String>,
    /// Salary text as posted.
    pub salary: Option<String>,
    /// Job description (plain text preferred, HTML fallback unsanitized;
    /// sanitization happens at render time).
    pub description: Option<String>,
    /// Job posting URL, the dedup key. Unique per user.
    pub url: String,
    /// Posting timestamp as provided by the source.
    pub posted_at: Option<String>,
    /// Integration tag of the originating provider.
    pub source: String,
    /// Provider-side posting id.
    pub external_id: Option<String>,
    /// Recruiter / poster name when the source exposed one.
    pub recruiter_name: Option<String>,
    /// Pipeline status; every imported lead starts in "backlog".
    pub status: String,
    /// Whether the user has promoted this record to an active lead.
    pub is_marked_as_lead: bool,
    /// User-assigned tags (jsonb array, empty on import).
    pub tags: Value,
    /// Qualification score in [0, 100], recomputed in place.
    pub score: i32,
    /// Free-form user notes, consulted by the remote-work signal.
    pub notes: Option<String>,
    /// Raw merged enrichment payload (jsonb).
    pub enrichment_data: Option<Value>,
    /// When enrichment was last applied.
    pub enriched_at: Option<DateTime<Utc>>,
    /// Timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Timestamp of last update.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Lead {
    /// Score projection of the stored row, used by the post-enrichment
    /// re-score and the bulk recompute.
    pub fn score_input(&self) -> LeadScoreInput {
        LeadScoreInput {
            job_location: self.location.clone(),
            company_location: self.company_location.clone(),
            company_size: self.company_size.clone(),
            company_funding: self.company_funding.clone(),
            job_description: self.description.clone(),
            notes: self.notes.clone(),
            enrichment_data: self.enrichment_data.clone(),
        }
    }
}

/// One invocation of the ingestion pipeline against the provider, tracked
/// with a status and completion outcome. Never left ambiguous: a run
/// resolves to completed or failed before the invocation returns.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SearchRun {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Provider identifier the run was requested for.
    pub provider: String,
    /// Search parameters the run executed (jsonb).
    pub params: Value,
    /// "running", "completed", or "failed".
    pub status: String,
    /// Provider or storage error message for failed runs.
    pub error: Option<String>,
    /// Records received from the provider.
    pub received: i32,
    /// Records imported as new leads.
    pub imported: i32,
    /// Records skipped as duplicates.
    pub skipped: i32,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// A saved parameter set that can be replayed by later runs.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub params: Value,
    pub created_at: DateTime<Utc>,
}

// ============ API Request/Response Models ============

/// Search parameters accepted by the ingestion entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Job titles to search for. Required, non-empty.
    pub job_titles: Vec<String>,
    /// Locations to search in.
    #[serde(default)]
    pub locations: Vec<String>,
    /// Posted-time window bucket.
    pub posted_within: Option<PostedWithin>,
    /// Result cap passed through to the actor.
    pub limit: Option<u32>,
    /// Sort key passed through to the actor.
    pub sort: Option<SortKey>,
}

/// Posted-time window, mapped to the actor's time-filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostedWithin {
    Day,
    Week,
    Month,
}

impl PostedWithin {
    pub fn actor_param(&self) -> &'static str {
        match self {
            PostedWithin::Day => "r86400",
            PostedWithin::Week => "r604800",
            PostedWithin::Month => "r2592000",
        }
    }
}

/// Result ordering passed through to the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Relevance,
    Recent,
}

impl SortKey {
    pub fn actor_param(&self) -> &'static str {
        match self {
            SortKey::Relevance => "relevance",
            SortKey::Recent => "date",
        }
    }
}

/// Request payload for POST /api/v1/searches/run.
#[derive(Debug, Deserialize)]
pub struct RunSearchRequest {
    /// Acting user, injected by the upstream gateway.
    pub user_id: Uuid,
    /// Provider identifier; must match the single supported actor.
    pub provider: String,
    /// Inline search parameters.
    pub params: Option<SearchParams>,
    /// Previously saved parameter set to replay instead.
    pub saved_search_id: Option<Uuid>,
}

/// Outcome of an ingestion run.
#[derive(Debug, Serialize)]
pub struct RunSearchResponse {
    pub success: bool,
    pub run_id: Uuid,
    pub received: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// Request payload for POST /api/v1/searches/saved.
#[derive(Debug, Deserialize)]
pub struct SaveSearchRequest {
    pub user_id: Uuid,
    pub name: String,
    pub params: SearchParams,
}

#[derive(Debug, Serialize)]
pub struct SaveSearchResponse {
    pub success: bool,
    pub id: Uuid,
}

/// Request payload for POST /api/v1/leads/enrich.
#[derive(Debug, Deserialize)]
pub struct EnrichLeadsRequest {
    pub user_id: Uuid,
    /// Specific leads to enrich; all never-enriched leads when omitted.
    pub lead_ids: Option<Vec<Uuid>>,
}

/// Outcome of an enrichment run.
#[derive(Debug, Serialize)]
pub struct EnrichLeadsResponse {
    pub success: bool,
    pub requested: usize,
    pub fetched: usize,
    pub enriched: usize,
}

/// Request payload for POST /api/v1/leads/rescore.
#[derive(Debug, Deserialize)]
pub struct RescoreRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RescoreResponse {
    pub success: bool,
    pub scanned: usize,
    pub updated: usize,
}
