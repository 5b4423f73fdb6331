//! Company enrichment: matching provider company records back to stored
//! leads and re-scoring them with the merged view.
//!
//! Matching is literal: normalized LinkedIn URL first, lowercased company
//! name second. Results the provider returns beyond what was asked for are
//! dropped silently; a lead is enriched at most once per batch.

use crate::cache_validator::ValidatedCacheEntry;
use crate::db_storage::LeadStorage;
use crate::errors::AppError;
use crate::extract::{extract_first, extract_raw};
use crate::handlers::AppState;
use crate::models::{DerivedCompanyFields, Lead};
use crate::normalize::classify_company_size;
use crate::scoring::score_lead;
use crate::services::CompanyEnrichmentService;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Paths a company record may carry its own LinkedIn URL under.
const RESULT_URL_FIELDS: &[&str] = &["linkedinUrl", "linkedin_url", "url"];
/// Paths a company record may carry its name under.
const RESULT_NAME_FIELDS: &[&str] = &["name", "companyName"];

/// Canonicalizes a LinkedIn company reference for identity matching.
///
/// Lowercase, trimmed, trailing slashes stripped; anything that does not
/// parse as an absolute URL is treated as a company slug and expanded to
/// the canonical company-page form.
pub fn normalize_company_url(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let stripped = lowered.trim_end_matches('/');

    if Url::parse(stripped).is_ok() {
        stripped.to_string()
    } else {
        format!("https://www.linkedin.com/company/{}", stripped)
    }
}

/// Per-batch lookup tables from lead identity keys to lead ids.
///
/// Leads with a resolvable LinkedIn company URL are keyed by the normalized
/// URL; leads without one fall back to their lowercased company name. Built
/// fresh ahead of each provider call and discarded afterwards.
pub struct LeadLookup {
    by_url: HashMap<String, Uuid>,
    by_name: HashMap<String, Uuid>,
}

impl LeadLookup {
    pub fn build(leads: &[Lead]) -> Self {
        let mut by_url = HashMap::new();
        let mut by_name = HashMap::new();

        for lead in leads {
            match lead.company_linkedin_url.as_deref().filter(|u| !u.trim().is_empty()) {
                Some(link) => {
                    by_url.entry(normalize_company_url(link)).or_insert(lead.id);
                }
                None => {
                    if let Some(name) =
                        lead.company_name.as_deref().filter(|n| !n.trim().is_empty())
                    {
                        by_name
                            .entry(name.trim().to_lowercase())
                            .or_insert(lead.id);
                    }
                }
            }
        }

        Self { by_url, by_name }
    }

    /// URL keys of all leads in the batch, for cache probes and the
    /// provider request.
    pub fn url_keys(&self) -> impl Iterator<Item = &String> {
        self.by_url.keys()
    }

    /// Name keys of the leads that had no URL.
    pub fn name_keys(&self) -> impl Iterator<Item = &String> {
        self.by_name.keys()
    }

    /// Matches one provider company record to at most one originating lead:
    /// normalized URL first, lowercased name second.
    pub fn match_record(&self, record: &Value) -> Option<Uuid> {
        if let Some(url) = extract_first(record, RESULT_URL_FIELDS) {
            if let Some(id) = self.by_url.get(&normalize_company_url(&url)) {
                return Some(*id);
            }
        }

        let name = extract_first(record, RESULT_NAME_FIELDS)?;
        self.by_name.get(&name.trim().to_lowercase()).copied()
    }
}

/// Merges a raw enrichment record into a lead's existing enrichment
/// payload; record keys win on collision.
pub fn merge_enrichment(existing: Option<&Value>, record: &Value) -> Value {
    let mut base: Map<String, Value> = existing
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    if let Some(incoming) = record.as_object() {
        for (key, value) in incoming {
            base.insert(key.clone(), value.clone());
        }
    }

    Value::Object(base)
}

/// Derives the flattened company columns from an enrichment record.
pub fn derive_company_fields(record: &Value) -> DerivedCompanyFields {
    let company_size = extract_raw(record, &["employeeCount", "employee_count"])
        .and_then(classify_company_size)
        .map(str::to_string);

    let company_industry = record
        .get("industries")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|s| !s.is_empty());

    DerivedCompanyFields {
        company_size,
        company_industry,
        company_location: extract_first(record, &["locations.0.city", "locations.0", "headquarters"]),
        company_description: extract_first(record, &["description"]),
        company_website: extract_first(record, &["website"]),
    }
}

/// Outcome of one enrichment run.
#[derive(Debug)]
pub struct EnrichmentOutcome {
    pub requested: usize,
    pub fetched: usize,
    pub enriched: usize,
}

/// Outcome of a bulk score recompute.
#[derive(Debug)]
pub struct RescoreOutcome {
    pub scanned: usize,
    pub updated: usize,
}

/// Complete enrichment workflow for a batch of leads.
pub async fn run_enrichment_workflow(
    state: Arc<AppState>,
    user_id: Uuid,
    lead_ids: Option<Vec<Uuid>>,
) -> Result<EnrichmentOutcome, AppError> {
    let storage = LeadStorage::new(state.db.clone());

    tracing::info!("Step 1: Loading leads to enrich for user {}", user_id);
    let leads = storage
        .leads_for_enrichment(user_id, lead_ids.as_deref())
        .await?;
    let requested = leads.len();
    if leads.is_empty() {
        tracing::info!("No leads to enrich");
        return Ok(EnrichmentOutcome {
            requested: 0,
            fetched: 0,
            enriched: 0,
        });
    }

    tracing::info!("Step 2: Building lookup tables for {} lead(s)", requested);
    let lookup = LeadLookup::build(&leads);
    let leads_by_id: HashMap<Uuid, &Lead> = leads.iter().map(|l| (l.id, l)).collect();

    // Step 3: company profiles cached from earlier batches don't need a
    // provider round-trip again.
    let mut results: Vec<Value> = Vec::new();
    let mut urls_to_fetch: Vec<String> = Vec::new();
    for url in lookup.url_keys() {
        let cache_key = format!("company:{}", url);
        let cached = state.company_profile_cache.get(&cache_key).await;
        match cached.and_then(|c| ValidatedCacheEntry::deserialize_and_validate(&c)) {
            Some(payload) => match serde_json::from_str::<Value>(&payload) {
                Ok(record) => {
                    tracing::debug!("Company profile cache HIT: {}", url);
                    results.push(record);
                }
                Err(_) => urls_to_fetch.push(url.clone()),
            },
            None => urls_to_fetch.push(url.clone()),
        }
    }
    let names_to_fetch: Vec<String> = lookup.name_keys().cloned().collect();

    // Step 4: one provider run for everything not served from cache.
    if !urls_to_fetch.is_empty() || !names_to_fetch.is_empty() {
        tracing::info!(
            "Step 4: Fetching {} company URL(s) and {} name(s) from provider",
            urls_to_fetch.len(),
            names_to_fetch.len()
        );
        let service = CompanyEnrichmentService::new(&state.config);
        let fetched = service
            .fetch_company_profiles(&urls_to_fetch, &names_to_fetch)
            .await?;

        for record in &fetched {
            if let Some(url) = extract_first(record, RESULT_URL_FIELDS) {
                if let Ok(serialized) = serde_json::to_string(record) {
                    let cache_key = format!("company:{}", normalize_company_url(&url));
                    let entry = ValidatedCacheEntry::new(serialized);
                    state
                        .company_profile_cache
                        .insert(cache_key, entry.serialize())
                        .await;
                }
            }
        }

        results.extend(fetched);
    }
    let fetched_count = results.len();

    tracing::info!("Step 5: Matching {} company record(s)", fetched_count);
    let mut matched: HashSet<Uuid> = HashSet::new();
    let mut enriched = 0usize;

    for record in &results {
        let Some(lead_id) = lookup.match_record(record) else {
            // The provider returning more/different companies than requested
            // is not an error condition.
            tracing::debug!("Company record matched no lead, dropping");
            continue;
        };
        if !matched.insert(lead_id) {
            // First matching result wins; duplicates are not reapplied.
            continue;
        }

        let lead = leads_by_id[&lead_id];
        let merged = merge_enrichment(lead.enrichment_data.as_ref(), record);
        let derived = derive_company_fields(record);

        let mut input = lead.score_input();
        input.company_size = derived.company_size.clone().or(input.company_size);
        input.company_location = derived.company_location.clone().or(input.company_location);
        input.enrichment_data = Some(merged.clone());
        let score = score_lead(&input);

        storage
            .apply_enrichment(lead_id, &merged, &derived, score)
            .await?;
        tracing::info!("Lead {} enriched, new score {}", lead_id, score);
        enriched += 1;
    }

    tracing::info!(
        "Enrichment complete: {} requested, {} fetched, {} enriched",
        requested,
        fetched_count,
        enriched
    );

    Ok(EnrichmentOutcome {
        requested,
        fetched: fetched_count,
        enriched,
    })
}

/// Bulk score recompute over already-stored leads: no normalization, no
/// matching, just the scoring engine over each row's own fields.
pub async fn rescore_all_leads(
    storage: &LeadStorage,
    user_id: Uuid,
) -> Result<RescoreOutcome, AppError> {
    let leads = storage.all_leads(user_id).await?;
    let scanned = leads.len();
    let mut updated = 0usize;

    for lead in &leads {
        let score = score_lead(&lead.score_input());
        if score != lead.score {
            storage.update_score(lead.id, score).await?;
            updated += 1;
        }
    }

    tracing::info!(
        "Rescore for user {}: {} scanned, {} updated",
        user_id,
        scanned,
        updated
    );

    Ok(RescoreOutcome { scanned, updated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slugs_expand_to_canonical_company_urls() {
        assert_eq!(
            normalize_company_url("acme-corp"),
            "https://www.linkedin.com/company/acme-corp"
        );
        assert_eq!(
            normalize_company_url("https://www.linkedin.com/company/Acme-Corp/"),
            "https://www.linkedin.com/company/acme-corp"
        );
        assert_eq!(
            normalize_company_url("  HTTPS://www.linkedin.com/company/ACME//"),
            "https://www.linkedin.com/company/acme"
        );
    }

    #[test]
    fn merge_keeps_old_keys_and_overwrites_collisions() {
        let existing = json!({ "employeeCount": 10, "industries": ["Software"] });
        let incoming = json!({ "employeeCount": 25, "website": "https://acme.dev" });

        let merged = merge_enrichment(Some(&existing), &incoming);
        assert_eq!(merged["employeeCount"], 25);
        assert_eq!(merged["industries"][0], "Software");
        assert_eq!(merged["website"], "https://acme.dev");
    }

    #[test]
    fn derive_joins_industries_and_buckets_size() {
        let record = json!({
            "employeeCount": 120,
            "industries": ["Software", "Analytics"],
            "locations": [{ "city": "Austin" }],
            "description": "We make things.",
            "website": "https://acme.dev"
        });

        let derived = derive_company_fields(&record);
        assert_eq!(derived.company_size.as_deref(), Some("51-200"));
        assert_eq!(derived.company_industry.as_deref(), Some("Software, Analytics"));
        assert_eq!(derived.company_location.as_deref(), Some("Austin"));
        assert_eq!(derived.company_website.as_deref(), Some("https://acme.dev"));
    }

    #[test]
    fn empty_record_derives_nothing() {
        let derived = derive_company_fields(&json!({}));
        assert!(derived.company_size.is_none());
        assert!(derived.company_industry.is_none());
        assert!(derived.company_location.is_none());
        assert!(derived.company_description.is_none());
        assert!(derived.company_website.is_none());
    }
}
