use crate::errors::AppError;
use crate::models::{DerivedCompanyFields, Lead, SavedSearch, ScoredLead, SearchRun};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

/// Database storage service for leads, runs, and saved searches.
///
/// Uses sequential queries instead of complex CTEs for better sqlx
/// compatibility.
pub struct LeadStorage {
    pool: PgPool,
}

impl LeadStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---- Run metadata ----

    /// Creates a run row in the "running" state and returns its id.
    pub async fn insert_run(
        &self,
        user_id: Uuid,
        provider: &str,
        params: &Value,
    ) -> Result<Uuid, AppError> {
        let run_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO search_runs (id, user_id, provider, params, status, received, imported, skipped)
            VALUES ($1, $2, $3, $4, 'running', 0, 0, 0)
            "#,
        )
        .bind(run_id)
        .bind(user_id)
        .bind(provider)
        .bind(params)
        .execute(&self.pool)
        .await?;

        Ok(run_id)
    }

    /// Resolves a run to "completed" with its outcome counts.
    pub async fn mark_run_completed(
        &self,
        run_id: Uuid,
        received: usize,
        imported: usize,
        skipped: usize,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE search_runs
            SET status = 'completed', received = $2, imported = $3, skipped = $4,
                finished_at = now()
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .bind(received as i32)
        .bind(imported as i32)
        .bind(skipped as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Resolves a run to "failed" with the underlying error message. A run
    /// never stays "running" after its invocation returns.
    pub async fn mark_run_failed(&self, run_id: Uuid, error: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE search_runs
            SET status = 'failed', error = $2, finished_at = now()
            WHERE id = $1
            "#,
        )
        .bind(run_id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_run(&self, run_id: Uuid) -> Result<SearchRun, AppError> {
        sqlx::query_as::<_, SearchRun>("SELECT * FROM search_runs WHERE id = $1")
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Run {} not found", run_id)))
    }

    // ---- Saved searches ----

    pub async fn insert_saved_search(
        &self,
        user_id: Uuid,
        name: &str,
        params: &Value,
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO saved_searches (id, user_id, name, params)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .bind(params)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn get_saved_search(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<SavedSearch, AppError> {
        sqlx::query_as::<_, SavedSearch>(
            "SELECT * FROM saved_searches WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Saved search {} not found", id)))
    }

    // ---- Leads ----

    /// All lead URLs already stored for the user. Read fresh per pipeline
    /// run so the dedup index reflects prior commits from the same user.
    pub async fn existing_urls(&self, user_id: Uuid) -> Result<HashSet<String>, AppError> {
        let urls: Vec<String> =
            sqlx::query_scalar("SELECT url FROM leads WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(urls.into_iter().collect())
    }

    /// Bulk-inserts scored leads. Returns the number of rows actually
    /// written.
    ///
    /// `ON CONFLICT DO NOTHING` on the per-user URL key makes a racing
    /// duplicate insert a benign no-op instead of a run failure; any other
    /// database error aborts the remaining pipeline for this run.
    pub async fn insert_leads(
        &self,
        user_id: Uuid,
        scored: &[ScoredLead],
    ) -> Result<u64, AppError> {
        let mut inserted: u64 = 0;

        for entry in scored {
            let lead = &entry.lead;
            let result = sqlx::query(
                r#"
                INSERT INTO leads (
                    id, user_id, title, company_name, company_url,
                    company_linkedin_url, company_description, company_size,
                    company_website, location, salary, description, url,
                    posted_at, source, external_id, recruiter_name,
                    status, is_marked_as_lead, tags, score
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                        $13, $14, $15, $16, $17, 'backlog', false, $18, $19)
                ON CONFLICT (user_id, url) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&lead.title)
            .bind(&lead.company)
            .bind(&lead.company_url)
            .bind(&lead.company_linkedin_url)
            .bind(&lead.company_description)
            .bind(&lead.company_size)
            .bind(&lead.company_website)
            .bind(&lead.location)
            .bind(&lead.salary)
            .bind(&lead.description)
            .bind(&lead.url)
            .bind(&lead.posted_at)
            .bind(&lead.source)
            .bind(&lead.external_id)
            .bind(&lead.recruiter_name)
            .bind(json!([]))
            .bind(entry.score)
            .execute(&self.pool)
            .await?;

            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    /// Leads targeted by an enrichment run: an explicit id list, or every
    /// never-enriched lead for the user when none is given.
    pub async fn leads_for_enrichment(
        &self,
        user_id: Uuid,
        lead_ids: Option<&[Uuid]>,
    ) -> Result<Vec<Lead>, AppError> {
        let leads = match lead_ids {
            Some(ids) => {
                sqlx::query_as::<_, Lead>(
                    "SELECT * FROM leads WHERE user_id = $1 AND id = ANY($2) ORDER BY created_at ASC",
                )
                .bind(user_id)
                .bind(ids)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Lead>(
                    "SELECT * FROM leads WHERE user_id = $1 AND enriched_at IS NULL ORDER BY created_at ASC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(leads)
    }

    /// Every stored lead for the user, for the bulk score recompute.
    pub async fn all_leads(&self, user_id: Uuid) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>(
            "SELECT * FROM leads WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(leads)
    }

    /// Applies a matched enrichment record onto a lead: merged raw payload,
    /// derived company fields (existing values kept where derivation came up
    /// empty), the re-computed score, and the enrichment timestamp.
    pub async fn apply_enrichment(
        &self,
        lead_id: Uuid,
        enrichment_data: &Value,
        derived: &DerivedCompanyFields,
        score: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE leads
            SET enrichment_data = $2,
                company_size = COALESCE($3, company_size),
                company_industry = COALESCE($4, company_industry),
                company_location = COALESCE($5, company_location),
                company_description = COALESCE($6, company_description),
                company_website = COALESCE($7, company_website),
                score = $8,
                enriched_at = now(),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(lead_id)
        .bind(enrichment_data)
        .bind(&derived.company_size)
        .bind(&derived.company_industry)
        .bind(&derived.company_location)
        .bind(&derived.company_description)
        .bind(&derived.company_website)
        .bind(score)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes a recomputed score. Used by the bulk recompute flow.
    pub async fn update_score(&self, lead_id: Uuid, score: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE leads SET score = $2, updated_at = now() WHERE id = $1")
            .bind(lead_id)
            .bind(score)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
