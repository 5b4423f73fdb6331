use std::env;
use uuid::Uuid;

use leadscout_api::db::Database;
use leadscout_api::db_storage::LeadStorage;
use leadscout_api::models::{NormalizedLead, ScoredLead};

/// Integration smoke test for the lead/run storage layer.
/// Marked ignored to avoid running against production by accident; set
/// TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn ingest_and_readback_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    let storage = LeadStorage::new(db.pool.clone());

    // Unique user per run to avoid conflicts on repeated executions.
    let user_id = Uuid::new_v4();

    let run_id = storage
        .insert_run(user_id, "linkedin-jobs", &serde_json::json!({ "job_titles": ["SRE"] }))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let lead = NormalizedLead {
        title: "SRE".to_string(),
        url: format!("https://www.linkedin.com/jobs/view/{}/", Uuid::new_v4()),
        source: "linkedin".to_string(),
        ..Default::default()
    };

    let inserted = storage
        .insert_leads(user_id, &[ScoredLead { lead: lead.clone(), score: 0 }])
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(inserted, 1);

    // Read-your-writes: the URL set must reflect the commit we just made.
    let urls = storage
        .existing_urls(user_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert!(urls.contains(&lead.url));

    // Re-inserting the same URL is a benign no-op, not an error.
    let reinserted = storage
        .insert_leads(user_id, &[ScoredLead { lead: lead.clone(), score: 0 }])
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(reinserted, 0);

    storage
        .mark_run_completed(run_id, 1, 1, 0)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let run = storage
        .get_run(run_id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(run.status, "completed");
    assert_eq!(run.imported, 1);

    Ok(())
}
