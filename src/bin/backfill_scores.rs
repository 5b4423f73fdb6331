//! One-shot bulk score recompute across all stored leads.
//!
//! Reuses the same scoring engine as the API's ingestion and enrichment
//! paths, so a backfill never disagrees with request-time scoring.

use dotenvy::dotenv;
use leadscout_api::models::Lead;
use leadscout_api::scoring::score_lead;
use sqlx::postgres::PgPoolOptions;
use std::env;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Starting score backfill...");

    let user_ids: Vec<Uuid> = sqlx::query_scalar("SELECT DISTINCT user_id FROM leads")
        .fetch_all(&pool)
        .await?;
    tracing::info!("Found {} user(s) with stored leads.", user_ids.len());

    let mut scanned = 0usize;
    let mut updated = 0usize;

    for user_id in user_ids {
        let leads: Vec<Lead> =
            sqlx::query_as("SELECT * FROM leads WHERE user_id = $1 ORDER BY created_at ASC")
                .bind(user_id)
                .fetch_all(&pool)
                .await?;

        for lead in &leads {
            scanned += 1;
            let score = score_lead(&lead.score_input());
            if score == lead.score {
                continue;
            }

            sqlx::query("UPDATE leads SET score = $2, updated_at = now() WHERE id = $1")
                .bind(lead.id)
                .bind(score)
                .execute(&pool)
                .await?;
            updated += 1;
            tracing::debug!("Lead {}: {} -> {}", lead.id, lead.score, score);
        }
    }

    tracing::info!("Backfill complete: {} scanned, {} updated.", scanned, updated);

    Ok(())
}
