use crate::config::Config;
use crate::errors::AppError;
use crate::models::SearchParams;
use crate::provider_models::{ApiResponse, ProviderRun, RunState};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Low-level client for the actor platform's run API.
///
/// One run is submitted, polled on a fixed interval until it reaches a
/// terminal state, and its dataset fetched. Polling is the only suspension
/// point in a pipeline run and gives up after a bounded number of attempts.
pub struct ActorPlatformClient {
    client: Client,
    base_url: String,
    token: String,
    poll_interval: Duration,
    poll_max_attempts: u32,
}

impl ActorPlatformClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.scraper_base_url.trim_end_matches('/').to_string(),
            token: config.scraper_api_token.clone(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            poll_max_attempts: config.poll_max_attempts,
        }
    }

    /// Starts an actor run. Returns immediately with run metadata.
    pub async fn submit_run(&self, actor_id: &str, input: &Value) -> Result<ProviderRun, AppError> {
        let url = format!("{}/v2/acts/{}/runs", self.base_url, actor_id);
        tracing::info!("Submitting actor run: {}", actor_id);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Actor run submission failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Provider(format!(
                "Actor platform returned {}: {}",
                status, error_text
            )));
        }

        let body: ApiResponse<ProviderRun> = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse actor run response: {}", e))
        })?;

        Ok(body.data)
    }

    /// Fetches the current state of a run.
    pub async fn poll_run(&self, run_id: &str) -> Result<ProviderRun, AppError> {
        let url = format!("{}/v2/actor-runs/{}", self.base_url, run_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Actor run poll failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Provider(format!(
                "Actor platform returned {}: {}",
                status, error_text
            )));
        }

        let body: ApiResponse<ProviderRun> = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse actor run response: {}", e))
        })?;

        Ok(body.data)
    }

    /// Fetches all dataset items of a completed run as raw records.
    pub async fn fetch_dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>, AppError> {
        let url = format!(
            "{}/v2/datasets/{}/items?format=json",
            self.base_url, dataset_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Dataset fetch failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Provider(format!(
                "Actor platform returned {}: {}",
                status, error_text
            )));
        }

        let items: Vec<Value> = response.json().await.map_err(|e| {
            AppError::Provider(format!("Failed to parse dataset items: {}", e))
        })?;

        Ok(items)
    }

    /// Submits a run, polls it to completion, and returns its dataset.
    ///
    /// The poll loop sleeps a fixed interval between attempts and surfaces a
    /// timeout-shaped failure once the attempt ceiling is reached rather
    /// than blocking indefinitely.
    pub async fn run_to_completion(
        &self,
        actor_id: &str,
        input: &Value,
    ) -> Result<Vec<Value>, AppError> {
        let mut run = self.submit_run(actor_id, input).await?;
        tracing::info!("Actor run {} submitted, status: {}", run.id, run.status);

        let mut attempts: u32 = 0;
        loop {
            match run.state() {
                RunState::Succeeded => break,
                RunState::Failed => {
                    return Err(AppError::Provider(format!(
                        "Actor run {} ended with status {}",
                        run.id, run.status
                    )));
                }
                RunState::InProgress => {
                    attempts += 1;
                    if attempts > self.poll_max_attempts {
                        return Err(AppError::PollTimeout(format!(
                            "Actor run {} still {} after {} poll attempts",
                            run.id, run.status, self.poll_max_attempts
                        )));
                    }
                    tokio::time::sleep(self.poll_interval).await;
                    run = self.poll_run(&run.id).await?;
                }
            }
        }

        let dataset_id = run.default_dataset_id.ok_or_else(|| {
            AppError::Provider(format!("Succeeded run {} carries no dataset id", run.id))
        })?;

        let items = self.fetch_dataset_items(&dataset_id).await?;
        tracing::info!("Actor run {} delivered {} records", run.id, items.len());
        Ok(items)
    }
}

/// Job-search actor integration: maps search parameters onto the actor's
/// input schema and runs it to completion.
pub struct JobSearchService {
    platform: ActorPlatformClient,
    actor_id: String,
}

impl JobSearchService {
    pub fn new(config: &Config) -> Self {
        Self {
            platform: ActorPlatformClient::new(config),
            actor_id: config.jobs_actor_id.clone(),
        }
    }

    /// Builds the actor input payload from validated search parameters.
    pub fn actor_input(params: &SearchParams) -> Value {
        let mut input = json!({
            "jobTitles": params.job_titles,
            "locations": params.locations,
        });
        if let Some(window) = params.posted_within {
            input["postedWithin"] = json!(window.actor_param());
        }
        if let Some(limit) = params.limit {
            input["maxResults"] = json!(limit);
        }
        if let Some(sort) = params.sort {
            input["sortBy"] = json!(sort.actor_param());
        }
        input
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Value>, AppError> {
        let input = Self::actor_input(params);
        self.platform.run_to_completion(&self.actor_id, &input).await
    }
}

/// Company-enrichment actor integration: same run contract, input is a list
/// of company URLs/names rather than job-search parameters.
pub struct CompanyEnrichmentService {
    platform: ActorPlatformClient,
    actor_id: String,
}

impl CompanyEnrichmentService {
    pub fn new(config: &Config) -> Self {
        Self {
            platform: ActorPlatformClient::new(config),
            actor_id: config.company_actor_id.clone(),
        }
    }

    pub async fn fetch_company_profiles(
        &self,
        company_urls: &[String],
        company_names: &[String],
    ) -> Result<Vec<Value>, AppError> {
        let input = json!({
            "companyUrls": company_urls,
            "companyNames": company_names,
        });
        self.platform.run_to_completion(&self.actor_id, &input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostedWithin, SortKey};

    #[test]
    fn actor_input_carries_only_present_params() {
        let params = SearchParams {
            job_titles: vec!["Platform Engineer".to_string()],
            locations: vec![],
            posted_within: None,
            limit: None,
            sort: None,
        };
        let input = JobSearchService::actor_input(&params);
        assert_eq!(input["jobTitles"][0], "Platform Engineer");
        assert!(input.get("postedWithin").is_none());
        assert!(input.get("maxResults").is_none());
    }

    #[test]
    fn posted_window_maps_to_actor_buckets() {
        let params = SearchParams {
            job_titles: vec!["SRE".to_string()],
            locations: vec!["United States".to_string()],
            posted_within: Some(PostedWithin::Week),
            limit: Some(50),
            sort: Some(SortKey::Recent),
        };
        let input = JobSearchService::actor_input(&params);
        assert_eq!(input["postedWithin"], "r604800");
        assert_eq!(input["maxResults"], 50);
        assert_eq!(input["sortBy"], "date");
    }
}
