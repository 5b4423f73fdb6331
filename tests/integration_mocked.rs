/// Integration tests with a mocked actor platform.
/// Exercises the submit/poll/fetch provider contract without hitting real
/// external services.
use leadscout_api::config::Config;
use leadscout_api::errors::AppError;
use leadscout_api::services::{CompanyEnrichmentService, JobSearchService};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create a test config pointing at the mock server.
fn create_test_config(scraper_base_url: String) -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        port: 8080,
        scraper_base_url,
        scraper_api_token: "test_token".to_string(),
        jobs_actor_id: "actor-jobs".to_string(),
        company_actor_id: "actor-companies".to_string(),
        poll_interval_secs: 0,
        poll_max_attempts: 3,
    }
}

fn search_params() -> leadscout_api::models::SearchParams {
    leadscout_api::models::SearchParams {
        job_titles: vec!["Platform Engineer".to_string()],
        locations: vec!["United States".to_string()],
        posted_within: None,
        limit: Some(10),
        sort: None,
    }
}

#[tokio::test]
async fn test_search_run_succeeds_without_polling() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/acts/actor-jobs/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "run-1", "status": "SUCCEEDED", "defaultDatasetId": "ds-1" }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/datasets/ds-1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "title": "Platform Engineer", "url": "https://www.linkedin.com/jobs/view/1/" },
            { "title": "SRE", "url": "https://www.linkedin.com/jobs/view/2/" }
        ])))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = JobSearchService::new(&config);

    let records = service.search(&search_params()).await.expect("records");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["title"], "Platform Engineer");
}

#[tokio::test]
async fn test_search_run_polls_until_succeeded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/acts/actor-jobs/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "run-2", "status": "READY" }
        })))
        .mount(&mock_server)
        .await;

    // First poll still running, then terminal success.
    Mock::given(method("GET"))
        .and(path("/v2/actor-runs/run-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "run-2", "status": "RUNNING" }
        })))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/actor-runs/run-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "run-2", "status": "SUCCEEDED", "defaultDatasetId": "ds-2" }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/datasets/ds-2/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "title": "Backend Engineer", "id": 99 }
        ])))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = JobSearchService::new(&config);

    let records = service.search(&search_params()).await.expect("records");
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_failed_run_status_is_a_provider_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/acts/actor-jobs/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "run-3", "status": "FAILED" }
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = JobSearchService::new(&config);

    let result = service.search(&search_params()).await;
    assert!(matches!(result, Err(AppError::Provider(_))));
}

#[tokio::test]
async fn test_unrecognized_run_status_is_a_provider_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/acts/actor-jobs/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "run-4", "status": "SOMETHING-NEW" }
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = JobSearchService::new(&config);

    let result = service.search(&search_params()).await;
    assert!(matches!(result, Err(AppError::Provider(_))));
}

#[tokio::test]
async fn test_poll_ceiling_surfaces_a_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/acts/actor-jobs/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "run-5", "status": "READY" }
        })))
        .mount(&mock_server)
        .await;

    // The run never progresses past RUNNING.
    Mock::given(method("GET"))
        .and(path("/v2/actor-runs/run-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "id": "run-5", "status": "RUNNING" }
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = JobSearchService::new(&config);

    let result = service.search(&search_params()).await;
    assert!(matches!(result, Err(AppError::PollTimeout(_))));
}

#[tokio::test]
async fn test_non_2xx_submission_is_a_provider_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/acts/actor-jobs/runs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = JobSearchService::new(&config);

    let result = service.search(&search_params()).await;
    assert!(matches!(result, Err(AppError::Provider(_))));
}

#[tokio::test]
async fn test_company_enrichment_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/acts/actor-companies/runs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "run-6", "status": "SUCCEEDED", "defaultDatasetId": "ds-6" }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/datasets/ds-6/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "Acme Corp",
                "linkedinUrl": "https://www.linkedin.com/company/acme-corp",
                "employeeCount": 42,
                "industries": ["Software"]
            }
        ])))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let service = CompanyEnrichmentService::new(&config);

    let profiles = service
        .fetch_company_profiles(
            &["https://www.linkedin.com/company/acme-corp".to_string()],
            &[],
        )
        .await
        .expect("profiles");

    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0]["employeeCount"], 42);
}

#[tokio::test]
async fn test_concurrent_provider_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "run-7", "status": "SUCCEEDED", "defaultDatasetId": "ds-7" }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());

    let mut handles = vec![];
    for _ in 0..10 {
        let config_clone = config.clone();
        handles.push(tokio::spawn(async move {
            let service = JobSearchService::new(&config_clone);
            service.search(&search_params()).await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.is_ok());
    }
}
