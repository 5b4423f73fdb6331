use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub scraper_base_url: String,
    pub scraper_api_token: String,
    pub jobs_actor_id: String,
    pub company_actor_id: String,
    pub poll_interval_secs: u64,
    pub poll_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            scraper_base_url: std::env::var("SCRAPER_BASE_URL")
                .unwrap_or_else(|_| "https://api.apify.com".to_string()),
            scraper_api_token: std::env::var("SCRAPER_API_TOKEN")
                .map_err(|_| anyhow::anyhow!("SCRAPER_API_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("SCRAPER_API_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            jobs_actor_id: std::env::var("JOBS_ACTOR_ID")
                .map_err(|_| anyhow::anyhow!("JOBS_ACTOR_ID environment variable required"))
                .and_then(|id| {
                    if id.trim().is_empty() {
                        anyhow::bail!("JOBS_ACTOR_ID cannot be empty");
                    }
                    Ok(id)
                })?,
            company_actor_id: std::env::var("COMPANY_ACTOR_ID")
                .map_err(|_| anyhow::anyhow!("COMPANY_ACTOR_ID environment variable required"))
                .and_then(|id| {
                    if id.trim().is_empty() {
                        anyhow::bail!("COMPANY_ACTOR_ID cannot be empty");
                    }
                    Ok(id)
                })?,
            poll_interval_secs: std::env::var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("POLL_INTERVAL_SECS must be a positive number"))?,
            poll_max_attempts: std::env::var("POLL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("POLL_MAX_ATTEMPTS must be a positive number"))?,
        };

        if !config.scraper_base_url.starts_with("http://")
            && !config.scraper_base_url.starts_with("https://")
        {
            anyhow::bail!("SCRAPER_BASE_URL must start with http:// or https://");
        }
        if config.poll_max_attempts == 0 {
            anyhow::bail!("POLL_MAX_ATTEMPTS must be at least 1");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Scraper base URL: {}", config.scraper_base_url);
        tracing::debug!(
            "Actors: jobs={}, company={}",
            config.jobs_actor_id,
            config.company_actor_id
        );
        tracing::debug!(
            "Poll: every {}s, max {} attempts",
            config.poll_interval_secs,
            config.poll_max_attempts
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
