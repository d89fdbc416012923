use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which `ResumeMatcher` backend the service wires in at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherBackend {
    Keyword,
    Llm,
}

/// Application configuration loaded from environment variables.
/// Every value has a default except `ANTHROPIC_API_KEY`, which is only
/// required when `MATCHER_BACKEND=llm`.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub job_source_base_url: String,
    pub source_timeout: Duration,
    pub matcher_timeout: Duration,
    pub default_results_limit: u32,
    pub max_results_limit: u32,
    pub description_concurrency: usize,
    pub max_upload_bytes: usize,
    pub matcher_backend: MatcherBackend,
    pub anthropic_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests never touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let matcher_backend = match lookup("MATCHER_BACKEND")
            .unwrap_or_else(|| "keyword".to_string())
            .to_lowercase()
            .as_str()
        {
            "keyword" => MatcherBackend::Keyword,
            "llm" => MatcherBackend::Llm,
            other => bail!("MATCHER_BACKEND must be 'keyword' or 'llm', got '{other}'"),
        };

        let anthropic_api_key = lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty());
        if matcher_backend == MatcherBackend::Llm && anthropic_api_key.is_none() {
            bail!("ANTHROPIC_API_KEY is required when MATCHER_BACKEND=llm");
        }

        let default_results_limit: u32 = parse_or(&lookup, "DEFAULT_RESULTS_LIMIT", 10)?;
        let max_results_limit: u32 = parse_or(&lookup, "MAX_RESULTS_LIMIT", 30)?;
        if default_results_limit == 0 || default_results_limit > max_results_limit {
            bail!(
                "DEFAULT_RESULTS_LIMIT must be between 1 and MAX_RESULTS_LIMIT ({max_results_limit})"
            );
        }

        let source_timeout_secs: u64 = parse_or(&lookup, "SOURCE_TIMEOUT_SECS", 60)?;
        let matcher_timeout_secs: u64 = parse_or(&lookup, "MATCHER_TIMEOUT_SECS", 30)?;
        if source_timeout_secs == 0 || matcher_timeout_secs == 0 {
            bail!("SOURCE_TIMEOUT_SECS and MATCHER_TIMEOUT_SECS must be at least 1");
        }

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            job_source_base_url: lookup("JOB_SOURCE_BASE_URL")
                .unwrap_or_else(|| "https://www.linkedin.com".to_string())
                .trim_end_matches('/')
                .to_string(),
            source_timeout: Duration::from_secs(source_timeout_secs),
            matcher_timeout: Duration::from_secs(matcher_timeout_secs),
            default_results_limit,
            max_results_limit,
            description_concurrency: parse_or::<usize, _>(&lookup, "DESCRIPTION_CONCURRENCY", 4)?
                .max(1),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            matcher_backend,
            anthropic_api_key,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
