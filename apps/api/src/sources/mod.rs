//! Job sources — pluggable, trait-based providers of postings for a keyword.
//!
//! Default: `LinkedInJobSource` (scrapes the public guest job-search pages).
//! `AppState` holds the coordinator, which holds an `Arc<dyn JobSource>`.

use async_trait::async_trait;
use thiserror::Error;

use crate::search::model::{JobPosting, SearchFilters};

pub mod linkedin;

pub use linkedin::LinkedInJobSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("job source unavailable: {0}")]
    Unavailable(String),

    #[error("job source returned HTTP {status}")]
    Status { status: u16 },

    #[error("job source blocked the request (HTTP {status})")]
    Blocked { status: u16 },
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Unavailable(e.to_string())
    }
}

/// A provider of job postings. Implementations make no promise about ordering,
/// completeness or latency; the coordinator bounds every call with a timeout.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn search(
        &self,
        keyword: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<JobPosting>, SourceError>;
}
