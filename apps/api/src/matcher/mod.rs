//! Résumé matching — pluggable, trait-based scorer of a résumé against one job description.
//!
//! Default: `KeywordResumeMatcher` (pure-Rust, fast, deterministic, fully testable).
//! Optional: `LlmResumeMatcher` (semantic via Claude), selected with `MATCHER_BACKEND=llm`.

use async_trait::async_trait;
use thiserror::Error;

use crate::search::model::MatchResult;

pub mod keyword;
pub mod llm;
pub mod prompts;
pub mod skills;

pub use keyword::KeywordResumeMatcher;
pub use llm::LlmResumeMatcher;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("matcher backend error: {0}")]
    Backend(String),
}

/// The matcher trait. Implementations must be deterministic for identical
/// inputs; the coordinator treats any error as a soft, per-posting failure.
#[async_trait]
pub trait ResumeMatcher: Send + Sync {
    async fn match_resume(
        &self,
        description: &str,
        resume_text: &str,
    ) -> Result<MatchResult, MatchError>;
}

/// Rejects inputs no backend can score.
pub(crate) fn ensure_matchable(description: &str, resume_text: &str) -> Result<(), MatchError> {
    if description.trim().is_empty() {
        return Err(MatchError::MalformedInput(
            "job description is empty".to_string(),
        ));
    }
    if resume_text.trim().is_empty() {
        return Err(MatchError::MalformedInput("résumé text is empty".to_string()));
    }
    Ok(())
}
