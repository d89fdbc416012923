//! Fake sources and matchers shared by the coordinator and route tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::matcher::{MatchError, ResumeMatcher};
use crate::search::model::{JobPosting, MatchResult, SearchFilters};
use crate::sources::{JobSource, SourceError};

/// Returns a fixed list of postings and counts how often it was called.
pub struct FixedSource {
    postings: Vec<JobPosting>,
    pub calls: Arc<AtomicUsize>,
}

impl FixedSource {
    pub fn new(postings: Vec<JobPosting>) -> Self {
        Self {
            postings,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobSource for FixedSource {
    async fn search(
        &self,
        _keyword: &str,
        _filters: &SearchFilters,
    ) -> Result<Vec<JobPosting>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.postings.clone())
    }
}

pub struct FailingSource;

#[async_trait]
impl JobSource for FailingSource {
    async fn search(
        &self,
        _keyword: &str,
        _filters: &SearchFilters,
    ) -> Result<Vec<JobPosting>, SourceError> {
        Err(SourceError::Unavailable("connection refused".to_string()))
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledSource;

#[async_trait]
impl JobSource for StalledSource {
    async fn search(
        &self,
        _keyword: &str,
        _filters: &SearchFilters,
    ) -> Result<Vec<JobPosting>, SourceError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }
}

/// Scores a description by parsing `score=<f64>` out of it.
///
/// Descriptions containing `malformed` fail, `stall` sleeps for an hour,
/// and `panic` panics inside the task.
pub struct ScriptedMatcher;

#[async_trait]
impl ResumeMatcher for ScriptedMatcher {
    async fn match_resume(
        &self,
        description: &str,
        resume_text: &str,
    ) -> Result<MatchResult, MatchError> {
        if description.contains("malformed") {
            return Err(MatchError::MalformedInput("scripted failure".to_string()));
        }
        if description.contains("stall") {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if description.contains("panic") {
            panic!("scripted matcher panic");
        }

        let similarity_score = description
            .split_whitespace()
            .find_map(|w| w.strip_prefix("score="))
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(MatchResult {
            similarity_score,
            matched_skills: vec![format!("resume:{}", resume_text.len())],
            missing_skills: vec![],
        })
    }
}

/// Sleeps for `delay` before answering and counts the calls that finished.
pub struct SlowMatcher {
    pub delay: Duration,
    pub completed: Arc<AtomicUsize>,
}

impl SlowMatcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResumeMatcher for SlowMatcher {
    async fn match_resume(
        &self,
        _description: &str,
        _resume_text: &str,
    ) -> Result<MatchResult, MatchError> {
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(MatchResult {
            similarity_score: 0.5,
            matched_skills: vec![],
            missing_skills: vec![],
        })
    }
}

pub fn posting(title: &str, description: &str) -> JobPosting {
    JobPosting::new(title, format!("{title} Corp"), description)
}
