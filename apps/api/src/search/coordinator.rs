//! Search Coordinator — orchestrates one search from request to ranked result.
//!
//! Flow: validate keyword → job source (bounded by timeout) → parallel résumé
//! scoring with per-posting isolation → stable rank → `SearchResult`.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::Config;
use crate::matcher::ResumeMatcher;
use crate::search::model::{
    FailureCode, JobPosting, MatchResult, ScoreOutcome, ScoringStatus, SearchFailure,
    SearchRequest, SearchResult,
};
use crate::search::SearchError;
use crate::sources::JobSource;

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub source: Duration,
    pub matcher: Duration,
}

impl From<&Config> for Timeouts {
    fn from(config: &Config) -> Self {
        Self {
            source: config.source_timeout,
            matcher: config.matcher_timeout,
        }
    }
}

pub struct SearchCoordinator {
    source: Arc<dyn JobSource>,
    matcher: Arc<dyn ResumeMatcher>,
    timeouts: Timeouts,
}

impl SearchCoordinator {
    pub fn new(
        source: Arc<dyn JobSource>,
        matcher: Arc<dyn ResumeMatcher>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            source,
            matcher,
            timeouts,
        }
    }

    /// Runs one search. Only an invalid keyword is returned as an error; a
    /// failing source yields an empty result carrying a `SearchFailure`, and a
    /// failing matcher zeroes only the affected posting.
    pub async fn run_search(
        &self,
        request: &SearchRequest,
        resume_text: Option<&str>,
    ) -> Result<SearchResult, SearchError> {
        let keyword = request.keyword.trim();
        if keyword.is_empty() {
            return Err(SearchError::InvalidInput(
                "keyword cannot be empty".to_string(),
            ));
        }

        info!("Searching jobs for '{keyword}'");
        let postings = match timeout(
            self.timeouts.source,
            self.source.search(keyword, &request.filters),
        )
        .await
        {
            Ok(Ok(postings)) => postings,
            Ok(Err(e)) => {
                warn!("Job source failed for '{keyword}': {e}");
                return Ok(SearchResult::failed(SearchFailure {
                    code: FailureCode::SearchFailed,
                    message: format!("Error during job search: {e}"),
                }));
            }
            Err(_) => {
                warn!(
                    "Job source timed out after {}s for '{keyword}'",
                    self.timeouts.source.as_secs()
                );
                return Ok(SearchResult::failed(SearchFailure {
                    code: FailureCode::SourceTimeout,
                    message: format!(
                        "The job search did not finish within {} seconds",
                        self.timeouts.source.as_secs()
                    ),
                }));
            }
        };

        if postings.is_empty() {
            info!("No postings found for '{keyword}'");
            return Ok(SearchResult::empty());
        }

        let Some(resume) = resume_text.map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(SearchResult {
                postings,
                ranked: false,
                ..SearchResult::default()
            });
        };

        let outcomes = self.score_all(&postings, resume).await;
        let mut scoring_failures = 0;
        let mut scored = postings;
        for (posting, outcome) in scored.iter_mut().zip(outcomes) {
            if let ScoreOutcome::Failed(reason) = &outcome {
                warn!("Scoring failed for '{}' at {}: {reason}", posting.title, posting.company);
                scoring_failures += 1;
            }
            posting.apply_outcome(outcome);
        }

        let postings = rank_postings(scored);
        info!(
            "Ranked {} postings for '{keyword}' ({scoring_failures} scoring failures)",
            postings.len()
        );

        Ok(SearchResult {
            postings,
            ranked: true,
            failure: None,
            scoring_failures,
        })
    }

    /// Scores every posting in its own task. The returned outcomes are in posting order.
    ///
    /// Tasks live in a `JoinSet`, so dropping this future aborts any matcher
    /// call still in flight.
    async fn score_all(&self, postings: &[JobPosting], resume: &str) -> Vec<ScoreOutcome> {
        let resume: Arc<str> = Arc::from(resume);
        let limit = self.timeouts.matcher;

        let mut tasks = JoinSet::new();
        for (index, posting) in postings.iter().enumerate() {
            let matcher = Arc::clone(&self.matcher);
            let resume = Arc::clone(&resume);
            let description = posting.description.clone();

            tasks.spawn(async move {
                let outcome = match timeout(limit, matcher.match_resume(&description, &resume)).await
                {
                    Ok(Ok(result)) => validate_match(result),
                    Ok(Err(e)) => ScoreOutcome::Failed(e.to_string()),
                    Err(_) => ScoreOutcome::Failed(format!(
                        "matcher timed out after {}s",
                        limit.as_secs()
                    )),
                };
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<ScoreOutcome>> = vec![None; postings.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!("Matcher task failed: {e}"),
            }
        }

        // A task that panicked never filled its slot.
        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| ScoreOutcome::Failed("matcher task failed".to_string()))
            })
            .collect()
    }
}

/// Non-finite scores are failures; finite ones are clamped to [0, 1] with `-0.0`
/// folded into `0.0`.
fn validate_match(mut result: MatchResult) -> ScoreOutcome {
    if !result.similarity_score.is_finite() {
        return ScoreOutcome::Failed(format!(
            "matcher returned a non-finite score ({})",
            result.similarity_score
        ));
    }
    result.similarity_score = result.similarity_score.clamp(0.0, 1.0) + 0.0;
    ScoreOutcome::Scored(result)
}

/// Sorts by similarity score descending; equal scores keep their source order.
pub fn rank_postings(postings: Vec<JobPosting>) -> Vec<JobPosting> {
    let mut indexed: Vec<(usize, JobPosting)> = postings.into_iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| compare_ranked(*ia, a, *ib, b));
    indexed.into_iter().map(|(_, p)| p).collect()
}

fn compare_ranked(ia: usize, a: &JobPosting, ib: usize, b: &JobPosting) -> Ordering {
    b.similarity_score
        .total_cmp(&a.similarity_score)
        .then_with(|| ia.cmp(&ib))
}

/// Counts postings whose score came from a successful matcher call.
pub fn scored_count(result: &SearchResult) -> usize {
    result
        .postings
        .iter()
        .filter(|p| p.scoring == ScoringStatus::Scored)
        .count()
}
