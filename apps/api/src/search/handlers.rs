//! Axum route handlers for the Search API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::resume::extract::ResumeFile;
use crate::resume::handlers::{extract_on_blocking_pool, read_file_field};
use crate::search::coordinator::scored_count;
use crate::search::model::{
    ExperienceLevel, JobPosting, JobType, MatchBand, SearchFailure, SearchRequest, SearchResult,
    TableRow,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchPayload {
    #[serde(flatten)]
    pub request: SearchRequest,
    #[serde(default)]
    pub resume_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostingView {
    #[serde(flatten)]
    pub posting: JobPosting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_band: Option<MatchBand>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub search_id: Uuid,
    pub searched_at: DateTime<Utc>,
    pub keyword: String,
    pub ranked: bool,
    pub total: usize,
    pub postings: Vec<PostingView>,
    pub table: Vec<TableRow>,
    pub failure: Option<SearchFailure>,
    pub resume_warning: Option<String>,
    pub scoring_failures: usize,
}

impl SearchResponse {
    fn new(keyword: &str, result: SearchResult, resume_warning: Option<String>) -> Self {
        let table = result.table_rows();
        let ranked = result.ranked;
        let postings = result
            .postings
            .into_iter()
            .map(|posting| PostingView {
                match_band: ranked.then(|| posting.match_band()),
                posting,
            })
            .collect::<Vec<_>>();

        Self {
            search_id: Uuid::new_v4(),
            searched_at: Utc::now(),
            keyword: keyword.trim().to_string(),
            ranked,
            total: postings.len(),
            postings,
            table,
            failure: result.failure,
            resume_warning,
            scoring_failures: result.scoring_failures,
        }
    }
}

/// Search fields collected from a multipart form.
#[derive(Debug, Default)]
struct SearchForm {
    request: SearchRequest,
    resume_text: Option<String>,
    resume_file: Option<ResumeFile>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/search
///
/// Runs a search with optional pasted résumé text and returns ranked results.
pub async fn handle_search(
    State(state): State<AppState>,
    Json(payload): Json<SearchPayload>,
) -> Result<Json<SearchResponse>, AppError> {
    run(&state, payload.request, payload.resume_text, None).await
}

/// POST /api/v1/search/upload
///
/// Multipart variant: the résumé may be uploaded as `resume_file`, which takes
/// precedence over `resume_text`. A file that cannot be read does not fail the
/// search; it runs unranked and the response carries `resume_warning`.
pub async fn handle_search_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SearchResponse>, AppError> {
    let form = read_search_form(&mut multipart).await?;

    let mut resume_warning = None;
    let resume_text = match form.resume_file {
        Some(file) => match extract_on_blocking_pool(file).await? {
            Ok((_, text)) => Some(text),
            Err(e) => {
                warn!("Résumé extraction failed, continuing without it: {e}");
                resume_warning = Some(format!("Error processing file: {e}"));
                None
            }
        },
        None => form.resume_text,
    };

    run(&state, form.request, resume_text, resume_warning).await
}

async fn run(
    state: &AppState,
    request: SearchRequest,
    resume_text: Option<String>,
    resume_warning: Option<String>,
) -> Result<Json<SearchResponse>, AppError> {
    let result = state
        .coordinator
        .run_search(&request, resume_text.as_deref())
        .await?;

    info!(
        "Search '{}' returned {} postings ({} scored)",
        request.keyword.trim(),
        result.len(),
        scored_count(&result)
    );

    Ok(Json(SearchResponse::new(
        &request.keyword,
        result,
        resume_warning,
    )))
}

async fn read_search_form(multipart: &mut Multipart) -> Result<SearchForm, AppError> {
    let mut form = SearchForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "keyword" => form.request.keyword = field.text().await?,
            "location" => {
                let location = field.text().await?;
                form.request.filters.location =
                    (!location.trim().is_empty()).then(|| location.trim().to_string());
            }
            "experience_level" | "experience_levels" => {
                let level = field
                    .text()
                    .await?
                    .parse::<ExperienceLevel>()
                    .map_err(AppError::Validation)?;
                form.request.filters.experience_levels.insert(level);
            }
            "job_type" | "job_types" => {
                let job_type = field
                    .text()
                    .await?
                    .parse::<JobType>()
                    .map_err(AppError::Validation)?;
                form.request.filters.job_types.insert(job_type);
            }
            "results_limit" => {
                let raw = field.text().await?;
                if !raw.trim().is_empty() {
                    let limit = raw.trim().parse::<u32>().map_err(|_| {
                        AppError::Validation(format!("results_limit must be a number, got '{raw}'"))
                    })?;
                    form.request.filters.results_limit = Some(limit);
                }
            }
            "resume_text" => form.resume_text = Some(field.text().await?),
            "resume_file" => {
                let file = read_file_field(field).await?;
                // Browsers send an empty part when no file was chosen.
                if !file.bytes.is_empty() {
                    form.resume_file = Some(file);
                }
            }
            other => debug!("Ignoring unknown multipart field '{other}'"),
        }
    }

    Ok(form)
}
