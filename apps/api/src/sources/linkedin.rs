//! LinkedIn guest job search — scrapes the public, logged-out search endpoints.
//!
//! Flow: page through search cards → dedup by job id → fetch every description
//! concurrently (bounded by a semaphore) → assemble `JobPosting`s in card order.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::search::model::{ExperienceLevel, JobPosting, JobType, SearchFilters};
use crate::sources::{JobSource, SourceError};

const SEARCH_PATH: &str = "/jobs-guest/jobs/api/seeMoreJobPostings/search";
const POSTING_PATH: &str = "/jobs-guest/jobs/api/jobPosting";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
/// The guest endpoint serves ten cards per page.
const PAGE_SIZE: usize = 10;
const MAX_PAGES: usize = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One card from the search page, before its description is fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCard {
    pub job_id: Option<String>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub date_posted: String,
    pub url: Option<String>,
}

pub struct LinkedInJobSource {
    client: Client,
    base_url: String,
    default_limit: u32,
    max_limit: u32,
    description_concurrency: usize,
}

impl LinkedInJobSource {
    pub fn new(
        base_url: impl Into<String>,
        default_limit: u32,
        max_limit: u32,
        description_concurrency: usize,
    ) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            default_limit: default_limit.max(1),
            max_limit: max_limit.max(1),
            description_concurrency: description_concurrency.max(1),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        Self::new(
            config.job_source_base_url.clone(),
            config.default_results_limit,
            config.max_results_limit,
            config.description_concurrency,
        )
    }

    fn effective_limit(&self, requested: Option<u32>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit) as usize
    }

    async fn fetch_cards(
        &self,
        keyword: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<JobCard>, SourceError> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        let mut cards = Vec::new();
        let mut seen = HashSet::new();

        for page in 0..MAX_PAGES {
            let params = search_query(keyword, filters, page * PAGE_SIZE);
            debug!("Fetching search page {page} from {url}");

            let response = match self.client.get(&url).query(&params).send().await {
                Ok(r) => r,
                Err(e) if page == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Search page {page} failed, keeping earlier pages: {e}");
                    break;
                }
            };

            let status = response.status().as_u16();
            if status == 429 || status == 999 {
                if page == 0 {
                    return Err(SourceError::Blocked { status });
                }
                warn!("Blocked on search page {page} (HTTP {status})");
                break;
            }
            if !response.status().is_success() {
                if page == 0 {
                    return Err(SourceError::Status { status });
                }
                warn!("Search page {page} returned HTTP {status}");
                break;
            }

            let html = response.text().await?;
            let page_cards = parse_job_cards(&html);
            if page_cards.is_empty() {
                break;
            }

            for card in page_cards {
                let key = card
                    .job_id
                    .clone()
                    .unwrap_or_else(|| format!("{}|{}", card.title, card.company));
                if seen.insert(key) {
                    cards.push(card);
                }
            }

            if cards.len() >= limit {
                break;
            }
        }

        cards.truncate(limit);
        Ok(cards)
    }

    /// Fetches descriptions in card order. A failed fetch yields an empty description.
    /// Dropping the returned future aborts the fetches still in flight.
    async fn fetch_descriptions(&self, cards: &[JobCard]) -> Vec<String> {
        let permits = Arc::new(Semaphore::new(self.description_concurrency));
        let mut tasks = JoinSet::new();

        for (index, card) in cards.iter().enumerate() {
            let client = self.client.clone();
            let permits = Arc::clone(&permits);
            let url = card
                .job_id
                .as_ref()
                .map(|id| format!("{}{}/{}", self.base_url, POSTING_PATH, id))
                .or_else(|| card.url.clone());

            tasks.spawn(async move {
                let Some(url) = url else {
                    return (index, String::new());
                };
                let Ok(_permit) = permits.acquire_owned().await else {
                    return (index, String::new());
                };
                let text = match fetch_description(&client, &url).await {
                    Ok(Some(text)) => text,
                    Ok(None) => {
                        warn!("No description markup found at {url}");
                        String::new()
                    }
                    Err(e) => {
                        warn!("Description fetch failed for {url}: {e}");
                        String::new()
                    }
                };
                (index, text)
            });
        }

        let mut descriptions = vec![String::new(); cards.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, text)) => descriptions[index] = text,
                Err(e) => warn!("Description task failed: {e}"),
            }
        }
        descriptions
    }
}

#[async_trait]
impl JobSource for LinkedInJobSource {
    async fn search(
        &self,
        keyword: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<JobPosting>, SourceError> {
        let limit = self.effective_limit(filters.results_limit);
        debug!(
            "Filters for '{keyword}': experience [{}], job types [{}], limit {limit}",
            filters
                .experience_levels
                .iter()
                .map(|l| l.label())
                .collect::<Vec<_>>()
                .join(", "),
            filters
                .job_types
                .iter()
                .map(|t| t.label())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let cards = self.fetch_cards(keyword, filters, limit).await?;
        info!("Found {} job cards for '{keyword}'", cards.len());

        let descriptions = self.fetch_descriptions(&cards).await;

        Ok(cards
            .into_iter()
            .zip(descriptions)
            .map(|(card, description)| {
                JobPosting::new(card.title, card.company, description)
                    .with_location(&card.location)
                    .with_date_posted(&card.date_posted)
                    .with_url(card.url)
            })
            .collect())
    }
}

async fn fetch_description(client: &Client, url: &str) -> Result<Option<String>, SourceError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(SourceError::Status {
            status: response.status().as_u16(),
        });
    }
    let html = response.text().await?;
    Ok(parse_description(&html))
}

// ────────────────────────────────────────────────────────────────────────────
// Query building
// ────────────────────────────────────────────────────────────────────────────

fn experience_code(level: ExperienceLevel) -> &'static str {
    match level {
        ExperienceLevel::EntryLevel => "2",
        ExperienceLevel::Associate => "3",
        ExperienceLevel::MidSeniorLevel => "4",
        ExperienceLevel::Director => "5",
        ExperienceLevel::Executive => "6",
    }
}

fn job_type_code(job_type: JobType) -> &'static str {
    match job_type {
        JobType::FullTime => "F",
        JobType::PartTime => "P",
        JobType::Contract => "C",
        JobType::Temporary => "T",
        JobType::Internship => "I",
    }
}

fn search_query(keyword: &str, filters: &SearchFilters, start: usize) -> Vec<(&'static str, String)> {
    let mut q = vec![("keywords", keyword.to_string())];

    if let Some(location) = filters.location.as_deref().map(str::trim) {
        if !location.is_empty() {
            q.push(("location", location.to_string()));
        }
    }
    if !filters.experience_levels.is_empty() {
        let codes: Vec<&str> = filters
            .experience_levels
            .iter()
            .map(|l| experience_code(*l))
            .collect();
        q.push(("f_E", codes.join(",")));
    }
    if !filters.job_types.is_empty() {
        let codes: Vec<&str> = filters.job_types.iter().map(|t| job_type_code(*t)).collect();
        q.push(("f_JT", codes.join(",")));
    }
    q.push(("start", start.to_string()));
    q
}

// ────────────────────────────────────────────────────────────────────────────
// HTML parsing
// ────────────────────────────────────────────────────────────────────────────

struct CardSelectors {
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    time: Selector,
    link: Selector,
    urn: Selector,
}

impl CardSelectors {
    fn new() -> Option<Self> {
        Some(Self {
            card: Selector::parse(".base-search-card").ok()?,
            title: Selector::parse(".base-search-card__title").ok()?,
            company: Selector::parse(".base-search-card__subtitle").ok()?,
            location: Selector::parse(".job-search-card__location").ok()?,
            time: Selector::parse("time").ok()?,
            link: Selector::parse("a.base-card__full-link").ok()?,
            urn: Selector::parse("[data-entity-urn]").ok()?,
        })
    }
}

/// Parses the cards of one search page. Cards without a title or company are skipped.
pub fn parse_job_cards(html: &str) -> Vec<JobCard> {
    let Some(sel) = CardSelectors::new() else {
        return Vec::new();
    };
    let document = Html::parse_fragment(html);

    document
        .select(&sel.card)
        .filter_map(|card| {
            let title = first_text(&card, &sel.title)?;
            let company = first_text(&card, &sel.company)?;
            let location = first_text(&card, &sel.location).unwrap_or_default();

            let date_posted = card
                .select(&sel.time)
                .next()
                .map(|t| {
                    let text = clean_text(&t.text().collect::<Vec<_>>().join(" "));
                    if text.is_empty() {
                        t.value().attr("datetime").unwrap_or_default().to_string()
                    } else {
                        text
                    }
                })
                .unwrap_or_default();

            let urn = card.value().attr("data-entity-urn").or_else(|| {
                card.select(&sel.urn)
                    .next()
                    .and_then(|e| e.value().attr("data-entity-urn"))
            });
            let job_id = urn.and_then(job_id_from_urn);

            let url = card
                .select(&sel.link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .or_else(|| card.value().attr("href"))
                .map(|href| href.split('?').next().unwrap_or(href).to_string());

            Some(JobCard {
                job_id,
                title,
                company,
                location,
                date_posted,
                url,
            })
        })
        .collect()
}

/// Extracts the full description text from a job posting page.
pub fn parse_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    for css in [".show-more-less-html__markup", ".description__text"] {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn job_id_from_urn(urn: &str) -> Option<String> {
    let id = urn.rsplit(':').next()?.trim();
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then(|| id.to_string())
}

fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    let text = clean_text(
        &element
            .select(selector)
            .next()?
            .text()
            .collect::<Vec<_>>()
            .join(" "),
    );
    (!text.is_empty()).then_some(text)
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
