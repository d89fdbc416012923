//! Data shapes passed across the search boundary: requests, postings, results.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCATION: &str = "Location not specified";
pub const DEFAULT_DATE_POSTED: &str = "Recently";

// ────────────────────────────────────────────────────────────────────────────
// Filters
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    #[serde(alias = "Entry level")]
    EntryLevel,
    #[serde(alias = "Associate")]
    Associate,
    #[serde(alias = "Mid-Senior level")]
    MidSeniorLevel,
    #[serde(alias = "Director")]
    Director,
    #[serde(alias = "Executive")]
    Executive,
}

impl ExperienceLevel {
    pub fn label(self) -> &'static str {
        match self {
            ExperienceLevel::EntryLevel => "Entry level",
            ExperienceLevel::Associate => "Associate",
            ExperienceLevel::MidSeniorLevel => "Mid-Senior level",
            ExperienceLevel::Director => "Director",
            ExperienceLevel::Executive => "Executive",
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "entry_level" => Ok(ExperienceLevel::EntryLevel),
            "associate" => Ok(ExperienceLevel::Associate),
            "mid_senior_level" => Ok(ExperienceLevel::MidSeniorLevel),
            "director" => Ok(ExperienceLevel::Director),
            "executive" => Ok(ExperienceLevel::Executive),
            _ => Err(format!("unknown experience level '{s}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[serde(alias = "Full-time")]
    FullTime,
    #[serde(alias = "Part-time")]
    PartTime,
    #[serde(alias = "Contract")]
    Contract,
    #[serde(alias = "Temporary")]
    Temporary,
    #[serde(alias = "Internship")]
    Internship,
}

impl JobType {
    pub fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Temporary => "Temporary",
            JobType::Internship => "Internship",
        }
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "full_time" => Ok(JobType::FullTime),
            "part_time" => Ok(JobType::PartTime),
            "contract" => Ok(JobType::Contract),
            "temporary" => Ok(JobType::Temporary),
            "internship" => Ok(JobType::Internship),
            _ => Err(format!("unknown job type '{s}'")),
        }
    }
}

/// "Mid-Senior level" and "mid_senior_level" both normalize to "mid_senior_level".
fn normalize_label(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

/// Optional filters forwarded unmodified to the job source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub experience_levels: BTreeSet<ExperienceLevel>,
    #[serde(default)]
    pub job_types: BTreeSet<JobType>,
    #[serde(default)]
    pub results_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub keyword: String,
    #[serde(flatten)]
    pub filters: SearchFilters,
}

impl SearchRequest {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            filters: SearchFilters::default(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Postings
// ────────────────────────────────────────────────────────────────────────────

/// Output of one résumé-to-description comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub similarity_score: f64,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
}

/// Tagged per-posting result of the scoring map.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Scored(MatchResult),
    Failed(String),
}

/// Whether a posting's derived fields came from a matcher call.
/// A zero score with `NotScored` means "no résumé", with `Failed` it means
/// the matcher could not score this posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoringStatus {
    #[default]
    NotScored,
    Scored,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_date_posted")]
    pub date_posted: String,
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub similarity_score: f64,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub scoring: ScoringStatus,
}

fn default_location() -> String {
    DEFAULT_LOCATION.to_string()
}

fn default_date_posted() -> String {
    DEFAULT_DATE_POSTED.to_string()
}

impl JobPosting {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: default_location(),
            date_posted: default_date_posted(),
            description: description.into(),
            url: None,
            similarity_score: 0.0,
            missing_skills: Vec::new(),
            matched_skills: Vec::new(),
            scoring: ScoringStatus::NotScored,
        }
    }

    /// Sets the location, keeping the default for blank values.
    pub fn with_location(mut self, location: &str) -> Self {
        if !location.trim().is_empty() {
            self.location = location.trim().to_string();
        }
        self
    }

    /// Sets the posting date, keeping the default for blank values.
    pub fn with_date_posted(mut self, date_posted: &str) -> Self {
        if !date_posted.trim().is_empty() {
            self.date_posted = date_posted.trim().to_string();
        }
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    /// Populates the derived fields from a scoring outcome. Applied once per search;
    /// a posting that was already scored keeps its first outcome.
    pub fn apply_outcome(&mut self, outcome: ScoreOutcome) {
        if self.scoring != ScoringStatus::NotScored {
            return;
        }
        match outcome {
            ScoreOutcome::Scored(result) => {
                self.similarity_score = result.similarity_score;
                self.matched_skills = result.matched_skills;
                self.missing_skills = result.missing_skills;
                self.scoring = ScoringStatus::Scored;
            }
            ScoreOutcome::Failed(reason) => {
                self.similarity_score = 0.0;
                self.matched_skills.clear();
                self.missing_skills.clear();
                self.scoring = ScoringStatus::Failed { reason };
            }
        }
    }

    pub fn match_band(&self) -> MatchBand {
        MatchBand::for_score(self.similarity_score)
    }
}

/// Coarse bucket of a similarity score, used to colour a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBand {
    High,
    Medium,
    Low,
}

impl MatchBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 0.7 {
            MatchBand::High
        } else if score >= 0.4 {
            MatchBand::Medium
        } else {
            MatchBand::Low
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Results
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    SearchFailed,
    SourceTimeout,
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCode::SearchFailed => write!(f, "SEARCH_FAILED"),
            FailureCode::SourceTimeout => write!(f, "SOURCE_TIMEOUT"),
        }
    }
}

/// User-visible reason a search came back empty because the source failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFailure {
    pub code: FailureCode,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub postings: Vec<JobPosting>,
    pub ranked: bool,
    #[serde(default)]
    pub failure: Option<SearchFailure>,
    #[serde(default)]
    pub scoring_failures: usize,
}

/// One row of the tabular view of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_percentage: Option<String>,
    pub date_posted: String,
}

impl SearchResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failed(failure: SearchFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Match percentage is only shown when the result was ranked against a résumé.
    pub fn table_rows(&self) -> Vec<TableRow> {
        self.postings
            .iter()
            .map(|p| TableRow {
                title: p.title.clone(),
                company: p.company.clone(),
                location: p.location.clone(),
                match_percentage: self
                    .ranked
                    .then(|| format!("{:.0}%", p.similarity_score * 100.0)),
                date_posted: p.date_posted.clone(),
            })
            .collect()
    }
}
