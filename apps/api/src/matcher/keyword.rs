//! Keyword matcher — term-frequency cosine blended with skill coverage.
//!
//! Algorithm:
//! 1. Tokenize both texts (lowercase; `+ # .` kept inside tokens).
//! 2. cosine = cos(tf(description), tf(résumé)) over non-stop-word tokens
//! 3. Skills = vocabulary entries found in the description, in order of appearance;
//!    matched if the résumé also contains them, missing otherwise.
//! 4. score = COSINE_WEIGHT × cosine + SKILL_WEIGHT × coverage
//!    (cosine alone when the description names no known skill), clamped to [0, 1].

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;

use crate::matcher::skills::{find_skills, vocabulary, Skill};
use crate::matcher::{ensure_matchable, MatchError, ResumeMatcher};
use crate::search::model::MatchResult;

const COSINE_WEIGHT: f64 = 0.5;
const SKILL_WEIGHT: f64 = 0.5;

const STOP_WORDS: &[&str] = &[
    "a", "about", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been", "but",
    "by", "can", "do", "for", "from", "has", "have", "in", "into", "is", "it", "its", "more",
    "must", "not", "of", "on", "or", "our", "should", "so", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "to", "us", "was", "we",
    "were", "what", "when", "which", "who", "will", "with", "within", "would", "you", "your",
];

/// Pure-Rust résumé matcher. Fast, deterministic, no network call.
pub struct KeywordResumeMatcher {
    vocabulary: Vec<Skill>,
    stop_words: HashSet<&'static str>,
}

impl Default for KeywordResumeMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordResumeMatcher {
    pub fn new() -> Self {
        Self {
            vocabulary: vocabulary(),
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    pub fn score(&self, description: &str, resume_text: &str) -> Result<MatchResult, MatchError> {
        ensure_matchable(description, resume_text)?;

        let description_tokens = tokenize(description);
        let resume_tokens = tokenize(resume_text);

        let cosine = cosine_similarity(
            &self.term_frequencies(&description_tokens),
            &self.term_frequencies(&resume_tokens),
        );

        let required = find_skills(&description_tokens, &self.vocabulary);
        let present: HashSet<&str> = find_skills(&resume_tokens, &self.vocabulary)
            .into_iter()
            .collect();

        let total = required.len();
        let (matched, missing): (Vec<&str>, Vec<&str>) = required
            .into_iter()
            .partition(|skill| present.contains(skill));

        let score = if total == 0 {
            cosine
        } else {
            let coverage = matched.len() as f64 / total as f64;
            COSINE_WEIGHT * cosine + SKILL_WEIGHT * coverage
        };

        Ok(MatchResult {
            similarity_score: score.clamp(0.0, 1.0),
            matched_skills: matched.into_iter().map(String::from).collect(),
            missing_skills: missing.into_iter().map(String::from).collect(),
        })
    }

    /// BTreeMap keeps the summation order fixed, so identical inputs give bit-identical scores.
    fn term_frequencies<'a>(&self, tokens: &'a [String]) -> BTreeMap<&'a str, f64> {
        let mut tf = BTreeMap::new();
        for token in tokens {
            if !self.stop_words.contains(token.as_str()) {
                *tf.entry(token.as_str()).or_insert(0.0) += 1.0;
            }
        }
        tf
    }
}

#[async_trait]
impl ResumeMatcher for KeywordResumeMatcher {
    async fn match_resume(
        &self,
        description: &str,
        resume_text: &str,
    ) -> Result<MatchResult, MatchError> {
        self.score(description, resume_text)
    }
}

/// Lowercases and splits on anything that is not alphanumeric or one of `+ # .`.
/// Trailing dots are dropped ("Docker." → "docker"); tokens shorter than two
/// characters or without any alphanumeric character are discarded.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_end_matches('.'))
        .filter(|t| t.chars().count() >= 2 && t.chars().any(char::is_alphanumeric))
        .map(String::from)
        .collect()
}

fn cosine_similarity(a: &BTreeMap<&str, f64>, b: &BTreeMap<&str, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
