//! Candidate scorer.
//!
//! A pure function of the candidate and the query. Only the ordering of scores
//! matters; the weights are relative.

use pinpoint_common::text::{contains_normalized, equals_normalized, fuzzy_match};
use pinpoint_common::{Candidate, ElementQuery, Position, ScoredCandidate, sort_ranked};

const VISIBLE: i32 = 10;
const ENABLED: i32 = 5;
const TEXT_EXACT: i32 = 30;
const TEXT_SUBSTRING: i32 = 20;
const TEXT_FUZZY: i32 = 10;
const COLOR: i32 = 5;
const POSITION: i32 = 15;
const CLASS_HINT: i32 = 5;
const KIND_MATCH: i32 = 10;

const CLASS_HINTS: [&str; 4] = ["primary", "main", "submit", "action"];

#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    fuzzy_threshold: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl Scorer {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self { fuzzy_threshold }
    }

    pub fn score(&self, candidate: &Candidate, query: &ElementQuery) -> i32 {
        let facts = &candidate.facts;
        let mut score = 0;

        if facts.visible {
            score += VISIBLE;
        }
        if facts.enabled {
            score += ENABLED;
        }
        score += self.text_score(candidate.text(), query.search_text());

        if let Some(color) = query.color() {
            let style = facts.attr("style").unwrap_or("").to_lowercase();
            let class = facts.class().to_lowercase();
            if color_present(&class, color) || color_present(&style, color) {
                score += COLOR;
            }
        }

        match query.position() {
            Some(Position::First) if candidate.is_first() => score += POSITION,
            Some(Position::Last) if candidate.is_last() => score += POSITION,
            _ => {}
        }

        let class = facts.class().to_lowercase();
        if CLASS_HINTS.iter().any(|hint| class.contains(hint)) {
            score += CLASS_HINT;
        }

        if query.element_kind.matches(facts) {
            score += KIND_MATCH;
        }

        score
    }

    fn text_score(&self, actual: &str, target: &str) -> i32 {
        if target.trim().is_empty() {
            return 0;
        }
        if equals_normalized(actual, target) {
            TEXT_EXACT
        } else if contains_normalized(actual, target) {
            TEXT_SUBSTRING
        } else if fuzzy_match(actual, target, self.fuzzy_threshold) {
            TEXT_FUZZY
        } else {
            0
        }
    }

    /// Score and sort best-first. Ties go to the lower priority, then to the
    /// earlier candidate.
    pub fn rank(&self, candidates: Vec<Candidate>, query: &ElementQuery) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .enumerate()
            .map(|(order, candidate)| ScoredCandidate {
                score: self.score(&candidate, query),
                candidate,
                order,
            })
            .collect();
        sort_ranked(&mut scored);
        scored
    }

    pub fn best(&self, candidates: Vec<Candidate>, query: &ElementQuery) -> Option<ScoredCandidate> {
        self.rank(candidates, query).into_iter().next()
    }
}

/// Gray and grey are the same color.
fn color_present(haystack: &str, color: &str) -> bool {
    match color {
        "gray" | "grey" => haystack.contains("gray") || haystack.contains("grey"),
        _ => haystack.contains(color),
    }
}
