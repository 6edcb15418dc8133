use crate::protocol::{NodeFacts, NodeHandle};
use serde::Serialize;
use std::cmp::Ordering;

/// A runtime node proposed by one strategy, with the facts needed to score it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub facts: NodeFacts,
    /// Name of the strategy that produced this candidate.
    pub strategy: String,
    pub priority: u8,
    /// Index within the result set it came from.
    pub rank: usize,
    /// Size of that result set.
    pub set_len: usize,
}

impl Candidate {
    pub fn new(facts: NodeFacts, strategy: &str, priority: u8) -> Self {
        Self {
            facts,
            strategy: strategy.to_string(),
            priority,
            rank: 0,
            set_len: 1,
        }
    }

    pub fn handle(&self) -> NodeHandle {
        self.facts.handle
    }

    /// Visible and enabled.
    pub fn is_actionable(&self) -> bool {
        self.facts.visible && self.facts.enabled
    }

    pub fn is_first(&self) -> bool {
        self.rank == 0
    }

    pub fn is_last(&self) -> bool {
        self.rank + 1 == self.set_len
    }

    pub fn text(&self) -> &str {
        self.facts.accessible_name()
    }
}

/// Stamp `rank`/`set_len` on a strategy's result set in order.
pub fn number_candidates(candidates: &mut [Candidate]) {
    let len = candidates.len();
    for (i, c) in candidates.iter_mut().enumerate() {
        c.rank = i;
        c.set_len = len;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: i32,
    /// Position in the list handed to the scorer, used as the final tiebreak.
    pub order: usize,
}

impl ScoredCandidate {
    /// Ranking order: higher score first, then lower priority, then earlier order.
    pub fn ranking(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then(self.candidate.priority.cmp(&other.candidate.priority))
            .then(self.order.cmp(&other.order))
    }
}

/// Sort best-first according to [`ScoredCandidate::ranking`].
pub fn sort_ranked(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| a.ranking(b));
}
