//! Detection strategies.
//!
//! Each strategy turns an [`ElementQuery`] into zero or more candidates using
//! only the [`PageAccessor`]. "Not found" is an empty list; errors mean the
//! accessor itself failed.

pub mod chain;
pub mod external;
pub mod heuristic;
pub mod label;
pub mod proximity;
pub mod structural;

pub use chain::{StrategyBackends, StrategyChain};
pub use external::{DetectorBackend, ExternalStrategy};
pub use heuristic::HeuristicStrategy;
pub use proximity::ProximityStrategy;
pub use structural::StructuralStrategy;

use crate::accessor::PageAccessor;
use pinpoint_common::{AccessorError, Candidate, ElementQuery, NodeFacts, number_candidates};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Strategy '{strategy}' failed: {source}")]
    ExecutionFailed {
        strategy: String,
        #[source]
        source: AccessorError,
    },
}

/// Configuration names of the strategy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[serde(alias = "dom")]
    Structural,
    #[serde(alias = "heuristic_pattern")]
    Heuristic,
    Proximity,
    #[serde(alias = "ocr")]
    Visual,
    Ml,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Structural => "structural",
            StrategyKind::Heuristic => "heuristic",
            StrategyKind::Proximity => "proximity",
            StrategyKind::Visual => "visual",
            StrategyKind::Ml => "ml",
        }
    }

    /// Lower is tried earlier.
    pub fn priority(&self) -> u8 {
        match self {
            StrategyKind::Structural => 1,
            StrategyKind::Heuristic | StrategyKind::Proximity => 2,
            StrategyKind::Visual => 3,
            StrategyKind::Ml => 4,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of strategy variants behind one `find` capability.
#[derive(Clone)]
pub enum Strategy {
    Structural(StructuralStrategy),
    HeuristicPattern(HeuristicStrategy),
    Proximity(ProximityStrategy),
    Visual(ExternalStrategy),
    Ml(ExternalStrategy),
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name())
            .field("priority", &self.priority())
            .finish()
    }
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Structural(_) => StrategyKind::Structural,
            Strategy::HeuristicPattern(_) => StrategyKind::Heuristic,
            Strategy::Proximity(_) => StrategyKind::Proximity,
            Strategy::Visual(_) => StrategyKind::Visual,
            Strategy::Ml(_) => StrategyKind::Ml,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn priority(&self) -> u8 {
        self.kind().priority()
    }

    /// Whether the strategy takes part in `resolve_all`. Built-in strategies
    /// always do; detector-backed ones ask their backend. Every variant is
    /// async, so there is no separate synchronous capability.
    pub fn supports_all(&self) -> bool {
        match self {
            Strategy::Visual(s) | Strategy::Ml(s) => s.supports_all(),
            _ => true,
        }
    }

    pub async fn find(
        &self,
        query: &ElementQuery,
        accessor: &dyn PageAccessor,
    ) -> Result<Vec<Candidate>, StrategyError> {
        debug!(strategy = self.name(), target = %query.target_text, "Running strategy");
        let found = match self {
            Strategy::Structural(s) => s.find(query, accessor).await,
            Strategy::HeuristicPattern(s) => s.find(query, accessor).await,
            Strategy::Proximity(s) => s.find(query, accessor).await,
            Strategy::Visual(s) | Strategy::Ml(s) => s.find(query, accessor).await,
        }
        .map_err(|source| StrategyError::ExecutionFailed {
            strategy: self.name().to_string(),
            source,
        })?;

        debug!(strategy = self.name(), count = found.len(), "Strategy finished");
        Ok(self.candidates(found))
    }

    fn candidates(&self, facts: Vec<NodeFacts>) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = facts
            .into_iter()
            .map(|f| Candidate::new(f, self.name(), self.priority()))
            .collect();
        number_candidates(&mut candidates);
        candidates
    }
}
