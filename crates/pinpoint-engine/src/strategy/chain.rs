use super::{
    DetectorBackend, ExternalStrategy, HeuristicStrategy, ProximityStrategy, Strategy,
    StrategyKind, StructuralStrategy,
};
use crate::config::ResolverConfig;
use std::sync::Arc;
use tracing::warn;

/// Optional detectors for the visual and ML strategies.
#[derive(Clone, Default)]
pub struct StrategyBackends {
    pub visual: Option<Arc<dyn DetectorBackend>>,
    pub ml: Option<Arc<dyn DetectorBackend>>,
}

/// Strategies in invocation order.
///
/// Sorted by priority once at construction; strategies with equal priority keep
/// their registration order.
#[derive(Debug, Clone)]
pub struct StrategyChain {
    strategies: Vec<Strategy>,
}

impl StrategyChain {
    pub fn new(mut strategies: Vec<Strategy>) -> Self {
        strategies.sort_by_key(|s| s.priority());
        Self { strategies }
    }

    /// Build the chain named by the configuration.
    ///
    /// Visual and ML entries without a backend are skipped with a warning.
    pub fn from_config(config: &ResolverConfig, backends: &StrategyBackends) -> Self {
        let threshold = config.fuzzy_match_threshold;
        let mut strategies = Vec::with_capacity(config.strategies.len());
        for kind in &config.strategies {
            let strategy = match kind {
                StrategyKind::Structural => {
                    Strategy::Structural(StructuralStrategy::new(threshold))
                }
                StrategyKind::Heuristic => {
                    Strategy::HeuristicPattern(HeuristicStrategy::new(threshold))
                }
                StrategyKind::Proximity => Strategy::Proximity(ProximityStrategy::new()),
                StrategyKind::Visual => match &backends.visual {
                    Some(b) => Strategy::Visual(ExternalStrategy::new(b.clone())),
                    None => {
                        warn!("Visual strategy requested but no detector is configured, skipping");
                        continue;
                    }
                },
                StrategyKind::Ml => match &backends.ml {
                    Some(b) => Strategy::Ml(ExternalStrategy::new(b.clone())),
                    None => {
                        warn!("ML strategy requested but no detector is configured, skipping");
                        continue;
                    }
                },
            };
            strategies.push(strategy);
        }
        Self::new(strategies)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(Strategy::name).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default(), &StrategyBackends::default())
    }
}
