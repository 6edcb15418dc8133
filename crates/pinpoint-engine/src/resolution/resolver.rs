//! Resolution orchestration.
//!
//! Cache lookup, then the strategy chain in priority order with retries, then
//! scoring. The whole search runs under one overall timeout.

use super::result::{ElementNotFoundError, Resolution};
use crate::accessor::PageAccessor;
use crate::config::{ConfigError, ResolveOptions, ResolverConfig};
use crate::context::PageContext;
use crate::scorer::Scorer;
use crate::strategy::{StrategyBackends, StrategyChain};
use pinpoint_common::{Candidate, ElementQuery, NodeHandle, ScoredCandidate, number_candidates};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct Resolver {
    config: ResolverConfig,
    chain: StrategyChain,
    scorer: Scorer,
}

impl Resolver {
    /// Resolver with the chain named by `config` and no visual/ML detectors.
    pub fn new(config: ResolverConfig) -> Result<Self, ConfigError> {
        Self::with_backends(config, StrategyBackends::default())
    }

    pub fn with_backends(
        config: ResolverConfig,
        backends: StrategyBackends,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let chain = StrategyChain::from_config(&config, &backends);
        Self::with_chain(config, chain)
    }

    /// Resolver over an explicit chain. `config.strategies` is ignored.
    pub fn with_chain(config: ResolverConfig, chain: StrategyChain) -> Result<Self, ConfigError> {
        config.validate()?;
        if chain.is_empty() {
            return Err(ConfigError::Invalid(
                "no usable strategy in the chain".into(),
            ));
        }
        let scorer = Scorer::new(config.fuzzy_match_threshold);
        Ok(Self {
            config,
            chain,
            scorer,
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn chain(&self) -> &StrategyChain {
        &self.chain
    }

    pub fn parse(&self, phrase: &str) -> ElementQuery {
        pinpoint_parser::parse(phrase)
    }

    pub async fn resolve<A: PageAccessor>(
        &self,
        ctx: &mut PageContext<A>,
        phrase: &str,
    ) -> Result<NodeHandle, ElementNotFoundError> {
        self.resolve_with(ctx, phrase, &ResolveOptions::default())
            .await
            .map(|r| r.node)
    }

    pub async fn resolve_detailed<A: PageAccessor>(
        &self,
        ctx: &mut PageContext<A>,
        phrase: &str,
    ) -> Result<Resolution, ElementNotFoundError> {
        self.resolve_with(ctx, phrase, &ResolveOptions::default())
            .await
    }

    pub async fn resolve_with<A: PageAccessor>(
        &self,
        ctx: &mut PageContext<A>,
        phrase: &str,
        options: &ResolveOptions,
    ) -> Result<Resolution, ElementNotFoundError> {
        let query = self.parse(phrase);
        let retry_count = options.retry_count.unwrap_or(self.config.retry_count);
        let backoff = options.backoff.unwrap_or_else(|| self.config.backoff());
        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());

        let page = if self.config.cache_enabled && !options.bypass_cache {
            match ctx.accessor.page_identity().await {
                Ok(page) => Some(page),
                Err(e) => {
                    warn!(error = %e, "Could not read page identity, bypassing cache");
                    None
                }
            }
        } else {
            None
        };

        if let Some(page) = &page
            && let Some(node) = self.cached(ctx, page, phrase).await
        {
            return Ok(Resolution {
                node,
                strategy: None,
                score: None,
                attempts: 0,
                from_cache: true,
            });
        }

        let mut attempted = Vec::new();
        let mut attempts = 0;
        let search = self.search(
            &ctx.accessor,
            &query,
            retry_count,
            backoff,
            &mut attempted,
            &mut attempts,
        );
        let outcome = tokio::time::timeout(timeout, search).await;

        match outcome {
            Ok(Some(best)) => {
                let node = best.candidate.handle();
                if let Some(page) = &page {
                    ctx.cache.put(page, phrase, node);
                }
                info!(
                    phrase,
                    node = %node,
                    strategy = %best.candidate.strategy,
                    score = best.score,
                    attempts,
                    "Resolved element"
                );
                Ok(Resolution {
                    node,
                    strategy: Some(best.candidate.strategy),
                    score: Some(best.score),
                    attempts,
                    from_cache: false,
                })
            }
            Ok(None) => {
                warn!(phrase, attempts, "Element not found");
                Err(ElementNotFoundError {
                    phrase: phrase.to_string(),
                    query,
                    attempted,
                    timed_out: false,
                })
            }
            Err(_) => {
                warn!(
                    phrase,
                    timeout_ms = timeout.as_millis() as u64,
                    "Resolution timed out"
                );
                Err(ElementNotFoundError {
                    phrase: phrase.to_string(),
                    query,
                    attempted,
                    timed_out: true,
                })
            }
        }
    }

    /// Every node any strategy proposes, best first, each node once.
    ///
    /// One pass, no retries, no cache. An empty list means nothing matched.
    pub async fn resolve_all<A: PageAccessor>(
        &self,
        ctx: &PageContext<A>,
        phrase: &str,
    ) -> Vec<NodeHandle> {
        let query = self.parse(phrase);
        let mut all = Vec::new();
        for strategy in self.chain.iter() {
            if !strategy.supports_all() {
                debug!(strategy = strategy.name(), "Strategy skipped, single-result only");
                continue;
            }
            match strategy.find(&query, &ctx.accessor).await {
                Ok(candidates) => all.extend(actionable(candidates)),
                Err(e) => warn!(error = %e, "Strategy failed, continuing"),
            }
        }

        let mut seen = HashSet::new();
        self.scorer
            .rank(all, &query)
            .into_iter()
            .map(|scored| scored.candidate.handle())
            .filter(|handle| seen.insert(*handle))
            .collect()
    }

    pub fn clear_cache<A: PageAccessor>(&self, ctx: &mut PageContext<A>) {
        ctx.clear_cache();
    }

    async fn cached<A: PageAccessor>(
        &self,
        ctx: &mut PageContext<A>,
        page: &str,
        phrase: &str,
    ) -> Option<NodeHandle> {
        let node = ctx.cache.get(page, phrase)?;
        if self.config.verify_cached {
            let attached = match ctx.accessor.is_attached(node).await {
                Ok(attached) => attached,
                Err(e) => {
                    warn!(node = %node, error = %e, "Could not verify cached node");
                    false
                }
            };
            if !attached {
                warn!(node = %node, phrase, "Cached node is detached, evicting");
                ctx.cache.remove(page, phrase);
                return None;
            }
        }
        debug!(node = %node, phrase, "Cache hit");
        Some(node)
    }

    async fn search(
        &self,
        accessor: &dyn PageAccessor,
        query: &ElementQuery,
        retry_count: u32,
        backoff: Duration,
        attempted: &mut Vec<String>,
        attempts: &mut u32,
    ) -> Option<ScoredCandidate> {
        let total = retry_count.saturating_add(1);
        for attempt in 1..=total {
            *attempts = attempt;
            if let Some(best) = self.search_once(accessor, query, attempted).await {
                return Some(best);
            }
            if attempt < total {
                info!(
                    attempt,
                    remaining = total - attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    "No candidate found, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
        }
        None
    }

    /// First strategy with an actionable candidate wins; its best-scored
    /// candidate is the answer. Later strategies are not run.
    async fn search_once(
        &self,
        accessor: &dyn PageAccessor,
        query: &ElementQuery,
        attempted: &mut Vec<String>,
    ) -> Option<ScoredCandidate> {
        for strategy in self.chain.iter() {
            if !attempted.iter().any(|name| name == strategy.name()) {
                attempted.push(strategy.name().to_string());
            }
            let candidates = match strategy.find(query, accessor).await {
                Ok(candidates) => actionable(candidates),
                Err(e) => {
                    warn!(error = %e, "Strategy failed, continuing");
                    continue;
                }
            };
            if let Some(best) = self.scorer.best(candidates, query) {
                debug!(
                    strategy = strategy.name(),
                    node = %best.candidate.handle(),
                    score = best.score,
                    "Strategy produced a candidate"
                );
                return Some(best);
            }
        }
        None
    }
}

/// Drop hidden and disabled candidates, then renumber so "first" and "last"
/// refer to what the user can act on.
fn actionable(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(Candidate::is_actionable)
        .collect();
    number_candidates(&mut kept);
    kept
}
