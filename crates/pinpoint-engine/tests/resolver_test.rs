mod common;

use async_trait::async_trait;
use common::{BrokenAccessor, CountingAccessor, SlowAccessor, URL, child, node, page};
use pinpoint_common::{AccessorError, ElementQuery, NodeHandle, PageSnapshot};
use pinpoint_engine::{
    DetectorBackend, PageAccessor, PageContext, ResolveOptions, Resolver, ResolverConfig,
    StrategyBackends, StrategyKind,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

fn config(strategies: Vec<StrategyKind>, retry_count: u32) -> ResolverConfig {
    ResolverConfig {
        strategies,
        retry_count,
        backoff_ms: 10,
        ..Default::default()
    }
}

fn submit_page() -> pinpoint_engine::SnapshotAccessor {
    page(vec![
        node(1, "form", "", json!({"class": "checkout"})),
        child(2, 1, "button", "Submit", json!({"class": "btn"})),
        child(3, 1, "button", "Submit", json!({"class": "btn btn-blue"})),
        child(4, 1, "button", "Cancel", json!({"class": "btn"})),
    ])
}

#[tokio::test]
async fn blue_submit_button_wins() {
    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let mut ctx = PageContext::new(submit_page());

    let resolution = resolver
        .resolve_detailed(&mut ctx, "Click on the blue Submit button")
        .await
        .unwrap();

    assert_eq!(resolution.node, NodeHandle(3));
    assert_eq!(resolution.strategy.as_deref(), Some("structural"));
    assert_eq!(resolution.attempts, 1);
    assert!(!resolution.from_cache);
}

#[tokio::test]
async fn second_resolve_is_served_from_cache() {
    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let (accessor, queries) = CountingAccessor::new(submit_page());
    let mut ctx = PageContext::new(accessor);

    let first = resolver.resolve(&mut ctx, "Click the Cancel button").await.unwrap();
    let after_first = queries.load(Ordering::SeqCst);
    assert!(after_first > 0);

    let second = resolver
        .resolve_detailed(&mut ctx, "click the cancel button")
        .await
        .unwrap();
    assert_eq!(second.node, first);
    assert!(second.from_cache);
    assert_eq!(queries.load(Ordering::SeqCst), after_first);
}

#[tokio::test]
async fn bypass_cache_runs_strategies_again() {
    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let (accessor, queries) = CountingAccessor::new(submit_page());
    let mut ctx = PageContext::new(accessor);

    resolver.resolve(&mut ctx, "Click the Cancel button").await.unwrap();
    let after_first = queries.load(Ordering::SeqCst);
    let again = resolver
        .resolve_with(
            &mut ctx,
            "Click the Cancel button",
            &ResolveOptions::new().bypass_cache(),
        )
        .await
        .unwrap();
    assert!(!again.from_cache);
    assert!(queries.load(Ordering::SeqCst) > after_first);
}

#[tokio::test]
async fn cache_disabled_never_stores() {
    let resolver = Resolver::new(ResolverConfig {
        cache_enabled: false,
        ..Default::default()
    })
    .unwrap();
    let mut ctx = PageContext::new(submit_page());
    resolver.resolve(&mut ctx, "Click the Cancel button").await.unwrap();
    assert!(ctx.cache().is_empty());
}

#[tokio::test]
async fn stale_cache_entry_is_evicted() {
    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let mut ctx = PageContext::new(submit_page());
    assert_eq!(
        resolver.resolve(&mut ctx, "Click the Cancel button").await.unwrap(),
        NodeHandle(4)
    );

    // Re-render: same page, new node ids.
    let rerendered: PageSnapshot = serde_json::from_value(json!({
        "url": URL,
        "nodes": [
            node(10, "form", "", json!({})),
            child(14, 10, "button", "Cancel", json!({})),
        ]
    }))
    .unwrap();
    ctx.accessor().replace(rerendered).await;

    let resolution = resolver
        .resolve_detailed(&mut ctx, "Click the Cancel button")
        .await
        .unwrap();
    assert_eq!(resolution.node, NodeHandle(14));
    assert!(!resolution.from_cache);
}

#[tokio::test]
async fn clear_cache_forgets_entries() {
    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let mut ctx = PageContext::new(submit_page());
    resolver.resolve(&mut ctx, "Click the Cancel button").await.unwrap();
    assert_eq!(ctx.cache().len(), 1);
    resolver.clear_cache(&mut ctx);
    assert!(ctx.cache().is_empty());
}

#[tokio::test]
async fn contexts_do_not_share_cache() {
    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let mut a = PageContext::new(submit_page());
    let mut b = PageContext::new(submit_page());
    resolver.resolve(&mut a, "Click the Cancel button").await.unwrap();
    assert!(b.cache().is_empty());
    let from_b = resolver
        .resolve_detailed(&mut b, "Click the Cancel button")
        .await
        .unwrap();
    assert!(!from_b.from_cache);
}

#[tokio::test(start_paused = true)]
async fn retries_until_node_appears() {
    let resolver = Resolver::new(ResolverConfig {
        retry_count: 2,
        backoff_ms: 1000,
        ..Default::default()
    })
    .unwrap();
    let accessor = Arc::new(page(vec![node(1, "div", "Loading", json!({}))]));
    let mut ctx = PageContext::new(accessor.clone());

    let later = accessor.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let loaded: PageSnapshot = serde_json::from_value(json!({
            "url": URL,
            "nodes": [node(2, "button", "Save", json!({}))]
        }))
        .unwrap();
        later.replace(loaded).await;
    });

    let start = tokio::time::Instant::now();
    let resolution = resolver
        .resolve_detailed(&mut ctx, "Click the Save button")
        .await
        .unwrap();

    assert_eq!(resolution.node, NodeHandle(2));
    assert_eq!(resolution.attempts, 3);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2000));
    assert!(elapsed < Duration::from_millis(2100));
}

#[tokio::test]
async fn exhaustion_names_every_strategy() {
    let resolver = Resolver::new(config(
        vec![StrategyKind::Structural, StrategyKind::Heuristic],
        0,
    ))
    .unwrap();
    let mut ctx = PageContext::new(submit_page());

    let err = resolver
        .resolve(&mut ctx, "Click the Frobnicate widget")
        .await
        .unwrap_err();
    assert_eq!(err.attempted, vec!["structural", "heuristic"]);
    assert!(!err.timed_out);
    assert_eq!(err.phrase, "Click the Frobnicate widget");
    assert!(err.to_string().contains("structural, heuristic"));
}

#[tokio::test]
async fn accessor_failures_fall_through_to_not_found() {
    let resolver = Resolver::new(config(
        vec![StrategyKind::Structural, StrategyKind::Proximity],
        1,
    ))
    .unwrap();
    let mut ctx = PageContext::new(BrokenAccessor);

    let err = resolver.resolve(&mut ctx, "Click Save").await.unwrap_err();
    assert_eq!(err.attempted, vec!["structural", "proximity"]);
    assert!(!err.timed_out);
}

#[tokio::test(start_paused = true)]
async fn overall_timeout_is_reported() {
    let resolver = Resolver::new(ResolverConfig {
        timeout_ms: 500,
        ..Default::default()
    })
    .unwrap();
    let mut ctx = PageContext::new(SlowAccessor {
        delay: Duration::from_secs(10),
    });

    let err = resolver.resolve(&mut ctx, "Click Save").await.unwrap_err();
    assert!(err.timed_out);
    assert_eq!(err.attempted, vec!["structural"]);
    assert_eq!(err.code(), "RESOLUTION_TIMEOUT");
}

#[tokio::test(start_paused = true)]
async fn per_call_timeout_overrides_config() {
    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let mut ctx = PageContext::new(SlowAccessor {
        delay: Duration::from_secs(10),
    });
    let start = tokio::time::Instant::now();
    let err = resolver
        .resolve_with(
            &mut ctx,
            "Click Save",
            &ResolveOptions::new().timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();
    assert!(err.timed_out);
    assert!(start.elapsed() < Duration::from_secs(1));
}

struct FixedDetector(NodeHandle);

#[async_trait]
impl DetectorBackend for FixedDetector {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn detect(
        &self,
        _query: &ElementQuery,
        _accessor: &dyn PageAccessor,
    ) -> Result<Vec<NodeHandle>, AccessorError> {
        Ok(vec![self.0])
    }
}

#[tokio::test]
async fn earlier_strategy_wins_over_better_score() {
    // The detector proposes the blue button, which would outscore the plain one.
    let backends = StrategyBackends {
        visual: Some(Arc::new(FixedDetector(NodeHandle(3)))),
        ml: None,
    };
    let resolver = Resolver::with_backends(
        config(vec![StrategyKind::Visual, StrategyKind::Structural], 0),
        backends,
    )
    .unwrap();
    assert_eq!(resolver.chain().names(), vec!["structural", "visual"]);

    let mut ctx = PageContext::new(page(vec![
        node(2, "button", "Submit", json!({"class": "btn"})),
        node(3, "button", "Send", json!({"class": "btn btn-blue"})),
    ]));
    let resolution = resolver
        .resolve_detailed(&mut ctx, "Click on the blue Submit button")
        .await
        .unwrap();
    assert_eq!(resolution.node, NodeHandle(2));
    assert_eq!(resolution.strategy.as_deref(), Some("structural"));
}

#[tokio::test]
async fn later_strategy_used_when_earlier_finds_nothing() {
    let backends = StrategyBackends {
        visual: Some(Arc::new(FixedDetector(NodeHandle(3)))),
        ml: None,
    };
    let resolver = Resolver::with_backends(
        config(vec![StrategyKind::Structural, StrategyKind::Visual], 0),
        backends,
    )
    .unwrap();
    let mut ctx = PageContext::new(page(vec![
        node(2, "button", "Submit", json!({})),
        node(3, "div", "", json!({"class": "icon-cart"})),
    ]));
    let resolution = resolver
        .resolve_detailed(&mut ctx, "Click the shopping cart icon")
        .await
        .unwrap();
    assert_eq!(resolution.node, NodeHandle(3));
    assert_eq!(resolution.strategy.as_deref(), Some("visual"));
}

struct SingleGuessDetector(NodeHandle);

#[async_trait]
impl DetectorBackend for SingleGuessDetector {
    fn name(&self) -> &str {
        "single-guess"
    }

    fn supports_all(&self) -> bool {
        false
    }

    async fn detect(
        &self,
        _query: &ElementQuery,
        _accessor: &dyn PageAccessor,
    ) -> Result<Vec<NodeHandle>, AccessorError> {
        Ok(vec![self.0])
    }
}

#[tokio::test]
async fn single_result_detectors_sit_out_resolve_all() {
    let backends = StrategyBackends {
        visual: Some(Arc::new(SingleGuessDetector(NodeHandle(3)))),
        ml: None,
    };
    let resolver = Resolver::with_backends(
        config(vec![StrategyKind::Structural, StrategyKind::Visual], 0),
        backends,
    )
    .unwrap();
    let visual = resolver.chain().iter().find(|s| s.name() == "visual").unwrap();
    assert!(!visual.supports_all());

    let mut ctx = PageContext::new(page(vec![
        node(2, "button", "Submit", json!({})),
        node(3, "div", "", json!({"class": "icon-cart"})),
    ]));
    let resolution = resolver
        .resolve_detailed(&mut ctx, "Click the shopping cart icon")
        .await
        .unwrap();
    assert_eq!(resolution.node, NodeHandle(3));

    let all = resolver.resolve_all(&ctx, "Click the shopping cart icon").await;
    assert!(!all.contains(&NodeHandle(3)));
}

#[tokio::test]
async fn hidden_and_disabled_nodes_are_never_returned() {
    let resolver = Resolver::new(config(vec![StrategyKind::Structural], 0)).unwrap();
    let mut ctx = PageContext::new(page(vec![
        json!({"id": 1, "tag": "button", "text": "Delete", "state": {"hidden": true},
               "rect": {"x": 0, "y": 0, "width": 80, "height": 30}}),
        json!({"id": 2, "tag": "button", "text": "Delete", "state": {"disabled": true},
               "rect": {"x": 0, "y": 40, "width": 80, "height": 30}}),
        node(3, "button", "Delete", json!({})),
    ]));
    assert_eq!(
        resolver.resolve(&mut ctx, "Click the Delete button").await.unwrap(),
        NodeHandle(3)
    );
}

#[tokio::test]
async fn position_picks_among_visible_matches() {
    let resolver = Resolver::new(config(vec![StrategyKind::Structural], 0)).unwrap();
    let rows = || {
        page(vec![
            node(1, "button", "Delete", json!({})),
            node(2, "button", "Delete", json!({})),
            node(3, "button", "Delete", json!({})),
        ])
    };

    let mut ctx = PageContext::new(rows());
    assert_eq!(
        resolver.resolve(&mut ctx, "Click the last Delete button").await.unwrap(),
        NodeHandle(3)
    );
    let mut ctx = PageContext::new(rows());
    assert_eq!(
        resolver.resolve(&mut ctx, "Click the first Delete button").await.unwrap(),
        NodeHandle(1)
    );
}

#[tokio::test]
async fn resolution_is_deterministic() {
    let resolver = Resolver::new(ResolverConfig::default()).unwrap();
    let mut ctx = PageContext::new(submit_page());
    let options = ResolveOptions::new().bypass_cache();
    let mut seen = Vec::new();
    for _ in 0..5 {
        let r = resolver
            .resolve_with(&mut ctx, "Click the Submit button", &options)
            .await
            .unwrap();
        seen.push((r.node, r.score));
    }
    assert!(seen.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn resolve_all_ranks_and_deduplicates() {
    let resolver = Resolver::new(config(
        vec![StrategyKind::Structural, StrategyKind::Heuristic],
        0,
    ))
    .unwrap();
    let ctx = PageContext::new(submit_page());

    let all = resolver.resolve_all(&ctx, "Click on the blue Submit button").await;
    assert_eq!(all[0], NodeHandle(3));
    assert!(all.contains(&NodeHandle(2)));
    let mut unique = all.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), all.len());

    assert!(resolver.resolve_all(&ctx, "Click the Frobnicate widget").await.is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let err = Resolver::new(ResolverConfig {
        fuzzy_match_threshold: 0.0,
        ..Default::default()
    });
    assert!(err.is_err());

    // Only strategies without a detector: nothing usable remains.
    let err = Resolver::new(config(vec![StrategyKind::Visual, StrategyKind::Ml], 0));
    assert!(err.is_err());
}
