//! Proximity strategy: nearest interactive node to a text anchor.

use crate::accessor::{PageAccessor, query_facts};
use pinpoint_common::{
    AccessorError, ElementKind, ElementQuery, NodeFacts, NodeHandle, StructuralQuery, TagSelector,
    TextMatch,
};
use tracing::debug;

const MAX_ANCHORS: usize = 5;
/// Candidates starting within this many pixels below the anchor get a bonus.
const BELOW_THRESHOLD_PX: f32 = 100.0;
/// Candidates starting within this many pixels right of the anchor get a bonus.
const RIGHT_THRESHOLD_PX: f32 = 300.0;
const BELOW_BONUS: f32 = 1000.0;
const RIGHT_BONUS: f32 = 500.0;
/// Inputs that already hold a value are unlikely targets.
const FILLED_PENALTY: f32 = 2000.0;

#[derive(Debug, Clone, Default)]
pub struct ProximityStrategy;

impl ProximityStrategy {
    pub fn new() -> Self {
        Self
    }

    /// The single nearest-scoring interactive node, if any.
    pub async fn find(
        &self,
        query: &ElementQuery,
        accessor: &dyn PageAccessor,
    ) -> Result<Vec<NodeFacts>, AccessorError> {
        Ok(nearest(query, accessor).await?.into_iter().collect())
    }
}

pub(crate) async fn nearest(
    query: &ElementQuery,
    accessor: &dyn PageAccessor,
) -> Result<Option<NodeFacts>, AccessorError> {
    let text = query.search_text();
    if text.is_empty() {
        return Ok(None);
    }

    let anchors = anchors(accessor, text).await?;
    if anchors.is_empty() {
        return Ok(None);
    }
    let anchor_ids: Vec<NodeHandle> = anchors.iter().map(|a| a.handle).collect();

    let interactive = query_facts(accessor, &StructuralQuery::Interactive).await?;
    let candidates = of_kind(
        interactive
            .into_iter()
            .filter(|f| f.visible && !anchor_ids.contains(&f.handle))
            .collect(),
        query.element_kind,
    );

    let mut best: Option<(f32, NodeFacts)> = None;
    for anchor in &anchors {
        for candidate in &candidates {
            let score = proximity_score(anchor, candidate);
            if best.as_ref().is_none_or(|(s, _)| score < *s) {
                best = Some((score, candidate.clone()));
            }
        }
    }

    if let Some((score, facts)) = &best {
        debug!(node = %facts.handle, score, "Proximity picked nearest node");
    }
    Ok(best.map(|(_, facts)| facts))
}

/// Visible nodes whose text contains `text`, in document order.
///
/// Ancestors of another anchor are dropped: their text contains the target
/// only because a descendant does.
async fn anchors(
    accessor: &dyn PageAccessor,
    text: &str,
) -> Result<Vec<NodeFacts>, AccessorError> {
    let found: Vec<NodeFacts> = query_facts(
        accessor,
        &StructuralQuery::text(&[TagSelector::any()], text, TextMatch::Contains),
    )
    .await?
    .into_iter()
    .filter(|f| f.visible && !f.rect.is_empty())
    .collect();

    let innermost: Vec<NodeFacts> = found
        .iter()
        .filter(|outer| {
            !found.iter().any(|inner| {
                inner.handle != outer.handle
                    && outer.rect.contains(&inner.rect)
                    && area(&inner.rect) < area(&outer.rect)
            })
        })
        .take(MAX_ANCHORS)
        .cloned()
        .collect();
    Ok(innermost)
}

fn area(rect: &pinpoint_common::Rect) -> f32 {
    rect.width * rect.height
}

fn of_kind(candidates: Vec<NodeFacts>, kind: ElementKind) -> Vec<NodeFacts> {
    if candidates.iter().any(|f| kind.matches(f)) {
        candidates.into_iter().filter(|f| kind.matches(f)).collect()
    } else {
        candidates
    }
}

/// Lower is better: center distance, less bonuses for sitting just below or
/// right of the anchor, plus a penalty for inputs that are already filled.
pub(crate) fn proximity_score(anchor: &NodeFacts, candidate: &NodeFacts) -> f32 {
    let mut score = anchor.rect.distance_to(&candidate.rect);
    let (ax, ay) = anchor.rect.center();
    let (cx, cy) = candidate.rect.center();
    let dy = cy - ay;
    let dx = cx - ax;
    if dy > 0.0 && dy < BELOW_THRESHOLD_PX {
        score -= BELOW_BONUS;
    }
    if dx > 0.0 && dx < RIGHT_THRESHOLD_PX {
        score -= RIGHT_BONUS;
    }
    if candidate.has_value() {
        score += FILLED_PENALTY;
    }
    score
}
