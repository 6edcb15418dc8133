//! Heuristic-pattern strategy.
//!
//! Three stages, first hit wins:
//! 1. common UI intents (create, login, submit, cancel, search, menu)
//! 2. search inside named page regions
//! 3. proximity to a text anchor

use super::proximity;
use crate::accessor::{PageAccessor, query_facts};
use pinpoint_common::text::{contains_normalized, contains_words, fuzzy_match};
use pinpoint_common::{
    AccessorError, ElementKind, ElementQuery, NodeFacts, Rect, StructuralQuery, TagSelector,
    TextMatch,
};
use std::sync::LazyLock;
use tracing::debug;

/// Similarity at which a target counts as a spelling of an intent variation.
const INTENT_SIMILARITY: f64 = 0.7;
const MAX_CONTAINERS_PER_REGION: usize = 3;

struct Intent {
    name: &'static str,
    variations: &'static [&'static str],
    tags: Vec<TagSelector>,
    classes: &'static [&'static str],
    attributes: &'static [&'static str],
    /// Containers in which a match is preferred.
    contexts: Vec<TagSelector>,
}

impl Intent {
    fn matches(&self, text: &str) -> bool {
        self.variations.iter().any(|v| names(text, v))
    }

    /// Variations the target actually names come first, the rest keep table order.
    fn ordered_variations(&self, text: &str) -> Vec<&'static str> {
        let (named, rest): (Vec<&'static str>, Vec<&'static str>) =
            self.variations.iter().copied().partition(|v| names(text, v));
        named.into_iter().chain(rest).collect()
    }

    fn probes(&self, text: &str) -> Vec<StructuralQuery> {
        let variations = self.ordered_variations(text);
        let mut probes = Vec::new();
        for tag in &self.tags {
            for variation in &variations {
                probes.push(StructuralQuery::text(
                    std::slice::from_ref(tag),
                    variation,
                    TextMatch::Contains,
                ));
                for attribute in self.attributes {
                    probes.push(StructuralQuery::attribute(
                        std::slice::from_ref(tag),
                        attribute,
                        variation,
                        TextMatch::Contains,
                    ));
                }
            }
        }
        for class in self.classes {
            for variation in &variations {
                probes.push(StructuralQuery::text(
                    &[TagSelector::class(class)],
                    variation,
                    TextMatch::Contains,
                ));
            }
        }
        probes
    }
}

fn names(text: &str, variation: &str) -> bool {
    contains_words(text, variation) || fuzzy_match(text, variation, INTENT_SIMILARITY)
}

static INTENTS: LazyLock<Vec<Intent>> = LazyLock::new(|| {
    vec![
        Intent {
            name: "create",
            variations: &["create", "add", "new", "+ create", "create new", "add new", "create a"],
            tags: vec![TagSelector::tag("button"), TagSelector::tag("a")],
            classes: &["btn", "button", "primary", "action"],
            attributes: &[],
            contexts: vec![],
        },
        Intent {
            name: "login",
            variations: &["login", "sign in", "signin", "log in", "authenticate"],
            tags: vec![TagSelector::tag("button"), TagSelector::tag("a")],
            classes: &[],
            attributes: &[],
            contexts: vec![],
        },
        Intent {
            name: "submit",
            variations: &["submit", "save", "confirm", "ok", "apply", "continue", "next"],
            tags: vec![
                TagSelector::tag("button"),
                TagSelector::tag_attr("input", "type", "submit"),
            ],
            classes: &[],
            attributes: &[],
            contexts: vec![
                TagSelector::tag("form"),
                TagSelector::tag("dialog"),
                TagSelector::attr("role", "dialog"),
                TagSelector::class("modal"),
                TagSelector::class("dialog"),
            ],
        },
        Intent {
            name: "cancel",
            variations: &["cancel", "close", "dismiss", "back", "no", "x", "×"],
            tags: vec![
                TagSelector::tag("button"),
                TagSelector::tag("a"),
                TagSelector::tag("span"),
            ],
            classes: &[],
            attributes: &["aria-label", "title"],
            contexts: vec![],
        },
        Intent {
            name: "search",
            variations: &["search", "find", "lookup", "query"],
            tags: vec![TagSelector::tag("input"), TagSelector::tag("button")],
            classes: &[],
            attributes: &["placeholder", "aria-label"],
            contexts: vec![],
        },
        Intent {
            name: "menu",
            variations: &["menu", "hamburger", "☰", "⋮", "more", "options"],
            tags: vec![
                TagSelector::tag("button"),
                TagSelector::tag("div"),
                TagSelector::tag("span"),
            ],
            classes: &[],
            attributes: &["aria-label", "role"],
            contexts: vec![],
        },
    ]
});

/// Page regions searched in order, each with the fragments that name it.
const REGIONS: [(&str, &[&str]); 6] = [
    ("header", &["header", "nav", "navigation", "navbar", "top-bar", "toolbar"]),
    ("form", &["form", "login", "signup", "register"]),
    ("modal", &["modal", "dialog", "popup", "overlay"]),
    ("footer", &["footer"]),
    ("sidebar", &["sidebar", "aside", "menu", "drawer"]),
    ("content", &["content", "main", "container", "wrapper"]),
];

#[derive(Debug, Clone)]
pub struct HeuristicStrategy {
    fuzzy_threshold: f64,
}

impl Default for HeuristicStrategy {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl HeuristicStrategy {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self { fuzzy_threshold }
    }

    pub async fn find(
        &self,
        query: &ElementQuery,
        accessor: &dyn PageAccessor,
    ) -> Result<Vec<NodeFacts>, AccessorError> {
        let text = query.search_text();

        if !text.is_empty() {
            for intent in INTENTS.iter().filter(|i| i.matches(text)) {
                let found = find_by_intent(intent, text, accessor).await?;
                if !found.is_empty() {
                    debug!(intent = intent.name, count = found.len(), "Matched UI intent");
                    return Ok(found);
                }
            }
        }

        if let Some(found) = self.find_in_regions(query, accessor).await? {
            return Ok(vec![found]);
        }

        Ok(proximity::nearest(query, accessor).await?.into_iter().collect())
    }

    async fn find_in_regions(
        &self,
        query: &ElementQuery,
        accessor: &dyn PageAccessor,
    ) -> Result<Option<NodeFacts>, AccessorError> {
        let text = query.search_text();
        let kind = query.element_kind;
        let concrete = !matches!(kind, ElementKind::Generic | ElementKind::Unknown);
        if text.is_empty() && !concrete {
            return Ok(None);
        }

        for (region, fragments) in REGIONS {
            for fragment in fragments {
                let containers = accessor
                    .query_all(&StructuralQuery::Region(fragment.to_string()))
                    .await?;
                for container in containers.into_iter().take(MAX_CONTAINERS_PER_REGION) {
                    if !text.is_empty() {
                        let mentions = query_facts(
                            accessor,
                            &StructuralQuery::within(
                                container,
                                StructuralQuery::text(
                                    &[TagSelector::any()],
                                    text,
                                    TextMatch::Contains,
                                ),
                            ),
                        )
                        .await?;
                        if let Some(hit) = mentions
                            .into_iter()
                            .find(|f| f.visible && accepts(kind, f))
                        {
                            debug!(region, fragment, node = %hit.handle, "Found in page region");
                            return Ok(Some(hit));
                        }
                    }

                    if concrete {
                        let typed = query_facts(
                            accessor,
                            &StructuralQuery::within(
                                container,
                                StructuralQuery::Select(kind.tag_selectors()),
                            ),
                        )
                        .await?;
                        if let Some(hit) = typed.into_iter().find(|f| {
                            f.visible
                                && (text.is_empty()
                                    || contains_normalized(f.accessible_name(), text)
                                    || fuzzy_match(
                                        f.accessible_name(),
                                        text,
                                        self.fuzzy_threshold,
                                    ))
                        }) {
                            debug!(region, fragment, node = %hit.handle, "Found kind in page region");
                            return Ok(Some(hit));
                        }
                    }
                }
            }
        }
        Ok(None)
    }
}

fn accepts(kind: ElementKind, facts: &NodeFacts) -> bool {
    match kind {
        ElementKind::Generic | ElementKind::Unknown => facts.is_interactive(),
        kind => kind.matches(facts),
    }
}

async fn find_by_intent(
    intent: &Intent,
    text: &str,
    accessor: &dyn PageAccessor,
) -> Result<Vec<NodeFacts>, AccessorError> {
    for probe in intent.probes(text) {
        let found = query_facts(accessor, &probe).await?;
        if !found.iter().any(|f| f.visible) {
            continue;
        }
        if intent.contexts.is_empty() {
            return Ok(found);
        }
        return prefer_in_context(found, &intent.contexts, accessor).await;
    }
    Ok(Vec::new())
}

/// Keep only nodes laid out inside one of the context containers, if any are.
async fn prefer_in_context(
    found: Vec<NodeFacts>,
    contexts: &[TagSelector],
    accessor: &dyn PageAccessor,
) -> Result<Vec<NodeFacts>, AccessorError> {
    let containers: Vec<Rect> = query_facts(accessor, &StructuralQuery::Select(contexts.to_vec()))
        .await?
        .into_iter()
        .filter(|c| c.visible)
        .map(|c| c.rect)
        .collect();
    let inside: Vec<NodeFacts> = found
        .iter()
        .filter(|f| containers.iter().any(|c| c.contains(&f.rect)))
        .cloned()
        .collect();
    Ok(if inside.is_empty() { found } else { inside })
}
