//! Structural strategy: typed queries against tags, text, attributes and roles.
//!
//! The strategy builds an ordered list of probes from the query and stops at
//! the first probe that yields a visible, enabled node. It returns everything
//! that probe found so the scorer compares like with like.

use super::label::{control_scope, form_group_controls, labelled_controls};
use crate::accessor::{PageAccessor, query_facts};
use pinpoint_common::text::{contains_normalized, fuzzy_match};
use pinpoint_common::{
    AccessorError, Action, ElementKind, ElementQuery, NodeFacts, StructuralQuery, TagSelector,
    TextMatch,
};
use std::fmt;
use tracing::{debug, trace};

const SPECIAL_CHARS: [char; 4] = ['+', '-', '*', '/'];

#[derive(Debug, Clone)]
enum Source {
    Query(StructuralQuery),
    LabelledControls(String),
    FormGroups(String),
}

#[derive(Debug, Clone)]
enum Refine {
    All,
    /// Accessible name contains the text, else fuzzily matches it.
    Named(String),
    /// Nodes of the kind if there are any, otherwise everything.
    OfKind(ElementKind),
    /// Interactive nodes if there are any, otherwise everything.
    PreferInteractive,
}

#[derive(Debug, Clone)]
struct Probe {
    source: Source,
    refine: Refine,
}

impl Probe {
    fn query(query: StructuralQuery) -> Self {
        Self {
            source: Source::Query(query),
            refine: Refine::All,
        }
    }

    fn refine(mut self, refine: Refine) -> Self {
        self.refine = refine;
        self
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Query(q) => write!(f, "{}", q),
            Source::LabelledControls(name) => write!(f, "label({})", name),
            Source::FormGroups(name) => write!(f, "form-group({})", name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StructuralStrategy {
    fuzzy_threshold: f64,
}

impl Default for StructuralStrategy {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl StructuralStrategy {
    pub fn new(fuzzy_threshold: f64) -> Self {
        Self { fuzzy_threshold }
    }

    pub async fn find(
        &self,
        query: &ElementQuery,
        accessor: &dyn PageAccessor,
    ) -> Result<Vec<NodeFacts>, AccessorError> {
        for probe in plan(query) {
            let found = self.run(&probe, accessor).await?;
            trace!(probe = %probe, count = found.len(), "Structural probe evaluated");
            if found.iter().any(|f| f.visible && f.enabled) {
                debug!(probe = %probe, count = found.len(), "Structural probe matched");
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }

    async fn run(
        &self,
        probe: &Probe,
        accessor: &dyn PageAccessor,
    ) -> Result<Vec<NodeFacts>, AccessorError> {
        let found = match &probe.source {
            Source::Query(q) => query_facts(accessor, q).await?,
            Source::LabelledControls(name) => labelled_controls(accessor, name).await?,
            Source::FormGroups(name) => form_group_controls(accessor, name).await?,
        };
        Ok(self.apply(&probe.refine, found))
    }

    fn apply(&self, refine: &Refine, found: Vec<NodeFacts>) -> Vec<NodeFacts> {
        match refine {
            Refine::All => found,
            Refine::Named(text) => {
                let containing: Vec<NodeFacts> = found
                    .iter()
                    .filter(|f| contains_normalized(f.accessible_name(), text))
                    .cloned()
                    .collect();
                if !containing.is_empty() {
                    return containing;
                }
                found
                    .into_iter()
                    .filter(|f| fuzzy_match(f.accessible_name(), text, self.fuzzy_threshold))
                    .collect()
            }
            Refine::OfKind(kind) => prefer(found, |f| kind.matches(f)),
            Refine::PreferInteractive => prefer(found, NodeFacts::is_interactive),
        }
    }
}

fn prefer(found: Vec<NodeFacts>, keep: impl Fn(&NodeFacts) -> bool) -> Vec<NodeFacts> {
    if found.iter().any(&keep) {
        found.into_iter().filter(|f| keep(f)).collect()
    } else {
        found
    }
}

fn is_concrete(kind: ElementKind) -> bool {
    !matches!(kind, ElementKind::Generic | ElementKind::Unknown)
}

fn wants_control(query: &ElementQuery) -> bool {
    matches!(
        query.element_kind,
        ElementKind::Input | ElementKind::Dropdown | ElementKind::Checkbox | ElementKind::Radio
    ) || matches!(query.action, Action::Type | Action::Select | Action::Check)
}

/// Probes in the order they are tried.
fn plan(query: &ElementQuery) -> Vec<Probe> {
    let text = query.search_text();
    let kind = query.element_kind;
    let mut probes = Vec::new();

    if text.is_empty() {
        if let Some(role) = kind.role() {
            probes.push(Probe::query(StructuralQuery::Role(role.to_string())));
        }
        if is_concrete(kind) {
            probes.push(Probe::query(StructuralQuery::Select(kind.tag_selectors())));
        }
        return probes;
    }

    if kind == ElementKind::Button {
        probes.extend(button_probes(text));
    }
    if wants_control(query) {
        probes.extend(field_probes(text, kind));
    }
    probes.extend(generic_probes(text, kind));
    probes
}

fn button_probes(text: &str) -> Vec<Probe> {
    let scope = ElementKind::Button.tag_selectors();
    let mut probes = vec![
        Probe::query(StructuralQuery::text(&scope, text, TextMatch::Exact)),
        Probe::query(StructuralQuery::text(&scope, text, TextMatch::Contains)),
        Probe::query(StructuralQuery::attribute(
            &[
                TagSelector::tag_attr("input", "type", "button"),
                TagSelector::tag_attr("input", "type", "submit"),
            ],
            "value",
            text,
            TextMatch::Contains,
        )),
        Probe::query(StructuralQuery::text(
            &[TagSelector::class("btn"), TagSelector::class("button")],
            text,
            TextMatch::Contains,
        )),
    ];

    if text.contains(SPECIAL_CHARS) {
        let cleaned = pinpoint_common::text::collapse_whitespace(&text.replace(SPECIAL_CHARS, " "));
        if !cleaned.is_empty() {
            probes.push(Probe::query(StructuralQuery::text(
                &scope,
                &cleaned,
                TextMatch::Contains,
            )));
        }
    }
    probes
}

fn field_probes(text: &str, kind: ElementKind) -> Vec<Probe> {
    let name = field_name(text);
    if name.is_empty() {
        return Vec::new();
    }
    let mut probes = vec![Probe {
        source: Source::LabelledControls(name.clone()),
        refine: Refine::OfKind(kind),
    }];
    for variant in field_variants(&name) {
        for attribute in ["placeholder", "name", "id", "aria-label"] {
            probes.push(Probe::query(StructuralQuery::attribute(
                &control_scope(),
                attribute,
                &variant,
                TextMatch::Contains,
            )));
        }
    }
    probes.push(Probe {
        source: Source::FormGroups(name),
        refine: Refine::OfKind(kind),
    });
    probes
}

fn generic_probes(text: &str, kind: ElementKind) -> Vec<Probe> {
    let scope = kind.tag_selectors();
    let text_refine = if is_concrete(kind) {
        Refine::All
    } else {
        Refine::PreferInteractive
    };
    let mut probes = vec![
        Probe::query(StructuralQuery::text(&scope, text, TextMatch::Exact))
            .refine(text_refine.clone()),
        Probe::query(StructuralQuery::text(&scope, text, TextMatch::Contains))
            .refine(text_refine),
    ];

    let ids = possible_ids(text);
    for id in &ids {
        probes.push(Probe::query(StructuralQuery::Id(id.clone())).refine(Refine::OfKind(kind)));
    }
    for id in &ids {
        probes.push(Probe::query(StructuralQuery::Name(id.clone())).refine(Refine::OfKind(kind)));
    }

    for mode in [TextMatch::Exact, TextMatch::Contains] {
        probes.push(
            Probe::query(StructuralQuery::attribute(
                &[TagSelector::any()],
                "aria-label",
                text,
                mode,
            ))
            .refine(Refine::OfKind(kind)),
        );
    }

    for pattern in class_patterns(kind, text) {
        probes.push(
            Probe::query(StructuralQuery::Select(vec![TagSelector::class(pattern)]))
                .refine(Refine::Named(text.to_string())),
        );
    }

    if let Some(role) = kind.role() {
        probes.push(
            Probe::query(StructuralQuery::Role(role.to_string()))
                .refine(Refine::Named(text.to_string())),
        );
    }
    probes
}

fn class_patterns(kind: ElementKind, text: &str) -> &'static [&'static str] {
    let lower = text.to_lowercase();
    if lower.contains("close") || lower == "x" {
        return &["close", "dismiss"];
    }
    match kind {
        ElementKind::Button => &["btn", "button", "submit"],
        ElementKind::Link => &["link", "nav"],
        ElementKind::Input => &["input", "field", "form-control"],
        _ => &[],
    }
}

/// Strip instruction words around a field name: "in the Email field" -> "Email".
pub(crate) fn field_name(text: &str) -> String {
    let mut name = text.trim().to_string();
    for prefix in ["enter", "type", "fill", "input", "in the", "in", "the"] {
        let matched = name
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            && name[prefix.len()..].starts_with(' ');
        if matched {
            name = name[prefix.len()..].trim().to_string();
        }
    }
    const SUFFIX: &str = " field";
    if let Some(cut) = name.len().checked_sub(SUFFIX.len())
        && name.get(cut..).is_some_and(|tail| tail.eq_ignore_ascii_case(SUFFIX))
    {
        name.truncate(cut);
    }
    name.trim().to_string()
}

/// Spellings a field name takes in attributes, deduplicated ignoring case.
pub(crate) fn field_variants(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();
    let mut variants = vec![
        name.to_string(),
        words.join("_"),
        words.join("-"),
        words.join(""),
    ];
    variants.retain(|v| !v.is_empty());
    let mut seen = std::collections::HashSet::new();
    variants.retain(|v| seen.insert(v.to_lowercase()));
    variants
}

/// Candidate `id`/`name` values for a piece of visible text.
pub(crate) fn possible_ids(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if SPECIAL_CHARS.contains(&c) || c.is_whitespace() {
                ' '
            } else {
                c
            }
        })
        .collect();
    let words: Vec<String> = cleaned.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
        return Vec::new();
    }
    let kebab = words.join("-");
    let mut ids = vec![
        words.join(" "),
        kebab.clone(),
        words.join("_"),
        words.join(""),
    ];
    if words.len() > 1 {
        let mut camel = words[0].clone();
        for w in &words[1..] {
            let mut chars = w.chars();
            if let Some(first) = chars.next() {
                camel.extend(first.to_uppercase());
                camel.push_str(chars.as_str());
            }
        }
        ids.push(camel);
    }
    ids.extend([
        format!("{}-btn", kebab),
        format!("{}-button", kebab),
        format!("btn-{}", kebab),
        format!("{}-link", kebab),
    ]);
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
    ids
}
