//! A [`PageAccessor`] over a captured page snapshot.
//!
//! Drivers that can dump the rendered tree (or tests that build one with
//! `serde_json::json!`) get full structural query support without a browser.

use crate::accessor::PageAccessor;
use async_trait::async_trait;
use pinpoint_common::text::{collapse_whitespace, contains_normalized, equals_normalized};
use pinpoint_common::{
    AccessorError, NodeFacts, NodeHandle, PageSnapshot, SnapshotNode, StructuralQuery,
    TagSelector, TextMatch,
};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug)]
pub struct SnapshotAccessor {
    page: RwLock<Page>,
}

#[derive(Debug)]
struct Page {
    snapshot: PageSnapshot,
    /// Node id to position in `snapshot.nodes`.
    index: HashMap<u32, usize>,
    children: HashMap<u32, Vec<u32>>,
    /// Detached after capture, on top of what the snapshot marks.
    detached: HashSet<u32>,
}

impl SnapshotAccessor {
    pub fn new(snapshot: PageSnapshot) -> Self {
        Self {
            page: RwLock::new(Page::new(snapshot)),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, AccessorError> {
        let snapshot: PageSnapshot = serde_json::from_str(json)?;
        Ok(Self::new(snapshot))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, AccessorError> {
        let snapshot: PageSnapshot = serde_json::from_value(value)?;
        Ok(Self::new(snapshot))
    }

    /// Remove a node and its subtree from the document, as a re-render would.
    pub async fn detach(&self, node: NodeHandle) {
        let mut page = self.page.write().await;
        page.detached.insert(node.0);
        debug!(node = %node, "Detached snapshot node");
    }

    /// Swap in a new capture, e.g. after navigation.
    pub async fn replace(&self, snapshot: PageSnapshot) {
        let mut page = self.page.write().await;
        *page = Page::new(snapshot);
    }

    pub async fn url(&self) -> String {
        self.page.read().await.snapshot.url.clone()
    }
}

impl Page {
    fn new(snapshot: PageSnapshot) -> Self {
        let mut index = HashMap::with_capacity(snapshot.nodes.len());
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for (i, node) in snapshot.nodes.iter().enumerate() {
            index.insert(node.id, i);
            if let Some(parent) = node.parent {
                children.entry(parent).or_default().push(node.id);
            }
        }
        Self {
            snapshot,
            index,
            children,
            detached: HashSet::new(),
        }
    }

    fn node(&self, id: u32) -> Option<&SnapshotNode> {
        self.index.get(&id).map(|&i| &self.snapshot.nodes[i])
    }

    fn ancestors(&self, id: u32) -> impl Iterator<Item = &SnapshotNode> {
        let mut next = self.node(id).and_then(|n| n.parent);
        let mut seen = HashSet::new();
        std::iter::from_fn(move || {
            let id = next?;
            if !seen.insert(id) {
                return None;
            }
            let node = self.node(id)?;
            next = node.parent;
            Some(node)
        })
    }

    fn is_attached(&self, id: u32) -> bool {
        let detached = |n: &SnapshotNode| n.state.detached || self.detached.contains(&n.id);
        match self.node(id) {
            Some(node) => !detached(node) && !self.ancestors(id).any(detached),
            None => false,
        }
    }

    fn is_visible(&self, node: &SnapshotNode) -> bool {
        !node.state.hidden
            && !node.rect.is_empty()
            && !self.ancestors(node.id).any(|a| a.state.hidden)
    }

    fn is_descendant(&self, id: u32, container: u32) -> bool {
        self.ancestors(id).any(|a| a.id == container)
    }

    /// Own text plus the text of every descendant, in document order.
    fn text_content(&self, id: u32) -> String {
        let mut parts = Vec::new();
        self.collect_text(id, &mut parts, &mut HashSet::new());
        collapse_whitespace(&parts.join(" "))
    }

    fn collect_text<'a>(&'a self, id: u32, parts: &mut Vec<&'a str>, seen: &mut HashSet<u32>) {
        if !seen.insert(id) {
            return;
        }
        if let Some(text) = self.node(id).and_then(|n| n.text.as_deref()) {
            parts.push(text);
        }
        if let Some(children) = self.children.get(&id) {
            for &child in children {
                self.collect_text(child, parts, seen);
            }
        }
    }

    fn facts(&self, node: &SnapshotNode) -> NodeFacts {
        let attached = self.is_attached(node.id);
        NodeFacts {
            handle: NodeHandle(node.id),
            tag: node.tag.to_lowercase(),
            attributes: node.attributes.clone(),
            text: self.text_content(node.id),
            value: node.value.clone(),
            visible: attached && self.is_visible(node),
            enabled: !node.state.disabled && !node.attributes.contains_key("disabled"),
            rect: node.rect,
        }
    }

    fn attached_facts(&self) -> Vec<NodeFacts> {
        self.snapshot
            .nodes
            .iter()
            .filter(|n| self.is_attached(n.id))
            .map(|n| self.facts(n))
            .collect()
    }

    fn evaluate(&self, query: &StructuralQuery) -> Vec<NodeHandle> {
        let all = self.attached_facts();
        self.evaluate_over(query, &all)
    }

    fn evaluate_over(&self, query: &StructuralQuery, all: &[NodeFacts]) -> Vec<NodeHandle> {
        let pick = |keep: &dyn Fn(&NodeFacts) -> bool| -> Vec<NodeHandle> {
            all.iter().filter(|&f| keep(f)).map(|f| f.handle).collect()
        };

        match query {
            StructuralQuery::Text { scope, text, mode } => {
                pick(&|f| in_scope(scope, f) && text_matches(*mode, &f.text, text))
            }
            StructuralQuery::Role(role) => {
                pick(&|f| f.role().is_some_and(|r| r.eq_ignore_ascii_case(role)))
            }
            StructuralQuery::Id(id) => pick(&|f| f.attr("id") == Some(id.as_str())),
            StructuralQuery::Name(name) => pick(&|f| f.attr("name") == Some(name.as_str())),
            StructuralQuery::Attribute {
                scope,
                attribute,
                value,
                mode,
            } => pick(&|f| {
                in_scope(scope, f)
                    && f.attr(attribute)
                        .is_some_and(|actual| attribute_matches(*mode, actual, value))
            }),
            StructuralQuery::Select(selectors) => pick(&|f| selectors.iter().any(|s| s.matches(f))),
            StructuralQuery::Region(fragment) => pick(&|f| is_region(f, fragment)),
            StructuralQuery::Interactive => pick(&NodeFacts::is_interactive),
            StructuralQuery::Within { container, query } => {
                if !self.is_attached(container.0) {
                    return Vec::new();
                }
                self.evaluate_over(query, all)
                    .into_iter()
                    .filter(|h| self.is_descendant(h.0, container.0))
                    .collect()
            }
            StructuralQuery::FollowingSiblings { of, scope } => {
                let Some(node) = self.node(of.0) else {
                    return Vec::new();
                };
                let parent = node.parent;
                let Some(&position) = self.index.get(&of.0) else {
                    return Vec::new();
                };
                all.iter()
                    .filter(|f| {
                        self.index.get(&f.handle.0).is_some_and(|&i| i > position)
                            && self.node(f.handle.0).is_some_and(|n| n.parent == parent)
                            && in_scope(scope, f)
                    })
                    .map(|f| f.handle)
                    .collect()
            }
            StructuralQuery::Parent(node) => self
                .node(node.0)
                .and_then(|n| n.parent)
                .filter(|&p| self.is_attached(p))
                .map(NodeHandle)
                .into_iter()
                .collect(),
        }
    }
}

fn in_scope(scope: &[TagSelector], facts: &NodeFacts) -> bool {
    scope.is_empty() || scope.iter().any(|s| s.matches(facts))
}

fn text_matches(mode: TextMatch, actual: &str, needle: &str) -> bool {
    match mode {
        TextMatch::Exact => equals_normalized(actual, needle),
        TextMatch::Contains => contains_normalized(actual, needle),
    }
}

fn attribute_matches(mode: TextMatch, actual: &str, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return false;
    }
    match mode {
        TextMatch::Exact => actual.trim().eq_ignore_ascii_case(needle),
        TextMatch::Contains => actual.to_lowercase().contains(&needle.to_lowercase()),
    }
}

fn is_region(facts: &NodeFacts, fragment: &str) -> bool {
    let fragment = fragment.to_lowercase();
    if facts.tag == fragment || facts.role().is_some_and(|r| r == fragment) {
        return true;
    }
    let mentions = |key: &str| {
        facts
            .attr(key)
            .is_some_and(|v| v.to_lowercase().contains(&fragment))
    };
    mentions("id") || mentions("class")
}

#[async_trait]
impl PageAccessor for SnapshotAccessor {
    async fn page_identity(&self) -> Result<String, AccessorError> {
        Ok(self.url().await)
    }

    async fn query_all(&self, query: &StructuralQuery) -> Result<Vec<NodeHandle>, AccessorError> {
        let page = self.page.read().await;
        Ok(page.evaluate(query))
    }

    async fn inspect(&self, node: NodeHandle) -> Result<NodeFacts, AccessorError> {
        let page = self.page.read().await;
        let Some(snapshot_node) = page.node(node.0) else {
            return Err(AccessorError::Query(format!("unknown node {}", node)));
        };
        if !page.is_attached(node.0) {
            return Err(AccessorError::NodeDetached { id: node.0 });
        }
        Ok(page.facts(snapshot_node))
    }

    async fn is_attached(&self, node: NodeHandle) -> Result<bool, AccessorError> {
        Ok(self.page.read().await.is_attached(node.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> SnapshotAccessor {
        SnapshotAccessor::from_value(json!({
            "url": "https://app.test/login",
            "nodes": [
                {"id": 1, "tag": "form", "attributes": {"class": "login-form"}, "rect": {"x": 0, "y": 0, "width": 400, "height": 300}},
                {"id": 2, "tag": "label", "parent": 1, "attributes": {"for": "email"}, "text": "Email", "rect": {"x": 10, "y": 10, "width": 60, "height": 20}},
                {"id": 3, "tag": "input", "parent": 1, "attributes": {"id": "email", "name": "email"}, "rect": {"x": 10, "y": 40, "width": 200, "height": 20}},
                {"id": 4, "tag": "button", "parent": 1, "rect": {"x": 10, "y": 80, "width": 80, "height": 30}},
                {"id": 5, "tag": "span", "parent": 4, "text": "Sign in", "rect": {"x": 15, "y": 85, "width": 50, "height": 20}},
                {"id": 6, "tag": "button", "attributes": {"style": "display:none"}, "text": "Sign in", "state": {"hidden": true}},
                {"id": 7, "tag": "input", "attributes": {"type": "hidden", "name": "csrf"}}
            ]
        }))
        .unwrap()
    }

    fn ids(handles: Vec<NodeHandle>) -> Vec<u32> {
        handles.into_iter().map(NodeHandle::id).collect()
    }

    #[tokio::test]
    async fn text_includes_descendants() {
        let page = page();
        let found = page
            .query_all(&StructuralQuery::text(
                &[TagSelector::tag("button")],
                "sign in",
                TextMatch::Exact,
            ))
            .await
            .unwrap();
        assert_eq!(ids(found), vec![4, 6]);
        assert_eq!(page.inspect(NodeHandle(4)).await.unwrap().text, "Sign in");
    }

    #[tokio::test]
    async fn hidden_nodes_are_returned_but_not_visible() {
        let page = page();
        let facts = page.inspect(NodeHandle(6)).await.unwrap();
        assert!(!facts.visible);
        assert!(page.inspect(NodeHandle(4)).await.unwrap().visible);
    }

    #[tokio::test]
    async fn within_and_siblings() {
        let page = page();
        let inside = page
            .query_all(&StructuralQuery::within(
                NodeHandle(1),
                StructuralQuery::Select(vec![TagSelector::tag("input")]),
            ))
            .await
            .unwrap();
        assert_eq!(ids(inside), vec![3]);

        let after = page
            .query_all(&StructuralQuery::FollowingSiblings {
                of: NodeHandle(2),
                scope: vec![TagSelector::any()],
            })
            .await
            .unwrap();
        assert_eq!(ids(after), vec![3, 4]);

        let parent = page.query_all(&StructuralQuery::Parent(NodeHandle(5))).await.unwrap();
        assert_eq!(ids(parent), vec![4]);
    }

    #[tokio::test]
    async fn ids_names_roles_and_regions() {
        let page = page();
        let by_id = page.query_all(&StructuralQuery::Id("email".into())).await.unwrap();
        assert_eq!(ids(by_id), vec![3]);
        let by_role = page.query_all(&StructuralQuery::Role("textbox".into())).await.unwrap();
        assert_eq!(ids(by_role), vec![3]);
        let region = page.query_all(&StructuralQuery::Region("login".into())).await.unwrap();
        assert_eq!(ids(region), vec![1]);
        let interactive = page.query_all(&StructuralQuery::Interactive).await.unwrap();
        assert_eq!(ids(interactive), vec![3, 4, 6]);
    }

    #[tokio::test]
    async fn detached_subtrees_disappear() {
        let page = page();
        page.detach(NodeHandle(4)).await;
        assert!(!page.is_attached(NodeHandle(5)).await.unwrap());
        assert!(matches!(
            page.inspect(NodeHandle(4)).await,
            Err(AccessorError::NodeDetached { id: 4 })
        ));
        let buttons = page
            .query_all(&StructuralQuery::Select(vec![TagSelector::tag("button")]))
            .await
            .unwrap();
        assert_eq!(ids(buttons), vec![6]);
    }

    #[tokio::test]
    async fn replace_resets_page() {
        let page = page();
        page.detach(NodeHandle(3)).await;
        page.replace(PageSnapshot {
            url: "https://app.test/home".into(),
            title: String::new(),
            nodes: vec![],
        })
        .await;
        assert_eq!(page.page_identity().await.unwrap(), "https://app.test/home");
        assert!(page.query_all(&StructuralQuery::Interactive).await.unwrap().is_empty());
    }
}
