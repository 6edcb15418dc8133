#![allow(dead_code)]

use async_trait::async_trait;
use pinpoint_common::{AccessorError, NodeFacts, NodeHandle, StructuralQuery};
use pinpoint_engine::{PageAccessor, SnapshotAccessor};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const URL: &str = "https://app.test/";

/// A node laid out on a simple vertical grid, one row per id.
pub fn node(id: u32, tag: &str, text: &str, attributes: Value) -> Value {
    json!({
        "id": id,
        "tag": tag,
        "text": if text.is_empty() { Value::Null } else { json!(text) },
        "attributes": attributes,
        "rect": {"x": 10, "y": id * 40, "width": 120, "height": 30}
    })
}

pub fn child(id: u32, parent: u32, tag: &str, text: &str, attributes: Value) -> Value {
    let mut n = node(id, tag, text, attributes);
    n["parent"] = json!(parent);
    n
}

pub fn page(nodes: Vec<Value>) -> SnapshotAccessor {
    SnapshotAccessor::from_value(json!({"url": URL, "nodes": nodes})).unwrap()
}

/// Counts structural queries so tests can tell whether strategies ran.
pub struct CountingAccessor {
    pub inner: SnapshotAccessor,
    pub queries: Arc<AtomicUsize>,
}

impl CountingAccessor {
    pub fn new(inner: SnapshotAccessor) -> (Self, Arc<AtomicUsize>) {
        let queries = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                queries: queries.clone(),
            },
            queries,
        )
    }
}

#[async_trait]
impl PageAccessor for CountingAccessor {
    async fn page_identity(&self) -> Result<String, AccessorError> {
        self.inner.page_identity().await
    }

    async fn query_all(&self, query: &StructuralQuery) -> Result<Vec<NodeHandle>, AccessorError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query_all(query).await
    }

    async fn inspect(&self, node: NodeHandle) -> Result<NodeFacts, AccessorError> {
        self.inner.inspect(node).await
    }

    async fn is_attached(&self, node: NodeHandle) -> Result<bool, AccessorError> {
        self.inner.is_attached(node).await
    }
}

/// Every query fails.
pub struct BrokenAccessor;

#[async_trait]
impl PageAccessor for BrokenAccessor {
    async fn page_identity(&self) -> Result<String, AccessorError> {
        Err(AccessorError::Script("page crashed".into()))
    }

    async fn query_all(&self, _query: &StructuralQuery) -> Result<Vec<NodeHandle>, AccessorError> {
        Err(AccessorError::Script("page crashed".into()))
    }

    async fn inspect(&self, node: NodeHandle) -> Result<NodeFacts, AccessorError> {
        Err(AccessorError::NodeDetached { id: node.0 })
    }
}

/// Every query takes `delay` and finds nothing.
pub struct SlowAccessor {
    pub delay: Duration,
}

#[async_trait]
impl PageAccessor for SlowAccessor {
    async fn page_identity(&self) -> Result<String, AccessorError> {
        Ok(URL.into())
    }

    async fn query_all(&self, _query: &StructuralQuery) -> Result<Vec<NodeHandle>, AccessorError> {
        tokio::time::sleep(self.delay).await;
        Ok(Vec::new())
    }

    async fn inspect(&self, node: NodeHandle) -> Result<NodeFacts, AccessorError> {
        Err(AccessorError::NodeDetached { id: node.0 })
    }
}
