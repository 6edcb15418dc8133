use async_trait::async_trait;
use pinpoint_common::{AccessorError, NodeFacts, NodeHandle, StructuralQuery};
use std::sync::Arc;
use tracing::debug;

/// The live page as the engine sees it.
///
/// Implementations wrap a browser-automation driver. The engine only locates;
/// it never navigates or performs input through this trait.
#[async_trait]
pub trait PageAccessor: Send + Sync {
    /// Identity of the current page, normally its URL.
    async fn page_identity(&self) -> Result<String, AccessorError>;

    /// Evaluate a structural query. Results are in document order; no match is
    /// an empty list, not an error.
    async fn query_all(&self, query: &StructuralQuery) -> Result<Vec<NodeHandle>, AccessorError>;

    /// Read tag, attributes, text, visibility, enablement and geometry of a node.
    async fn inspect(&self, node: NodeHandle) -> Result<NodeFacts, AccessorError>;

    /// Whether the node is still part of the document.
    async fn is_attached(&self, _node: NodeHandle) -> Result<bool, AccessorError> {
        Ok(true)
    }
}

#[async_trait]
impl<T: PageAccessor + ?Sized> PageAccessor for Arc<T> {
    async fn page_identity(&self) -> Result<String, AccessorError> {
        (**self).page_identity().await
    }

    async fn query_all(&self, query: &StructuralQuery) -> Result<Vec<NodeHandle>, AccessorError> {
        (**self).query_all(query).await
    }

    async fn inspect(&self, node: NodeHandle) -> Result<NodeFacts, AccessorError> {
        (**self).inspect(node).await
    }

    async fn is_attached(&self, node: NodeHandle) -> Result<bool, AccessorError> {
        (**self).is_attached(node).await
    }
}

/// Query and inspect in one go.
///
/// Nodes that detach between the query and the inspection are skipped.
pub async fn query_facts(
    accessor: &dyn PageAccessor,
    query: &StructuralQuery,
) -> Result<Vec<NodeFacts>, AccessorError> {
    let handles = accessor.query_all(query).await?;
    inspect_all(accessor, &handles).await
}

pub async fn inspect_all(
    accessor: &dyn PageAccessor,
    handles: &[NodeHandle],
) -> Result<Vec<NodeFacts>, AccessorError> {
    let mut facts = Vec::with_capacity(handles.len());
    for &handle in handles {
        match accessor.inspect(handle).await {
            Ok(f) => facts.push(f),
            Err(AccessorError::NodeDetached { id }) => {
                debug!(node = id, "Node detached before inspection, skipping");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(facts)
}

/// Keep the first occurrence of every node.
pub fn dedup_facts(facts: Vec<NodeFacts>) -> Vec<NodeFacts> {
    let mut seen = std::collections::HashSet::new();
    facts
        .into_iter()
        .filter(|f| seen.insert(f.handle))
        .collect()
}
