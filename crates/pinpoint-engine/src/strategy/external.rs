use crate::accessor::{PageAccessor, inspect_all};
use async_trait::async_trait;
use pinpoint_common::{AccessorError, ElementQuery, NodeFacts, NodeHandle};
use std::sync::Arc;

/// An optical or learned detector plugged in behind the visual/ML strategies.
#[async_trait]
pub trait DetectorBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether the detector may be asked for every match at once. Detectors
    /// that only produce a single best guess return false and are left out of
    /// `resolve_all`.
    fn supports_all(&self) -> bool {
        true
    }

    /// Propose nodes for the query, best guess first.
    async fn detect(
        &self,
        query: &ElementQuery,
        accessor: &dyn PageAccessor,
    ) -> Result<Vec<NodeHandle>, AccessorError>;
}

#[derive(Clone)]
pub struct ExternalStrategy {
    backend: Arc<dyn DetectorBackend>,
}

impl ExternalStrategy {
    pub fn new(backend: Arc<dyn DetectorBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn supports_all(&self) -> bool {
        self.backend.supports_all()
    }

    pub async fn find(
        &self,
        query: &ElementQuery,
        accessor: &dyn PageAccessor,
    ) -> Result<Vec<NodeFacts>, AccessorError> {
        let handles = self.backend.detect(query, accessor).await?;
        inspect_all(accessor, &handles).await
    }
}
