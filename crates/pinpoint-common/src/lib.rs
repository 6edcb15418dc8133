pub mod candidate;
pub mod error;
pub mod protocol;
pub mod query;
pub mod structural;
pub mod text;

pub use candidate::{Candidate, ScoredCandidate, number_candidates, sort_ranked};
pub use error::AccessorError;
pub use protocol::{NodeFacts, NodeHandle, NodeState, PageSnapshot, Rect, SnapshotNode};
pub use query::{Action, ElementKind, ElementQuery, Position};
pub use structural::{StructuralQuery, TagSelector, TextMatch};
