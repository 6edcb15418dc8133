use pinpoint_common::{ElementQuery, NodeHandle};
use serde::Serialize;
use thiserror::Error;

/// A successful resolution and how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub node: NodeHandle,
    /// Strategy that produced the node; `None` for cache hits.
    pub strategy: Option<String>,
    pub score: Option<i32>,
    /// Search passes run. Backoff sleeps are one fewer.
    pub attempts: u32,
    pub from_cache: bool,
}

/// Final failure after the strategy chain and all retries, or after timeout.
#[derive(Debug, Clone, Error)]
#[error("{} '{phrase}' (strategies tried: {})", headline(.timed_out), join(.attempted))]
pub struct ElementNotFoundError {
    pub phrase: String,
    pub query: ElementQuery,
    /// Strategy names in the order they were first tried.
    pub attempted: Vec<String>,
    pub timed_out: bool,
}

fn headline(timed_out: &bool) -> &'static str {
    if *timed_out {
        "Timed out resolving"
    } else {
        "Element not found for"
    }
}

fn join(attempted: &[String]) -> String {
    if attempted.is_empty() {
        "none".into()
    } else {
        attempted.join(", ")
    }
}

impl ElementNotFoundError {
    pub fn code(&self) -> &'static str {
        if self.timed_out {
            "RESOLUTION_TIMEOUT"
        } else {
            "ELEMENT_NOT_FOUND"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_lists_strategies() {
        let err = ElementNotFoundError {
            phrase: "Click Foo".into(),
            query: ElementQuery::new("Click Foo"),
            attempted: vec!["structural".into(), "heuristic".into()],
            timed_out: false,
        };
        assert_eq!(
            err.to_string(),
            "Element not found for 'Click Foo' (strategies tried: structural, heuristic)"
        );
        assert_eq!(err.code(), "ELEMENT_NOT_FOUND");
    }

    #[test]
    fn timeout_message() {
        let err = ElementNotFoundError {
            phrase: "x".into(),
            query: ElementQuery::new("x"),
            attempted: vec![],
            timed_out: true,
        };
        assert_eq!(err.to_string(), "Timed out resolving 'x' (strategies tried: none)");
    }
}
