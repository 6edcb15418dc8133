use crate::protocol::{NodeFacts, NodeHandle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single tag/attribute/class filter, the subset of CSS the strategies need.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TagSelector {
    pub tag: Option<String>,
    pub attribute: Option<(String, String)>,
    pub class_fragment: Option<String>,
}

impl TagSelector {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            ..Default::default()
        }
    }

    pub fn tag_attr(tag: &str, attr: &str, value: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            attribute: Some((attr.to_string(), value.to_string())),
            class_fragment: None,
        }
    }

    pub fn attr(attr: &str, value: &str) -> Self {
        Self {
            attribute: Some((attr.to_string(), value.to_string())),
            ..Default::default()
        }
    }

    /// Matches nodes whose class list contains `fragment` as a substring.
    pub fn class(fragment: &str) -> Self {
        Self {
            class_fragment: Some(fragment.to_string()),
            ..Default::default()
        }
    }

    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, facts: &NodeFacts) -> bool {
        if let Some(tag) = &self.tag
            && !facts.tag.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        if let Some((key, value)) = &self.attribute {
            let actual = match facts.attr(key) {
                Some(v) => v.to_string(),
                // `type` has a browser default even when absent
                None if key == "type" => match facts.input_type() {
                    Some(t) => t,
                    None => return false,
                },
                None => return false,
            };
            if !actual.eq_ignore_ascii_case(value) {
                return false;
            }
        }
        if let Some(fragment) = &self.class_fragment
            && !facts
                .class()
                .to_lowercase()
                .contains(&fragment.to_lowercase())
        {
            return false;
        }
        true
    }
}

impl fmt::Display for TagSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wrote = false;
        if let Some(tag) = &self.tag {
            write!(f, "{}", tag)?;
            wrote = true;
        }
        if let Some((key, value)) = &self.attribute {
            write!(f, "[{}=\"{}\"]", key, value)?;
            wrote = true;
        }
        if let Some(fragment) = &self.class_fragment {
            write!(f, "[class*=\"{}\"]", fragment)?;
            wrote = true;
        }
        if !wrote {
            write!(f, "*")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextMatch {
    /// Whole text equals the needle, ignoring case and punctuation.
    Exact,
    /// Text contains the needle, ignoring case.
    Contains,
}

/// Structural queries a page accessor must evaluate.
///
/// Results are always returned in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuralQuery {
    /// Nodes matching any selector in `scope` whose text content matches.
    /// An empty scope matches every tag.
    Text {
        scope: Vec<TagSelector>,
        text: String,
        mode: TextMatch,
    },
    /// Nodes with the given explicit or implicit role.
    Role(String),
    /// Node with the exact `id` attribute.
    Id(String),
    /// Nodes with the exact `name` attribute.
    Name(String),
    /// Nodes matching `scope` whose `attribute` matches `value`.
    Attribute {
        scope: Vec<TagSelector>,
        attribute: String,
        value: String,
        mode: TextMatch,
    },
    /// Union of tag selectors.
    Select(Vec<TagSelector>),
    /// Containers whose tag or role equals the fragment, or whose id or class
    /// mentions it.
    Region(String),
    /// Every node a user can act on directly.
    Interactive,
    /// Evaluate `query` restricted to descendants of `container`.
    Within {
        container: NodeHandle,
        query: Box<StructuralQuery>,
    },
    /// Later siblings of `of` matching `scope`.
    FollowingSiblings {
        of: NodeHandle,
        scope: Vec<TagSelector>,
    },
    /// The parent of a node, if any.
    Parent(NodeHandle),
}

impl StructuralQuery {
    pub fn select(selectors: &[TagSelector]) -> Self {
        StructuralQuery::Select(selectors.to_vec())
    }

    pub fn text(scope: &[TagSelector], text: &str, mode: TextMatch) -> Self {
        StructuralQuery::Text {
            scope: scope.to_vec(),
            text: text.to_string(),
            mode,
        }
    }

    pub fn attribute(scope: &[TagSelector], attribute: &str, value: &str, mode: TextMatch) -> Self {
        StructuralQuery::Attribute {
            scope: scope.to_vec(),
            attribute: attribute.to_string(),
            value: value.to_string(),
            mode,
        }
    }

    pub fn within(container: NodeHandle, query: StructuralQuery) -> Self {
        StructuralQuery::Within {
            container,
            query: Box::new(query),
        }
    }
}

fn join(selectors: &[TagSelector]) -> String {
    if selectors.is_empty() {
        return "*".into();
    }
    selectors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for StructuralQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralQuery::Text { scope, text, mode } => {
                let op = match mode {
                    TextMatch::Exact => "text=",
                    TextMatch::Contains => "text*=",
                };
                write!(f, "{} :{}\"{}\"", join(scope), op, text)
            }
            StructuralQuery::Role(role) => write!(f, "[role={}]", role),
            StructuralQuery::Id(id) => write!(f, "#{}", id),
            StructuralQuery::Name(name) => write!(f, "[name=\"{}\"]", name),
            StructuralQuery::Attribute {
                scope,
                attribute,
                value,
                mode,
            } => {
                let op = match mode {
                    TextMatch::Exact => "=",
                    TextMatch::Contains => "*=",
                };
                write!(f, "{} [{}{}\"{}\"]", join(scope), attribute, op, value)
            }
            StructuralQuery::Select(selectors) => write!(f, "{}", join(selectors)),
            StructuralQuery::Region(fragment) => write!(f, "region({})", fragment),
            StructuralQuery::Interactive => write!(f, ":interactive"),
            StructuralQuery::Within { container, query } => write!(f, "{} >> {}", container, query),
            StructuralQuery::FollowingSiblings { of, scope } => {
                write!(f, "{} ~ {}", of, join(scope))
            }
            StructuralQuery::Parent(node) => write!(f, "{} :parent", node),
        }
    }
}
