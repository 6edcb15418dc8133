use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Custom deserializer for attribute maps that drops null values.
/// Drivers commonly report missing attributes as `null`.
fn deserialize_nullable_string_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: BTreeMap<String, Option<String>> = BTreeMap::deserialize(deserializer)?;
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| v.map(|val| (k, val)))
        .collect())
}

/// Opaque reference to one runtime node, stable for the lifetime of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHandle(pub u32);

impl NodeHandle {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Euclidean distance between the two centers.
    pub fn distance_to(&self, other: &Rect) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
    }

    /// True if `inner` lies completely inside `self`.
    pub fn contains(&self, inner: &Rect) -> bool {
        inner.x >= self.x
            && inner.y >= self.y
            && inner.x + inner.width <= self.x + self.width
            && inner.y + inner.height <= self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Cheap introspected facts about one node, as read from the live page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeFacts {
    pub handle: NodeHandle,
    /// Lower-case tag name ("button", "input", "a", ...).
    pub tag: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string_map")]
    pub attributes: BTreeMap<String, String>,
    /// Text content of the node, descendants included, whitespace collapsed.
    #[serde(default)]
    pub text: String,
    /// Current value of a form control, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub visible: bool,
    pub enabled: bool,
    #[serde(default)]
    pub rect: Rect,
}

impl NodeFacts {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    fn attr_is(&self, key: &str, value: &str) -> bool {
        self.attr(key).is_some_and(|v| v.eq_ignore_ascii_case(value))
    }

    /// Lower-cased `type` attribute of inputs; browsers default it to "text".
    pub fn input_type(&self) -> Option<String> {
        match self.tag.as_str() {
            "input" => Some(
                self.attr("type")
                    .map(str::to_lowercase)
                    .unwrap_or_else(|| "text".into()),
            ),
            "button" => Some(
                self.attr("type")
                    .map(str::to_lowercase)
                    .unwrap_or_else(|| "submit".into()),
            ),
            _ => None,
        }
    }

    pub fn class(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    /// Explicit ARIA role, or the implicit role of the tag.
    pub fn role(&self) -> Option<String> {
        if let Some(role) = self.attr("role") {
            return Some(role.to_lowercase());
        }
        let implicit = match self.tag.as_str() {
            "button" => "button",
            "a" => "link",
            "textarea" => "textbox",
            "select" => "combobox",
            "img" => "img",
            "dialog" => "dialog",
            "form" => "form",
            "nav" => "navigation",
            "input" => match self.input_type().as_deref() {
                Some("checkbox") => "checkbox",
                Some("radio") => "radio",
                Some("button" | "submit" | "reset" | "image") => "button",
                Some("hidden") => return None,
                _ => "textbox",
            },
            _ => return None,
        };
        Some(implicit.to_string())
    }

    pub fn is_button_input(&self) -> bool {
        self.tag == "input"
            && matches!(
                self.input_type().as_deref(),
                Some("button" | "submit" | "reset")
            )
    }

    pub fn is_content_editable(&self) -> bool {
        self.attr_is("contenteditable", "true")
    }

    /// True for nodes a user can act on directly.
    pub fn is_interactive(&self) -> bool {
        match self.tag.as_str() {
            "a" | "button" | "select" | "textarea" => return true,
            "input" => return self.input_type().as_deref() != Some("hidden"),
            _ => {}
        }
        if self.is_content_editable() || self.attr("onclick").is_some() {
            return true;
        }
        if self.attr("tabindex").is_some_and(|t| t.trim() != "-1") {
            return true;
        }
        self.attr("role").is_some_and(|r| {
            matches!(
                r.to_lowercase().as_str(),
                "button"
                    | "link"
                    | "checkbox"
                    | "radio"
                    | "switch"
                    | "tab"
                    | "menuitem"
                    | "option"
                    | "combobox"
                    | "textbox"
                    | "searchbox"
            )
        })
    }

    /// The text a user would read off this node.
    ///
    /// Text content first, then the attributes that name controls without text.
    pub fn accessible_name(&self) -> &str {
        if !self.text.trim().is_empty() {
            return self.text.trim();
        }
        if let Some(label) = self.attr("aria-label").filter(|v| !v.trim().is_empty()) {
            return label.trim();
        }
        if self.is_button_input()
            && let Some(value) = self.attr("value").filter(|v| !v.trim().is_empty())
        {
            return value.trim();
        }
        for key in ["placeholder", "title", "alt", "name"] {
            if let Some(v) = self.attr(key).filter(|v| !v.trim().is_empty()) {
                return v.trim();
            }
        }
        ""
    }

    /// True if the control already holds a non-blank value.
    pub fn has_value(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeState {
    pub hidden: bool,
    pub disabled: bool,
    pub detached: bool,
}

/// One node of a captured page snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: u32,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_nullable_string_map")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub state: NodeState,
}

/// A flat, document-ordered capture of a rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
}
