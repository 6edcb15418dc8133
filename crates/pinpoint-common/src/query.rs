use crate::protocol::NodeFacts;
use crate::structural::TagSelector;
use crate::text::normalize_text;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What the caller intends to do with the element once found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Click,
    Type,
    Select,
    Check,
    #[default]
    Unknown,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Click => "click",
            Action::Type => "type",
            Action::Select => "select",
            Action::Check => "check",
            Action::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of element a phrase asks for.
///
/// `Unknown` is reserved for empty input; a phrase that names no kind is `Generic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Button,
    Link,
    Input,
    Checkbox,
    Radio,
    Dropdown,
    Image,
    Tab,
    Menu,
    Generic,
    #[default]
    Unknown,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Button => "button",
            ElementKind::Link => "link",
            ElementKind::Input => "input",
            ElementKind::Checkbox => "checkbox",
            ElementKind::Radio => "radio",
            ElementKind::Dropdown => "dropdown",
            ElementKind::Image => "image",
            ElementKind::Tab => "tab",
            ElementKind::Menu => "menu",
            ElementKind::Generic => "generic",
            ElementKind::Unknown => "unknown",
        }
    }

    /// True for the kinds a user types into.
    pub fn is_field(&self) -> bool {
        matches!(self, ElementKind::Input | ElementKind::Dropdown)
    }

    /// ARIA role that identifies this kind, if one exists.
    pub fn role(&self) -> Option<&'static str> {
        match self {
            ElementKind::Button => Some("button"),
            ElementKind::Link => Some("link"),
            ElementKind::Input => Some("textbox"),
            ElementKind::Checkbox => Some("checkbox"),
            ElementKind::Radio => Some("radio"),
            ElementKind::Dropdown => Some("combobox"),
            ElementKind::Image => Some("img"),
            ElementKind::Tab => Some("tab"),
            ElementKind::Menu => Some("menu"),
            ElementKind::Generic | ElementKind::Unknown => None,
        }
    }

    /// Tag/role selectors that scope text searches for this kind.
    pub fn tag_selectors(&self) -> Vec<TagSelector> {
        match self {
            ElementKind::Button => vec![
                TagSelector::tag("button"),
                TagSelector::tag_attr("input", "type", "submit"),
                TagSelector::tag_attr("input", "type", "button"),
                TagSelector::attr("role", "button"),
            ],
            ElementKind::Link => vec![TagSelector::tag("a"), TagSelector::attr("role", "link")],
            ElementKind::Input => vec![
                TagSelector::tag("input"),
                TagSelector::tag("textarea"),
                TagSelector::attr("role", "textbox"),
            ],
            ElementKind::Checkbox => vec![
                TagSelector::tag_attr("input", "type", "checkbox"),
                TagSelector::attr("role", "checkbox"),
            ],
            ElementKind::Radio => vec![
                TagSelector::tag_attr("input", "type", "radio"),
                TagSelector::attr("role", "radio"),
            ],
            ElementKind::Dropdown => vec![
                TagSelector::tag("select"),
                TagSelector::attr("role", "combobox"),
                TagSelector::attr("role", "listbox"),
            ],
            ElementKind::Image => vec![
                TagSelector::tag("img"),
                TagSelector::tag_attr("input", "type", "image"),
                TagSelector::attr("role", "img"),
            ],
            ElementKind::Tab => vec![TagSelector::attr("role", "tab")],
            ElementKind::Menu => vec![
                TagSelector::attr("role", "menu"),
                TagSelector::attr("role", "menuitem"),
                TagSelector::tag("nav"),
            ],
            ElementKind::Generic | ElementKind::Unknown => vec![
                TagSelector::tag("button"),
                TagSelector::tag("a"),
                TagSelector::tag("input"),
                TagSelector::tag("select"),
                TagSelector::tag("textarea"),
                TagSelector::tag("label"),
                TagSelector::tag("li"),
                TagSelector::tag("span"),
                TagSelector::tag("div"),
                TagSelector::attr("role", "button"),
                TagSelector::attr("role", "link"),
            ],
        }
    }

    /// True when the node's runtime tag or role corresponds to this kind.
    pub fn matches(&self, facts: &NodeFacts) -> bool {
        let role = facts.role();
        let role = role.as_deref();
        let input_type = facts.input_type();
        let input_type = input_type.as_deref();
        match self {
            ElementKind::Button => {
                facts.tag == "button" || facts.is_button_input() || role == Some("button")
            }
            ElementKind::Link => facts.tag == "a" || role == Some("link"),
            ElementKind::Input => {
                facts.tag == "textarea"
                    || facts.is_content_editable()
                    || matches!(role, Some("textbox" | "searchbox"))
                    || (facts.tag == "input"
                        && !matches!(
                            input_type,
                            Some(
                                "checkbox"
                                    | "radio"
                                    | "button"
                                    | "submit"
                                    | "reset"
                                    | "image"
                                    | "hidden"
                            )
                        ))
            }
            ElementKind::Checkbox => matches!(role, Some("checkbox" | "switch")),
            ElementKind::Radio => role == Some("radio"),
            ElementKind::Dropdown => {
                facts.tag == "select" || matches!(role, Some("combobox" | "listbox"))
            }
            ElementKind::Image => {
                facts.tag == "img" || input_type == Some("image") || role == Some("img")
            }
            ElementKind::Tab => role == Some("tab"),
            ElementKind::Menu => matches!(role, Some("menu" | "menuitem" | "menubar")),
            ElementKind::Generic | ElementKind::Unknown => false,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    First,
    Last,
    Top,
    Bottom,
    Left,
    Right,
}

impl Position {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "first" => Some(Position::First),
            "last" => Some(Position::Last),
            "top" => Some(Position::Top),
            "bottom" => Some(Position::Bottom),
            "left" => Some(Position::Left),
            "right" => Some(Position::Right),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::First => "first",
            Position::Last => "last",
            Position::Top => "top",
            Position::Bottom => "bottom",
            Position::Left => "left",
            Position::Right => "right",
        }
    }
}

/// Structured intent extracted from a natural-language phrase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementQuery {
    /// The phrase exactly as the caller wrote it.
    pub original: String,
    pub action: Action,
    pub element_kind: ElementKind,
    pub target_text: String,
    /// Modifier tokens: `color` and `position`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Text to type, or the option to choose for select actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ElementQuery {
    pub fn new(original: &str) -> Self {
        Self {
            original: original.to_string(),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.element_kind = kind;
        self
    }

    pub fn with_target(mut self, text: &str) -> Self {
        self.target_text = text.to_string();
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    pub fn color(&self) -> Option<&str> {
        self.attributes.get("color").map(String::as_str)
    }

    pub fn position(&self) -> Option<Position> {
        self.attributes.get("position").and_then(|p| Position::parse(p))
    }

    /// Target text with one layer of enclosing quotes removed.
    pub fn search_text(&self) -> &str {
        let text = self.target_text.trim();
        for quote in ['"', '\''] {
            if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
                return text[1..text.len() - 1].trim();
            }
        }
        text
    }

    /// True when neither an action nor a concrete kind could be determined.
    pub fn is_ambiguous(&self) -> bool {
        self.action == Action::Unknown
            && matches!(self.element_kind, ElementKind::Generic | ElementKind::Unknown)
    }

    /// Cache key component: the normalized original phrase.
    pub fn cache_key(&self) -> String {
        normalize_text(&self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{NodeHandle, Rect};

    fn facts(tag: &str, attrs: &[(&str, &str)]) -> NodeFacts {
        NodeFacts {
            handle: NodeHandle(1),
            tag: tag.into(),
            attributes: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: String::new(),
            value: None,
            visible: true,
            enabled: true,
            rect: Rect::default(),
        }
    }

    #[test]
    fn kind_matches_runtime_nodes() {
        assert!(ElementKind::Button.matches(&facts("button", &[])));
        assert!(ElementKind::Button.matches(&facts("input", &[("type", "submit")])));
        assert!(ElementKind::Button.matches(&facts("div", &[("role", "button")])));
        assert!(!ElementKind::Button.matches(&facts("a", &[])));
        assert!(ElementKind::Input.matches(&facts("input", &[])));
        assert!(ElementKind::Input.matches(&facts("input", &[("type", "email")])));
        assert!(!ElementKind::Input.matches(&facts("input", &[("type", "checkbox")])));
        assert!(ElementKind::Checkbox.matches(&facts("input", &[("type", "checkbox")])));
        assert!(ElementKind::Dropdown.matches(&facts("select", &[])));
        assert!(!ElementKind::Generic.matches(&facts("button", &[])));
    }

    #[test]
    fn search_text_strips_quotes() {
        let q = ElementQuery::new("x").with_target("\"Sign up\"");
        assert_eq!(q.search_text(), "Sign up");
        let q = ElementQuery::new("x").with_target("Sign up");
        assert_eq!(q.search_text(), "Sign up");
    }

    #[test]
    fn cache_key_is_normalized() {
        let a = ElementQuery::new("Click  the Submit button!");
        let b = ElementQuery::new("click the submit BUTTON");
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn serializes_snake_case() {
        let q = ElementQuery::new("Click on the blue Submit button")
            .with_kind(ElementKind::Button)
            .with_target("Submit")
            .with_attribute("color", "blue");
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["element_kind"], "button");
        assert_eq!(json["action"], "unknown");
        assert_eq!(json["attributes"]["color"], "blue");
        assert!(json.get("value").is_none());
    }
}
