//! Fixed vocabularies for action, kind and modifier extraction.
//!
//! Every table is ordered; the first entry with an unquoted match wins.

use lazy_static::lazy_static;
use pinpoint_common::{Action, ElementKind};
use regex::Regex;

/// How an action phrasing captures its value, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    None,
    /// Group 1 holds the text to type or the option to pick.
    Value,
}

pub struct ActionRule {
    pub pattern: Regex,
    pub action: Action,
    pub capture: Capture,
}

pub struct KindRule {
    pub pattern: Regex,
    pub kind: ElementKind,
}

fn rule(pattern: &str, action: Action, capture: Capture) -> ActionRule {
    ActionRule {
        pattern: Regex::new(pattern).unwrap(),
        action,
        capture,
    }
}

fn kind(pattern: &str, kind: ElementKind) -> KindRule {
    KindRule {
        pattern: Regex::new(pattern).unwrap(),
        kind,
    }
}

// A value is either a quoted run or the shortest plain run before the keyword.
const VALUE: &str = r#"("[^"]*"|'[^']*'|.+?)"#;

lazy_static! {
    pub static ref ACTION_RULES: Vec<ActionRule> = vec![
        rule(r"(?i)\b(?:click|tap)\s+(?:on\s+)?(?:the\s+)?", Action::Click, Capture::None),
        rule(r"(?i)\bpress\s+(?:on\s+)?(?:the\s+)?", Action::Click, Capture::None),
        rule(
            &format!(r"(?i)\b(?:enter|type)\s+{}\s+in(?:to)?\s+(?:the\s+)?", VALUE),
            Action::Type,
            Capture::Value,
        ),
        rule(r"(?i)\bfill\s+(?:in\s+)?(?:the\s+)?", Action::Type, Capture::None),
        rule(
            &format!(r"(?i)\b(?:select|choose)\s+{}\s+from\s+(?:the\s+)?", VALUE),
            Action::Select,
            Capture::Value,
        ),
        rule(r"(?i)\b(?:check|tick)\s+(?:the\s+)?", Action::Check, Capture::None),
        rule(r"(?i)\b(?:enter|type|input)\s+(?:in\s+)?(?:the\s+)?", Action::Type, Capture::None),
    ];

    /// Compound keywords come before their single-word prefixes.
    pub static ref KIND_RULES: Vec<KindRule> = vec![
        kind(r"(?i)\bradio\s+buttons?\b", ElementKind::Radio),
        kind(r"(?i)\bcheck\s*box(?:es)?\b", ElementKind::Checkbox),
        kind(r"(?i)\b(?:text\s*box|text\s*area)\b", ElementKind::Input),
        kind(r"(?i)\b(?:combo\s*box|list\s*box|drop\s*-?\s*down)\b", ElementKind::Dropdown),
        kind(r"(?i)\b(?:buttons?|btn)\b", ElementKind::Button),
        kind(r"(?i)\b(?:links?|href|anchor|hyperlink)\b", ElementKind::Link),
        kind(r"(?i)\b(?:input|fields?|box)\b", ElementKind::Input),
        kind(r"(?i)\b(?:radio|option)\b", ElementKind::Radio),
        kind(r"(?i)\bselect\b", ElementKind::Dropdown),
        kind(r"(?i)\b(?:image|img|picture|photo)\b", ElementKind::Image),
        kind(r"(?i)\btab\b", ElementKind::Tab),
        kind(r"(?i)\bmenu\b", ElementKind::Menu),
    ];

    pub static ref COLOR: Regex =
        Regex::new(r"(?i)\b(red|blue|green|yellow|orange|purple|black|white|gray|grey)\b").unwrap();

    pub static ref POSITION: Regex =
        Regex::new(r"(?i)\b(first|last|top|bottom|left|right)\b").unwrap();

    pub static ref LEADING_ARTICLE: Regex = Regex::new(r"(?i)^(?:the|a|an)\s+").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_kinds_precede_prefixes() {
        let first = KIND_RULES
            .iter()
            .find(|r| r.pattern.is_match("radio button"))
            .unwrap();
        assert_eq!(first.kind, ElementKind::Radio);

        let first = KIND_RULES
            .iter()
            .find(|r| r.pattern.is_match("remember check box"))
            .unwrap();
        assert_eq!(first.kind, ElementKind::Checkbox);
    }

    #[test]
    fn kind_keywords_respect_word_boundaries() {
        let tab = KIND_RULES
            .iter()
            .find(|r| r.kind == ElementKind::Tab)
            .unwrap();
        assert!(tab.pattern.is_match("Settings tab"));
        assert!(!tab.pattern.is_match("table"));
        let button = KIND_RULES
            .iter()
            .find(|r| r.kind == ElementKind::Button)
            .unwrap();
        assert!(!button.pattern.is_match("buttonless"));
    }

    #[test]
    fn type_rule_captures_quoted_value() {
        let rule = &ACTION_RULES[2];
        let caps = rule
            .pattern
            .captures("Type \"log in now\" into the search box")
            .unwrap();
        assert_eq!(&caps[1], "\"log in now\"");
    }

    #[test]
    fn check_does_not_match_checkbox() {
        let check = ACTION_RULES
            .iter()
            .find(|r| r.action == Action::Check)
            .unwrap();
        assert!(!check.pattern.is_match("checkbox"));
        assert!(check.pattern.is_match("Check the terms"));
    }
}
