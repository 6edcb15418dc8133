use pinpoint_common::{Action, ElementKind, Position};
use pinpoint_parser::parse;

#[test]
fn test_parse_scenario_phrase() {
    let q = parse("Click on the blue Submit button");
    assert_eq!(q.action, Action::Click);
    assert_eq!(q.element_kind, ElementKind::Button);
    assert_eq!(q.target_text, "Submit");
    assert_eq!(q.color(), Some("blue"));
    assert_eq!(q.attributes.len(), 1);
    assert_eq!(q.original, "Click on the blue Submit button");
}

#[test]
fn test_parse_empty_input() {
    for input in ["", "   "] {
        let q = parse(input);
        assert_eq!(q.action, Action::Unknown);
        assert_eq!(q.element_kind, ElementKind::Unknown);
        assert_eq!(q.target_text, "");
        assert!(q.attributes.is_empty());
    }
}

#[test]
fn test_parse_unrecognised_phrase_is_generic() {
    let q = parse("Sign in");
    assert_eq!(q.element_kind, ElementKind::Generic);
    assert!(q.is_ambiguous());
    assert_eq!(q.target_text, "Sign in");
}

#[test]
fn test_typing_defaults_to_input() {
    let q = parse("Type hello");
    assert_eq!(q.action, Action::Type);
    assert_eq!(q.element_kind, ElementKind::Input);
    assert_eq!(q.target_text, "hello");
}

#[test]
fn test_quoted_text_is_preserved() {
    let q = parse("Click the \"Blue  Button\" link");
    assert_eq!(q.element_kind, ElementKind::Link);
    assert_eq!(q.target_text, "\"Blue  Button\"");
    assert_eq!(q.color(), None);
    assert_eq!(q.search_text(), "Blue  Button");
}

#[test]
fn test_consumed_tokens_never_leak_into_target() {
    let phrases = [
        "Click the red first Delete button",
        "Press the last green Save btn",
        "Select Canada from the left country dropdown",
    ];
    for phrase in phrases {
        let q = parse(phrase);
        let target = q.target_text.to_lowercase();
        for word in target.split_whitespace() {
            assert!(
                !matches!(
                    word,
                    "click" | "press" | "select" | "from" | "button" | "btn" | "dropdown"
                        | "red" | "green" | "first" | "last" | "left"
                ),
                "{:?} leaked {:?} into target {:?}",
                phrase,
                word,
                q.target_text
            );
        }
    }
}

#[test]
fn test_only_one_color_and_position_extracted() {
    let q = parse("Click the top blue red button");
    assert_eq!(q.color(), Some("blue"));
    assert_eq!(q.position(), Some(Position::Top));
    assert_eq!(q.target_text, "red");
}

#[test]
fn test_parse_is_deterministic() {
    let phrase = "Choose \"Express\" from the shipping select";
    assert_eq!(parse(phrase), parse(phrase));
}
