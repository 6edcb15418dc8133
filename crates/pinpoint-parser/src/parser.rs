use crate::vocab::{ACTION_RULES, COLOR, Capture, KIND_RULES, LEADING_ARTICLE, POSITION};
use pinpoint_common::{Action, ElementKind, ElementQuery, Position};
use regex::{Match, Regex};
use std::ops::Range;
use tracing::debug;

/// Parse a natural-language phrase into an [`ElementQuery`].
///
/// Never fails. Phrases the vocabularies do not cover degrade to a generic
/// query whose target is the whole phrase.
pub fn parse(text: &str) -> ElementQuery {
    let original = text.trim();
    let mut query = ElementQuery::new(original);
    if original.is_empty() {
        return query;
    }

    let mut working = original.to_string();

    if let Some((action, value, span)) = extract_action(&working) {
        query.action = action;
        query.value = value.map(|v| strip_quotes(&v).to_string());
        working.replace_range(span, " ");
    }

    let mut kind = None;
    for rule in KIND_RULES.iter() {
        if first_unquoted(&rule.pattern, &working).is_some() {
            kind = Some(rule.kind);
            working = remove_unquoted(&rule.pattern, &working, |_| true);
            break;
        }
    }
    query.element_kind = match kind {
        Some(kind) => kind,
        None if query.action == Action::Type => ElementKind::Input,
        None => ElementKind::Generic,
    };

    if let Some(token) = first_unquoted(&COLOR, &working).map(|m| m.as_str().to_lowercase()) {
        working = remove_unquoted(&COLOR, &working, |m| m.eq_ignore_ascii_case(&token));
        query.attributes.insert("color".into(), token);
    }

    if let Some(token) = first_unquoted(&POSITION, &working).map(|m| m.as_str().to_lowercase())
        && let Some(position) = Position::parse(&token)
    {
        working = remove_unquoted(&POSITION, &working, |m| m.eq_ignore_ascii_case(&token));
        query
            .attributes
            .insert("position".into(), position.as_str().to_string());
    }

    query.target_text = residual(&working);

    debug!(
        phrase = original,
        action = %query.action,
        kind = %query.element_kind,
        target = %query.target_text,
        "Parsed element query"
    );
    if query.is_ambiguous() {
        debug!(phrase = original, "No action or element kind recognised, using the whole phrase");
    }

    query
}

fn extract_action(text: &str) -> Option<(Action, Option<String>, Range<usize>)> {
    let spans = quoted_spans(text);
    for rule in ACTION_RULES.iter() {
        for caps in rule.pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if in_spans(&spans, whole.start()) {
                continue;
            }
            // "check box" names a kind, not a check action
            if rule.action == Action::Check && next_word_is(&text[whole.end()..], "box") {
                continue;
            }
            let value = match rule.capture {
                Capture::Value => caps.get(1).map(|m| m.as_str().trim().to_string()),
                Capture::None => None,
            };
            return Some((rule.action, value, whole.range()));
        }
    }
    None
}

fn next_word_is(rest: &str, word: &str) -> bool {
    rest.split_whitespace()
        .next()
        .is_some_and(|w| w.eq_ignore_ascii_case(word))
}

/// Byte ranges of balanced quoted runs, quotes included.
///
/// A quote only opens at a word start, so apostrophes inside words are ignored.
fn quoted_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut open: Option<(char, usize)> = None;
    let mut prev: Option<char> = None;
    for (i, c) in text.char_indices() {
        match open {
            Some((quote, start)) if c == quote => {
                spans.push(start..i + c.len_utf8());
                open = None;
            }
            Some(_) => {}
            None if (c == '"' || c == '\'') && prev.is_none_or(|p| !p.is_alphanumeric()) => {
                open = Some((c, i));
            }
            None => {}
        }
        prev = Some(c);
    }
    spans
}

fn in_spans(spans: &[Range<usize>], idx: usize) -> bool {
    spans.iter().any(|s| s.contains(&idx))
}

fn first_unquoted<'t>(pattern: &Regex, text: &'t str) -> Option<Match<'t>> {
    let spans = quoted_spans(text);
    pattern.find_iter(text).find(|m| !in_spans(&spans, m.start()))
}

/// Replace every unquoted match accepted by `keep` with a single space.
fn remove_unquoted(pattern: &Regex, text: &str, keep: impl Fn(&str) -> bool) -> String {
    let spans = quoted_spans(text);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in pattern.find_iter(text) {
        if in_spans(&spans, m.start()) || !keep(m.as_str()) {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        out.push(' ');
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Collapse whitespace outside quoted runs; quoted runs are kept verbatim.
fn collapse_unquoted(text: &str) -> String {
    let spans = quoted_spans(text);
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for (i, c) in text.char_indices() {
        if !in_spans(&spans, i) && c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

fn residual(text: &str) -> String {
    let mut target = collapse_unquoted(text);
    loop {
        let stripped = LEADING_ARTICLE.replace(&target, "").into_owned();
        if stripped == target {
            break;
        }
        target = stripped;
    }
    target
        .trim_end_matches(['.', ',', '!', '?', ';', ':'])
        .trim()
        .to_string()
}

fn strip_quotes(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_spans_skip_apostrophes() {
        let text = "Click the user's \"Save 'draft'\" button";
        let spans = quoted_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(&text[spans[0].clone()], "\"Save 'draft'\"");
    }

    #[test]
    fn removal_leaves_quoted_tokens() {
        let out = remove_unquoted(&COLOR, "red \"red\" Red", |m| m.eq_ignore_ascii_case("red"));
        assert_eq!(collapse_unquoted(&out), "\"red\"");
    }

    #[test]
    fn collapse_preserves_quoted_whitespace() {
        assert_eq!(collapse_unquoted("  a   \"b   c\"  d "), "a \"b   c\" d");
    }

    #[test]
    fn residual_strips_repeated_articles_and_punctuation() {
        assert_eq!(residual("  the a Submit. "), "Submit");
        assert_eq!(residual("the A"), "A");
    }

    #[test]
    fn strip_quotes_only_when_balanced() {
        assert_eq!(strip_quotes("\"USA\""), "USA");
        assert_eq!(strip_quotes("'USA"), "'USA");
    }
}
