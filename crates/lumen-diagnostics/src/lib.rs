//! Lumen Diagnostics
//!
//! Suggestion helpers consulted by the lexer, parser, and validator when
//! they format diagnostics: Levenshtein-based keyword suggestions and a
//! fixed table of "false friends" — vocabulary users carry over from
//! other UI ecosystems that has a Lumen equivalent.
//!
//! # Example
//!
//! ```
//! use lumen_diagnostics::closest;
//!
//! let keywords = ["layout", "button", "state"];
//! assert_eq!(closest("layot", &keywords), Some("layout"));
//! assert_eq!(closest("zzzzzz", &keywords), None);
//! ```

/// Levenshtein edit distance between two short strings.
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Maximum acceptable distance for a suggestion, scaled by word length.
/// Short words get a tight threshold so `fn` never suggests `on` noise.
fn max_distance(word: &str) -> usize {
    match word.chars().count() {
        0..=3 => 1,
        4..=6 => 2,
        _ => 3,
    }
}

/// Find the closest candidate within the distance threshold.
///
/// Ties break on distance, then candidate length, then spelling, so the
/// result is deterministic regardless of candidate order.
pub fn closest<'a>(word: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let word = word.trim();
    if word.is_empty() {
        return None;
    }

    candidates
        .iter()
        .filter(|c| !c.is_empty() && **c != word)
        .map(|c| (edit_distance(word, c), *c))
        .filter(|(d, _)| *d <= max_distance(word))
        .min_by(|(da, a), (db, b)| da.cmp(db).then(a.len().cmp(&b.len())).then(a.cmp(b)))
        .map(|(_, c)| c)
}

/// Tokens commonly brought over from other UI frameworks, mapped to a
/// hint naming the Lumen construct.
const FALSE_FRIENDS: &[(&str, &str)] = &[
    ("useState", "reactive values are declared with `state name: type = value`"),
    ("setState", "assign to the state binding directly, e.g. `count = count + 1`"),
    ("useEffect", "side effects go in `watch name:` blocks or `on mount:`"),
    ("useMemo", "computed values are declared with `derived name = expr`"),
    ("computed", "computed values are declared with `derived name = expr`"),
    ("onClick", "actions attach with an arrow, e.g. `button \"Save\" -> save()`"),
    ("onChange", "watch a binding with `watch name:` instead of a change handler"),
    ("componentDidMount", "startup logic goes in an `on mount:` block"),
    ("componentWillUnmount", "teardown logic goes in an `on destroy:` block"),
    ("ngOnInit", "startup logic goes in an `on mount:` block"),
    ("ngIf", "conditional rendering uses `if cond:` with an indented block"),
    ("v-if", "conditional rendering uses `if cond:` with an indented block"),
    ("v-show", "use `show cond:` around the elements to toggle"),
    ("ngFor", "repeat elements with `for item in items:`"),
    ("v-for", "repeat elements with `for item in items:`"),
    ("className", "style classes are set with the `class=` property"),
    ("div", "generic containers are written `layout col:` or `layout row:`"),
    ("span", "inline text is written `text \"...\"`"),
    ("img", "images are written `image \"src\"`"),
    ("href", "links are written `link \"label\" to=\"/path\"`"),
    (";", "statements end at the newline; semicolons are not used"),
    ("{", "blocks are opened with `:` and indentation, not braces"),
    ("}", "blocks are closed by dedenting, not with `}`"),
];

/// Look up a false-friend hint for a token borrowed from another ecosystem.
pub fn framework_hint(word: &str) -> Option<&'static str> {
    FALSE_FRIENDS
        .iter()
        .find(|(from, _)| *from == word)
        .map(|(_, hint)| *hint)
}

/// Format the standard suggestion suffix for an unknown word, combining
/// the closest-keyword lookup with the false-friend table. Returns an
/// empty string when neither has anything to say.
pub fn suggestion_suffix(word: &str, candidates: &[&str]) -> String {
    if let Some(hint) = framework_hint(word) {
        return format!(" ({hint})");
    }
    match closest(word, candidates) {
        Some(kw) => format!(" (did you mean '{kw}'?)"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const KEYWORDS: &[&str] = &[
        "page", "component", "state", "derived", "layout", "button", "text", "watch",
    ];

    // =========================================================================
    // Edit distance
    // =========================================================================

    #[test]
    fn test_distance_identical() {
        assert_eq!(edit_distance("layout", "layout"), 0);
    }

    #[test]
    fn test_distance_one_deletion() {
        assert_eq!(edit_distance("layot", "layout"), 1);
    }

    #[test]
    fn test_distance_substitution_and_insertion() {
        assert_eq!(edit_distance("derved", "derived"), 1);
        assert_eq!(edit_distance("stat", "state"), 1);
    }

    #[test]
    fn test_distance_empty() {
        assert_eq!(edit_distance("", "state"), 5);
    }

    // =========================================================================
    // Closest keyword
    // =========================================================================

    #[test]
    fn test_closest_simple_typo() {
        assert_eq!(closest("layot", KEYWORDS), Some("layout"));
    }

    #[test]
    fn test_closest_transposition() {
        assert_eq!(closest("sttae", KEYWORDS), Some("state"));
    }

    #[test]
    fn test_closest_no_match() {
        assert_eq!(closest("xqzwv", KEYWORDS), None);
    }

    #[test]
    fn test_closest_exact_word_excluded() {
        // An exact spelling is not a "suggestion"
        assert_eq!(closest("state", &["state"]), None);
    }

    #[test]
    fn test_closest_empty_word() {
        assert_eq!(closest("", KEYWORDS), None);
    }

    #[test]
    fn test_closest_short_word_tight_threshold() {
        // Distance 2 from a 2-char word is above the threshold
        assert_eq!(closest("fx", &["for"]), None);
    }

    #[test]
    fn test_closest_deterministic_tie_break() {
        // "tex" is distance 1 from both "text" and a hypothetical "te";
        // shorter candidate wins after equal distance
        assert_eq!(closest("watc", &["watch", "match"]), Some("watch"));
        assert_eq!(closest("watc", &["match", "watch"]), Some("watch"));
    }

    // =========================================================================
    // False friends
    // =========================================================================

    #[test]
    fn test_hint_use_state() {
        let hint = framework_hint("useState").unwrap();
        assert!(hint.contains("state"));
    }

    #[test]
    fn test_hint_on_click() {
        let hint = framework_hint("onClick").unwrap();
        assert!(hint.contains("->"));
    }

    #[test]
    fn test_hint_v_for() {
        let hint = framework_hint("v-for").unwrap();
        assert!(hint.contains("for item in items"));
    }

    #[test]
    fn test_hint_semicolon() {
        assert!(framework_hint(";").unwrap().contains("newline"));
    }

    #[test]
    fn test_hint_braces() {
        assert!(framework_hint("{").unwrap().contains("indentation"));
        assert!(framework_hint("}").unwrap().contains("dedenting"));
    }

    #[test]
    fn test_hint_unknown() {
        assert_eq!(framework_hint("flurble"), None);
    }

    // =========================================================================
    // Combined suffix
    // =========================================================================

    #[test]
    fn test_suffix_prefers_false_friend() {
        let s = suggestion_suffix("ngIf", KEYWORDS);
        assert!(s.contains("if cond:"));
    }

    #[test]
    fn test_suffix_falls_back_to_closest() {
        assert_eq!(
            suggestion_suffix("layot", KEYWORDS),
            " (did you mean 'layout'?)"
        );
    }

    #[test]
    fn test_suffix_empty_when_nothing_close() {
        assert_eq!(suggestion_suffix("xqzwv", KEYWORDS), "");
    }
}
