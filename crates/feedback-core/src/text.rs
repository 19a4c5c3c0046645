use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Escape pairs handled by [`normalize`], checked in this order at each
/// backslash position. `\\` comes last so a doubled backslash is consumed
/// as one literal backslash instead of swallowing the pair that follows.
const ESCAPE_PAIRS: [(char, char); 4] = [('n', '\n'), ('t', '\t'), ('r', '\r'), ('\\', '\\')];

/// Best-effort clean-up of incoming text before classification or rendering.
///
/// Callers frequently hand us text that crossed a JSON or CLI boundary and
/// picked up one extra layer of escaping on the way. The pass is:
/// 1. if the whole input parses as a JSON string literal, unwrap it;
/// 2. replace literal `\n`, `\t`, `\r`, `\\` pairs in a single
///    left-to-right scan (substituted output is never re-scanned);
/// 3. collapse `\r\n` and lone `\r` to `\n`.
///
/// Never fails; every fallback degrades to returning best-effort text.
pub fn normalize(text: &str) -> String {
    let text = match serde_json::from_str::<Value>(text) {
        Ok(Value::String(decoded)) => decoded,
        _ => text.to_string(),
    };

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                if let Some(&(_, replacement)) =
                    ESCAPE_PAIRS.iter().find(|(escaped, _)| *escaped == next)
                {
                    chars.next();
                    out.push(replacement);
                    continue;
                }
            }
        }
        out.push(ch);
    }

    out.replace("\r\n", "\n").replace('\r', "\n")
}

/// Heuristic line patterns that count as Markdown evidence. A line scores
/// at most one hit no matter how many patterns it matches.
const MARKDOWN_PATTERNS: [&str; 9] = [
    r"^#{1,6}\s+.+",    // headings
    r"\*\*.+?\*\*",     // bold
    r"\*.+?\*",         // italic *text*
    r"_.+?_",           // italic _text_
    r"`[^`]+`",         // inline code
    r"^\s*```",         // fenced code block
    r"^\s*>",           // blockquote
    r"^\s*[-*+]\s+",    // unordered list
    r"^\s*\d+\.\s+",    // ordered list
];

fn markdown_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        MARKDOWN_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("markdown heuristic pattern"))
            .collect()
    })
}

/// Heuristic check whether `text` likely contains Markdown.
///
/// Classifies true when at least two lines carry Markdown evidence, or when
/// any evidence exists and more than 10% of the lines carry it.
pub fn is_markdown(text: &str) -> bool {
    let text = normalize(text);
    if text.trim().is_empty() {
        return false;
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let hits = lines
        .iter()
        .filter(|line| {
            markdown_patterns()
                .iter()
                .any(|pattern| pattern.is_match(line))
        })
        .count();

    hits >= 2 || (hits > 0 && hits as f64 / lines.len() as f64 > 0.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unwraps_json_string_literal() {
        assert_eq!(normalize(r#""a\nb""#), "a\nb");
    }

    #[test]
    fn normalize_replaces_literal_escape_pairs() {
        assert_eq!(normalize(r"line1\nline2"), "line1\nline2");
        assert_eq!(normalize(r"col1\tcol2"), "col1\tcol2");
        assert_eq!(normalize(r"a\\b"), r"a\b");
    }

    #[test]
    fn normalize_collapses_line_endings() {
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn normalize_is_idempotent_on_normalized_text() {
        for input in [
            "plain text",
            r"line1\nline2",
            r#""a\nb""#,
            "a\r\nb\rc",
            "# Title\n**bold** text",
            "",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input {input:?}");
        }
    }

    #[test]
    fn normalize_leaves_unknown_escapes_alone() {
        assert_eq!(normalize(r"path\x1b"), r"path\x1b");
    }

    #[test]
    fn normalize_ignores_non_string_json_documents() {
        assert_eq!(normalize("42"), "42");
        assert_eq!(normalize("[1, 2]"), "[1, 2]");
    }

    #[test]
    fn detects_markdown_with_multiple_features() {
        assert!(is_markdown("# Title\n**bold** text\n- item"));
    }

    #[test]
    fn detects_markdown_by_density() {
        // One feature line out of three is above the 10% density floor.
        assert!(is_markdown("```\nlet x = 1;\nmore plain text"));
    }

    #[test]
    fn plain_text_is_not_markdown() {
        assert!(!is_markdown("just plain text\nno markup here"));
    }

    #[test]
    fn empty_and_whitespace_are_not_markdown() {
        assert!(!is_markdown(""));
        assert!(!is_markdown("   "));
    }

    #[test]
    fn classifier_normalizes_before_matching() {
        assert!(is_markdown(r"# Title\n- item one\n- item two"));
    }

    #[test]
    fn one_line_scores_at_most_one_hit() {
        // Bold plus inline code on a single line is still a single feature.
        assert!(!is_markdown(
            "**bold** and `code` here\nplain\nplain\nplain\nplain\nplain\nplain\nplain\nplain\nplain"
        ));
    }
}
