use std::panic::{catch_unwind, AssertUnwindSafe};

use anyhow::{anyhow, Result};
use pulldown_cmark::{html, Options, Parser};

use crate::text::{is_markdown, normalize};

/// Escape text into minimal HTML, preserving line breaks.
///
/// Always succeeds; the output is safe to hand to a rich-text viewer.
pub fn text_to_html(text: &str) -> String {
    let text = normalize(text);
    escape_html(&text).replace('\n', "<br>")
}

/// Convert Markdown to HTML with tables, footnotes, strikethrough and
/// task-list extensions enabled. Any rendering failure degrades to the
/// plain-escaped output of [`text_to_html`]; the call never raises.
pub fn markdown_to_html(text: &str) -> String {
    render_with(text, markdown_renderer)
}

/// Render the prompt shown at dialog construction, dispatching on the
/// Markdown classifier's verdict.
pub fn render_prompt(text: &str) -> String {
    if is_markdown(text) {
        markdown_to_html(text)
    } else {
        text_to_html(text)
    }
}

/// Run `renderer` over normalized text, falling back to the plain escaper
/// when it fails. This is the seam that keeps rendering total: worst case
/// is visually degraded output, never a crash.
fn render_with(text: &str, renderer: impl Fn(&str) -> Result<String>) -> String {
    let normalized = normalize(text);
    match renderer(&normalized) {
        Ok(html) => html,
        Err(_) => escape_html(&normalized).replace('\n', "<br>"),
    }
}

fn markdown_renderer(text: &str) -> Result<String> {
    catch_unwind(AssertUnwindSafe(|| {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(text, options);
        let mut out = String::new();
        html::push_html(&mut out, parser);
        out
    }))
    .map_err(|_| anyhow!("markdown renderer failed"))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;

    #[test]
    fn plain_text_escapes_metacharacters_and_breaks_lines() {
        assert_eq!(text_to_html("<b>&\n"), "&lt;b&gt;&amp;<br>");
    }

    #[test]
    fn plain_text_escapes_quotes() {
        assert_eq!(text_to_html(r#"a "b" 'c'"#), "a &quot;b&quot; &#x27;c&#x27;");
    }

    #[test]
    fn plain_text_normalizes_before_escaping() {
        assert_eq!(text_to_html(r"one\ntwo"), "one<br>two");
    }

    #[test]
    fn markdown_renders_headings_and_emphasis() {
        let html = markdown_to_html("# Title\n\nsome **bold** text");
        assert!(html.contains("<h1>Title</h1>"), "html: {html}");
        assert!(html.contains("<strong>bold</strong>"), "html: {html}");
    }

    #[test]
    fn markdown_renders_tables_extension() {
        let html = markdown_to_html("| a | b |\n| - | - |\n| 1 | 2 |");
        assert!(html.contains("<table>"), "html: {html}");
    }

    #[test]
    fn failed_renderer_falls_back_to_plain_output() {
        let input = "# Title\n<tag> & text";
        let degraded = render_with(input, |_| bail!("renderer unavailable"));
        assert_eq!(degraded, text_to_html(input));
    }

    #[test]
    fn prompt_rendering_dispatches_on_classifier() {
        assert_eq!(render_prompt("plain <text>\nno markup"), "plain &lt;text&gt;<br>no markup");
        assert!(render_prompt("# Title\n- item").contains("<h1>Title</h1>"));
    }
}
