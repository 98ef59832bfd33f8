//! Text preprocessing for speech.
//!
//! Replies arrive as markdown and must not have their formatting characters
//! read aloud; dictation fragments arrive with ragged whitespace and must not
//! leak it into the staged input. Both cleanups live here.

/// Collapse runs of whitespace to single spaces and trim the edges.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markdown formatting from text, producing plain text suitable for an
/// utterance.
///
/// Handles:
/// - Fenced code blocks (```…```) → replaced with "Code omitted."
/// - Inline code (`…`) → unwrapped
/// - Headers (# …) → text only
/// - Bold / italic / strikethrough markers → removed
/// - Links \[text\](url) → text only
/// - Bullet / numbered lists → text only
/// - Blockquotes (> …) → text only
/// - Horizontal rules (---, ***, ___) → removed
/// - HTML tags → removed
#[must_use]
pub fn strip_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_code_block = false;
    let mut code_block_replaced = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            in_code_block = !in_code_block;
            code_block_replaced = false;
            continue;
        }

        if in_code_block {
            if !code_block_replaced {
                if !result.is_empty() {
                    result.push(' ');
                }
                result.push_str("Code omitted.");
                code_block_replaced = true;
            }
            continue;
        }

        if is_horizontal_rule(trimmed) {
            continue;
        }

        let processed = strip_line_markdown(line);
        let processed = processed.trim();
        if !processed.is_empty() {
            if !result.is_empty() {
                result.push(' ');
            }
            result.push_str(processed);
        }
    }

    collapse_whitespace(&result)
}

// ── Internal helpers ───────────────────────────────────────────────

/// Check if a line is a horizontal rule (---, ***, ___).
fn is_horizontal_rule(line: &str) -> bool {
    let chars: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    chars.len() >= 3 && chars.windows(2).all(|w| w[0] == w[1] && matches!(w[0], '-' | '*' | '_'))
}

/// Strip inline markdown from a single line.
fn strip_line_markdown(line: &str) -> String {
    let mut s = line.trim_start().to_string();

    while s.starts_with('>') {
        s = s.trim_start_matches('>').trim_start().to_string();
    }

    if s.starts_with('#') {
        s = s.trim_start_matches('#').trim_start().to_string();
    }

    s = strip_list_marker(&s);
    s = strip_links(&s);
    s = strip_inline_code(&s);
    s = strip_emphasis(&s);
    s = strip_html_tags(&s);

    s
}

fn strip_list_marker(line: &str) -> String {
    // Bullet: - item, * item, + item
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("+ "))
    {
        return rest.to_string();
    }

    // Numbered: 1. item, 2) item
    if let Some(pos) = line.find(|c: char| !c.is_ascii_digit()) {
        if pos > 0 {
            let after = &line[pos..];
            if let Some(rest) = after.strip_prefix(". ").or_else(|| after.strip_prefix(") ")) {
                return rest.to_string();
            }
        }
    }

    line.to_string()
}

fn strip_links(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '[' {
            let link_text: String = chars.by_ref().take_while(|&c| c != ']').collect();
            if chars.peek() == Some(&'(') {
                chars.next(); // consume '('
                let _url: String = chars.by_ref().take_while(|&c| c != ')').collect();
                result.push_str(&link_text);
                continue;
            }
            // Not a link, emit as-is
            result.push('[');
            result.push_str(&link_text);
            result.push(']');
        } else {
            result.push(c);
        }
    }

    result
}

fn strip_inline_code(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('`') {
        let after = &rest[open + 1..];
        if let Some(close) = after.find('`') {
            result.push_str(&rest[..open]);
            result.push_str(&after[..close]);
            rest = &after[close + 1..];
        } else {
            result.push_str(&rest[..open]);
            rest = after;
        }
    }
    result.push_str(rest);

    result
}

fn strip_emphasis(text: &str) -> String {
    // Standalone _ is left alone; it appears in identifiers more often than
    // as emphasis in chat replies.
    text.replace("**", "")
        .replace("__", "")
        .replace("~~", "")
        .replace('*', "")
}

fn strip_html_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        if let Some(close) = after.find('>') {
            result.push_str(&rest[..open]);
            rest = &after[close + 1..];
        } else {
            // Unclosed '<' is kept literally.
            result.push_str(&rest[..=open]);
            rest = after;
        }
    }
    result.push_str(rest);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_whitespace_squeezes_and_trims() {
        assert_eq!(collapse_whitespace("  what   is\tthe\nweather  "), "what is the weather");
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn strips_links_to_their_text() {
        assert_eq!(
            strip_markdown("Use the [Simplify App](https://www.simplifymoney.in/) today"),
            "Use the Simplify App today"
        );
    }

    #[test]
    fn strips_emphasis_and_headers() {
        assert_eq!(strip_markdown("# Advice\n**Save** *early* and ~~spend~~ invest"), "Advice Save early and spend invest");
    }

    #[test]
    fn strips_list_markers() {
        let text = "1. Buy index funds\n2) Keep an emergency fund\n- Avoid debt";
        assert_eq!(
            strip_markdown(text),
            "Buy index funds Keep an emergency fund Avoid debt"
        );
    }

    #[test]
    fn replaces_code_blocks() {
        let text = "Here:\n```\nlet x = 1;\nlet y = 2;\n```\nDone";
        assert_eq!(strip_markdown(text), "Here: Code omitted. Done");
    }

    #[test]
    fn drops_horizontal_rules_and_blockquotes() {
        assert_eq!(strip_markdown("> quoted\n---\nplain"), "quoted plain");
    }

    #[test]
    fn unwraps_inline_code() {
        assert_eq!(strip_markdown("run `cargo build` now"), "run cargo build now");
    }

    #[test]
    fn devanagari_passes_through_untouched() {
        assert_eq!(strip_markdown("**नमस्ते**, आप कैसे हैं?"), "नमस्ते, आप कैसे हैं?");
    }
}
