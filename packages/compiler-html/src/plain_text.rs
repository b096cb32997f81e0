//! Plain-text alternative for mail clients that do not render HTML.

use crate::interpolate::interpolate;
use mailforge_model::{Block, BlockContent, Context};

/// Render blocks as plain text, one paragraph per block.
///
/// Absent or empty `blocks` yield an empty string, mirroring [`crate::compile`].
pub fn compile_plain_text(blocks: Option<&[Block]>, context: &Context) -> String {
    let Some(blocks) = blocks else {
        return String::new();
    };

    let paragraphs: Vec<String> = blocks
        .iter()
        .filter_map(|block| block_text(block, context))
        .filter(|p| !p.is_empty())
        .collect();

    paragraphs.join("\n\n")
}

fn block_text(block: &Block, context: &Context) -> Option<String> {
    match &block.content {
        BlockContent::Header(data) => {
            let mut text = html_to_text(&interpolate(&data.title, context));
            if let Some(subtitle) = data.subtitle.as_deref().filter(|s| !s.is_empty()) {
                text.push('\n');
                text.push_str(&html_to_text(&interpolate(subtitle, context)));
            }
            Some(text)
        }
        BlockContent::Text(data) => Some(html_to_text(&interpolate(&data.content, context))),
        BlockContent::Image(data) => data
            .alt
            .as_deref()
            .filter(|a| !a.is_empty())
            .map(|alt| format!("[{}]", alt)),
        BlockContent::Button(data) => {
            let label = html_to_text(&interpolate(&data.label, context));
            if data.url.is_empty() || data.url == "#" {
                Some(label)
            } else {
                Some(format!("{} ({})", label, data.url))
            }
        }
        BlockContent::Footer(data) => Some(html_to_text(&interpolate(&data.text, context))),
        BlockContent::Spacer | BlockContent::Unknown { .. } => None,
    }
}

/// Strip tags from an HTML snippet. Line breaks and block closers become
/// newlines; the common entities are decoded.
///
/// A `<` only opens a tag when followed by a letter, `/` or `!`, and only
/// when a closing `>` exists. Anything else is kept as text.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut chars = html.chars().peekable();

    while let Some(ch) = chars.next() {
        let opens_tag = ch == '<'
            && chars
                .peek()
                .is_some_and(|c| c.is_ascii_alphabetic() || *c == '/' || *c == '!');
        if !opens_tag {
            out.push(ch);
            continue;
        }

        let mut tag = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '>' {
                closed = true;
                break;
            }
            tag.push(c);
        }
        if !closed {
            out.push('<');
            out.push_str(&tag);
            break;
        }

        let name: String = tag
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '/')
            .collect::<String>()
            .to_ascii_lowercase();

        match name.as_str() {
            "br" | "br/" => out.push('\n'),
            "/p" | "/div" | "/li" | "/h1" | "/h2" | "/h3" | "/h4" | "/h5" | "/h6" | "/tr" => {
                out.push('\n')
            }
            _ => {}
        }
    }

    let decoded = decode_entities(&out);
    let lines: Vec<&str> = decoded.lines().map(str::trim_end).collect();

    // Collapse runs of blank lines to one.
    let mut result = String::new();
    let mut blank_run = 0;
    for line in lines {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !result.is_empty() || !line.trim().is_empty() {
            result.push_str(line);
            result.push('\n');
        }
    }

    result.trim_end().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&copy;", "©")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailforge_model::Scalar;
    use serde_json::json;

    #[test]
    fn test_html_to_text() {
        assert_eq!(
            html_to_text("Hi Sam,<br><br>Join <strong>Acme</strong> &amp; co."),
            "Hi Sam,\n\nJoin Acme & co."
        );
        assert_eq!(html_to_text("<p>One</p><p>Two</p>"), "One\nTwo");
        assert_eq!(html_to_text("a<BR/>b"), "a\nb");
        assert_eq!(html_to_text("plain"), "plain");
    }

    #[test]
    fn test_html_to_text_keeps_bare_angle_brackets() {
        assert_eq!(
            html_to_text("Orders under 5 < 10 items ship free. Thanks!"),
            "Orders under 5 < 10 items ship free. Thanks!"
        );
        assert_eq!(html_to_text("a <3 b<br>c"), "a <3 b\nc");
        assert_eq!(html_to_text("x < y and <b>bold</b>"), "x < y and bold");
        // Unterminated tag is kept as text.
        assert_eq!(html_to_text("see <unfinished"), "see <unfinished");
    }

    #[test]
    fn test_plain_text_document() {
        let blocks: Vec<Block> = serde_json::from_value(json!([
            { "id": "h", "type": "header", "data": { "title": "Hello {{name}}", "subtitle": "News" } },
            { "id": "s", "type": "spacer" },
            { "id": "i", "type": "image", "data": { "url": "a.png", "alt": "Logo" } },
            { "id": "b", "type": "button", "data": { "label": "Open", "url": "https://x.io" } },
            { "id": "f", "type": "footer", "data": { "text": "© {{year}}" } },
            { "id": "u", "type": "poll" }
        ]))
        .unwrap();
        let mut context = Context::new();
        context.insert("name".to_string(), Scalar::from("Sam"));
        context.insert("year".to_string(), Scalar::from(2026));

        assert_eq!(
            compile_plain_text(Some(blocks.as_slice()), &context),
            "Hello Sam\nNews\n\n[Logo]\n\nOpen (https://x.io)\n\n© 2026"
        );
    }

    #[test]
    fn test_plain_text_empty() {
        assert_eq!(compile_plain_text(None, &Context::new()), "");
        assert_eq!(compile_plain_text(Some(&[][..]), &Context::new()), "");
    }
}
