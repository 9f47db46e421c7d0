//! Text cleanup for extracted pages
//!
//! Extracted pages arrive as HTML-ish markup. Before anything is sent to the
//! summarization model the markup is flattened to plain prose: script and
//! style blocks vanish with their contents, every other tag is dropped while
//! its inner text stays, and whitespace collapses to single spaces. Also
//! home to the small string helpers used when shaping cards (slugs, word
//! trimming).

/// Flatten markup to clean prose. Tag matching is ASCII case-insensitive and
/// tolerates attributes on opening tags. The result has no tags, no
/// newlines, and no runs of consecutive spaces. Cleaning an already-clean
/// string returns it unchanged.
pub fn clean_text(raw: &str) -> String {
    let without_scripts = remove_element(raw, "script");
    let without_styles = remove_element(&without_scripts, "style");
    let text = strip_tags(&without_styles);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove every `<tag ...>...</tag>` block including its contents. An
/// unterminated block swallows the rest of the input.
fn remove_element(html: &str, tag: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;

    while let Some(rel) = lower[pos..].find(&open) {
        let start = pos + rel;
        out.push_str(&html[pos..start]);
        match lower[start..].find(&close) {
            Some(end) => pos = start + end + close.len(),
            None => {
                pos = html.len();
                break;
            }
        }
    }

    out.push_str(&html[pos..]);
    out
}

/// Drop remaining tags, keeping their inner text. Each tag is replaced by a
/// space so adjacent words do not fuse; the final whitespace collapse takes
/// care of the extra spacing.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out
}

/// Lowercased dashed identifier: non-alphanumeric runs become single
/// dashes, with no leading or trailing dash.
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut prev_dash = true;

    for c in s.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

/// Cap a string at `max_words` whitespace-separated words. Inner whitespace
/// normalizes to single spaces either way.
pub fn trim_to_words(s: &str, max_words: usize) -> String {
    let words: Vec<&str> = s.split_whitespace().collect();
    words[..words.len().min(max_words)].join(" ")
}
