use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use regex::{Captures, Regex};
use serde::Deserialize;
use std::sync::OnceLock;

use crate::fetch::content_path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownFlavor {
    #[default]
    Minimal,
    CommonMark,
}

/// Renders a post body with the configured flavor. `content_dir` is used to
/// resolve relative image sources in the CommonMark flavor.
pub fn render(markdown: &str, flavor: MarkdownFlavor, content_dir: &str) -> String {
    match flavor {
        MarkdownFlavor::Minimal => convert(markdown),
        MarkdownFlavor::CommonMark => render_commonmark(markdown, content_dir),
    }
}

/// Minimal markdown to HTML. Rules run in a fixed order: headers, bold and
/// italic, links, list items, then paragraphs. Input is escaped first, so
/// anything that fails to match stays literal text.
pub fn convert(markdown: &str) -> String {
    static RE_HEADING: OnceLock<Regex> = OnceLock::new();
    static RE_BOLD: OnceLock<Regex> = OnceLock::new();
    static RE_ITALIC: OnceLock<Regex> = OnceLock::new();
    static RE_LINK: OnceLock<Regex> = OnceLock::new();

    let re_heading = RE_HEADING.get_or_init(|| Regex::new(r"(?m)^(#{1,3}) (.*)$").unwrap());
    let re_bold = RE_BOLD.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
    // No whitespace just inside the markers, so `* item` lines are left for lists.
    let re_italic =
        RE_ITALIC.get_or_init(|| Regex::new(r"\*([^*\s](?:[^*\n]*[^*\s])?)\*").unwrap());
    let re_link = RE_LINK.get_or_init(|| Regex::new(r"\[([^\]\n]*)\]\(([^)\s]*)\)").unwrap());

    if markdown.trim().is_empty() {
        return String::new();
    }

    let mut html = escape_html(&markdown.replace("\r\n", "\n"));

    html = re_heading
        .replace_all(&html, |caps: &Captures| {
            let level = caps[1].len();
            format!("<h{level}>{}</h{level}>", caps[2].trim_end())
        })
        .to_string();
    html = re_bold.replace_all(&html, "<strong>$1</strong>").to_string();
    html = re_italic.replace_all(&html, "<em>$1</em>").to_string();
    html = re_link
        .replace_all(&html, |caps: &Captures| {
            format!(r#"<a href="{}">{}</a>"#, safe_href(&caps[2]), &caps[1])
        })
        .to_string();
    html = wrap_lists(&html);

    paragraphs(&html)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn safe_href(target: &str) -> &str {
    const BLOCKED: [&str; 3] = ["javascript:", "vbscript:", "data:"];
    // Browsers drop control characters and whitespace before reading the
    // scheme, so `\u{1}java\tscript:` is still `javascript:`.
    let scheme: String = target
        .chars()
        .filter(|c| !c.is_control() && !c.is_whitespace())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    if BLOCKED.iter().any(|blocked| scheme.starts_with(blocked)) {
        "#"
    } else {
        target
    }
}

fn wrap_lists(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut items: Vec<String> = Vec::new();

    let flush = |items: &mut Vec<String>, out: &mut Vec<String>| {
        if !items.is_empty() {
            out.push(format!("<ul>{}</ul>", items.join("\n")));
            items.clear();
        }
    };

    for line in text.split('\n') {
        match line.strip_prefix("* ") {
            Some(item) => items.push(format!("<li>{item}</li>")),
            None => {
                flush(&mut items, &mut out);
                out.push(line.to_string());
            }
        }
    }
    flush(&mut items, &mut out);
    out.join("\n")
}

fn paragraphs(text: &str) -> String {
    static RE_BLANK: OnceLock<Regex> = OnceLock::new();
    let re_blank = RE_BLANK.get_or_init(|| Regex::new(r"\n[^\S\n]*\n\s*").unwrap());

    const BLOCK_TAGS: [&str; 4] = ["<h1>", "<h2>", "<h3>", "<ul>"];
    re_blank
        .split(text)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| {
            if BLOCK_TAGS.iter().any(|tag| block.starts_with(tag)) {
                block.to_string()
            } else {
                format!("<p>{block}</p>")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_commonmark(markdown: &str, content_dir: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        // Raw HTML in a post is shown, never interpreted.
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: image_source(dest_url, content_dir),
            title,
            id,
        }),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::from(safe_href(&dest_url).to_string()),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

fn image_source<'a>(src: CowStr<'a>, content_dir: &str) -> CowStr<'a> {
    let lowered = src.to_ascii_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") || src.starts_with('/') {
        src
    } else {
        CowStr::from(content_path(content_dir, &src))
    }
}
