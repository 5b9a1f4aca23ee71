//! Link extraction from primary document content
//!
//! Recognizes wiki links (`[[Target]]`, `[[Shown text|Target]]`) and
//! Markdown inline links whose destination is a document title
//! (`[text](#Target)` or a relative destination). External URLs are ignored.

use pulldown_cmark::{Event, Options, Parser, Tag};

/// Extract referenced titles, deduplicated in first-occurrence order
pub fn extract_links(content: &str) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    let mut push = |title: String| {
        if !title.is_empty() && !links.contains(&title) {
            links.push(title);
        }
    };

    for target in extract_wikilinks(content) {
        push(target);
    }

    for event in Parser::new_ext(content, Options::empty()) {
        if let Event::Start(Tag::Link { dest_url, .. }) = event {
            if let Some(title) = link_target(&dest_url) {
                push(title);
            }
        }
    }

    links
}

/// Extract wiki link targets (not handled by pulldown-cmark)
fn extract_wikilinks(content: &str) -> Vec<String> {
    let mut links = Vec::new();
    let mut chars = content.chars().peekable();
    let mut in_link = false;
    let mut link_text = String::new();

    while let Some(c) = chars.next() {
        if !in_link && c == '[' && chars.peek() == Some(&'[') {
            chars.next();
            in_link = true;
            link_text.clear();
        } else if in_link && c == ']' && chars.peek() == Some(&']') {
            chars.next();
            in_link = false;

            // the target follows the pipe
            let target = match link_text.rfind('|') {
                Some(pipe_pos) => &link_text[pipe_pos + 1..],
                None => link_text.as_str(),
            };
            links.push(target.trim().to_string());
        } else if in_link {
            link_text.push(c);
        }
    }

    links
}

/// Map a Markdown link destination to a document title
fn link_target(dest: &str) -> Option<String> {
    let dest = dest.trim();
    if dest.is_empty() || dest.contains("://") || dest.starts_with("mailto:") {
        return None;
    }
    let title = dest.strip_prefix('#').unwrap_or(dest);
    Some(title.replace("%20", " "))
}
