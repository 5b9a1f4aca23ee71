//! Title list codec for list fields
//!
//! A list is a whitespace-separated sequence of titles; a title containing
//! whitespace is wrapped in `[[...]]`.

/// Parse a title list, keeping the first occurrence of each title
pub fn parse_string_list(value: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let mut rest = value;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let item = if let Some(inner) = rest.strip_prefix("[[") {
            match inner.find("]]") {
                Some(end) => {
                    let title = &inner[..end];
                    rest = &inner[end + 2..];
                    title
                }
                None => {
                    // unterminated bracket: take the remainder verbatim
                    let title = inner;
                    rest = "";
                    title
                }
            }
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let title = &rest[..end];
            rest = &rest[end..];
            title
        };
        if !item.is_empty() && !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }

    items
}

/// Serialize titles back into list form
pub fn stringify_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| {
            let item = item.as_ref();
            if item.contains(char::is_whitespace) {
                format!("[[{}]]", item)
            } else {
                item.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
