//! Selector capability: turns a filter expression into document titles
//!
//! The graph layer only depends on the `Selector` trait. `SimpleSelector`
//! is a small union-of-terms implementation over a `DocumentStore`:
//!
//! - `*` every candidate
//! - `Title` or `[[Title with spaces]]` one title
//! - `prefix:<p>` titles starting with `<p>`
//! - `tag:<t>` documents whose `tags` list contains `<t>`
//! - `has:<field>` documents with a non-empty field
//! - `field:<name>=<value>` documents whose field equals the value
//!
//! A term prefixed with `!` removes its matches from the result.

use crate::storage::list::parse_string_list;
use crate::storage::{Document, DocumentStore, StorageResult};
use std::sync::Arc;

/// Evaluates filter expressions
pub trait Selector: Send + Sync {
    /// Titles matched by `expr`
    ///
    /// With a domain, only titles of the domain are considered and they need
    /// not exist as documents; without one, all non-system, non-draft
    /// documents are candidates.
    fn evaluate(&self, expr: &str, domain: Option<&[String]>) -> StorageResult<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq)]
enum Term {
    All,
    Title(String),
    Prefix(String),
    Tag(String),
    Has(String),
    FieldEquals(String, String),
}

impl Term {
    fn parse(token: &str) -> Self {
        if token == "*" {
            return Self::All;
        }
        if let Some(p) = token.strip_prefix("prefix:") {
            return Self::Prefix(p.to_string());
        }
        if let Some(t) = token.strip_prefix("tag:") {
            return Self::Tag(t.to_string());
        }
        if let Some(f) = token.strip_prefix("has:") {
            return Self::Has(f.to_string());
        }
        if let Some(rest) = token.strip_prefix("field:") {
            if let Some((name, value)) = rest.split_once('=') {
                return Self::FieldEquals(name.to_string(), value.to_string());
            }
        }
        Self::Title(token.to_string())
    }

    fn needs_document(&self) -> bool {
        matches!(self, Self::Tag(_) | Self::Has(_) | Self::FieldEquals(..))
    }

    fn matches(&self, title: &str, doc: Option<&Document>) -> bool {
        match self {
            Self::All => true,
            Self::Title(t) => t == title,
            Self::Prefix(p) => title.starts_with(p.as_str()),
            Self::Tag(tag) => doc
                .and_then(|d| d.field("tags"))
                .is_some_and(|tags| parse_string_list(tags).iter().any(|t| t == tag)),
            Self::Has(field) => doc.is_some_and(|d| d.non_empty_field(field).is_some()),
            Self::FieldEquals(name, value) => {
                doc.and_then(|d| d.field(name)).is_some_and(|v| v == value)
            }
        }
    }
}

/// Split an expression into `(negated, token)` pairs
fn tokenize(expr: &str) -> Vec<(bool, String)> {
    let mut tokens = Vec::new();
    let mut rest = expr;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let (negated, body) = match rest.strip_prefix('!') {
            Some(body) => (true, body),
            None => (false, rest),
        };
        let (token, remainder) = match body.strip_prefix("[[") {
            Some(inner) => match inner.find("]]") {
                Some(end) => (&inner[..end], &inner[end + 2..]),
                None => (inner, ""),
            },
            None => {
                let end = body.find(char::is_whitespace).unwrap_or(body.len());
                (&body[..end], &body[end..])
            }
        };
        if !token.is_empty() {
            tokens.push((negated, token.to_string()));
        }
        rest = remainder;
    }

    tokens
}

/// Minimal selector over a document store
#[derive(Clone)]
pub struct SimpleSelector {
    store: Arc<dyn DocumentStore>,
}

impl SimpleSelector {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn candidates(&self, domain: Option<&[String]>) -> StorageResult<Vec<String>> {
        if let Some(domain) = domain {
            return Ok(domain.to_vec());
        }
        let mut live = Vec::new();
        for title in self.store.titles()? {
            if !self.store.is_system_or_draft(&title)? {
                live.push(title);
            }
        }
        Ok(live)
    }
}

impl Selector for SimpleSelector {
    fn evaluate(&self, expr: &str, domain: Option<&[String]>) -> StorageResult<Vec<String>> {
        let terms: Vec<(bool, Term)> = tokenize(expr)
            .into_iter()
            .map(|(negated, token)| (negated, Term::parse(&token)))
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let load_docs = terms.iter().any(|(_, term)| term.needs_document());
        let mut entries: Vec<(String, Option<Document>)> = Vec::new();
        for title in self.candidates(domain)? {
            let doc = if load_docs { self.store.get(&title)? } else { None };
            entries.push((title, doc));
        }

        let mut result: Vec<String> = Vec::new();
        for (negated, term) in &terms {
            if *negated {
                result.retain(|title| {
                    let doc = entries.iter().find(|(t, _)| t == title).and_then(|(_, d)| d.as_ref());
                    !term.matches(title, doc)
                });
                continue;
            }
            for (title, doc) in &entries {
                if term.matches(title, doc.as_ref()) && !result.contains(title) {
                    result.push(title.clone());
                }
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn selector() -> SimpleSelector {
        let store = MemoryStore::with_documents([
            Document::new("Alpha").with_field("tags", "greek [[first letter]]"),
            Document::new("Beta").with_field("color", "red"),
            Document::new("Gamma Ray").with_field("color", ""),
            Document::new("$:/system/doc"),
            Document::new("Draft of 'Alpha'").with_field("draft.of", "Alpha"),
        ]);
        SimpleSelector::new(Arc::new(store))
    }

    #[test]
    fn star_matches_live_documents() {
        let matches = selector().evaluate("*", None).unwrap();
        assert_eq!(matches, vec!["Alpha", "Beta", "Gamma Ray"]);
    }

    #[test]
    fn titles_and_bracketed_titles() {
        let matches = selector().evaluate("Beta [[Gamma Ray]] Missing", None).unwrap();
        assert_eq!(matches, vec!["Beta", "Gamma Ray"]);
    }

    #[test]
    fn field_terms() {
        let s = selector();
        assert_eq!(s.evaluate("tag:greek", None).unwrap(), vec!["Alpha"]);
        assert_eq!(s.evaluate("[[tag:first letter]]", None).unwrap(), vec!["Alpha"]);
        assert_eq!(s.evaluate("has:color", None).unwrap(), vec!["Beta"]);
        assert_eq!(s.evaluate("field:color=red", None).unwrap(), vec!["Beta"]);
    }

    #[test]
    fn negation_removes_matches() {
        let matches = selector().evaluate("* !Beta !prefix:Gam", None).unwrap();
        assert_eq!(matches, vec!["Alpha"]);
    }

    #[test]
    fn domain_restricts_candidates_without_existence() {
        let domain = vec!["$:/types/likes".to_string(), "$:/types/list:tags".to_string()];
        let s = selector();
        assert_eq!(s.evaluate("*", Some(&domain)).unwrap(), domain);
        assert_eq!(
            s.evaluate("prefix:$:/types/list:", Some(&domain)).unwrap(),
            vec!["$:/types/list:tags"]
        );
    }

    #[test]
    fn empty_expression_matches_nothing() {
        assert!(selector().evaluate("  ", None).unwrap().is_empty());
    }
}
