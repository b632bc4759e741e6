//! Search query language and the search collaborator trait.
//!
//! Queries are a mix of `operator:value` terms and free text:
//! `from:alice subject:"quarterly report" has:attachment invoice`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::query::{MessageFilter, MessageSummary, QueryError, TotalStats};

/// Fast matches metadata only, deep includes body text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Fast,
    Deep,
}

impl SearchMode {
    pub fn toggle(self) -> Self {
        match self {
            Self::Fast => Self::Deep,
            Self::Deep => Self::Fast,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Fast => "Fast",
            Self::Deep => "Deep",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub text_terms: Vec<String>,
    pub from_addrs: Vec<String>,
    pub to_addrs: Vec<String>,
    pub cc_addrs: Vec<String>,
    pub bcc_addrs: Vec<String>,
    pub subject_terms: Vec<String>,
    pub labels: Vec<String>,
    pub has_attachment: Option<bool>,
    pub before: Option<NaiveDate>,
    pub after: Option<NaiveDate>,
    pub larger_than: Option<i64>,
    pub smaller_than: Option<i64>,
    pub account_id: Option<i64>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.text_terms.is_empty()
            && self.from_addrs.is_empty()
            && self.to_addrs.is_empty()
            && self.cc_addrs.is_empty()
            && self.bcc_addrs.is_empty()
            && self.subject_terms.is_empty()
            && self.labels.is_empty()
            && self.has_attachment.is_none()
            && self.before.is_none()
            && self.after.is_none()
            && self.larger_than.is_none()
            && self.smaller_than.is_none()
    }
}

/// One page of fast search results
#[derive(Debug, Clone, Default)]
pub struct FastSearchPage {
    pub messages: Vec<MessageSummary>,
    /// Total matches across all pages
    pub total_count: i64,
    /// Metrics over every match, when the engine computes them
    pub stats: Option<TotalStats>,
}

pub trait SearchEngine: Send + Sync {
    /// Metadata search scoped by `filter`
    fn search_fast(
        &self,
        query: &Query,
        filter: &MessageFilter,
        limit: usize,
        offset: usize,
    ) -> Result<FastSearchPage, QueryError>;

    /// Full-text search; scope must already be merged into `query`
    fn search_deep(
        &self,
        query: &Query,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MessageSummary>, QueryError>;
}

/// Parse a search string. Unknown operators are kept as text terms.
pub fn parse(input: &str) -> Query {
    let mut query = Query::default();

    for token in tokenize(input) {
        let Some((op, value)) = token.split_once(':') else {
            query.text_terms.push(token);
            continue;
        };
        let value = value.trim_matches('"').to_string();
        if value.is_empty() {
            query.text_terms.push(token);
            continue;
        }

        match op.to_ascii_lowercase().as_str() {
            "from" => query.from_addrs.push(value),
            "to" => query.to_addrs.push(value),
            "cc" => query.cc_addrs.push(value),
            "bcc" => query.bcc_addrs.push(value),
            "subject" => query.subject_terms.push(value),
            "label" | "l" => query.labels.push(value),
            "has" if value.eq_ignore_ascii_case("attachment")
                || value.eq_ignore_ascii_case("attachments") =>
            {
                query.has_attachment = Some(true);
            }
            "before" => match parse_date(&value) {
                Some(date) => query.before = Some(date),
                None => query.text_terms.push(token),
            },
            "after" => match parse_date(&value) {
                Some(date) => query.after = Some(date),
                None => query.text_terms.push(token),
            },
            "larger" => match parse_size(&value) {
                Some(size) => query.larger_than = Some(size),
                None => query.text_terms.push(token),
            },
            "smaller" => match parse_size(&value) {
                Some(size) => query.smaller_than = Some(size),
                None => query.text_terms.push(token),
            },
            _ => query.text_terms.push(token),
        }
    }

    query
}

/// Fold the drill context of `filter` into a copy of `query`.
pub fn merge_filter_into_query(query: &Query, filter: &MessageFilter) -> Query {
    let mut merged = query.clone();

    if filter.source_id.is_some() {
        merged.account_id = filter.source_id;
    }
    if let Some(sender) = &filter.sender {
        merged.from_addrs.push(sender.clone());
    }
    if let Some(recipient) = &filter.recipient {
        merged.to_addrs.push(recipient.clone());
    }
    if let Some(label) = &filter.label {
        merged.labels.push(label.clone());
    }
    if filter.with_attachments_only {
        merged.has_attachment = Some(true);
    }
    // Domains are matched as a from-address suffix
    if let Some(domain) = &filter.domain {
        merged.from_addrs.push(format!("@{domain}"));
    }

    merged
}

fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in input.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                // Keep quotes on operator values so `subject:"a b"` survives
                if current.contains(':') {
                    current.push(c);
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y/%m/%d"))
        .ok()
}

fn parse_size(value: &str) -> Option<i64> {
    let upper = value.to_ascii_uppercase();
    let (digits, multiplier) = match upper.chars().last()? {
        'K' => (&upper[..upper.len() - 1], 1024),
        'M' => (&upper[..upper.len() - 1], 1024 * 1024),
        'G' => (&upper[..upper.len() - 1], 1024 * 1024 * 1024),
        _ => (upper.as_str(), 1),
    };
    digits.parse::<i64>().ok().map(|n| n * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Dimension, TimeGranularity};

    #[test]
    fn test_parse_operators_and_text() {
        let q = parse("from:alice@example.com to:bob label:work invoice");
        assert_eq!(q.from_addrs, vec!["alice@example.com"]);
        assert_eq!(q.to_addrs, vec!["bob"]);
        assert_eq!(q.labels, vec!["work"]);
        assert_eq!(q.text_terms, vec!["invoice"]);
    }

    #[test]
    fn test_parse_quoted_values() {
        let q = parse(r#"subject:"quarterly report" "exact phrase""#);
        assert_eq!(q.subject_terms, vec!["quarterly report"]);
        assert_eq!(q.text_terms, vec!["exact phrase"]);
    }

    #[test]
    fn test_parse_dates_sizes_and_flags() {
        let q = parse("after:2024-01-01 before:2024/06/30 larger:5M smaller:100 has:attachment");
        assert_eq!(q.after, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(q.before, NaiveDate::from_ymd_opt(2024, 6, 30));
        assert_eq!(q.larger_than, Some(5 * 1024 * 1024));
        assert_eq!(q.smaller_than, Some(100));
        assert_eq!(q.has_attachment, Some(true));
    }

    #[test]
    fn test_bad_operator_values_become_text() {
        let q = parse("before:yesterday weird:thing from:");
        assert_eq!(q.text_terms, vec!["before:yesterday", "weird:thing", "from:"]);
        assert!(q.before.is_none());
    }

    #[test]
    fn test_empty_query() {
        assert!(parse("   ").is_empty());
        assert!(!parse("x").is_empty());
    }

    #[test]
    fn test_merge_filter_into_query() {
        let mut filter = MessageFilter::scoped(Some(2), true, TimeGranularity::Month);
        filter.set_dimension(Dimension::Sender, "alice@example.com", TimeGranularity::Month);
        filter.set_dimension(Dimension::Domain, "example.com", TimeGranularity::Month);
        filter.set_dimension(Dimension::Label, "work", TimeGranularity::Month);

        let original = parse("from:carol report");
        let merged = merge_filter_into_query(&original, &filter);

        assert_eq!(
            merged.from_addrs,
            vec!["carol", "alice@example.com", "@example.com"]
        );
        assert_eq!(merged.labels, vec!["work"]);
        assert_eq!(merged.account_id, Some(2));
        assert_eq!(merged.has_attachment, Some(true));
        // Original untouched
        assert_eq!(original.from_addrs, vec!["carol"]);
    }
}
