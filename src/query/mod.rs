//! Archive query model: grouping dimensions, row/message types and the
//! engine trait the explorer drives.

mod engine;
pub mod filter;
mod memory;

use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

pub use engine::{Engine, QueryError};
pub use filter::{EmptyTargets, MessageFilter, TimeRange};
pub use memory::{Archive, MemoryEngine, StoredMessage};
#[cfg(test)]
pub(crate) use memory::fixtures;

/// Grouping axis for aggregate views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[default]
    Sender,
    SenderName,
    Recipient,
    RecipientName,
    Domain,
    Label,
    Time,
}

impl Dimension {
    /// Cycling order for grouping selection
    pub const ALL: [Dimension; 7] = [
        Dimension::Sender,
        Dimension::SenderName,
        Dimension::Recipient,
        Dimension::RecipientName,
        Dimension::Domain,
        Dimension::Label,
        Dimension::Time,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Sender => "Senders",
            Self::SenderName => "Sender Names",
            Self::Recipient => "Recipients",
            Self::RecipientName => "Recipient Names",
            Self::Domain => "Domains",
            Self::Label => "Labels",
            Self::Time => "Time",
        }
    }

    /// Short lowercase name used in filter descriptions
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Sender => "from",
            Self::SenderName => "from-name",
            Self::Recipient => "to",
            Self::RecipientName => "to-name",
            Self::Domain => "domain",
            Self::Label => "label",
            Self::Time => "period",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|d| *d == self).unwrap_or(0)
    }

    fn step(self, forward: bool) -> Self {
        let len = Self::ALL.len();
        let pos = self.position();
        let next = if forward {
            (pos + 1) % len
        } else {
            (pos + len - 1) % len
        };
        Self::ALL[next]
    }

    /// Advance one step in the cycle, stepping over `skip` when landed on.
    pub fn cycle(self, forward: bool, skip: Option<Dimension>) -> Self {
        let next = self.step(forward);
        match skip {
            Some(skip) if skip == next => next.step(forward),
            _ => next,
        }
    }

    /// Dimension offered when sub-grouping a drill made on `self`.
    ///
    /// Name and address variants of the same party are treated as redundant,
    /// so a sender drill never sub-groups by sender name and vice versa.
    pub fn next_sub_group(self) -> Self {
        match self {
            Self::Sender | Self::SenderName => Self::Recipient,
            Self::Recipient | Self::RecipientName => Self::Domain,
            Self::Domain => Self::Label,
            Self::Label => Self::Time,
            Self::Time => Self::Sender,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeGranularity {
    Year,
    #[default]
    Month,
    Day,
}

impl TimeGranularity {
    pub fn next(self) -> Self {
        match self {
            Self::Year => Self::Month,
            Self::Month => Self::Day,
            Self::Day => Self::Year,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Year => "Year",
            Self::Month => "Month",
            Self::Day => "Day",
        }
    }

    /// Period key a timestamp falls into (`2024`, `2024-03`, `2024-03-15`)
    pub fn period_key(self, at: &DateTime<Utc>) -> String {
        match self {
            Self::Year => format!("{:04}", at.year()),
            Self::Month => format!("{:04}-{:02}", at.year(), at.month()),
            Self::Day => format!("{:04}-{:02}-{:02}", at.year(), at.month(), at.day()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    Count,
    Size,
    Attachments,
    Name,
}

impl SortField {
    pub fn next(self) -> Self {
        match self {
            Self::Count => Self::Size,
            Self::Size => Self::Attachments,
            Self::Attachments => Self::Name,
            Self::Name => Self::Count,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Size => "Size",
            Self::Attachments => "Attachments",
            Self::Name => "Name",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Desc,
    Asc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            Self::Desc => Self::Asc,
            Self::Asc => Self::Desc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Self::Desc => "↓",
            Self::Asc => "↑",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSortField {
    #[default]
    Date,
    Size,
    Subject,
}

impl MessageSortField {
    pub fn next(self) -> Self {
        match self {
            Self::Date => Self::Size,
            Self::Size => Self::Subject,
            Self::Subject => Self::Date,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Size => "Size",
            Self::Subject => "Subject",
        }
    }
}

/// Sort order for aggregate rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateSort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Sort order for message lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageSort {
    pub field: MessageSortField,
    pub direction: SortDirection,
}

/// One group in an aggregate view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateRow {
    pub key: String,
    pub count: i64,
    pub total_size: i64,
    pub attachment_size: i64,
    pub attachment_count: i64,
    pub total_unique: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl Address {
    /// Domain part of the address, lowercased
    pub fn domain(&self) -> String {
        self.email
            .rsplit_once('@')
            .map(|(_, d)| d.to_lowercase())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSummary {
    pub id: i64,
    /// Identifier of the message at its origin (used for deletion manifests)
    pub source_message_id: String,
    pub conversation_id: i64,
    pub subject: String,
    pub snippet: String,
    pub from_email: String,
    pub from_name: String,
    pub sent_at: DateTime<Utc>,
    pub size_estimate: i64,
    pub has_attachments: bool,
    pub attachment_count: i64,
    pub labels: Vec<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl MessageSummary {
    pub fn display_from(&self) -> &str {
        if self.from_name.is_empty() {
            &self.from_email
        } else {
            &self.from_name
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentInfo {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub mime_type: String,
    pub size: i64,
    /// Content-addressed storage key under the attachments directory
    pub content_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDetail {
    pub id: i64,
    pub source_message_id: String,
    pub conversation_id: i64,
    pub subject: String,
    pub from: Vec<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub sent_at: DateTime<Utc>,
    pub size_estimate: i64,
    pub labels: Vec<String>,
    pub body_text: String,
    pub attachments: Vec<AttachmentInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: i64,
    #[serde(default)]
    pub source_type: String,
    pub identifier: String,
    #[serde(default)]
    pub display_name: String,
}

impl AccountInfo {
    pub fn display(&self) -> &str {
        if self.display_name.is_empty() {
            &self.identifier
        } else {
            &self.display_name
        }
    }
}

/// Aggregate metrics for a scope (whole archive or a filtered subset)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TotalStats {
    pub message_count: i64,
    pub total_size: i64,
    pub attachment_count: i64,
    pub attachment_size: i64,
    pub label_count: i64,
    pub account_count: i64,
}

impl TotalStats {
    /// Stats describing a single aggregate row
    pub fn from_row(row: &AggregateRow) -> Self {
        Self {
            message_count: row.count,
            total_size: row.total_size,
            attachment_count: row.attachment_count,
            attachment_size: row.attachment_size,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Restrict to one account (None = all accounts)
    pub source_id: Option<i64>,
    pub sort: AggregateSort,
    /// Maximum rows returned (0 = unlimited)
    pub limit: usize,
    pub granularity: TimeGranularity,
    pub with_attachments_only: bool,
    /// Free-text query narrowing the grouped messages
    pub search_query: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsOptions {
    pub source_id: Option<i64>,
    pub with_attachments_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cycle_returns_after_seven_steps() {
        let mut dim = Dimension::Recipient;
        let mut seen = Vec::new();
        for _ in 0..7 {
            dim = dim.cycle(true, None);
            seen.push(dim);
        }
        assert_eq!(dim, Dimension::Recipient);
        assert_eq!(
            seen,
            vec![
                Dimension::RecipientName,
                Dimension::Domain,
                Dimension::Label,
                Dimension::Time,
                Dimension::Sender,
                Dimension::SenderName,
                Dimension::Recipient,
            ]
        );
    }

    #[test]
    fn test_cycle_backward_wraps() {
        assert_eq!(Dimension::Sender.cycle(false, None), Dimension::Time);
        assert_eq!(Dimension::Time.cycle(true, None), Dimension::Sender);
    }

    #[test]
    fn test_cycle_skips_drill_dimension() {
        assert_eq!(
            Dimension::Sender.cycle(true, Some(Dimension::SenderName)),
            Dimension::Recipient
        );
        assert_eq!(
            Dimension::Recipient.cycle(false, Some(Dimension::SenderName)),
            Dimension::Sender
        );
        // Skip only applies to the landing dimension
        assert_eq!(
            Dimension::Sender.cycle(true, Some(Dimension::Domain)),
            Dimension::SenderName
        );
    }

    #[test]
    fn test_next_sub_group_skips_name_variants() {
        assert_eq!(Dimension::Sender.next_sub_group(), Dimension::Recipient);
        assert_eq!(Dimension::SenderName.next_sub_group(), Dimension::Recipient);
        assert_eq!(Dimension::Recipient.next_sub_group(), Dimension::Domain);
        assert_eq!(Dimension::RecipientName.next_sub_group(), Dimension::Domain);
        assert_eq!(Dimension::Domain.next_sub_group(), Dimension::Label);
        assert_eq!(Dimension::Label.next_sub_group(), Dimension::Time);
        assert_eq!(Dimension::Time.next_sub_group(), Dimension::Sender);
    }

    #[test]
    fn test_period_keys() {
        let at = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(TimeGranularity::Year.period_key(&at), "2024");
        assert_eq!(TimeGranularity::Month.period_key(&at), "2024-03");
        assert_eq!(TimeGranularity::Day.period_key(&at), "2024-03-07");
    }

    #[test]
    fn test_granularity_cycle() {
        assert_eq!(TimeGranularity::Year.next(), TimeGranularity::Month);
        assert_eq!(TimeGranularity::Month.next(), TimeGranularity::Day);
        assert_eq!(TimeGranularity::Day.next(), TimeGranularity::Year);
    }

    #[test]
    fn test_address_domain() {
        let addr = Address {
            email: "Alice@Example.COM".into(),
            name: String::new(),
        };
        assert_eq!(addr.domain(), "example.com");
        assert_eq!(Address::default().domain(), "");
    }
}
