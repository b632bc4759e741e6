//! Cumulative message predicate built while drilling through dimensions.

use bitflags::bitflags;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Dimension, MessageSort, TimeGranularity};

/// Key shown for a dimension constrained to "value absent"
pub const EMPTY_KEY_LABEL: &str = "(empty)";

bitflags! {
    /// Dimensions constrained to messages where the field is absent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EmptyTargets: u8 {
        const SENDER = 0b0000_0001;
        const SENDER_NAME = 0b0000_0010;
        const RECIPIENT = 0b0000_0100;
        const RECIPIENT_NAME = 0b0000_1000;
        const DOMAIN = 0b0001_0000;
        const LABEL = 0b0010_0000;
        const TIME = 0b0100_0000;
    }
}

impl EmptyTargets {
    pub fn for_dimension(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Sender => Self::SENDER,
            Dimension::SenderName => Self::SENDER_NAME,
            Dimension::Recipient => Self::RECIPIENT,
            Dimension::RecipientName => Self::RECIPIENT_NAME,
            Dimension::Domain => Self::DOMAIN,
            Dimension::Label => Self::LABEL,
            Dimension::Time => Self::TIME,
        }
    }
}

/// Time bucket constraint. The period string is only meaningful together
/// with the granularity it was produced under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub period: String,
    pub granularity: TimeGranularity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub sender: Option<String>,
    pub sender_name: Option<String>,
    pub recipient: Option<String>,
    pub recipient_name: Option<String>,
    pub domain: Option<String>,
    pub label: Option<String>,
    pub time: Option<TimeRange>,
    /// Granularity applied when a time period is set on this filter
    pub granularity: TimeGranularity,
    pub empty: EmptyTargets,

    pub conversation_id: Option<i64>,
    /// Account restriction (None = all accounts)
    pub source_id: Option<i64>,
    pub after: Option<NaiveDate>,
    pub before: Option<NaiveDate>,
    pub with_attachments_only: bool,

    pub sort: MessageSort,
    /// Maximum messages returned (0 = unlimited)
    pub limit: usize,
    pub offset: usize,
}

impl MessageFilter {
    /// Fresh filter carrying only scope options, as created by a top-level drill
    pub fn scoped(
        source_id: Option<i64>,
        with_attachments_only: bool,
        granularity: TimeGranularity,
    ) -> Self {
        Self {
            source_id,
            with_attachments_only,
            granularity,
            ..Self::default()
        }
    }

    /// Constrain `dimension` to `key`, replacing any earlier constraint on it.
    ///
    /// An empty key means "field absent": the value is cleared and the
    /// match-empty flag is raised instead. Time keys take `granularity` so the
    /// period string and its granularity always agree.
    pub fn set_dimension(&mut self, dimension: Dimension, key: &str, granularity: TimeGranularity) {
        let flag = EmptyTargets::for_dimension(dimension);
        let value = (!key.is_empty()).then(|| key.to_string());
        self.empty.set(flag, key.is_empty());

        match dimension {
            Dimension::Sender => self.sender = value,
            Dimension::SenderName => self.sender_name = value,
            Dimension::Recipient => self.recipient = value,
            Dimension::RecipientName => self.recipient_name = value,
            Dimension::Domain => self.domain = value,
            Dimension::Label => self.label = value,
            Dimension::Time => {
                self.granularity = granularity;
                self.time = value.map(|period| TimeRange {
                    period,
                    granularity,
                });
            }
        }
    }

    /// Drop any constraint on `dimension`
    pub fn clear_dimension(&mut self, dimension: Dimension) {
        self.empty.remove(EmptyTargets::for_dimension(dimension));
        match dimension {
            Dimension::Sender => self.sender = None,
            Dimension::SenderName => self.sender_name = None,
            Dimension::Recipient => self.recipient = None,
            Dimension::RecipientName => self.recipient_name = None,
            Dimension::Domain => self.domain = None,
            Dimension::Label => self.label = None,
            Dimension::Time => self.time = None,
        }
    }

    /// Constrained value for `dimension`, if one is set
    pub fn value(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Sender => self.sender.as_deref(),
            Dimension::SenderName => self.sender_name.as_deref(),
            Dimension::Recipient => self.recipient.as_deref(),
            Dimension::RecipientName => self.recipient_name.as_deref(),
            Dimension::Domain => self.domain.as_deref(),
            Dimension::Label => self.label.as_deref(),
            Dimension::Time => self.time.as_ref().map(|t| t.period.as_str()),
        }
    }

    pub fn matches_empty(&self, dimension: Dimension) -> bool {
        self.empty.contains(EmptyTargets::for_dimension(dimension))
    }

    pub fn is_constrained(&self, dimension: Dimension) -> bool {
        self.value(dimension).is_some() || self.matches_empty(dimension)
    }

    /// True when any dimension carries a drill constraint
    pub fn has_drill_criteria(&self) -> bool {
        Dimension::ALL.iter().any(|d| self.is_constrained(*d))
    }

    /// Display key for `dimension`, `(empty)` when constrained to absence
    pub fn key_for(&self, dimension: Dimension) -> String {
        if self.matches_empty(dimension) {
            return EMPTY_KEY_LABEL.to_string();
        }
        self.value(dimension).unwrap_or_default().to_string()
    }

    /// Human readable summary of the drill constraints, in cycle order
    pub fn describe(&self) -> String {
        Dimension::ALL
            .iter()
            .filter(|d| self.is_constrained(**d))
            .map(|d| format!("{}:{}", d.short_name(), self.key_for(*d)))
            .collect::<Vec<_>>()
            .join(" › ")
    }
}
