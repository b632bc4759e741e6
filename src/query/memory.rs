//! In-memory engine over a JSON archive snapshot.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use aho_corasick::AhoCorasick;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AccountInfo, Address, AggregateOptions, AggregateRow, AttachmentInfo, Dimension, Engine,
    MessageDetail, MessageFilter, MessageSortField, MessageSummary, QueryError, SortDirection,
    SortField, StatsOptions, TimeGranularity, TotalStats,
};
use crate::search::{self, FastSearchPage, Query, SearchEngine};

/// Serialized archive layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Archive {
    #[serde(default)]
    pub accounts: Vec<AccountInfo>,
    #[serde(default)]
    pub messages: Vec<StoredMessage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: i64,
    #[serde(default)]
    pub source_id: i64,
    #[serde(default)]
    pub source_message_id: String,
    #[serde(default)]
    pub conversation_id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub to: Vec<Address>,
    #[serde(default)]
    pub cc: Vec<Address>,
    #[serde(default)]
    pub bcc: Vec<Address>,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub size_estimate: i64,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub body_text: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentInfo>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StoredMessage {
    fn from_email(&self) -> &str {
        self.from.as_ref().map(|a| a.email.as_str()).unwrap_or("")
    }

    fn from_name(&self) -> &str {
        self.from.as_ref().map(|a| a.name.as_str()).unwrap_or("")
    }

    fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }

    fn attachment_size(&self) -> i64 {
        self.attachments.iter().map(|a| a.size).sum()
    }

    /// Keys this message is grouped under for `dimension`.
    /// Multi-valued dimensions yield one key per distinct value.
    fn group_keys(&self, dimension: Dimension, granularity: TimeGranularity) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        match dimension {
            Dimension::Sender => {
                keys.insert(self.from_email().to_lowercase());
            }
            Dimension::SenderName => {
                keys.insert(self.from_name().to_string());
            }
            Dimension::Recipient => {
                keys.extend(self.recipients().map(|a| a.email.to_lowercase()));
            }
            Dimension::RecipientName => {
                keys.extend(
                    self.recipients()
                        .filter(|a| !a.name.is_empty())
                        .map(|a| a.name.clone()),
                );
            }
            Dimension::Domain => {
                keys.insert(self.from.as_ref().map(Address::domain).unwrap_or_default());
            }
            Dimension::Label => {
                keys.extend(self.labels.iter().cloned());
            }
            Dimension::Time => {
                keys.insert(granularity.period_key(&self.sent_at));
            }
        }
        if keys.is_empty() {
            keys.insert(String::new());
        }
        keys
    }

    fn summary(&self) -> MessageSummary {
        MessageSummary {
            id: self.id,
            source_message_id: self.source_message_id.clone(),
            conversation_id: self.conversation_id,
            subject: self.subject.clone(),
            snippet: self.snippet.clone(),
            from_email: self.from_email().to_string(),
            from_name: self.from_name().to_string(),
            sent_at: self.sent_at,
            size_estimate: self.size_estimate,
            has_attachments: !self.attachments.is_empty(),
            attachment_count: self.attachments.len() as i64,
            labels: self.labels.clone(),
            deleted_at: self.deleted_at,
        }
    }

    fn detail(&self) -> MessageDetail {
        MessageDetail {
            id: self.id,
            source_message_id: self.source_message_id.clone(),
            conversation_id: self.conversation_id,
            subject: self.subject.clone(),
            from: self.from.iter().cloned().collect(),
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            sent_at: self.sent_at,
            size_estimate: self.size_estimate,
            labels: self.labels.clone(),
            body_text: self.body_text.clone(),
            attachments: self.attachments.clone(),
        }
    }
}

/// Engine answering every query from a loaded [`Archive`]
pub struct MemoryEngine {
    archive: Archive,
    by_id: HashMap<i64, usize>,
}

impl MemoryEngine {
    pub fn new(archive: Archive) -> Self {
        let by_id = archive
            .messages
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.id, idx))
            .collect();
        Self { archive, by_id }
    }

    pub fn load(path: &Path) -> Result<Self, QueryError> {
        let content = std::fs::read_to_string(path)?;
        let archive: Archive = serde_json::from_str(&content)?;
        tracing::info!(
            "Loaded archive {} ({} messages, {} accounts)",
            path.display(),
            archive.messages.len(),
            archive.accounts.len()
        );
        Ok(Self::new(archive))
    }

    fn live_messages(&self) -> impl Iterator<Item = &StoredMessage> {
        self.archive.messages.iter().filter(|m| m.deleted_at.is_none())
    }

    fn group(
        &self,
        messages: Vec<&StoredMessage>,
        dimension: Dimension,
        opts: &AggregateOptions,
    ) -> Vec<AggregateRow> {
        let mut groups: BTreeMap<String, AggregateRow> = BTreeMap::new();
        for msg in messages {
            for key in msg.group_keys(dimension, opts.granularity) {
                let row = groups.entry(key.clone()).or_insert_with(|| AggregateRow {
                    key,
                    ..AggregateRow::default()
                });
                row.count += 1;
                row.total_unique += 1;
                row.total_size += msg.size_estimate;
                row.attachment_count += msg.attachments.len() as i64;
                row.attachment_size += msg.attachment_size();
            }
        }

        let mut rows: Vec<AggregateRow> = groups.into_values().collect();
        rows.sort_by(|a, b| {
            let ord = match opts.sort.field {
                SortField::Count => a.count.cmp(&b.count),
                SortField::Size => a.total_size.cmp(&b.total_size),
                SortField::Attachments => a.attachment_size.cmp(&b.attachment_size),
                SortField::Name => a.key.cmp(&b.key),
            };
            // Ties always break by key so results are stable
            let ord = match opts.sort.direction {
                SortDirection::Desc => ord.reverse(),
                SortDirection::Asc => ord,
            };
            ord.then_with(|| a.key.cmp(&b.key))
        });
        if opts.limit > 0 {
            rows.truncate(opts.limit);
        }
        rows
    }

    fn scoped_by_options<'a>(
        &'a self,
        opts: &'a AggregateOptions,
    ) -> impl Iterator<Item = &'a StoredMessage> + 'a {
        let matcher = opts
            .search_query
            .as_deref()
            .map(search::parse)
            .filter(|q| !q.is_empty())
            .map(|q| QueryMatcher::new(&q, false));
        self.live_messages().filter(move |m| {
            opts.source_id.is_none_or(|id| m.source_id == id)
                && (!opts.with_attachments_only || !m.attachments.is_empty())
                && matcher.as_ref().is_none_or(|qm| qm.matches(m))
        })
    }

    fn matching(&self, filter: &MessageFilter) -> Vec<&StoredMessage> {
        self.live_messages().filter(|m| matches_filter(filter, m)).collect()
    }
}

fn eq_ci(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn matches_filter(filter: &MessageFilter, msg: &StoredMessage) -> bool {
    if filter.source_id.is_some_and(|id| msg.source_id != id) {
        return false;
    }
    if filter.conversation_id.is_some_and(|id| msg.conversation_id != id) {
        return false;
    }
    if filter.with_attachments_only && msg.attachments.is_empty() {
        return false;
    }
    let date = msg.sent_at.date_naive();
    if filter.after.is_some_and(|after| date < after) {
        return false;
    }
    if filter.before.is_some_and(|before| date >= before) {
        return false;
    }

    Dimension::ALL.iter().all(|dim| {
        let dim = *dim;
        if filter.matches_empty(dim) {
            let keys = msg.group_keys(dim, filter.granularity);
            return dim != Dimension::Time && keys.len() == 1 && keys.contains("");
        }
        match (dim, filter.value(dim)) {
            (_, None) => true,
            (Dimension::Sender, Some(v)) => eq_ci(msg.from_email(), v),
            (Dimension::SenderName, Some(v)) => msg.from_name() == v,
            (Dimension::Recipient, Some(v)) => msg.recipients().any(|a| eq_ci(&a.email, v)),
            (Dimension::RecipientName, Some(v)) => msg.recipients().any(|a| a.name == v),
            (Dimension::Domain, Some(v)) => msg
                .from
                .as_ref()
                .is_some_and(|a| eq_ci(&a.domain(), v)),
            (Dimension::Label, Some(v)) => msg.labels.iter().any(|l| l == v),
            (Dimension::Time, Some(_)) => filter.time.as_ref().is_some_and(|range| {
                range.granularity.period_key(&msg.sent_at) == range.period
            }),
        }
    })
}

fn sort_messages(messages: &mut [&StoredMessage], filter: &MessageFilter) {
    messages.sort_by(|a, b| {
        let ord = match filter.sort.field {
            MessageSortField::Date => a.sent_at.cmp(&b.sent_at),
            MessageSortField::Size => a.size_estimate.cmp(&b.size_estimate),
            MessageSortField::Subject => a.subject.to_lowercase().cmp(&b.subject.to_lowercase()),
        };
        let ord = match filter.sort.direction {
            SortDirection::Desc => ord.reverse(),
            SortDirection::Asc => ord,
        };
        ord.then_with(|| a.id.cmp(&b.id))
    });
}

fn page<T: Clone>(items: &[T], limit: usize, offset: usize) -> Vec<T> {
    let iter = items.iter().skip(offset).cloned();
    if limit > 0 {
        iter.take(limit).collect()
    } else {
        iter.collect()
    }
}

fn stats_of<'a>(messages: impl Iterator<Item = &'a StoredMessage>) -> TotalStats {
    let mut stats = TotalStats::default();
    let mut labels = BTreeSet::new();
    let mut accounts = BTreeSet::new();
    for msg in messages {
        stats.message_count += 1;
        stats.total_size += msg.size_estimate;
        stats.attachment_count += msg.attachments.len() as i64;
        stats.attachment_size += msg.attachment_size();
        labels.extend(msg.labels.iter());
        accounts.insert(msg.source_id);
    }
    stats.label_count = labels.len() as i64;
    stats.account_count = accounts.len() as i64;
    stats
}

/// Case-insensitive term matcher for a parsed query
struct QueryMatcher {
    query: Query,
    text: Vec<AhoCorasick>,
    subject: Vec<AhoCorasick>,
    deep: bool,
}

impl QueryMatcher {
    fn new(query: &Query, deep: bool) -> Self {
        let build = |terms: &[String]| {
            terms
                .iter()
                .filter_map(|t| {
                    AhoCorasick::builder()
                        .ascii_case_insensitive(true)
                        .build([t])
                        .ok()
                })
                .collect::<Vec<_>>()
        };
        Self {
            text: build(&query.text_terms),
            subject: build(&query.subject_terms),
            query: query.clone(),
            deep,
        }
    }

    fn matches(&self, msg: &StoredMessage) -> bool {
        let q = &self.query;
        if q.account_id.is_some_and(|id| msg.source_id != id) {
            return false;
        }
        if q.has_attachment == Some(true) && msg.attachments.is_empty() {
            return false;
        }
        let date = msg.sent_at.date_naive();
        if q.after.is_some_and(|after| date < after) || q.before.is_some_and(|b| date >= b) {
            return false;
        }
        if q.larger_than.is_some_and(|n| msg.size_estimate <= n)
            || q.smaller_than.is_some_and(|n| msg.size_estimate >= n)
        {
            return false;
        }

        let from = msg.from.iter().collect::<Vec<_>>();
        let address_match = |wanted: &[String], addrs: &[&Address]| {
            wanted.iter().all(|w| {
                let w = w.to_lowercase();
                addrs.iter().any(|a| {
                    let email = a.email.to_lowercase();
                    if let Some(domain) = w.strip_prefix('@') {
                        email.ends_with(&format!("@{domain}"))
                    } else {
                        email.contains(&w) || a.name.to_lowercase().contains(&w)
                    }
                })
            })
        };
        let to: Vec<&Address> = msg.to.iter().collect();
        let cc: Vec<&Address> = msg.cc.iter().collect();
        let bcc: Vec<&Address> = msg.bcc.iter().collect();
        if !address_match(&q.from_addrs, &from)
            || !address_match(&q.to_addrs, &to)
            || !address_match(&q.cc_addrs, &cc)
            || !address_match(&q.bcc_addrs, &bcc)
        {
            return false;
        }
        if !q.labels.iter().all(|l| msg.labels.iter().any(|ml| eq_ci(ml, l))) {
            return false;
        }
        if !self.subject.iter().all(|ac| ac.is_match(&msg.subject)) {
            return false;
        }

        let recipients = msg
            .recipients()
            .map(|a| format!("{} {}", a.email, a.name))
            .collect::<Vec<_>>()
            .join(" ");
        let metadata = [
            msg.subject.as_str(),
            msg.from_email(),
            msg.from_name(),
            recipients.as_str(),
            msg.snippet.as_str(),
        ];
        self.text.iter().all(|ac| {
            metadata.iter().any(|field| ac.is_match(field))
                || (self.deep && ac.is_match(&msg.body_text))
        })
    }
}

impl Engine for MemoryEngine {
    fn aggregate(
        &self,
        dimension: Dimension,
        opts: &AggregateOptions,
    ) -> Result<Vec<AggregateRow>, QueryError> {
        let messages = self.scoped_by_options(opts).collect();
        Ok(self.group(messages, dimension, opts))
    }

    fn sub_aggregate(
        &self,
        filter: &MessageFilter,
        dimension: Dimension,
        opts: &AggregateOptions,
    ) -> Result<Vec<AggregateRow>, QueryError> {
        let messages = self
            .scoped_by_options(opts)
            .filter(|m| matches_filter(filter, m))
            .collect();
        Ok(self.group(messages, dimension, opts))
    }

    fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<MessageSummary>, QueryError> {
        let mut messages = self.matching(filter);
        sort_messages(&mut messages, filter);
        let summaries: Vec<MessageSummary> = messages.iter().map(|m| m.summary()).collect();
        Ok(page(&summaries, filter.limit, filter.offset))
    }

    fn get_message(&self, id: i64) -> Result<MessageDetail, QueryError> {
        self.by_id
            .get(&id)
            .and_then(|idx| self.archive.messages.get(*idx))
            .map(StoredMessage::detail)
            .ok_or(QueryError::NotFound(id))
    }

    fn total_stats(&self, opts: &StatsOptions) -> Result<TotalStats, QueryError> {
        Ok(stats_of(self.live_messages().filter(|m| {
            opts.source_id.is_none_or(|id| m.source_id == id)
                && (!opts.with_attachments_only || !m.attachments.is_empty())
        })))
    }

    fn list_accounts(&self) -> Result<Vec<AccountInfo>, QueryError> {
        Ok(self.archive.accounts.clone())
    }

    fn source_ids_by_filter(&self, filter: &MessageFilter) -> Result<Vec<String>, QueryError> {
        Ok(self
            .matching(filter)
            .into_iter()
            .map(|m| m.source_message_id.clone())
            .filter(|id| !id.is_empty())
            .collect())
    }
}

impl SearchEngine for MemoryEngine {
    fn search_fast(
        &self,
        query: &Query,
        filter: &MessageFilter,
        limit: usize,
        offset: usize,
    ) -> Result<FastSearchPage, QueryError> {
        let matcher = QueryMatcher::new(query, false);
        let mut hits: Vec<&StoredMessage> = self
            .live_messages()
            .filter(|m| matches_filter(filter, m) && matcher.matches(m))
            .collect();
        sort_messages(&mut hits, filter);

        let stats = stats_of(hits.iter().copied());
        let summaries: Vec<MessageSummary> = hits.iter().map(|m| m.summary()).collect();
        Ok(FastSearchPage {
            messages: page(&summaries, limit, offset),
            total_count: summaries.len() as i64,
            stats: Some(stats),
        })
    }

    fn search_deep(
        &self,
        query: &Query,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MessageSummary>, QueryError> {
        let matcher = QueryMatcher::new(query, true);
        let mut hits: Vec<&StoredMessage> =
            self.live_messages().filter(|m| matcher.matches(m)).collect();
        sort_messages(&mut hits, &MessageFilter::default());
        let summaries: Vec<MessageSummary> = hits.iter().map(|m| m.summary()).collect();
        Ok(page(&summaries, limit, offset))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn addr(email: &str, name: &str) -> Address {
        Address {
            email: email.to_string(),
            name: name.to_string(),
        }
    }

    pub fn message(id: i64, from: &str, to: &[&str], month: u32) -> StoredMessage {
        StoredMessage {
            id,
            source_id: 1,
            source_message_id: format!("src-{id}"),
            conversation_id: id,
            subject: format!("Message {id}"),
            snippet: format!("snippet {id}"),
            from: (!from.is_empty()).then(|| addr(from, "")),
            to: to.iter().map(|e| addr(e, "")).collect(),
            sent_at: Utc.with_ymd_and_hms(2024, month, 10, 9, 0, 0).unwrap(),
            size_estimate: 1000,
            labels: vec!["inbox".to_string()],
            body_text: format!("body of message {id}"),
            ..StoredMessage::default()
        }
    }

    /// Small archive: alice writes to bob and carol, dave writes to bob,
    /// one message has no sender.
    pub fn archive() -> Archive {
        let mut messages = vec![
            message(1, "alice@example.com", &["bob@example.com"], 1),
            message(2, "alice@example.com", &["bob@example.com", "carol@other.org"], 2),
            message(3, "alice@example.com", &["carol@other.org"], 2),
            message(4, "dave@other.org", &["bob@example.com"], 3),
            message(5, "", &["bob@example.com"], 3),
        ];
        messages[1].attachments.push(AttachmentInfo {
            id: 20,
            filename: "report.pdf".into(),
            mime_type: "application/pdf".into(),
            size: 4096,
            content_hash: "ab12cd".into(),
        });
        messages[2].conversation_id = 2;
        messages[3].labels.push("work".into());
        messages[3].body_text = "the quarterly numbers are attached".into();
        Archive {
            accounts: vec![AccountInfo {
                id: 1,
                source_type: "gmail".into(),
                identifier: "me@example.com".into(),
                display_name: String::new(),
            }],
            messages,
        }
    }

    pub fn engine() -> MemoryEngine {
        MemoryEngine::new(archive())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::engine;
    use super::*;

    fn row<'a>(rows: &'a [AggregateRow], key: &str) -> &'a AggregateRow {
        rows.iter().find(|r| r.key == key).unwrap()
    }

    #[test]
    fn test_aggregate_by_sender_sorted_by_count() {
        let engine = engine();
        let rows = engine
            .aggregate(Dimension::Sender, &AggregateOptions::default())
            .unwrap();
        assert_eq!(rows[0].key, "alice@example.com");
        assert_eq!(rows[0].count, 3);
        assert_eq!(row(&rows, "").count, 1);
        assert_eq!(row(&rows, "alice@example.com").attachment_count, 1);
    }

    #[test]
    fn test_recipients_group_multi_valued() {
        let engine = engine();
        let rows = engine
            .aggregate(Dimension::Recipient, &AggregateOptions::default())
            .unwrap();
        assert_eq!(row(&rows, "bob@example.com").count, 4);
        assert_eq!(row(&rows, "carol@other.org").count, 2);
    }

    #[test]
    fn test_sub_aggregate_respects_filter() {
        let engine = engine();
        let mut filter = MessageFilter::default();
        filter.set_dimension(Dimension::Sender, "alice@example.com", TimeGranularity::Month);
        let rows = engine
            .sub_aggregate(&filter, Dimension::Recipient, &AggregateOptions::default())
            .unwrap();
        assert_eq!(row(&rows, "bob@example.com").count, 2);
        assert_eq!(row(&rows, "carol@other.org").count, 2);
    }

    #[test]
    fn test_match_empty_sender() {
        let engine = engine();
        let mut filter = MessageFilter::default();
        filter.set_dimension(Dimension::Sender, "", TimeGranularity::Month);
        let messages = engine.list_messages(&filter).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, 5);
    }

    #[test]
    fn test_time_filter_uses_its_granularity() {
        let engine = engine();
        let mut filter = MessageFilter::default();
        filter.set_dimension(Dimension::Time, "2024-02", TimeGranularity::Month);
        assert_eq!(engine.list_messages(&filter).unwrap().len(), 2);

        filter.set_dimension(Dimension::Time, "2024-02", TimeGranularity::Year);
        assert!(engine.list_messages(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_list_messages_sort_and_limit() {
        let engine = engine();
        let mut filter = MessageFilter::default();
        filter.limit = 2;
        let messages = engine.list_messages(&filter).unwrap();
        assert_eq!(messages.len(), 2);
        // Date descending by default
        assert!(messages[0].sent_at >= messages[1].sent_at);
    }

    #[test]
    fn test_get_message_not_found() {
        let engine = engine();
        assert!(matches!(engine.get_message(99), Err(QueryError::NotFound(99))));
        assert_eq!(engine.get_message(2).unwrap().attachments.len(), 1);
    }

    #[test]
    fn test_search_fast_vs_deep() {
        let engine = engine();
        let query = search::parse("quarterly");
        let fast = engine
            .search_fast(&query, &MessageFilter::default(), 100, 0)
            .unwrap();
        assert_eq!(fast.total_count, 0);

        let deep = engine.search_deep(&query, 100, 0).unwrap();
        assert_eq!(deep.len(), 1);
        assert_eq!(deep[0].id, 4);
    }

    #[test]
    fn test_search_fast_scoped_and_paged() {
        let engine = engine();
        let mut filter = MessageFilter::default();
        filter.set_dimension(Dimension::Sender, "alice@example.com", TimeGranularity::Month);
        let page = engine
            .search_fast(&search::parse("message"), &filter, 2, 0)
            .unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.messages.len(), 2);
        assert_eq!(page.stats.unwrap().message_count, 3);
    }

    #[test]
    fn test_domain_query_suffix() {
        let engine = engine();
        let query = search::parse("from:@other.org");
        let hits = engine.search_deep(&query, 0, 0).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].from_email, "dave@other.org");
    }

    #[test]
    fn test_source_ids_by_filter() {
        let engine = engine();
        let mut filter = MessageFilter::default();
        filter.set_dimension(Dimension::Recipient, "carol@other.org", TimeGranularity::Month);
        let mut ids = engine.source_ids_by_filter(&filter).unwrap();
        ids.sort();
        assert_eq!(ids, vec!["src-2", "src-3"]);
    }

    #[test]
    fn test_aggregate_with_search_query() {
        let engine = engine();
        let opts = AggregateOptions {
            search_query: Some("label:work".into()),
            ..AggregateOptions::default()
        };
        let rows = engine.aggregate(Dimension::Sender, &opts).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "dave@other.org");
    }

    #[test]
    fn test_total_stats() {
        let engine = engine();
        let stats = engine.total_stats(&StatsOptions::default()).unwrap();
        assert_eq!(stats.message_count, 5);
        assert_eq!(stats.attachment_count, 1);
        assert_eq!(stats.label_count, 2);

        let only_attachments = engine
            .total_stats(&StatsOptions {
                source_id: None,
                with_attachments_only: true,
            })
            .unwrap();
        assert_eq!(only_attachments.message_count, 1);
    }
}
