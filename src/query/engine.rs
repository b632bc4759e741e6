use thiserror::Error;

use super::{
    AccountInfo, AggregateOptions, AggregateRow, Dimension, MessageDetail, MessageFilter,
    MessageSummary, StatsOptions, TotalStats,
};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("message {0} not found")]
    NotFound(i64),
    #[error("failed to read archive: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed archive: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Backend(String),
}

/// Read-side access to the archive.
///
/// Calls are synchronous; the explorer runs them on blocking workers and
/// tags each with a request id.
pub trait Engine: Send + Sync {
    /// Group every message in scope by `dimension`
    fn aggregate(
        &self,
        dimension: Dimension,
        opts: &AggregateOptions,
    ) -> Result<Vec<AggregateRow>, QueryError>;

    /// Group the messages matching `filter` by `dimension`
    fn sub_aggregate(
        &self,
        filter: &MessageFilter,
        dimension: Dimension,
        opts: &AggregateOptions,
    ) -> Result<Vec<AggregateRow>, QueryError>;

    fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<MessageSummary>, QueryError>;

    fn get_message(&self, id: i64) -> Result<MessageDetail, QueryError>;

    fn total_stats(&self, opts: &StatsOptions) -> Result<TotalStats, QueryError>;

    fn list_accounts(&self) -> Result<Vec<AccountInfo>, QueryError>;

    /// Origin identifiers of every message matching `filter`
    fn source_ids_by_filter(&self, filter: &MessageFilter) -> Result<Vec<String>, QueryError>;
}
