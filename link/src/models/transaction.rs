use crate::error::{AceQlLinkError, Result};

/// Transaction isolation level as named by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionIsolation {
    None,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl TransactionIsolation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionIsolation::None => "transaction_none",
            TransactionIsolation::ReadUncommitted => "transaction_read_uncommitted",
            TransactionIsolation::ReadCommitted => "transaction_read_committed",
            TransactionIsolation::RepeatableRead => "transaction_repeatable_read",
            TransactionIsolation::Serializable => "transaction_serializable",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "transaction_none" => Ok(TransactionIsolation::None),
            "transaction_read_uncommitted" => Ok(TransactionIsolation::ReadUncommitted),
            "transaction_read_committed" => Ok(TransactionIsolation::ReadCommitted),
            "transaction_repeatable_read" => Ok(TransactionIsolation::RepeatableRead),
            "transaction_serializable" => Ok(TransactionIsolation::Serializable),
            other => Err(AceQlLinkError::protocol(format!(
                "Unknown transaction isolation level: {}",
                other
            ))),
        }
    }
}

/// Cursor holdability across commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holdability {
    HoldCursorsOverCommit,
    CloseCursorsAtCommit,
}

impl Holdability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Holdability::HoldCursorsOverCommit => "hold_cursors_over_commit",
            Holdability::CloseCursorsAtCommit => "close_cursors_at_commit",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim() {
            "hold_cursors_over_commit" => Ok(Holdability::HoldCursorsOverCommit),
            "close_cursors_at_commit" => Ok(Holdability::CloseCursorsAtCommit),
            other => Err(AceQlLinkError::protocol(format!("Unknown holdability: {}", other))),
        }
    }
}
