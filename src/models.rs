//! This module defines the domain data types for transactions.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The settlement state of a [Transaction].
///
/// A transaction starts out `pending` and is moved to exactly one of the
/// terminal states `cleared` or `failed` by the clear-funds operation.
/// Terminal states are never left again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// The transaction has been created but not yet settled.
    #[default]
    Pending,
    /// Settlement was attempted and rejected.
    Failed,
    /// Settlement succeeded.
    Cleared,
}

impl TransactionStatus {
    /// The lowercase string form used in the database and in JSON bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cleared => "cleared",
        }
    }
}

impl ToSql for TransactionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "pending" => Ok(TransactionStatus::Pending),
            "failed" => Ok(TransactionStatus::Failed),
            "cleared" => Ok(TransactionStatus::Cleared),
            other => Err(FromSqlError::Other(
                format!("unknown transaction status \"{other}\"").into(),
            )),
        }
    }
}

/// A record of a monetary transfer request with a lifecycle status.
///
/// To create a new `Transaction`, use [Transaction::build] and pass the
/// result to a [TransactionStore](crate::stores::TransactionStore), which
/// assigns the `id` and `timestamp` fields on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction. Unique and never reused.
    pub id: DatabaseId,
    /// The name of the client that requested the transfer.
    pub client_name: String,
    /// The value of the transfer in dollars.
    pub amount: f64,
    /// The settlement state of the transaction.
    pub status: TransactionStatus,
    /// When the transaction was created, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [NewTransaction] for discoverability.
    pub fn build(client_name: &str, amount: f64) -> NewTransaction {
        NewTransaction {
            client_name: client_name.to_owned(),
            amount,
            status: TransactionStatus::Pending,
        }
    }
}

/// A transaction that has not been inserted into a store yet, so it has no
/// `id` or `timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// The name of the client that requested the transfer.
    pub client_name: String,
    /// The value of the transfer in dollars.
    pub amount: f64,
    /// The initial settlement state. Defaults to
    /// [TransactionStatus::Pending].
    pub status: TransactionStatus,
}

impl NewTransaction {
    /// Set the initial status for the transaction.
    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }
}
