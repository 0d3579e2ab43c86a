//! Defines the transaction store trait.

use crate::{
    Error,
    models::{DatabaseId, NewTransaction, Transaction, TransactionStatus},
};

/// Handles the creation, retrieval and settlement of transactions.
pub trait TransactionStore {
    /// Create a new transaction in the store.
    ///
    /// The store assigns the `id` and `timestamp` of the returned transaction.
    fn create(&mut self, new_transaction: NewTransaction) -> Result<Transaction, Error>;

    /// Retrieve a transaction from the store by its `id`.
    fn get(&self, id: DatabaseId) -> Result<Transaction, Error>;

    /// Retrieve all transactions, ordered by timestamp descending (newest
    /// first).
    fn get_all(&self) -> Result<Vec<Transaction>, Error>;

    /// Move a pending transaction to the terminal state `status` and return
    /// the updated record.
    ///
    /// Implementers must guard the update on the current status so a
    /// transaction can only ever leave the pending state once, even under
    /// concurrent calls.
    fn resolve(
        &mut self,
        id: DatabaseId,
        status: TransactionStatus,
    ) -> Result<Transaction, Error>;

    /// Get the total number of transactions in the store.
    fn count(&self) -> Result<usize, Error>;
}
