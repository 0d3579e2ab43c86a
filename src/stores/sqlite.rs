//! Implements a SQLite backed transaction store.
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{DatabaseId, NewTransaction, Transaction, TransactionStatus},
    stores::TransactionStore,
};

/// Stores transactions in a SQLite database.
///
/// Each operation locks the shared connection for its own duration only, so
/// the store can be cloned freely and shared between request handlers and the
/// background generator task.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// The `id` is assigned by SQLite and the `timestamp` is set to the
    /// current UTC time.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    ///
    /// # Panics
    /// Panics if the lock for the database connection is already held by the same thread.
    fn create(&mut self, new_transaction: NewTransaction) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();

        let transaction = connection
            .prepare(
                "INSERT INTO transactions (client_name, amount, status, timestamp)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING id, client_name, amount, status, timestamp",
            )?
            .query_row(
                (
                    new_transaction.client_name,
                    new_transaction.amount,
                    new_transaction.status,
                    OffsetDateTime::now_utc(),
                ),
                Self::map_row,
            )?;

        Ok(transaction)
    }

    /// Retrieve a transaction in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseId) -> Result<Transaction, Error> {
        let transaction = self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, client_name, amount, status, timestamp
                 FROM transactions WHERE id = :id",
            )?
            .query_row(&[(":id", &id)], Self::map_row)?;

        Ok(transaction)
    }

    /// Retrieve all transactions, newest first.
    ///
    /// Rows are ordered by timestamp descending with the ID as a tiebreak so
    /// that rows inserted within the same timestamp granule still come back
    /// in reverse insertion order.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn get_all(&self) -> Result<Vec<Transaction>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, client_name, amount, status, timestamp
                 FROM transactions ORDER BY timestamp DESC, id DESC",
            )?
            .query_map([], Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect()
    }

    /// Move a pending transaction to `status`.
    ///
    /// The update is guarded on the row still being pending, so a transaction
    /// can only leave the pending state once.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a valid transaction,
    /// - [Error::TransactionNotPending] if the transaction has already been
    ///   settled,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn resolve(
        &mut self,
        id: DatabaseId,
        status: TransactionStatus,
    ) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();

        let result = connection
            .prepare(
                "UPDATE transactions SET status = ?1
                 WHERE id = ?2 AND status = ?3
                 RETURNING id, client_name, amount, status, timestamp",
            )?
            .query_row((status, id, TransactionStatus::Pending), Self::map_row);

        match result {
            Ok(transaction) => Ok(transaction),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                // The guard filtered the row out: either the ID is unknown or
                // the transaction has already been settled.
                let exists: bool = connection.query_row(
                    "SELECT EXISTS (SELECT 1 FROM transactions WHERE id = ?1)",
                    [id],
                    |row| row.get(0),
                )?;

                if exists {
                    Err(Error::TransactionNotPending)
                } else {
                    Err(Error::NotFound)
                }
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Get the total number of transactions in the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is an SQL error.
    fn count(&self) -> Result<usize, Error> {
        self.connection
            .lock()
            .unwrap()
            .query_row("SELECT COUNT(id) FROM transactions", [], |row| {
                row.get::<_, i64>(0).map(|count| count as usize)
            })
            .map_err(|error| error.into())
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    client_name TEXT NOT NULL,
                    amount REAL NOT NULL,
                    status TEXT NOT NULL DEFAULT 'pending',
                    timestamp TEXT NOT NULL
                    )",
            (),
        )?;

        // Ensure the sequence starts at 1
        connection.execute(
            "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transactions', 0)",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Transaction {
            id: row.get(offset)?,
            client_name: row.get(offset + 1)?,
            amount: row.get(offset + 2)?,
            status: row.get(offset + 3)?,
            timestamp: row.get(offset + 4)?,
        })
    }
}

#[cfg(test)]
mod sqlite_transaction_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        models::{Transaction, TransactionStatus},
        stores::TransactionStore,
    };

    use super::SQLiteTransactionStore;

    fn get_test_store() -> SQLiteTransactionStore {
        let conn = Connection::open_in_memory().expect("Could not open database in memory");
        initialize(&conn).expect("Could not initialize database");

        SQLiteTransactionStore::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn create_assigns_id_and_timestamp() {
        let mut store = get_test_store();

        let transaction = store.create(Transaction::build("Acme", 500.0)).unwrap();

        assert_eq!(transaction.id, 1);
        assert_eq!(transaction.client_name, "Acme");
        assert_eq!(transaction.amount, 500.0);
        assert_eq!(transaction.status, TransactionStatus::Pending);
    }

    #[test]
    fn create_respects_explicit_status() {
        let mut store = get_test_store();

        let transaction = store
            .create(Transaction::build("Acme", 500.0).status(TransactionStatus::Cleared))
            .unwrap();

        assert_eq!(transaction.status, TransactionStatus::Cleared);
    }

    #[test]
    fn get_returns_created_transaction() {
        let mut store = get_test_store();
        let want = store.create(Transaction::build("Acme", 500.0)).unwrap();

        let got = store.get(want.id).unwrap();

        assert_eq!(got, want);
    }

    #[test]
    fn get_fails_on_unknown_id() {
        let store = get_test_store();

        let result = store.get(999_999);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_all_returns_newest_first() {
        let mut store = get_test_store();
        for i in 0..3 {
            store
                .create(Transaction::build(&format!("Client {i}"), 100.0))
                .unwrap();
        }

        let transactions = store.get_all().unwrap();

        let ids: Vec<i64> = transactions.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(
            transactions
                .windows(2)
                .all(|pair| pair[0].timestamp >= pair[1].timestamp),
            "expected timestamps in descending order, got {transactions:?}"
        );
    }

    #[test]
    fn resolve_settles_pending_transaction() {
        let mut store = get_test_store();
        let transaction = store.create(Transaction::build("Acme", 500.0)).unwrap();

        let updated = store
            .resolve(transaction.id, TransactionStatus::Cleared)
            .unwrap();

        assert_eq!(updated.id, transaction.id);
        assert_eq!(updated.status, TransactionStatus::Cleared);
        assert_eq!(
            store.get(transaction.id).unwrap().status,
            TransactionStatus::Cleared
        );
    }

    #[test]
    fn resolve_fails_on_settled_transaction() {
        let mut store = get_test_store();
        let transaction = store.create(Transaction::build("Acme", 500.0)).unwrap();
        store
            .resolve(transaction.id, TransactionStatus::Failed)
            .unwrap();

        let result = store.resolve(transaction.id, TransactionStatus::Cleared);

        assert_eq!(result, Err(Error::TransactionNotPending));
        assert_eq!(
            store.get(transaction.id).unwrap().status,
            TransactionStatus::Failed
        );
    }

    #[test]
    fn resolve_fails_on_unknown_id() {
        let mut store = get_test_store();

        let result = store.resolve(999_999, TransactionStatus::Cleared);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn count_tracks_inserts() {
        let mut store = get_test_store();
        assert_eq!(store.count().unwrap(), 0);

        store.create(Transaction::build("Acme", 500.0)).unwrap();
        store.create(Transaction::build("Globex", 1_500.0)).unwrap();

        assert_eq!(store.count().unwrap(), 2);
    }
}
