//! Produces synthetic transactions, both for seeding the database on startup
//! and for the recurring background insert task.

use std::{
    ops::{Range, RangeInclusive},
    time::Duration,
};

use rand::{Rng, rngs::StdRng};
use tokio::task::JoinHandle;

use crate::{
    Error,
    models::{NewTransaction, Transaction},
    stores::TransactionStore,
};

/// The number of transactions the store is topped up to on startup.
pub const MINIMUM_SEED_COUNT: usize = 50;

/// How long the background task waits between synthetic inserts.
pub const GENERATOR_INTERVAL: Duration = Duration::from_secs(2);

/// Half of the generated amounts fall in this range.
const SMALL_AMOUNT_RANGE: Range<f64> = 1.0..1_000.0;
/// The other half of the generated amounts fall in this range.
const LARGE_AMOUNT_RANGE: Range<f64> = 1_000.0..1_000_000.0;
/// The number appended to the placeholder client name.
const CLIENT_NUMBER_RANGE: RangeInclusive<u32> = 10_000..=99_999;

/// Generate a random transaction with a placeholder client name.
///
/// The amount is drawn with a 50% chance from [1, 1000) and a 50% chance from
/// [1000, 1000000), uniformly within the chosen range. The status is always
/// pending. This is a pure value producer with no side effects.
pub fn random_transaction(rng: &mut impl Rng) -> NewTransaction {
    let amount = if rng.random_bool(0.5) {
        rng.random_range(SMALL_AMOUNT_RANGE)
    } else {
        rng.random_range(LARGE_AMOUNT_RANGE)
    };
    let client_name = format!("Client {}", rng.random_range(CLIENT_NUMBER_RANGE));

    Transaction::build(&client_name, amount)
}

/// Insert synthetic transactions until the store holds at least `minimum`
/// rows.
///
/// Returns the number of transactions that were inserted, which is zero when
/// the store already holds `minimum` or more rows.
///
/// # Errors
/// Returns an [Error::SqlError] if an insert or the row count fails.
pub fn ensure_minimum_seed<T>(
    store: &mut T,
    rng: &mut impl Rng,
    minimum: usize,
) -> Result<usize, Error>
where
    T: TransactionStore,
{
    let missing = minimum.saturating_sub(store.count()?);

    for _ in 0..missing {
        store.create(random_transaction(rng))?;
    }

    Ok(missing)
}

/// Spawn the recurring background task that inserts one synthetic transaction
/// every [GENERATOR_INTERVAL].
///
/// The insert runs on the blocking thread pool so SQLite I/O never stalls the
/// async scheduler. Insert failures are logged and the loop carries on; the
/// task only ends when its handle is aborted, which lands at the sleep await
/// point.
pub fn spawn_generator_task<T>(store: T, mut rng: StdRng) -> JoinHandle<()>
where
    T: TransactionStore + Clone + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(GENERATOR_INTERVAL).await;

            let mut store = store.clone();
            let new_transaction = random_transaction(&mut rng);

            match tokio::task::spawn_blocking(move || store.create(new_transaction)).await {
                Ok(Ok(transaction)) => tracing::debug!(
                    "inserted synthetic transaction {} for {}",
                    transaction.id,
                    transaction.client_name
                ),
                Ok(Err(error)) => {
                    tracing::error!("could not insert synthetic transaction: {error}")
                }
                Err(error) => {
                    tracing::error!("synthetic transaction insert did not complete: {error}")
                }
            }
        }
    })
}



#[cfg(test)]
mod generator_task_tests {
    use std::{sync::{Arc, Mutex}, time::Duration};

    use rand::{SeedableRng, rngs::StdRng};
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        stores::{TransactionStore, sqlite::SQLiteTransactionStore},
    };

    use super::spawn_generator_task;

    fn get_test_store() -> SQLiteTransactionStore {
        let conn = Connection::open_in_memory().expect("Could not open database in memory");
        initialize(&conn).expect("Could not initialize database");

        SQLiteTransactionStore::new(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn aborting_the_task_completes_without_panic() {
        let store = get_test_store();
        let task = spawn_generator_task(store, StdRng::seed_from_u64(42));

        task.abort();
        let result = task.await;

        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn inserts_after_the_interval_elapses() {
        let store = get_test_store();
        let task = spawn_generator_task(store.clone(), StdRng::seed_from_u64(42));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        task.abort();
        let _ = task.await;

        assert!(store.count().unwrap() >= 1);
    }
}
