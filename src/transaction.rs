//! Defines the endpoints for listing, fetching, creating and settling
//! transactions.

use std::time::Duration;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rand::Rng;
use serde::Deserialize;

use crate::{
    AppState, Error,
    models::{DatabaseId, Transaction, TransactionStatus},
    stores::TransactionStore,
};

/// How long the simulated settlement call takes.
pub const CLEAR_FUNDS_DELAY: Duration = Duration::from_millis(1_500);

/// The probability that a settlement attempt resolves to `failed`.
pub const CLEAR_FUNDS_FAILURE_RATE: f64 = 0.1;

/// The request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// The name of the client that requested the transfer.
    pub client_name: String,
    /// The value of the transfer in dollars.
    pub amount: f64,
    /// The initial settlement state, pending if omitted.
    #[serde(default)]
    pub status: TransactionStatus,
}

/// A route handler for listing all transactions, newest first.
pub async fn get_transactions<T>(
    State(state): State<AppState<T>>,
) -> Result<Json<Vec<Transaction>>, Error>
where
    T: TransactionStore + Send + Sync,
{
    let transactions = state.transaction_store.get_all()?;

    Ok(Json(transactions))
}

/// A route handler for fetching a single transaction by its ID.
///
/// Responds with 404 if no transaction with that ID exists.
pub async fn get_transaction<T>(
    State(state): State<AppState<T>>,
    Path(transaction_id): Path<DatabaseId>,
) -> Result<Json<Transaction>, Error>
where
    T: TransactionStore + Send + Sync,
{
    let transaction = state.transaction_store.get(transaction_id)?;

    Ok(Json(transaction))
}

/// A route handler for creating a new transaction, responds with 201 and the
/// created record on success.
///
/// The client name must not be empty and the amount must be a finite number,
/// otherwise the request is rejected with 422.
pub async fn create_transaction<T>(
    State(state): State<AppState<T>>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), Error>
where
    T: TransactionStore + Send + Sync,
{
    if request.client_name.trim().is_empty() {
        return Err(Error::Validation("client_name must not be empty".to_owned()));
    }

    if !request.amount.is_finite() {
        return Err(Error::Validation("amount must be a finite number".to_owned()));
    }

    let mut store = state.transaction_store;
    let transaction = store.create(
        Transaction::build(&request.client_name, request.amount).status(request.status),
    )?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler that simulates clearing the funds of a pending
/// transaction.
///
/// Responds with 404 if no transaction with that ID exists and 400 if the
/// transaction is no longer pending. Otherwise the handler waits out the
/// simulated settlement latency, then persists `failed` with a 10% chance and
/// `cleared` otherwise. The operation is not idempotent: once settled, any
/// further call responds with 400.
pub async fn clear_funds<T>(
    State(state): State<AppState<T>>,
    Path(transaction_id): Path<DatabaseId>,
) -> Result<Json<Transaction>, Error>
where
    T: TransactionStore + Send + Sync,
{
    let mut store = state.transaction_store;

    let transaction = store.get(transaction_id)?;
    if transaction.status != TransactionStatus::Pending {
        return Err(Error::TransactionNotPending);
    }

    // Mock external settlement call. Suspends this request only, other
    // requests keep being served.
    tokio::time::sleep(CLEAR_FUNDS_DELAY).await;

    let outcome = {
        let mut rng = state.rng.lock().unwrap();
        settle(&mut *rng)
    };

    // The guarded update catches a concurrent settlement that happened while
    // this request was sleeping.
    let updated = store.resolve(transaction_id, outcome)?;

    Ok(Json(updated))
}

/// Draw the settlement outcome: `failed` with probability
/// [CLEAR_FUNDS_FAILURE_RATE], `cleared` otherwise.
fn settle(rng: &mut impl Rng) -> TransactionStatus {
    if rng.random_bool(CLEAR_FUNDS_FAILURE_RATE) {
        TransactionStatus::Failed
    } else {
        TransactionStatus::Cleared
    }
}

#[cfg(test)]
mod settle_tests {
    use rand::{SeedableRng, rngs::StdRng};

    use crate::models::TransactionStatus;

    use super::settle;

    #[test]
    fn roughly_ten_percent_of_settlements_fail() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 10_000;

        let failed = (0..trials)
            .filter(|_| settle(&mut rng) == TransactionStatus::Failed)
            .count();

        // 10% of 10000 trials, with room for sampling noise.
        assert!(
            (800..=1_200).contains(&failed),
            "got {failed} failed settlements out of {trials}"
        );
    }
}
