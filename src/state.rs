//! Implements a struct that holds the state of the HTTP server.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;

use crate::stores::TransactionStore;

/// The state of the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState<T>
where
    T: TransactionStore + Send + Sync,
{
    /// The store for managing [transactions](crate::models::Transaction).
    pub transaction_store: T,
    /// The random source used to settle clear-funds calls.
    ///
    /// Injected rather than process-global so tests can seed it for
    /// deterministic outcomes.
    pub rng: Arc<Mutex<StdRng>>,
}

impl<T> AppState<T>
where
    T: TransactionStore + Send + Sync,
{
    /// Create a new [AppState].
    pub fn new(transaction_store: T, rng: StdRng) -> Self {
        Self {
            transaction_store,
            rng: Arc::new(Mutex::new(rng)),
        }
    }
}
