//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/transactions/{transaction_id}',
//! use [format_endpoint].

/// The root route which returns the service banner.
pub const ROOT: &str = "/";
/// The route to list all transactions.
pub const TRANSACTIONS: &str = "/transactions/";
/// The route to get a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route to create a transaction.
pub const CREATE_TRANSACTION: &str = "/transactions/create-transaction";
/// The route to settle a pending transaction.
pub const CLEAR_FUNDS: &str = "/transactions/{transaction_id}/clear-funds";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/transactions/{transaction_id}',
/// '{transaction_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let param_start = endpoint_path.find('{');
    let param_end = endpoint_path.find('}');

    match (param_start, param_end) {
        (Some(start), Some(end)) if start < end => {
            let mut formatted = String::with_capacity(endpoint_path.len());
            formatted.push_str(&endpoint_path[..start]);
            formatted.push_str(&id.to_string());
            formatted.push_str(&endpoint_path[end + 1..]);
            formatted
        }
        _ => endpoint_path.to_string(),
    }
}
