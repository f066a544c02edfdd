//! HTTP routes, one file per resource.

pub mod health;
pub mod login;
pub mod metrics;
pub mod products;
pub mod pvz;
pub mod receptions;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a UUID-backed identifier taken from the request path.
pub(crate) fn parse_id<T>(raw: &str, what: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = uuid::Error>,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {what} format: {e}")))
}
