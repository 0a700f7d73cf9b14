//! Bounded waits around gateway calls.
//!
//! A hung network call becomes an `Auth`/`Store` error with reason
//! `Timeout` instead of stalling the caller forever.

use crate::error::{AuthFailure, NotekeeperError, Result, StoreFailure};
use std::future::Future;
use std::time::Duration;

pub(crate) async fn identity_call<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(NotekeeperError::auth(
            AuthFailure::Timeout,
            format!("{operation} did not complete within {}s", limit.as_secs_f32()),
        )),
    }
}

pub(crate) async fn store_call<T>(
    limit: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(NotekeeperError::store(
            StoreFailure::Timeout,
            format!("{operation} did not complete within {}s", limit.as_secs_f32()),
        )),
    }
}
