//! Runs one action per identifier concurrently.
//!
//! All actions are polled together on the caller's task and every one runs to
//! completion: a failure does not cancel its siblings. Dropping the returned
//! future drops, and so aborts, every action still in flight.

use std::future::Future;

use futures::future::join_all;

use crate::error::FcmError;

/// Runs `action` for every id and waits for all of them.
///
/// Fails if any action failed, reporting the error of the first failed id in
/// input order. The other outcomes are discarded; use
/// [`collect_concurrently`] when partial success matters.
pub async fn for_each_concurrently<I, F, Fut, T>(ids: I, action: F) -> Result<(), FcmError>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, FcmError>>,
{
    let outcomes = join_all(ids.into_iter().map(action)).await;

    let failures = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    if failures > 0 {
        debug!("{} of {} concurrent calls failed", failures, outcomes.len());
    }

    match outcomes.into_iter().find_map(Result::err) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Runs `action` for every id and returns each id with its own outcome, in
/// input order.
pub async fn collect_concurrently<I, F, Fut, T>(ids: I, mut action: F) -> Vec<(I::Item, Result<T, FcmError>)>
where
    I: IntoIterator,
    I::Item: Clone,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, FcmError>>,
{
    let ids: Vec<I::Item> = ids.into_iter().collect();
    let outcomes = join_all(ids.iter().cloned().map(&mut action)).await;

    ids.into_iter().zip(outcomes).collect()
}
