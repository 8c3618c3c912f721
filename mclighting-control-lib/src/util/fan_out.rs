//! Running one operation against every light at once.
//!
//! All futures are polled concurrently on the calling task and every one of
//! them runs to completion, even after another has failed. Results keep the
//! order of the input, which is the order of the device set.

use std::future::Future;

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};

/// How the outcome of a fan-out is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FanOutMode {
    /// Stop at the first failure and report only that error.
    #[default]
    FirstError,
    /// Wait for every light and report each result.
    CollectAll,
}

/// Resolves to all values in order, or to the first error observed.
///
/// A failure does not cancel the other futures; the error is reported once
/// all of them have finished.
pub async fn first_error<I, T, E>(futures: I) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    I::Item: Future<Output = Result<T, E>>,
{
    let (values, failure) = settle(futures).await;
    match failure {
        Some(e) => Err(e),
        None => Ok(values.into_iter().flatten().collect()),
    }
}

/// Runs every future to completion.
///
/// Returns the successful values at their input index, and the error of the
/// future that failed first in completion order.
pub async fn settle<I, T, E>(futures: I) -> (Vec<Option<T>>, Option<E>)
where
    I: IntoIterator,
    I::Item: Future<Output = Result<T, E>>,
{
    let mut pending = futures
        .into_iter()
        .enumerate()
        .map(|(index, future)| async move { (index, future.await) })
        .collect::<FuturesUnordered<_>>();

    let mut values: Vec<Option<T>> = (0..pending.len()).map(|_| None).collect();
    let mut failure = None;
    while let Some((index, result)) = pending.next().await {
        match result {
            Ok(value) => values[index] = Some(value),
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
    }
    (values, failure)
}

/// Resolves once every future is done, keeping each individual result.
pub async fn collect_all<I, T, E>(futures: I) -> Vec<Result<T, E>>
where
    I: IntoIterator,
    I::Item: Future<Output = Result<T, E>>,
{
    join_all(futures).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;

    async fn delayed(value: u32, millis: u64) -> Result<u32, String> {
        sleep(Duration::from_millis(millis)).await;
        if value == 0 {
            Err(format!("failed after {}ms", millis))
        } else {
            Ok(value)
        }
    }

    #[tokio::test]
    async fn test_first_error_keeps_input_order() {
        let result = first_error(vec![delayed(1, 30), delayed(2, 10), delayed(3, 20)]).await;
        assert_eq!(result, Ok(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_first_error_reports_earliest_failure() {
        let result = first_error(vec![delayed(1, 50), delayed(0, 5), delayed(0, 20)]).await;
        assert_eq!(result, Err("failed after 5ms".to_string()));
    }

    #[tokio::test]
    async fn test_first_error_lets_later_futures_finish() {
        let finished = Arc::new(AtomicBool::new(false));
        let slow = {
            let finished = finished.clone();
            async move {
                sleep(Duration::from_millis(30)).await;
                finished.store(true, Ordering::SeqCst);
                Ok::<u32, String>(1)
            }
        };
        let failing = async { Err::<u32, _>("failed at once".to_string()) };

        type Boxed = std::pin::Pin<Box<dyn Future<Output = Result<u32, String>>>>;
        let futures: Vec<Boxed> = vec![Box::pin(failing), Box::pin(slow)];
        let result = first_error(futures).await;
        assert_eq!(result, Err("failed at once".to_string()));
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_settle_keeps_successes_at_their_index() {
        let (values, failure) = settle(vec![delayed(0, 20), delayed(5, 1), delayed(0, 5)]).await;
        assert_eq!(values, vec![None, Some(5), None]);
        assert_eq!(failure, Some("failed after 5ms".to_string()));
    }

    #[tokio::test]
    async fn test_collect_all_keeps_every_result() {
        let results = collect_all(vec![delayed(0, 5), delayed(7, 1)]).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert_eq!(results[1], Ok(7));
    }

    #[tokio::test]
    async fn test_empty_fan_out() {
        let futures: Vec<std::future::Ready<Result<u32, String>>> = Vec::new();
        assert_eq!(first_error(futures).await, Ok(vec![]));
    }
}
