//! Bounded waiting on an in-flight request.
//!
//! [`wait_with_timeout`] runs a future on its own task and races its result
//! against a timer and a cancellation token. Whichever finishes first decides the
//! single outcome:
//!
//! - the future completes: its result is returned;
//! - the timer fires: [`NetError::Timeout`];
//! - the caller's token is cancelled: [`NetError::Cancelled`].
//!
//! The result travels over a one-shot channel, so a late completion after a
//! timeout has nowhere to go and is dropped. The in-flight task watches a child
//! token that is cancelled as soon as the wait ends, for whatever reason, which
//! also stops the underlying transport future.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::errors::NetError;

pub async fn wait_with_timeout<T, F>(
    fut: F,
    timeout: Duration,
    cancel: CancellationToken,
) -> Result<T, NetError>
where
    F: Future<Output = Result<T, NetError>> + Send + 'static,
    T: Send + 'static,
{
    let inflight = cancel.child_token();
    // Cancels the in-flight task on every exit path, including the caller dropping us
    let _guard = inflight.clone().drop_guard();

    let (tx, rx) = oneshot::channel();
    let task_token = inflight.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = task_token.cancelled() => {}
            res = fut => {
                // Receiver is gone when the wait already ended
                let _ = tx.send(res);
            }
        }
    });

    tokio::select! {
        res = rx => match res {
            Ok(outcome) => outcome,
            Err(_) if cancel.is_cancelled() => Err(NetError::Cancelled),
            Err(_) => Err(NetError::Transport("request task ended without a result".to_string())),
        },
        _ = tokio::time::sleep(timeout) => {
            inflight.cancel();
            Err(NetError::Timeout(timeout))
        }
        _ = cancel.cancelled() => Err(NetError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[tokio::test]
    async fn returns_the_result_when_it_arrives_in_time() {
        let res = wait_with_timeout(async { Ok::<_, NetError>(7) }, Duration::from_secs(1), CancellationToken::new()).await;
        assert_eq!(res.unwrap(), 7);
    }

    #[tokio::test]
    async fn passes_errors_through() {
        let res: Result<(), _> = wait_with_timeout(
            async { Err(NetError::Transport("reset".into())) },
            Duration::from_secs(1),
            CancellationToken::new(),
        )
        .await;
        assert!(matches!(res, Err(NetError::Transport(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn times_out_no_earlier_than_the_deadline() {
        let timeout = Duration::from_millis(100);
        let started = Instant::now();

        let res: Result<(), _> = wait_with_timeout(futures::future::pending(), timeout, CancellationToken::new()).await;

        assert!(matches!(res, Err(NetError::Timeout(d)) if d == timeout));
        let elapsed = started.elapsed();
        assert!(elapsed >= timeout, "returned after {elapsed:?}");
        assert!(elapsed < timeout + Duration::from_secs(2), "returned after {elapsed:?}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn late_completion_is_dropped_and_task_is_stopped() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let res = wait_with_timeout(
            async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                flag.store(true, Ordering::SeqCst);
                Ok::<_, NetError>(())
            },
            Duration::from_millis(50),
            CancellationToken::new(),
        )
        .await;
        assert!(matches!(res, Err(NetError::Timeout(_))));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!finished.load(Ordering::SeqCst), "in-flight future kept running after the timeout");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn caller_cancellation_wins() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let res: Result<(), _> = wait_with_timeout(futures::future::pending(), Duration::from_secs(5), cancel).await;
        assert!(matches!(res, Err(NetError::Cancelled)));
    }

    #[tokio::test]
    async fn already_cancelled_token_never_runs_to_success() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res: Result<(), _> = wait_with_timeout(futures::future::pending(), Duration::from_secs(5), cancel).await;
        assert!(matches!(res, Err(NetError::Cancelled)));
    }
}
