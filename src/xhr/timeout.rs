use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Outcome of racing an operation against a timer and a cancellation token.
#[derive(Debug, PartialEq)]
pub(crate) enum Race<T> {
    /// The operation settled first
    Finished(T),
    /// The timer fired first. The token has been canceled.
    TimedOut,
    /// The token was canceled from elsewhere (abort or a new open)
    Canceled,
}

/// Races `operation` against an optional timer.
///
/// Whatever loses is dropped when this returns: a pending timer is released, and an operation
/// that lost to the timer is dropped after `cancel` has been triggered so the transport stops
/// too. Without a timeout only cancellation can cut the operation short.
pub(crate) async fn race<F>(operation: F, timeout: Option<Duration>, cancel: &CancellationToken) -> Race<F::Output>
where
    F: Future,
{
    let timer = async {
        match timeout {
            Some(duration) => tokio::time::sleep(duration).await,
            None => futures::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Race::Canceled,
        out = operation => Race::Finished(out),
        _ = timer => {
            cancel.cancel();
            Race::TimedOut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fast_operation_wins() {
        let cancel = CancellationToken::new();
        let res = race(async { 7 }, Some(Duration::from_millis(50)), &cancel).await;
        assert_eq!(res, Race::Finished(7));
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_wins_and_cancels_token() {
        let cancel = CancellationToken::new();
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            1
        };
        let res = race(slow, Some(Duration::from_millis(50)), &cancel).await;
        assert_eq!(res, Race::TimedOut);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn no_timeout_waits_for_operation() {
        let cancel = CancellationToken::new();
        let slow = async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            "done"
        };
        assert_eq!(race(slow, None, &cancel).await, Race::Finished("done"));
    }

    #[tokio::test]
    async fn cancellation_beats_everything() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let res = race(futures::future::pending::<()>(), Some(Duration::from_secs(1)), &cancel).await;
        assert_eq!(res, Race::Canceled);
    }
}
