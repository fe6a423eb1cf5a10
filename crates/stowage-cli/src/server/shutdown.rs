//! Shutdown trigger and drain deadline.

use std::future::Future;
use std::time::Duration;

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;
use tokio::sync::oneshot;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;

/// Returns the graceful-shutdown trigger and its drain deadline for
/// SIGINT/SIGTERM.
///
/// See [`with_drain_deadline`].
pub fn shutdown_signal(
    shutdown_timeout: Duration,
) -> (impl Future<Output = ()>, impl Future<Output = ()>) {
    with_drain_deadline(wait_for_signal(), shutdown_timeout)
}

/// Pairs `trigger` with a deadline that resolves `drain_timeout` after it.
///
/// The first future resolves with `trigger` and is what the server waits on
/// before it stops accepting connections. The second resolves once in-flight
/// requests have had `drain_timeout` to finish, and never if the trigger is
/// dropped unfired.
pub fn with_drain_deadline<F>(
    trigger: F,
    drain_timeout: Duration,
) -> (impl Future<Output = ()>, impl Future<Output = ()>)
where
    F: Future<Output = ()>,
{
    let (fired_tx, fired_rx) = oneshot::channel::<()>();

    let signal = async move {
        trigger.await;
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            timeout_secs = drain_timeout.as_secs(),
            "Graceful shutdown initiated"
        );
        let _ = fired_tx.send(());
    };

    let deadline = async move {
        if fired_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(drain_timeout).await;
        tracing::warn!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            timeout_secs = drain_timeout.as_secs(),
            "In-flight requests outlived the shutdown timeout"
        );
    };

    (signal, deadline)
}

/// Resolves on the first SIGINT or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires.
async fn wait_for_signal() {
    let interrupt = async {
        match ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %err,
                    "Failed to install SIGINT handler"
                );
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    error = %err,
                    "Failed to install SIGTERM handler"
                );
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        signal = received,
        "Received shutdown signal"
    );
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn deadline_follows_trigger() {
        let drain = Duration::from_millis(20);
        let (signal, deadline) = with_drain_deadline(async {}, drain);

        let started = Instant::now();
        signal.await;
        timeout(Duration::from_secs(5), deadline).await.unwrap();
        assert!(started.elapsed() >= drain);
    }

    #[tokio::test]
    async fn deadline_waits_for_trigger() {
        let (signal, deadline) =
            with_drain_deadline(std::future::pending::<()>(), Duration::ZERO);
        tokio::pin!(signal);
        tokio::pin!(deadline);

        let both = async {
            tokio::select! {
                () = &mut signal => "signal",
                () = &mut deadline => "deadline",
            }
        };
        assert!(timeout(Duration::from_millis(50), both).await.is_err());
    }

    #[tokio::test]
    async fn dropped_trigger_never_expires() {
        let (signal, deadline) = with_drain_deadline(async {}, Duration::ZERO);
        drop(signal);

        assert!(
            timeout(Duration::from_millis(50), deadline)
                .await
                .is_err()
        );
    }
}
