//! Process signal handling.
//!
//! SIGINT and SIGTERM broadcast a shutdown to every listener. SIGHUP is
//! acknowledged in the log only; configuration is read once at startup.

use tokio::signal;
use tokio::sync::broadcast;

/// Wait for a termination signal, then notify every subscriber of `shutdown_tx`.
pub async fn shutdown_signal_handler(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
        _ = hangup_logger() => {}
    }

    notify_shutdown(&shutdown_tx);
}

/// Log every SIGHUP until the process stops. Never completes on its own.
#[cfg(unix)]
async fn hangup_logger() {
    let mut hangups = match signal::unix::signal(signal::unix::SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGHUP handler");
            return std::future::pending().await;
        }
    };

    while hangups.recv().await.is_some() {
        tracing::info!("Received SIGHUP, configuration stays as loaded at startup");
    }

    std::future::pending().await
}

#[cfg(not(unix))]
async fn hangup_logger() {
    std::future::pending().await
}

/// Broadcast shutdown; returns how many listeners were still subscribed.
pub fn notify_shutdown(shutdown_tx: &broadcast::Sender<()>) -> usize {
    match shutdown_tx.send(()) {
        Ok(receivers) => receivers,
        Err(_) => {
            tracing::debug!("No listeners left to notify");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_reaches_every_subscriber() {
        let (tx, mut first) = broadcast::channel(1);
        let mut second = tx.subscribe();

        assert_eq!(notify_shutdown(&tx), 2);
        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
    }

    #[test]
    fn test_notify_without_subscribers() {
        let (tx, rx) = broadcast::channel::<()>(1);
        drop(rx);
        assert_eq!(notify_shutdown(&tx), 0);
    }
}
