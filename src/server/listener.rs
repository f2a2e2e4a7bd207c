//! Plain and TLS listeners sharing one router.

use std::future::IntoFuture;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

use super::tls::{build_acceptor, serve_tls, TlsError};
use crate::config::Settings;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(#[from] TlsError),

    #[error("TLS listener requires tls.cert_file and tls.key_file")]
    MissingKeyMaterial,
}

async fn bind(addr: String) -> Result<TcpListener, ListenerError> {
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })
}

/// Run every configured listener until all of them stop.
///
/// Each listener watches `shutdown_tx` and winds down when it fires. A
/// listener that dies is logged and does not take the others down.
pub async fn serve(
    app: Router,
    settings: &Settings,
    shutdown_tx: &broadcast::Sender<()>,
) -> Result<(), ListenerError> {
    let mut listeners = JoinSet::new();

    if settings.server.port != 0 {
        let addr = settings.server_addr();
        let listener = bind(addr.clone()).await?;
        tracing::info!("Plain HTTP listening on {}", addr);

        let mut shutdown = shutdown_tx.subscribe();
        listeners.spawn(
            axum::serve(listener, app.clone())
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .into_future(),
        );
    } else {
        tracing::info!("Plain HTTP port not configured");
    }

    if settings.tls.is_enabled() {
        let (Some(cert_file), Some(key_file)) = (&settings.tls.cert_file, &settings.tls.key_file)
        else {
            return Err(ListenerError::MissingKeyMaterial);
        };

        let acceptor = build_acceptor(cert_file, key_file)?;
        let addr = settings.tls_addr();
        let listener = bind(addr.clone()).await?;
        tracing::info!("HTTPS listening on {}", addr);

        listeners.spawn(serve_tls(listener, acceptor, app, shutdown_tx.subscribe()));
    } else {
        tracing::info!("TLS port not configured");
    }

    while let Some(joined) = listeners.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Listener stopped with error"),
            Err(e) => tracing::error!(error = %e, "Listener task panicked"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_missing_key_material() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        settings.tls.port = 5443;
        settings.tls.cert_file = Some(PathBuf::from("cert.pem"));

        let (tx, _) = broadcast::channel(1);
        let err = serve(Router::new(), &settings, &tx).await.unwrap_err();
        assert!(matches!(err, ListenerError::MissingKeyMaterial));
    }

    #[tokio::test]
    async fn test_plain_listener_stops_on_shutdown() {
        let mut settings = Settings::default();
        settings.server.host = "127.0.0.1".to_string();
        settings.server.port = 0;

        // Nothing configured: returns immediately
        let (tx, _) = broadcast::channel(1);
        serve(Router::new(), &settings, &tx).await.unwrap();

        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        settings.server.port = probe.local_addr().unwrap().port();
        drop(probe);

        let shutdown = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = shutdown.send(());
        });

        tokio::time::timeout(Duration::from_secs(5), serve(Router::new(), &settings, &tx))
            .await
            .expect("listener did not shut down")
            .unwrap();
    }
}
