//! Listener setup: plain HTTP or TLS with the responder identity

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpListener;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;
use tower::Service;

/// Serve plain HTTP until SIGINT/SIGTERM
pub async fn serve_plain(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

/// Serve HTTPS, terminating TLS per connection
pub async fn serve_tls(
    listener: TcpListener,
    app: Router,
    acceptor: TlsAcceptor,
) -> anyhow::Result<()> {
    let mut make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, remote) = accepted?;
                let service = make_service.call(remote).await?;
                let acceptor = acceptor.clone();
                tokio::spawn(async move {
                    let stream = match acceptor.accept(stream).await {
                        Ok(stream) => stream,
                        Err(e) => {
                            tracing::debug!(%remote, "TLS handshake failed: {e}");
                            return;
                        }
                    };
                    let service = hyper_util::service::TowerToHyperService::new(service);
                    if let Err(e) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection_with_upgrades(TokioIo::new(stream), service)
                        .await
                    {
                        tracing::debug!(%remote, "connection error: {e}");
                    }
                });
            }
            _ = &mut shutdown => break,
        }
    }
    Ok(())
}

/// TLS acceptor using the responder certificate chain and key
pub fn tls_acceptor(cert_path: &Path, key_path: &Path) -> anyhow::Result<TlsAcceptor> {
    let cert_data = std::fs::read(cert_path)
        .with_context(|| format!("could not read {}", cert_path.display()))?;
    let certs = rustls_pemfile::certs(&mut cert_data.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid certificate PEM in {}", cert_path.display()))?;

    let key_data = std::fs::read(key_path)
        .with_context(|| format!("could not read {}", key_path.display()))?;
    let key = rustls_pemfile::private_key(&mut key_data.as_slice())
        .with_context(|| format!("invalid key PEM in {}", key_path.display()))?
        .with_context(|| format!("no private key in {}", key_path.display()))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("TLS configuration rejected the responder identity")?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Wait for SIGTERM or SIGINT
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
