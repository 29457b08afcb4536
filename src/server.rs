//! Serving a [`Dispatcher`] over HTTP with axum.

use crate::config::ServerConfig;
use crate::context::RequestContext;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::common::render_error;
use axum::Router;
use axum::extract::Request;
use axum::response::Response;
use tokio::signal;

impl Dispatcher {
    /// Dispatch a raw HTTP request.
    pub async fn dispatch_http(&self, request: Request) -> Response {
        let (parts, _body) = request.into_parts();
        match RequestContext::from_parts(&parts) {
            Some(ctx) => self.dispatch(ctx).await,
            None if self.has_path(parts.uri.path()) => {
                tracing::debug!("Unsupported method {} {}", parts.method, parts.uri);
                render_error(405, "Method Not Allowed")
            }
            None => {
                tracing::debug!("{} {}: no route", parts.method, parts.uri);
                render_error(404, "Not Found")
            }
        }
    }

    /// Convert the route table into an axum [`Router`].
    ///
    /// Every request is handed to the dispatcher, which does its own exact
    /// path matching, so route paths are never interpreted as axum patterns.
    /// Layers can be added to the returned router as usual.
    pub fn into_router<S>(self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        Router::new().fallback(move |request: Request| {
            let dispatcher = self.clone();
            async move { dispatcher.dispatch_http(request).await }
        })
    }
}

/// Bind to `config.address()` and serve `router` until Ctrl+C or SIGTERM.
pub async fn serve(router: Router, config: &ServerConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.address()).await?;
    tracing::info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Create a future that completes when a shutdown signal is received
///
/// # Example
///
/// ```rust,ignore
/// use paramflow::server::shutdown_signal;
///
/// tokio::select! {
///     _ = shutdown_signal() => {
///         tracing::info!("Shutdown signal received");
///     }
///     _ = server.serve() => {}
/// }
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
