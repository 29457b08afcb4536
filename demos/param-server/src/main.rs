use paramflow::prelude::*;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod controller;

use controller::MyController;

#[tokio::main]
async fn main() -> paramflow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting param-server...");

    let dispatcher = Dispatcher::builder().register(MyController)?.build();
    for (method, path) in dispatcher.routes() {
        tracing::info!("  {} {}", method, path);
    }

    let router: axum::Router = dispatcher.into_router().layer(TraceLayer::new_for_http());
    let config = ServerConfig::from_env()?;

    paramflow::server::serve(router, &config).await
}
