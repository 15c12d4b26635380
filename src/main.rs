//! Student records API server.

use std::sync::Arc;

use roster::middleware::LoggerMiddleware;
use roster::students::{self, InMemoryStore};
use roster::{Config, Server};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::default();

    let mut router = students::routes(Arc::new(InMemoryStore::new()));
    router.layer(LoggerMiddleware);
    let router = Arc::new(router);

    let server = Server::from_config(&config).await?;
    tracing::info!(
        "Student API running at http://localhost:{}",
        server.local_addr().port()
    );

    server
        .run(move |req| {
            let router = Arc::clone(&router);
            async move { router.route(req).await }
        })
        .await?;

    Ok(())
}
