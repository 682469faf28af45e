/// Ripple - Minimal Social Networking Backend
///
/// A small social service: accounts, image posts, likes, comments, and a
/// follow graph, served over a JSON REST API.

mod account;
mod api;
mod auth;
mod comment;
mod config;
mod context;
mod db;
mod error;
mod media;
mod post;
mod server;

use config::ServerConfig;
use context::AppContext;
use error::ApiResult;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ripple=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Print banner
    print_banner();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ____  _               __
   / __ \(_)___  ____    / /__
  / /_/ / / __ \/ __ \  / / _ \
 / _, _/ / /_/ / /_/ / / /  __/
/_/ |_/_/ .___/ .___/ /_/\___/
       /_/   /_/

        Minimal Social Networking Backend v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
