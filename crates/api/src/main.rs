use anyhow::Context;

use hrms_api::{ApiConfig, AppState, build_app};
use hrms_auth::RouteTable;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hrms_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "starting hrms-api");

    let backend = hrms_infra::init_global(|| Ok(config.build_backend()?))?;
    let state = AppState::new(backend, RouteTable::default(), config.cookie_policy());
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
