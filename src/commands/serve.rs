use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;

use crate::commands::SyncContext;
use crate::server;

pub const DEFAULT_PORT: u16 = 4096;

pub async fn run(ctx: SyncContext, port: u16) -> Result<()> {
    let app = server::router(Arc::new(server::AppState::new(ctx)));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("meetcal listening on http://{}", addr);
    tracing::info!(%addr, "serving sync trigger");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
