//! HTTP+JSON RPC surface, SSE mutation stream, and Await/Watch client
//! helpers for the beads daemon process.

pub mod await_watch;
pub mod error;
pub mod events;
pub mod matcher;
pub mod rpc;
pub mod routes;
pub mod state;
pub mod token;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use beads_query::Router;
use beads_storage::Storage;
use tokio::net::TcpListener;

use crate::events::EventHub;
use crate::state::AppState;

pub use await_watch::{AwaitClient, AwaitResult, DecisionResult};
pub use matcher::Matcher;

/// Options collected from CLI flags / config to start a daemon instance.
pub struct DaemonOptions {
    pub store: Arc<dyn Storage>,
    pub router: Router,
    pub beads_dir: std::path::PathBuf,
    pub host: String,
    pub port: u16,
    pub readonly: bool,
}

/// Binds the listener, mints the SSE token, and returns the running
/// `axum::Router`, listener, and resolved socket address. Must be called
/// from within a Tokio runtime. The caller drives `axum::serve` itself so it
/// can fold it into its own shutdown handling.
pub async fn build(
    options: DaemonOptions,
) -> std::io::Result<(axum::Router, TcpListener, SocketAddr, String)> {
    let listener = TcpListener::bind((options.host.as_str(), options.port)).await?;
    let addr = listener.local_addr()?;

    let token = token::mint(&options.beads_dir)?;

    let state = Arc::new(AppState {
        store: options.store,
        router: options.router,
        events: EventHub::new(),
        readonly: options.readonly,
        sse_token: token.clone(),
        started_at: Instant::now(),
        http_addr: addr.to_string(),
    });

    Ok((routes::build_router(state), listener, addr, token))
}
