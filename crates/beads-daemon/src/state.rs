//! Shared application state handed to every axum handler.

use std::sync::Arc;
use std::time::Instant;

use beads_query::Router;
use beads_storage::Storage;

use crate::events::EventHub;

pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub router: Router,
    pub events: EventHub,
    pub readonly: bool,
    pub sse_token: String,
    pub started_at: Instant,
    pub http_addr: String,
}
