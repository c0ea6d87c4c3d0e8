use axum::{extract::State, Json};
use serde::Serialize;

use super::AdminState;
use crate::cache::EntrySummary;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub active_connections: u64,
    pub cache_entries: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        active_connections: state.tracker.active_count(),
        cache_entries: state.store.len(),
    })
}

/// Metadata for every cached entry, sorted by key. Bodies are not included.
pub async fn get_cache(State(state): State<AdminState>) -> Json<Vec<EntrySummary>> {
    Json(state.store.snapshot())
}
