//! HTTP request handlers.

use crate::server::AppState;
use axum::{
    body::Bytes,
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use postrpc::codec::parse_form;
use postrpc::config::ProtocolConfig;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// RPC endpoint: `POST {path}?rpc={name}` with `arg{i}` form fields.
///
/// Always answers 200 with an envelope; failures are reported inside the envelope only.
/// The query and body are parsed leniently so that no request is rejected before
/// dispatch.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> impl IntoResponse {
    let rpc_name = query
        .as_deref()
        .map(parse_form)
        .and_then(|mut params| params.remove(ProtocolConfig::RPC_QUERY_PARAM));
    let body = String::from_utf8_lossy(&body);

    let response = state
        .dispatcher
        .respond_to_request(rpc_name.as_deref(), &body)
        .await;
    if !response.recognized {
        debug!("Unrecognized RPC request: {:?}", rpc_name);
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, ProtocolConfig::JSON_CONTENT_TYPE)],
        response.body(),
    )
}
