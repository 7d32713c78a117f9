// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    domain::{GeoLocation, PriceQuote, TokenMetrics, TokenQuote, aggregate},
    infra::api::AppState,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub fn make_app() -> Router<AppState> {
    Router::new()
        .route("/info", get(info))
        .route("/nodes", get(nodes))
        .route("/geolocation", post(geolocation))
        .route("/price/native", get(native_price))
        .route("/price/token", get(token_price))
}

/// Service name, version and network.
async fn info(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME").to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        network: state.network.to_string(),
    })
}

/// Aggregated node inventory with per-node scores and the network rollup.
async fn nodes(State(state): State<AppState>) -> Response {
    match aggregate(&state.registry, &state.credits).await {
        Ok(snapshot) if snapshot.nodes.is_empty() => {
            warn!("node registry yielded an empty inventory");
            error_response(StatusCode::NOT_FOUND, "no nodes found")
        }

        Ok(snapshot) => Json(DataEnvelope {
            success: true,
            data: snapshot,
        })
        .into_response(),

        Err(error) => {
            error!(error:%; "cannot aggregate node inventory");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "cannot aggregate node inventory",
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoRequest {
    #[serde(default)]
    ips: Vec<String>,
}

/// Batch geolocation lookup; at most 100 effective addresses per request.
async fn geolocation(
    State(state): State<AppState>,
    Json(request): Json<GeoRequest>,
) -> Json<DataEnvelope<HashMap<String, GeoLocation>>> {
    let data = state.geo.locate(&request.ips).await;
    Json(DataEnvelope {
        success: true,
        data,
    })
}

async fn native_price(State(state): State<AppState>) -> Json<PriceQuote> {
    Json(state.price.native_price().await)
}

async fn token_price(State(state): State<AppState>) -> Json<TokenResponse> {
    let TokenQuote { metrics, cached } = state.price.token_metrics().await;
    Json(TokenResponse {
        success: true,
        data: metrics,
        cached,
    })
}

#[derive(Debug, Serialize)]
struct DataEnvelope<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    success: bool,
    data: TokenMetrics,
    cached: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceInfo {
    name: String,
    version: String,
    network: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: String,
}

fn error_response(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(ErrorEnvelope {
            success: false,
            error: error.to_owned(),
        }),
    )
        .into_response()
}
