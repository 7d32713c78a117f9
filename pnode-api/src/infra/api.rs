// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod v1;

use crate::{
    domain::Api,
    infra::{credits::CreditsClient, geo::GeoClient, price::PriceClient, registry::RegistryClient},
};
use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use log::info;
use pnode_common::domain::Network;
use serde::Deserialize;
use std::{io, net::IpAddr};
use thiserror::Error;
use tokio::signal::unix::{SignalKind, signal};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

/// Shared state for all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub network: Network,
    pub registry: RegistryClient,
    pub credits: CreditsClient,
    pub geo: GeoClient,
    pub price: PriceClient,
}

/// Axum based [Api] implementation.
pub struct AxumApi {
    config: Config,
    state: AppState,
}

impl AxumApi {
    pub fn new(config: Config, state: AppState) -> Self {
        Self { config, state }
    }
}

impl Api for AxumApi {
    type Error = AxumApiError;

    async fn serve(self) -> Result<(), Self::Error> {
        let Config {
            address,
            port,
            request_body_limit,
        } = self.config;

        let app = make_app(self.state, request_body_limit as usize);

        let listener = tokio::net::TcpListener::bind((address, port))
            .await
            .map_err(AxumApiError::Bind)?;
        info!(address:?, port; "listening to TCP connections");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(AxumApiError::Serve)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub address: IpAddr,
    pub port: u16,

    #[serde(with = "byte_unit_serde")]
    pub request_body_limit: u64,
}

#[derive(Debug, Error)]
pub enum AxumApiError {
    #[error("cannot bind tcp listener")]
    Bind(#[source] io::Error),

    #[error("cannot serve API")]
    Serve(#[source] io::Error),
}

fn make_app(state: AppState, request_body_limit: usize) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .nest("/api/v1", v1::make_app())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(request_body_limit))
                .layer(CorsLayer::permissive()),
        )
}

async fn ready() -> impl IntoResponse {
    StatusCode::OK
}

async fn shutdown_signal() {
    signal(SignalKind::terminate())
        .expect("install SIGTERM handler")
        .recv()
        .await;
}
