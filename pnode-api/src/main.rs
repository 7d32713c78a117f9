// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use log::{error, info};
use pnode_api::{
    application,
    config::Config,
    infra::{
        self,
        api::{AppState, AxumApi},
        cache::TtlCache,
        credits::CreditsClient,
        geo::GeoClient,
        price::PriceClient,
        registry::RegistryClient,
    },
};
use pnode_common::{config::ConfigExt, telemetry};
use std::{panic, sync::Arc, time::Duration};
use tokio::signal::unix::{SignalKind, signal};

/// Cache TTL for price and token market data.
const PRICE_TTL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    telemetry::init_logging();
    panic::set_hook(Box::new(|panic| error!(panic:%; "process panicked")));

    if let Err(error) = run().await {
        let backtrace = error.backtrace();
        let error = format!("{error:#}");
        error!(error, backtrace:%; "process exited with ERROR");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler can be registered");
    let config = Config::load().context("load configuration")?;
    info!(config:?; "starting");

    let Config {
        application_config,
        infra_config,
        telemetry_config:
            telemetry::Config {
                tracing_config,
                metrics_config,
            },
    } = config;

    telemetry::init_tracing(tracing_config);
    telemetry::init_metrics(metrics_config);

    let infra::Config {
        api_config,
        registry_config,
        credits_config,
        geo_config,
        price_config,
    } = infra_config;

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("create HTTP client")?;

    // Response caches: one per data kind, created once here and handed to the clients.
    let native_price_cache = Arc::new(TtlCache::new(PRICE_TTL));
    let token_metrics_cache = Arc::new(TtlCache::new(PRICE_TTL));
    let geo_cache = Arc::new(TtlCache::new(geo_config.soft_ttl));

    let state = AppState {
        network: application_config.network,
        registry: RegistryClient::new(registry_config, http.clone()),
        credits: CreditsClient::new(credits_config, http.clone()),
        geo: GeoClient::new(geo_config, http.clone(), geo_cache),
        price: PriceClient::new(price_config, http, native_price_cache, token_metrics_cache),
    };

    let api = AxumApi::new(api_config, state);

    application::run(api, sigterm)
        .await
        .context("run dashboard API application")
}
