// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use fastrace::collector::{Config as FastraceConfig, ConsoleReporter};
use log::LevelFilter;
use logforth::append;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Deserialize;
use std::{env, net::IpAddr};

/// Telemetry configuration: tracing and metrics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(rename = "tracing", default)]
    pub tracing_config: Option<TracingConfig>,

    #[serde(rename = "metrics", default)]
    pub metrics_config: Option<MetricsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub address: IpAddr,
    pub port: u16,
}

/// Initialize logging with a stderr appender; the level is taken from `RUST_LOG`, defaulting
/// to info.
pub fn init_logging() {
    let level = env::var("RUST_LOG")
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    use logforth::record::{Level, LevelFilter as LogforthLevelFilter};
    let filter = match level {
        LevelFilter::Off => LogforthLevelFilter::Off,
        LevelFilter::Error => LogforthLevelFilter::MoreSevereEqual(Level::Error),
        LevelFilter::Warn => LogforthLevelFilter::MoreSevereEqual(Level::Warn),
        LevelFilter::Info => LogforthLevelFilter::MoreSevereEqual(Level::Info),
        LevelFilter::Debug => LogforthLevelFilter::MoreSevereEqual(Level::Debug),
        LevelFilter::Trace => LogforthLevelFilter::MoreSevereEqual(Level::Trace),
    };

    logforth::starter_log::builder()
        .dispatch(|dispatch| dispatch.filter(filter).append(append::Stderr::default()))
        .apply();
}

/// Initialize tracing with a console reporter if enabled.
pub fn init_tracing(config: Option<TracingConfig>) {
    if let Some(TracingConfig { enabled: true }) = config {
        fastrace::set_reporter(ConsoleReporter, FastraceConfig::default());
    }
}

/// Initialize the Prometheus metrics exporter if configured. Must be called from within a
/// Tokio runtime.
pub fn init_metrics(config: Option<MetricsConfig>) {
    if let Some(MetricsConfig { address, port }) = config {
        if let Err(error) = PrometheusBuilder::new()
            .with_http_listener((address, port))
            .install()
        {
            log::error!("cannot install Prometheus metrics exporter: {error}");
        }
    }
}
