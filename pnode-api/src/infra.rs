// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

pub mod api;
pub mod cache;
pub mod credits;
pub mod geo;
pub mod price;
pub mod registry;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(rename = "api")]
    pub api_config: api::Config,

    #[serde(rename = "registry")]
    pub registry_config: registry::Config,

    #[serde(rename = "credits")]
    pub credits_config: credits::Config,

    #[serde(rename = "geo")]
    pub geo_config: geo::Config,

    #[serde(rename = "price")]
    pub price_config: price::Config,
}
