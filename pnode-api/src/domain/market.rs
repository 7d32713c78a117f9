// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

/// Native asset price quote, labeled with its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub price: f64,
    pub cached: bool,

    /// Provider id, "cache" or "default".
    pub source: String,
}

/// Project token market metrics; only the fields the dashboard consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetrics {
    pub price_usd: f64,
    pub market_cap_usd: f64,
    pub volume_24h_usd: f64,
    pub change_24h_percent: f64,
}

/// Token metrics together with their cache provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenQuote {
    pub metrics: TokenMetrics,
    pub cached: bool,
}
