// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

/// Resolved geolocation for a node host; only the fields the dashboard consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub ip: String,
    pub country: String,
    pub country_code: String,
    pub city: String,
    pub lat: f64,
    pub lon: f64,
}
