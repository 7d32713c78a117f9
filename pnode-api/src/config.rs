// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{application, infra};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(rename = "application")]
    pub application_config: application::Config,

    #[serde(rename = "infra")]
    pub infra_config: infra::Config,

    #[serde(rename = "telemetry", default)]
    pub telemetry_config: pnode_common::telemetry::Config,
}
