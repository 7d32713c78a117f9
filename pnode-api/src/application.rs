// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::domain::Api;
use anyhow::Context as AnyhowContext;
use log::warn;
use pnode_common::domain::Network;
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use tokio::{select, signal::unix::Signal, task};

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde_as(as = "DisplayFromStr")]
    pub network: Network,
}

/// Serve the API until SIGTERM.
pub async fn run(api: impl Api, mut sigterm: Signal) -> anyhow::Result<()> {
    let serve_api_task =
        task::spawn(async move { api.serve().await.context("serving dashboard API") });

    select! {
        result = serve_api_task => result
            .context("serve_api_task panicked")
            .and_then(|r| r.context("serve_api_task failed")),
        _ = sigterm.recv() => {
            warn!("SIGTERM received");
            Ok(())
        }
    }
}
