// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::domain::CreditSource;
use fastrace::trace;
use log::warn;
use metrics::counter;
use serde::Deserialize;
use std::{collections::HashMap, time::Duration};

const STATUS_OK: &str = "ok";

/// Config for the credits ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub url: String,

    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Credits ledger client.
///
/// Credits are best-effort enrichment: every failure path degrades to an empty mapping and
/// never surfaces an error to the caller.
#[derive(Clone)]
pub struct CreditsClient {
    http: reqwest::Client,
    config: Config,
}

impl CreditsClient {
    pub fn new(config: Config, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    #[trace]
    async fn fetch(&self) -> Result<CreditsResponse, reqwest::Error> {
        self.http
            .get(&self.config.url)
            .timeout(self.config.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<CreditsResponse>()
            .await
    }
}

impl CreditSource for CreditsClient {
    async fn fetch_credits(&self) -> HashMap<String, f64> {
        match self.fetch().await {
            Ok(response) if response.status == STATUS_OK => credit_map(response.pods_credits),

            Ok(response) => {
                counter!("credits_fetch_failures").increment(1);
                warn!(status = response.status; "credits ledger returned non-ok status");
                HashMap::new()
            }

            Err(error) => {
                counter!("credits_fetch_failures").increment(1);
                warn!(error:%; "cannot fetch credits, continuing without");
                HashMap::new()
            }
        }
    }
}

/// Fold ledger entries into the identity-key mapping; negative balances are clamped to 0.
fn credit_map(entries: Vec<CreditEntry>) -> HashMap<String, f64> {
    entries
        .into_iter()
        .map(|entry| (entry.pod_id, entry.credits.max(0.0)))
        .collect()
}

#[derive(Debug, Deserialize)]
struct CreditsResponse {
    status: String,

    #[serde(default)]
    pods_credits: Vec<CreditEntry>,
}

#[derive(Debug, Deserialize)]
struct CreditEntry {
    pod_id: String,
    credits: f64,
}

#[cfg(test)]
mod tests {
    use crate::infra::credits::{CreditsResponse, credit_map};

    #[test]
    fn test_credits_response_deserialization() {
        let json = r#"{
            "status": "ok",
            "pods_credits": [
                { "pod_id": "pod-1", "credits": 12.5 },
                { "pod_id": "pod-2", "credits": 0.0 }
            ]
        }"#;

        let response = serde_json::from_str::<CreditsResponse>(json).expect("valid response");
        assert_eq!(response.status, "ok");
        assert_eq!(response.pods_credits.len(), 2);

        let map = credit_map(response.pods_credits);
        assert_eq!(map["pod-1"], 12.5);
        assert_eq!(map["pod-2"], 0.0);
    }

    #[test]
    fn test_credits_response_without_entries() {
        let response =
            serde_json::from_str::<CreditsResponse>(r#"{ "status": "error" }"#).expect("parses");
        assert!(response.pods_credits.is_empty());
    }

    #[test]
    fn test_credit_map_clamps_negative_balances() {
        let response = serde_json::from_str::<CreditsResponse>(
            r#"{ "status": "ok", "pods_credits": [{ "pod_id": "pod-1", "credits": -3.0 }] }"#,
        )
        .expect("parses");

        let map = credit_map(response.pods_credits);
        assert_eq!(map["pod-1"], 0.0);
    }
}
