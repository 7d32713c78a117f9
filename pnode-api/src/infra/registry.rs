// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::domain::{NodeRecord, NodeSource};
use fastrace::trace;
use futures::{Stream, StreamExt, stream::FuturesUnordered};
use itertools::Itertools;
use log::{debug, warn};
use metrics::counter;
use serde::Deserialize;
use serde_json::json;
use std::{pin::pin, time::Duration};
use thiserror::Error;
use tokio::{task, time::timeout};

/// JSON-RPC method for fetching the pNode inventory.
const GET_PNODES_METHOD: &str = "getPnodes";

/// Cap on endpoint errors carried in [RegistryError::AllEndpointsFailed].
const MAX_REPORTED_ERRORS: usize = 3;

/// Config for the node registry.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Registry endpoints raced per fetch.
    pub endpoints: Vec<String>,

    /// Per-endpoint request timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Node registry client racing all configured endpoints per fetch.
#[derive(Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    config: Config,
}

impl RegistryClient {
    pub fn new(config: Config, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    #[trace]
    async fn fetch_endpoint(&self, endpoint: &str) -> Result<Vec<NodeRecord>, EndpointError> {
        let request = json!({
            "jsonrpc": "2.0",
            "method": GET_PNODES_METHOD,
            "params": [],
            "id": 1,
        });

        let response = timeout(self.config.timeout, async {
            self.http
                .post(endpoint)
                .json(&request)
                .send()
                .await?
                .error_for_status()?
                .json::<RpcResponse>()
                .await
        })
        .await
        .map_err(|_| EndpointError::Timeout(self.config.timeout))??;

        if let Some(error) = response.error {
            return Err(EndpointError::Rpc(error.message));
        }

        Ok(response.result.unwrap_or_default())
    }
}

impl NodeSource for RegistryClient {
    type Error = RegistryError;

    /// Race all endpoints; the first non-empty successful result wins by completion order.
    /// Losing tasks are abandoned, not cancelled.
    async fn fetch_nodes(&self) -> Result<Vec<NodeRecord>, RegistryError> {
        if self.config.endpoints.is_empty() {
            return Err(RegistryError::NoEndpoints);
        }

        let tasks = self
            .config
            .endpoints
            .iter()
            .cloned()
            .map(|endpoint| {
                let client = self.clone();
                task::spawn(async move {
                    let result = client.fetch_endpoint(&endpoint).await;
                    (endpoint, result)
                })
            })
            .collect::<FuturesUnordered<_>>();

        let outcomes = tasks.map(|joined| match joined {
            Ok(outcome) => outcome,

            Err(error) => (
                "<registry task>".to_owned(),
                Err(EndpointError::Task(error.to_string())),
            ),
        });

        first_non_empty(outcomes).await
    }
}

/// Consume endpoint outcomes in completion order, returning the first non-empty success.
/// An empty inventory counts as an endpoint failure.
async fn first_non_empty<S>(outcomes: S) -> Result<Vec<NodeRecord>, RegistryError>
where
    S: Stream<Item = (String, Result<Vec<NodeRecord>, EndpointError>)>,
{
    let mut outcomes = pin!(outcomes);
    let mut errors = Vec::new();

    while let Some((endpoint, result)) = outcomes.next().await {
        match result {
            Ok(nodes) if !nodes.is_empty() => {
                debug!(endpoint; "registry endpoint won the inventory race");
                return Ok(nodes);
            }

            Ok(_) => errors.push((endpoint, EndpointError::EmptyInventory)),

            Err(error) => {
                counter!("registry_endpoint_failures").increment(1);
                warn!(endpoint, error:%; "registry endpoint failed");
                errors.push((endpoint, error));
            }
        }
    }

    Err(RegistryError::AllEndpointsFailed(errors))
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<NodeRecord>>,

    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
}

/// Error for a single registry endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("task failed: {0}")]
    Task(String),

    #[error("empty inventory")]
    EmptyInventory,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no registry endpoints configured")]
    NoEndpoints,

    #[error("all registry endpoints failed: {}", format_errors(.0))]
    AllEndpointsFailed(Vec<(String, EndpointError)>),
}

fn format_errors(errors: &[(String, EndpointError)]) -> String {
    let reported = errors
        .iter()
        .take(MAX_REPORTED_ERRORS)
        .map(|(endpoint, error)| format!("{endpoint}: {error}"))
        .join("; ");

    if errors.len() > MAX_REPORTED_ERRORS {
        format!(
            "{reported}; and {} more",
            errors.len() - MAX_REPORTED_ERRORS
        )
    } else {
        reported
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::NodeRecord,
        infra::registry::{EndpointError, RegistryError, first_non_empty},
    };
    use assert_matches::assert_matches;
    use futures::stream;
    use std::time::Duration;

    fn record(pubkey: &str) -> NodeRecord {
        NodeRecord {
            pubkey: Some(pubkey.to_owned()),
            ..Default::default()
        }
    }

    fn timed_out() -> EndpointError {
        EndpointError::Timeout(Duration::from_secs(10))
    }

    #[tokio::test]
    async fn test_first_non_empty_skips_failed_endpoints() {
        let outcomes = stream::iter(vec![
            ("http://one".to_owned(), Err(timed_out())),
            (
                "http://two".to_owned(),
                Ok(vec![record("a"), record("b"), record("c")]),
            ),
            ("http://three".to_owned(), Ok(vec![record("d")])),
        ]);

        let nodes = first_non_empty(outcomes).await.expect("one endpoint succeeds");
        assert_eq!(nodes.len(), 3);
    }

    #[tokio::test]
    async fn test_first_non_empty_treats_empty_as_failure() {
        let outcomes = stream::iter(vec![
            ("http://one".to_owned(), Ok(vec![])),
            ("http://two".to_owned(), Ok(vec![record("a")])),
        ]);

        let nodes = first_non_empty(outcomes).await.expect("one endpoint succeeds");
        assert_eq!(nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_first_non_empty_aggregates_errors() {
        let outcomes = stream::iter(vec![
            ("http://one".to_owned(), Err(timed_out())),
            ("http://two".to_owned(), Ok(vec![])),
        ]);

        let result = first_non_empty(outcomes).await;
        assert_matches!(
            result,
            Err(RegistryError::AllEndpointsFailed(errors)) => assert_eq!(errors.len(), 2)
        );
    }

    #[tokio::test]
    async fn test_all_endpoints_failed_message_is_bounded() {
        let outcomes = stream::iter(
            (0..7)
                .map(|n| (format!("http://{n}"), Err(timed_out())))
                .collect::<Vec<_>>(),
        );

        let error = first_non_empty(outcomes)
            .await
            .expect_err("all endpoints failed");
        let message = error.to_string();
        assert!(message.contains("and 4 more"));
        assert!(!message.contains("http://4"));
    }
}
