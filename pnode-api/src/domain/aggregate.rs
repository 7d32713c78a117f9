// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::domain::{NetworkStats, NodeRecord, ScoredNode, node, stats};
use log::debug;
use pnode_common::error::BoxError;
use serde::Serialize;
use std::{
    collections::HashMap,
    error::Error as StdError,
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;

/// Node inventory source abstraction.
#[trait_variant::make(Send)]
pub trait NodeSource
where
    Self: Clone + Send + Sync + 'static,
{
    type Error: StdError + Send + Sync + 'static;

    /// Fetch the full current node inventory (whole-collection replace).
    async fn fetch_nodes(&self) -> Result<Vec<NodeRecord>, Self::Error>;
}

/// Credit balance source abstraction.
///
/// Credits are best-effort enrichment: implementations must degrade to an empty mapping
/// instead of failing.
#[trait_variant::make(Send)]
pub trait CreditSource
where
    Self: Clone + Send + Sync + 'static,
{
    async fn fetch_credits(&self) -> HashMap<String, f64>;
}

/// One aggregation cycle's output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSnapshot {
    pub nodes: Vec<ScoredNode>,
    pub stats: NetworkStats,

    /// Seconds since epoch at which this cycle ran.
    pub timestamp: u64,
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("cannot fetch node inventory")]
    Inventory(#[source] BoxError),
}

/// Run one aggregation cycle: fetch inventory and credits concurrently, merge and score,
/// roll up network stats.
///
/// Only inventory failure is a hard error; a failing credit source joins as the empty
/// mapping.
pub async fn aggregate<N, C>(registry: &N, credits: &C) -> Result<NetworkSnapshot, AggregateError>
where
    N: NodeSource,
    C: CreditSource,
{
    let (records, credits) = tokio::join!(registry.fetch_nodes(), credits.fetch_credits());
    let records = records.map_err(|error| AggregateError::Inventory(Box::new(error)))?;

    let now = unix_now();
    let nodes = records
        .into_iter()
        .filter_map(|record| node::normalize(record, &credits, now))
        .collect::<Vec<_>>();
    debug!(node_count = nodes.len(); "merged node inventory");

    let stats = stats::network_stats(&nodes);

    Ok(NetworkSnapshot {
        nodes,
        stats,
        timestamp: now,
    })
}

/// Seconds since epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::domain::{AggregateError, CreditSource, NodeRecord, NodeSource, aggregate};
    use assert_matches::assert_matches;
    use std::collections::HashMap;
    use thiserror::Error;

    #[derive(Debug, Clone)]
    struct FixedNodes(Vec<NodeRecord>);

    impl NodeSource for FixedNodes {
        type Error = FetchError;

        async fn fetch_nodes(&self) -> Result<Vec<NodeRecord>, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug, Clone)]
    struct FailingNodes;

    impl NodeSource for FailingNodes {
        type Error = FetchError;

        async fn fetch_nodes(&self) -> Result<Vec<NodeRecord>, FetchError> {
            Err(FetchError)
        }
    }

    #[derive(Debug, Clone)]
    struct FixedCredits(HashMap<String, f64>);

    impl CreditSource for FixedCredits {
        async fn fetch_credits(&self) -> HashMap<String, f64> {
            self.0.clone()
        }
    }

    #[derive(Debug, Error)]
    #[error("inventory unavailable")]
    struct FetchError;

    fn record(pubkey: Option<&str>) -> NodeRecord {
        NodeRecord {
            pubkey: pubkey.map(ToOwned::to_owned),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_aggregate() {
        let registry = FixedNodes(vec![
            record(Some("pod-1")),
            record(None),
            record(Some("pod-2")),
        ]);
        let credits = FixedCredits(HashMap::from([("pod-2".to_owned(), 77.0)]));

        let snapshot = aggregate(&registry, &credits).await.expect("aggregation succeeds");

        // Identity keys are preserved, never fabricated; keyless records are dropped.
        let pubkeys = snapshot
            .nodes
            .iter()
            .map(|node| node.pubkey.as_str())
            .collect::<Vec<_>>();
        assert_eq!(pubkeys, vec!["pod-1", "pod-2"]);

        assert_eq!(snapshot.nodes[0].credits, 0.0);
        assert_eq!(snapshot.nodes[1].credits, 77.0);
        assert_eq!(snapshot.stats.total_nodes, 2);
        assert!(snapshot.timestamp > 0);
    }

    #[tokio::test]
    async fn test_aggregate_inventory_failure() {
        let credits = FixedCredits(HashMap::new());

        let result = aggregate(&FailingNodes, &credits).await;
        assert_matches!(result, Err(AggregateError::Inventory(_)));
    }
}
