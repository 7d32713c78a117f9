// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::domain::{NodeStatus, ScoredNode};
use serde::Serialize;
use std::collections::HashMap;

/// Network-wide rollup over a scored node collection; derived, never stored, recomputed
/// every cycle.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub total_nodes: u64,
    pub online_nodes: u64,
    pub warning_nodes: u64,
    pub offline_nodes: u64,
    pub public_nodes: u64,
    pub private_nodes: u64,
    pub total_storage_committed: u64,
    pub total_storage_used: u64,
    pub storage_usage_percent: f64,
    pub avg_uptime: f64,
    pub avg_score: f64,
    pub avg_credits: f64,
    pub version_distribution: HashMap<String, u64>,

    /// Populated by a downstream enrichment step, not by the rollup.
    pub country_distribution: HashMap<String, u64>,
}

/// Single-pass rollup. All averages are 0 for an empty collection.
pub fn network_stats(nodes: &[ScoredNode]) -> NetworkStats {
    let mut stats = NetworkStats {
        total_nodes: nodes.len() as u64,
        ..Default::default()
    };

    let mut uptime_sum = 0.0;
    let mut score_sum = 0.0;
    let mut credits_sum = 0.0;

    for node in nodes {
        match node.status {
            NodeStatus::Online => stats.online_nodes += 1,
            NodeStatus::Warning => stats.warning_nodes += 1,
            NodeStatus::Offline => stats.offline_nodes += 1,
        }

        if node.is_public {
            stats.public_nodes += 1;
        } else {
            stats.private_nodes += 1;
        }

        stats.total_storage_committed = stats
            .total_storage_committed
            .saturating_add(node.storage_committed);
        stats.total_storage_used = stats.total_storage_used.saturating_add(node.storage_used);

        *stats
            .version_distribution
            .entry(node.version.clone())
            .or_insert(0) += 1;

        uptime_sum += node.uptime as f64;
        score_sum += node.score;
        credits_sum += node.credits;
    }

    if stats.total_nodes > 0 {
        let count = stats.total_nodes as f64;
        stats.avg_uptime = uptime_sum / count;
        stats.avg_score = score_sum / count;
        stats.avg_credits = credits_sum / count;
    }

    if stats.total_storage_committed > 0 {
        stats.storage_usage_percent =
            100.0 * stats.total_storage_used as f64 / stats.total_storage_committed as f64;
    }

    stats
}

#[cfg(test)]
mod tests {
    use crate::domain::{NodeRecord, ScoredNode, network_stats, normalize};
    use std::collections::HashMap;

    fn node(pubkey: &str, version: &str, is_public: bool, last_seen: u64) -> ScoredNode {
        let record = NodeRecord {
            pubkey: Some(pubkey.to_owned()),
            version: Some(version.to_owned()),
            is_public: Some(is_public),
            last_seen: Some(last_seen),
            storage_committed: Some(1_000),
            storage_used: Some(250),
            storage_usage_percent: Some(25.0),
            uptime: Some(3_600),
            ..Default::default()
        };
        normalize(record, &HashMap::new(), 100_000).expect("node with identity is kept")
    }

    #[test]
    fn test_network_stats_empty() {
        let stats = network_stats(&[]);
        assert_eq!(stats.total_nodes, 0);
        assert_eq!(stats.avg_uptime, 0.0);
        assert_eq!(stats.avg_score, 0.0);
        assert_eq!(stats.avg_credits, 0.0);
        assert_eq!(stats.storage_usage_percent, 0.0);
        assert!(stats.version_distribution.is_empty());
    }

    #[test]
    fn test_network_stats_invariants() {
        let nodes = vec![
            node("a", "0.9.1", true, 100_000),
            node("b", "0.9.1", false, 100_000 - 600),
            node("c", "0.9.0", false, 100_000 - 7_200),
        ];

        let stats = network_stats(&nodes);

        assert_eq!(stats.total_nodes, 3);
        assert_eq!(
            stats.online_nodes + stats.warning_nodes + stats.offline_nodes,
            stats.total_nodes
        );
        assert_eq!(stats.public_nodes + stats.private_nodes, stats.total_nodes);
        assert_eq!(
            stats.version_distribution.values().sum::<u64>(),
            stats.total_nodes
        );
        assert_eq!(stats.version_distribution["0.9.1"], 2);
        assert_eq!(stats.online_nodes, 1);
        assert_eq!(stats.warning_nodes, 1);
        assert_eq!(stats.offline_nodes, 1);
        assert_eq!(stats.total_storage_committed, 3_000);
        assert_eq!(stats.total_storage_used, 750);
        assert_eq!(stats.storage_usage_percent, 25.0);
        assert_eq!(stats.avg_uptime, 3_600.0);
        assert!(stats.country_distribution.is_empty());
    }
}
