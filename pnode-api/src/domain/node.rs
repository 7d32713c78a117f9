// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::domain::score;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Port assumed when the address carries none or an unparsable one.
pub const DEFAULT_NODE_PORT: u16 = 9001;

/// Version label for nodes that do not report one.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Raw pNode inventory record as returned by a registry endpoint.
///
/// Every field except the identity key may be missing or malformed upstream; shape repair
/// happens in [normalize].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    #[serde(default)]
    pub pubkey: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub is_public: Option<bool>,

    /// Seconds since epoch.
    #[serde(default)]
    pub last_seen: Option<u64>,

    /// Bytes.
    #[serde(default)]
    pub storage_committed: Option<u64>,

    /// Bytes.
    #[serde(default)]
    pub storage_used: Option<u64>,

    #[serde(default)]
    pub storage_usage_percent: Option<f64>,

    /// Seconds.
    #[serde(default)]
    pub uptime: Option<u64>,
}

/// Fully populated and scored node, created fresh every aggregation cycle and never mutated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredNode {
    pub pubkey: String,
    pub host: String,
    pub port: u16,
    pub version: String,
    pub is_public: bool,
    pub last_seen: u64,
    pub storage_committed: u64,
    pub storage_used: u64,
    pub storage_usage_percent: f64,
    pub uptime: u64,
    pub credits: f64,
    pub status: NodeStatus,
    pub score: f64,
}

/// Node liveness category derived from last-seen recency.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[display("online")]
    Online,

    #[display("warning")]
    Warning,

    #[display("offline")]
    Offline,
}

/// Split a `host:port` address; a missing or unparsable port defaults to [DEFAULT_NODE_PORT].
pub fn parse_address(address: &str) -> (String, u16) {
    match address.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host.to_owned(), port),
            Err(_) => (host.to_owned(), DEFAULT_NODE_PORT),
        },

        None => (address.to_owned(), DEFAULT_NODE_PORT),
    }
}

/// Total normalization from a raw record and the credit mapping to a [ScoredNode].
///
/// Returns `None` only when the identity key is missing or empty; every other missing or
/// malformed field degrades to a default. This is the single source of default values.
pub fn normalize(
    record: NodeRecord,
    credits: &HashMap<String, f64>,
    now: u64,
) -> Option<ScoredNode> {
    let pubkey = record.pubkey.filter(|pubkey| !pubkey.is_empty())?;

    let (host, port) = record
        .address
        .as_deref()
        .map(parse_address)
        .unwrap_or_else(|| (String::new(), DEFAULT_NODE_PORT));

    let version = record
        .version
        .filter(|version| !version.is_empty())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_owned());
    let is_public = record.is_public.unwrap_or_default();
    let last_seen = record.last_seen.unwrap_or(now);
    let storage_committed = record.storage_committed.unwrap_or_default();
    let storage_used = record.storage_used.unwrap_or_default();
    let storage_usage_percent = record
        .storage_usage_percent
        .filter(|percent| percent.is_finite())
        .unwrap_or_default();
    let uptime = record.uptime.unwrap_or_default();
    let credits = credits.get(&pubkey).copied().unwrap_or_default();

    let status = score::status_for(now, last_seen);
    let score = score::x_score(status, uptime, storage_usage_percent, credits);

    Some(ScoredNode {
        pubkey,
        host,
        port,
        version,
        is_public,
        last_seen,
        storage_committed,
        storage_used,
        storage_usage_percent,
        uptime,
        credits,
        status,
        score,
    })
}

#[cfg(test)]
mod tests {
    use crate::domain::{
        DEFAULT_NODE_PORT, NodeRecord, NodeStatus, UNKNOWN_VERSION, normalize, parse_address,
    };
    use std::collections::HashMap;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("10.0.0.1:8000"), ("10.0.0.1".to_owned(), 8000));
        assert_eq!(
            parse_address("10.0.0.1"),
            ("10.0.0.1".to_owned(), DEFAULT_NODE_PORT)
        );
        assert_eq!(
            parse_address("10.0.0.1:not-a-port"),
            ("10.0.0.1".to_owned(), DEFAULT_NODE_PORT)
        );
        assert_eq!(parse_address(""), (String::new(), DEFAULT_NODE_PORT));
    }

    #[test]
    fn test_normalize_drops_records_without_identity() {
        let credits = HashMap::new();

        assert!(normalize(NodeRecord::default(), &credits, 1_000).is_none());

        let record = NodeRecord {
            pubkey: Some(String::new()),
            ..Default::default()
        };
        assert!(normalize(record, &credits, 1_000).is_none());
    }

    #[test]
    fn test_normalize_applies_defaults() {
        let credits = HashMap::new();
        let record = NodeRecord {
            pubkey: Some("pod-1".to_owned()),
            ..Default::default()
        };

        let node = normalize(record, &credits, 1_000).expect("node with identity is kept");
        assert_eq!(node.pubkey, "pod-1");
        assert_eq!(node.host, "");
        assert_eq!(node.port, DEFAULT_NODE_PORT);
        assert_eq!(node.version, UNKNOWN_VERSION);
        assert!(!node.is_public);
        assert_eq!(node.last_seen, 1_000);
        assert_eq!(node.storage_committed, 0);
        assert_eq!(node.storage_used, 0);
        assert_eq!(node.credits, 0.0);
        // Last seen defaulted to now, hence online.
        assert_eq!(node.status, NodeStatus::Online);
    }

    #[test]
    fn test_normalize_resolves_credits() {
        let credits = HashMap::from([("pod-1".to_owned(), 250.0)]);

        let record = NodeRecord {
            pubkey: Some("pod-1".to_owned()),
            address: Some("203.0.113.7:9001".to_owned()),
            ..Default::default()
        };
        let node = normalize(record, &credits, 1_000).expect("node with identity is kept");
        assert_eq!(node.credits, 250.0);

        let record = NodeRecord {
            pubkey: Some("pod-2".to_owned()),
            ..Default::default()
        };
        let node = normalize(record, &credits, 1_000).expect("node with identity is kept");
        assert_eq!(node.credits, 0.0);
    }

    #[test]
    fn test_normalize_repairs_malformed_storage_percent() {
        let credits = HashMap::new();
        let record = NodeRecord {
            pubkey: Some("pod-1".to_owned()),
            storage_usage_percent: Some(f64::NAN),
            ..Default::default()
        };

        let node = normalize(record, &credits, 1_000).expect("node with identity is kept");
        assert_eq!(node.storage_usage_percent, 0.0);
    }
}
