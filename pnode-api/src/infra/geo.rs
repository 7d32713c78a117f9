// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{domain::GeoLocation, infra::cache::TtlCache};
use fastrace::trace;
use itertools::Itertools;
use log::warn;
use metrics::counter;
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;

/// Max addresses per upstream batch call.
pub const MAX_GEO_BATCH: usize = 100;

const STATUS_SUCCESS: &str = "success";

/// Config for the batch geolocation service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub url: String,

    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Entries younger than this are served without an upstream call.
    #[serde(with = "humantime_serde")]
    pub soft_ttl: Duration,

    /// Entries younger than this may still be served when the upstream call fails.
    #[serde(with = "humantime_serde")]
    pub hard_ttl: Duration,
}

/// Batch geolocation client over an injected cache.
///
/// The cache is created at process start with the soft TTL and grows for the process
/// lifetime; that is accepted.
#[derive(Clone)]
pub struct GeoClient {
    http: reqwest::Client,
    config: Config,
    cache: Arc<TtlCache<String, GeoLocation>>,
}

impl GeoClient {
    pub fn new(
        config: Config,
        http: reqwest::Client,
        cache: Arc<TtlCache<String, GeoLocation>>,
    ) -> Self {
        Self {
            http,
            config,
            cache,
        }
    }

    /// Resolve geolocations for the given addresses: deduplicated, capped at
    /// [MAX_GEO_BATCH], served from cache where fresh, with a single batch call for the
    /// rest. A failed batch call degrades to cached entries within the hard TTL window.
    #[trace]
    pub async fn locate(&self, ips: &[String]) -> HashMap<String, GeoLocation> {
        let ips = dedup_capped(ips, MAX_GEO_BATCH);

        let (mut located, uncached) = partition_cached(&ips, &self.cache);
        if uncached.is_empty() {
            return located;
        }

        match self.fetch_batch(&uncached).await {
            Ok(fetched) => {
                for location in fetched {
                    self.cache.insert(location.ip.clone(), location.clone());
                    located.insert(location.ip.clone(), location);
                }
            }

            Err(error) => {
                counter!("geo_batch_failures").increment(1);
                warn!(error:%; "geolocation batch call failed, serving cached subset");
                for ip in uncached {
                    if let Some(location) = self.cache.get_within(&ip, self.config.hard_ttl) {
                        located.insert(ip, location);
                    }
                }
            }
        }

        located
    }

    /// One upstream batch call. Entries that failed to resolve are dropped; the batch is a
    /// partial success.
    async fn fetch_batch(&self, ips: &[String]) -> Result<Vec<GeoLocation>, GeoError> {
        let entries = self
            .http
            .post(&self.config.url)
            .timeout(self.config.timeout)
            .json(&ips)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<GeoEntry>>()
            .await?;

        Ok(entries.into_iter().filter_map(GeoEntry::into_location).collect())
    }
}

/// Deduplicate preserving order, drop empties, cap the batch size.
fn dedup_capped(ips: &[String], cap: usize) -> Vec<String> {
    ips.iter()
        .filter(|ip| !ip.is_empty())
        .unique()
        .take(cap)
        .cloned()
        .collect()
}

/// Split into already-cached (fresh) and to-be-fetched.
fn partition_cached(
    ips: &[String],
    cache: &TtlCache<String, GeoLocation>,
) -> (HashMap<String, GeoLocation>, Vec<String>) {
    let mut cached = HashMap::new();
    let mut uncached = Vec::new();

    for ip in ips {
        match cache.get(ip) {
            Some(location) => {
                cached.insert(ip.clone(), location);
            }
            None => uncached.push(ip.clone()),
        }
    }

    (cached, uncached)
}

/// Wire entry of the batch geolocation service; only the consumed fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeoEntry {
    #[serde(default)]
    status: String,

    /// The looked-up address.
    #[serde(default)]
    query: String,

    #[serde(default)]
    country: String,

    #[serde(default)]
    country_code: String,

    #[serde(default)]
    city: String,

    #[serde(default)]
    lat: f64,

    #[serde(default)]
    lon: f64,
}

impl GeoEntry {
    fn into_location(self) -> Option<GeoLocation> {
        if self.status != STATUS_SUCCESS || self.query.is_empty() {
            return None;
        }

        Some(GeoLocation {
            ip: self.query,
            country: self.country,
            country_code: self.country_code,
            city: self.city,
            lat: self.lat,
            lon: self.lon,
        })
    }
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::GeoLocation,
        infra::{
            cache::TtlCache,
            geo::{GeoEntry, MAX_GEO_BATCH, dedup_capped, partition_cached},
        },
    };
    use std::time::Duration;

    fn location(ip: &str) -> GeoLocation {
        GeoLocation {
            ip: ip.to_owned(),
            country: "Germany".to_owned(),
            country_code: "DE".to_owned(),
            city: "Berlin".to_owned(),
            lat: 52.52,
            lon: 13.4,
        }
    }

    #[test]
    fn test_dedup_capped() {
        let ips = vec![
            "1.1.1.1".to_owned(),
            "1.1.1.1".to_owned(),
            String::new(),
            "2.2.2.2".to_owned(),
        ];
        assert_eq!(dedup_capped(&ips, MAX_GEO_BATCH), vec!["1.1.1.1", "2.2.2.2"]);

        let many = (0..150).map(|n| format!("10.0.0.{n}")).collect::<Vec<_>>();
        let capped = dedup_capped(&many, MAX_GEO_BATCH);
        assert_eq!(capped.len(), MAX_GEO_BATCH);
        assert_eq!(capped[0], "10.0.0.0");
    }

    #[test]
    fn test_partition_cached() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.insert("1.1.1.1".to_owned(), location("1.1.1.1"));

        let ips = vec!["1.1.1.1".to_owned(), "2.2.2.2".to_owned()];
        let (cached, uncached) = partition_cached(&ips, &cache);

        // The cached address must not be requested upstream again within the TTL.
        assert_eq!(cached.len(), 1);
        assert!(cached.contains_key("1.1.1.1"));
        assert_eq!(uncached, vec!["2.2.2.2"]);
    }

    #[test]
    fn test_partition_cached_expired_entries_are_refetched() {
        let cache = TtlCache::new(Duration::from_secs(300));
        cache.insert("1.1.1.1".to_owned(), location("1.1.1.1"));
        cache.backdate(&"1.1.1.1".to_owned(), Duration::from_secs(600));

        let ips = vec!["1.1.1.1".to_owned()];
        let (cached, uncached) = partition_cached(&ips, &cache);

        assert!(cached.is_empty());
        assert_eq!(uncached, vec!["1.1.1.1"]);
    }

    #[test]
    fn test_geo_entry_into_location() {
        let entry = serde_json::from_str::<GeoEntry>(
            r#"{
                "status": "success",
                "query": "1.1.1.1",
                "country": "Australia",
                "countryCode": "AU",
                "city": "Sydney",
                "lat": -33.87,
                "lon": 151.21
            }"#,
        )
        .expect("valid entry");
        let location = entry.into_location().expect("successful entry");
        assert_eq!(location.ip, "1.1.1.1");
        assert_eq!(location.country_code, "AU");

        let failed = serde_json::from_str::<GeoEntry>(
            r#"{ "status": "fail", "query": "256.0.0.1" }"#,
        )
        .expect("parses");
        assert!(failed.into_location().is_none());
    }
}
