// This file is part of pnode-dashboard.
// Copyright (C) 2025 pNode Dashboard Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::{
    domain::{PriceQuote, TokenMetrics, TokenQuote},
    infra::cache::TtlCache,
};
use fastrace::trace;
use log::warn;
use metrics::counter;
use serde::Deserialize;
use serde_json::Value;
use std::{fmt::Debug, future::Future, sync::Arc, time::Duration};
use thiserror::Error;

/// Fallback native asset price when neither a provider nor the cache can serve.
pub const DEFAULT_NATIVE_PRICE_USD: f64 = 150.0;

/// Fallback token price when neither a provider nor the cache can serve.
pub const DEFAULT_TOKEN_PRICE_USD: f64 = 0.01;

pub const SOURCE_CACHE: &str = "cache";
pub const SOURCE_DEFAULT: &str = "default";

const NATIVE_CACHE_KEY: &str = "native";
const TOKEN_CACHE_KEY: &str = "token";

/// Native asset price providers in waterfall priority order.
const NATIVE_PROVIDERS: [NativeProvider; 2] = [NativeProvider::Coingecko, NativeProvider::Binance];

/// Token metrics providers in waterfall priority order.
const TOKEN_PROVIDERS: [TokenProvider; 2] = [TokenProvider::Coingecko, TokenProvider::Dexscreener];

const COINGECKO_NATIVE_URL: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=solana&vs_currencies=usd";
const BINANCE_NATIVE_URL: &str = "https://api.binance.com/api/v3/ticker/price?symbol=SOLUSDT";
const COINGECKO_TOKEN_URL: &str =
    "https://api.coingecko.com/api/v3/coins/markets?vs_currency=usd&ids=xandeum";
const DEXSCREENER_TOKEN_URL: &str = "https://api.dexscreener.com/latest/dex/search?q=XAND";

/// Config for the price feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Price feed client for the native asset and the project token.
///
/// Both feeds share the same policy: fresh cache, then the provider waterfall, then the
/// stale cache, then a default sentinel.
#[derive(Clone)]
pub struct PriceClient {
    http: reqwest::Client,
    config: Config,
    native_cache: Arc<TtlCache<String, f64>>,
    token_cache: Arc<TtlCache<String, TokenMetrics>>,
}

impl PriceClient {
    pub fn new(
        config: Config,
        http: reqwest::Client,
        native_cache: Arc<TtlCache<String, f64>>,
        token_cache: Arc<TtlCache<String, TokenMetrics>>,
    ) -> Self {
        Self {
            http,
            config,
            native_cache,
            token_cache,
        }
    }

    /// Native asset price quote.
    #[trace]
    pub async fn native_price(&self) -> PriceQuote {
        let key = NATIVE_CACHE_KEY.to_owned();

        if let Some(price) = self.native_cache.get(&key) {
            return PriceQuote {
                price,
                cached: true,
                source: SOURCE_CACHE.to_owned(),
            };
        }

        let quoted = waterfall(
            &NATIVE_PROVIDERS,
            |provider| {
                let http = self.http.clone();
                let timeout = self.config.timeout;
                async move { provider.quote(&http, timeout).await }
            },
            |price| *price > 0.0,
        )
        .await;

        match quoted {
            Some((provider, price)) => {
                self.native_cache.insert(key, price);
                PriceQuote {
                    price,
                    cached: false,
                    source: provider.name().to_owned(),
                }
            }

            None => native_fallback(&self.native_cache),
        }
    }

    /// Project token market metrics.
    #[trace]
    pub async fn token_metrics(&self) -> TokenQuote {
        let key = TOKEN_CACHE_KEY.to_owned();

        if let Some(metrics) = self.token_cache.get(&key) {
            return TokenQuote {
                metrics,
                cached: true,
            };
        }

        let quoted = waterfall(
            &TOKEN_PROVIDERS,
            |provider| {
                let http = self.http.clone();
                let timeout = self.config.timeout;
                async move { provider.quote(&http, timeout).await }
            },
            |metrics: &TokenMetrics| metrics.price_usd > 0.0,
        )
        .await;

        match quoted {
            Some((_, metrics)) => {
                self.token_cache.insert(key, metrics.clone());
                TokenQuote {
                    metrics,
                    cached: false,
                }
            }

            None => token_fallback(&self.token_cache),
        }
    }
}

/// Stale cache, then the default sentinel.
fn native_fallback(cache: &TtlCache<String, f64>) -> PriceQuote {
    match cache.peek(&NATIVE_CACHE_KEY.to_owned()) {
        Some(price) => PriceQuote {
            price,
            cached: true,
            source: SOURCE_CACHE.to_owned(),
        },

        None => {
            counter!("price_default_fallbacks").increment(1);
            warn!("no native price provider available, serving default");
            PriceQuote {
                price: DEFAULT_NATIVE_PRICE_USD,
                cached: false,
                source: SOURCE_DEFAULT.to_owned(),
            }
        }
    }
}

/// Stale cache, then the default sentinel.
fn token_fallback(cache: &TtlCache<String, TokenMetrics>) -> TokenQuote {
    match cache.peek(&TOKEN_CACHE_KEY.to_owned()) {
        Some(metrics) => TokenQuote {
            metrics,
            cached: true,
        },

        None => {
            counter!("price_default_fallbacks").increment(1);
            warn!("no token metrics provider available, serving default");
            TokenQuote {
                metrics: TokenMetrics {
                    price_usd: DEFAULT_TOKEN_PRICE_USD,
                    market_cap_usd: 0.0,
                    volume_24h_usd: 0.0,
                    change_24h_percent: 0.0,
                },
                cached: false,
            }
        }
    }
}

/// Walk the providers in priority order, returning the first usable result. Later
/// providers are not contacted once one succeeds.
async fn waterfall<P, T, F, Fut>(
    providers: &[P],
    mut quote: F,
    usable: impl Fn(&T) -> bool,
) -> Option<(P, T)>
where
    P: Copy + Debug,
    F: FnMut(P) -> Fut,
    Fut: Future<Output = Result<T, PriceError>>,
{
    for &provider in providers {
        match quote(provider).await {
            Ok(value) if usable(&value) => return Some((provider, value)),

            Ok(_) => warn!(provider:?; "price provider returned unusable value"),

            Err(error) => {
                counter!("price_provider_failures").increment(1);
                warn!(provider:?, error:%; "price provider failed");
            }
        }
    }

    None
}

#[derive(Debug, Clone, Copy)]
enum NativeProvider {
    Coingecko,
    Binance,
}

impl NativeProvider {
    fn name(self) -> &'static str {
        match self {
            NativeProvider::Coingecko => "coingecko",
            NativeProvider::Binance => "binance",
        }
    }

    async fn quote(self, http: &reqwest::Client, timeout: Duration) -> Result<f64, PriceError> {
        match self {
            NativeProvider::Coingecko => {
                let value = get_json(http, COINGECKO_NATIVE_URL, timeout).await?;
                value
                    .pointer("/solana/usd")
                    .and_then(Value::as_f64)
                    .ok_or(PriceError::MissingField("solana.usd"))
            }

            NativeProvider::Binance => {
                let value = get_json(http, BINANCE_NATIVE_URL, timeout).await?;
                value
                    .get("price")
                    .and_then(Value::as_str)
                    .and_then(|price| price.parse().ok())
                    .ok_or(PriceError::MissingField("price"))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TokenProvider {
    Coingecko,
    Dexscreener,
}

impl TokenProvider {
    async fn quote(
        self,
        http: &reqwest::Client,
        timeout: Duration,
    ) -> Result<TokenMetrics, PriceError> {
        match self {
            TokenProvider::Coingecko => {
                let value = get_json(http, COINGECKO_TOKEN_URL, timeout).await?;
                let market = value.get(0).ok_or(PriceError::MissingField("markets[0]"))?;

                Ok(TokenMetrics {
                    price_usd: f64_field(market, "current_price"),
                    market_cap_usd: f64_field(market, "market_cap"),
                    volume_24h_usd: f64_field(market, "total_volume"),
                    change_24h_percent: f64_field(market, "price_change_percentage_24h"),
                })
            }

            TokenProvider::Dexscreener => {
                let value = get_json(http, DEXSCREENER_TOKEN_URL, timeout).await?;
                let pair = value
                    .pointer("/pairs/0")
                    .ok_or(PriceError::MissingField("pairs[0]"))?;

                Ok(TokenMetrics {
                    price_usd: pair
                        .get("priceUsd")
                        .and_then(Value::as_str)
                        .and_then(|price| price.parse().ok())
                        .unwrap_or_default(),
                    market_cap_usd: f64_field(pair, "fdv"),
                    volume_24h_usd: pair
                        .pointer("/volume/h24")
                        .and_then(Value::as_f64)
                        .unwrap_or_default(),
                    change_24h_percent: pair
                        .pointer("/priceChange/h24")
                        .and_then(Value::as_f64)
                        .unwrap_or_default(),
                })
            }
        }
    }
}

fn f64_field(value: &Value, field: &str) -> f64 {
    value.get(field).and_then(Value::as_f64).unwrap_or_default()
}

async fn get_json(
    http: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Value, PriceError> {
    let value = http
        .get(url)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .json::<Value>()
        .await?;

    Ok(value)
}

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("missing field {0}")]
    MissingField(&'static str),
}
