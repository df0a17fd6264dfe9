// =============================================================================
// CoinGecko Collector — public simple/price endpoint
// =============================================================================
//
// One poll fetches every configured coin in a single request and appends one
// observation per coin to the store. The endpoint is unauthenticated; the
// only courtesy is a bounded request timeout and a shared batch timestamp so
// all of a poll's rows line up.
// =============================================================================

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::runtime_config::CoinConfig;
use crate::store::PriceStore;
use crate::types::Observation;

/// Request timeout for one poll (seconds).
const REQUEST_TIMEOUT_SECS: u64 = 30;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";

/// Quote payload for one coin from `/api/v3/simple/price`.
#[derive(Debug, Clone, Deserialize)]
pub struct SimplePrice {
    pub usd: Option<f64>,
    pub usd_market_cap: Option<f64>,
    pub usd_24h_vol: Option<f64>,
    pub usd_24h_change: Option<f64>,
}

/// Thin client for the CoinGecko public REST API.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different host (tests, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// GET /api/v3/simple/price for the given coin ids, quoted in USD with
    /// market cap, 24 h volume, and 24 h change included.
    pub async fn simple_prices(&self, ids: &[String]) -> Result<HashMap<String, SimplePrice>> {
        let url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies=usd\
             &include_market_cap=true&include_24hr_vol=true&include_24hr_change=true",
            self.base_url,
            ids.join(",")
        );
        debug!(coins = ids.len(), "fetching simple prices");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /api/v3/simple/price request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("simple/price returned {status}: {body}");
        }

        resp.json::<HashMap<String, SimplePrice>>()
            .await
            .context("failed to decode simple/price response")
    }
}

impl Default for CoinGeckoClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn one poll's payload into observations, all stamped `polled_at`.
///
/// Coins without a USD quote are skipped with a warning; coins absent from
/// the payload entirely (unknown id, delisted) are skipped the same way.
/// Returns `(coin id, observation)` pairs in config order.
pub fn observations_from_payload(
    payload: &HashMap<String, SimplePrice>,
    coins: &[CoinConfig],
    polled_at: DateTime<Utc>,
) -> Vec<(String, Observation)> {
    let mut observations = Vec::with_capacity(coins.len());
    for coin in coins {
        let Some(quote) = payload.get(&coin.id) else {
            warn!(coin = %coin.id, "coin missing from simple/price response — skipped");
            continue;
        };
        let Some(price) = quote.usd else {
            warn!(coin = %coin.id, "no USD quote in simple/price response — skipped");
            continue;
        };

        observations.push((
            coin.id.clone(),
            Observation {
                symbol: coin.symbol.clone(),
                price,
                timestamp: polled_at,
                market_cap: quote.usd_market_cap,
                volume_24h: quote.usd_24h_vol,
                change_24h_pct: quote.usd_24h_change,
            },
        ));
    }
    observations
}

/// One full poll: fetch all configured coins and append their readings.
///
/// Returns the number of observations stored.
pub async fn fetch_and_store(
    client: &CoinGeckoClient,
    store: &PriceStore,
    coins: &[CoinConfig],
) -> Result<usize> {
    if coins.is_empty() {
        warn!("no coins configured — nothing to fetch");
        return Ok(0);
    }

    let ids: Vec<String> = coins.iter().map(|c| c.id.clone()).collect();
    let payload = client.simple_prices(&ids).await?;

    let polled_at = Utc::now();
    let observations = observations_from_payload(&payload, coins, polled_at);

    for (name, obs) in &observations {
        store
            .insert_observation(name, obs)
            .with_context(|| format!("failed to store reading for {}", obs.symbol))?;
        debug!(symbol = %obs.symbol, price = obs.price, "stored price reading");
    }

    info!(
        stored = observations.len(),
        requested = coins.len(),
        "price poll complete"
    );
    Ok(observations.len())
}
