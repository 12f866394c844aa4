use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::types::*;
use crate::http;
use crate::report::PRICE_DECIMALS;
use crate::stats::RunStats;
use crate::types::{Listing, Offer, PriceMap};

/// Reads the open listings of one collection and reduces them to a `PriceMap`.
pub struct ListingFetcher {
    host: String,
    api_key: String,
    http: reqwest::Client,
    stats: Arc<RunStats>,
}

impl ListingFetcher {
    pub fn new(host: String, api_key: String, stats: Arc<RunStats>) -> Result<Self> {
        let api_key = api_key.trim().to_string();
        let http = http::json_client()?;

        tracing::debug!(api_key_len = api_key.len(), "ListingFetcher initialized");
        Ok(Self {
            host,
            api_key,
            http,
            stats,
        })
    }

    /// Single page only: listings past `limit` are not consulted.
    pub async fn fetch_price_map(&self, collection_slug: &str, limit: usize) -> Result<PriceMap> {
        let page = self.fetch_listings_page(collection_slug, limit).await?;
        if page.next.is_some() {
            tracing::warn!(
                collection = %collection_slug,
                limit,
                "more listings exist beyond the first page; they are ignored"
            );
        }

        let out = self.reduce_page(page)?;
        tracing::info!(listed_count = out.len(), collection = %collection_slug, "listings loaded");
        Ok(out)
    }

    /// Applies the freshness rule to every listing of a page. A malformed listing
    /// fails the whole page.
    pub fn reduce_page(&self, page: ListingsResponse) -> Result<PriceMap> {
        let mut out = PriceMap::new();
        for item in page.listings {
            let l = to_listing(item)?;
            self.stats.inc_listing_seen();
            let token_id = l.token_id.clone();
            let end_time = l.end_time;
            match out.offer(l) {
                Offer::Inserted => {}
                Offer::Replaced => {
                    self.stats.inc_duplicate_replaced();
                    tracing::debug!(token_id = %token_id, expires = %fmt_expiry(end_time), "newer listing replaced previous");
                }
                Offer::Skipped => {
                    self.stats.inc_duplicate_skipped();
                    tracing::debug!(token_id = %token_id, expires = %fmt_expiry(end_time), "older listing skipped");
                }
            }
        }
        Ok(out)
    }

    pub fn listings_url(&self, collection_slug: &str, limit: usize) -> String {
        format!(
            "{}/api/v2/listings/collection/{}/all?limit={}",
            self.host.trim_end_matches('/'),
            collection_slug,
            limit
        )
    }

    async fn fetch_listings_page(&self, collection_slug: &str, limit: usize) -> Result<ListingsResponse> {
        let url = self.listings_url(collection_slug, limit);
        tracing::debug!(url = %url, "fetching listings page");

        let req = self.http.get(&url).header("X-API-KEY", &self.api_key);
        let body = http::get_text(req, "/listings").await?;
        parse_listings_page(&body)
    }
}

pub fn parse_listings_page(body: &str) -> Result<ListingsResponse> {
    match serde_json::from_str(body) {
        Ok(v) => Ok(v),
        Err(e) => {
            let snippet: String = body.chars().take(2048).collect();
            anyhow::bail!(
                "decode /listings json failed: {} body_snippet={}",
                e,
                snippet
            );
        }
    }
}

pub fn to_listing(item: ListingItem) -> Result<Listing> {
    let params = item.protocol_data.parameters;
    let token_id = match params.offer.into_iter().next() {
        Some(o) => o.identifier_or_criteria,
        None => anyhow::bail!("listing has an empty offer list"),
    };

    if let Some(d) = item.price.current.decimals {
        if d != PRICE_DECIMALS {
            tracing::warn!(
                token_id = %token_id,
                decimals = d,
                currency = ?item.price.current.currency,
                "listing currency is not 18-decimal; price is still scaled by 10^18"
            );
        }
    }

    let price = parse_base_units(&item.price.current.value)
        .with_context(|| format!("bad price for token {}", token_id))?;

    Ok(Listing {
        token_id,
        price,
        end_time: params.end_time,
    })
}

/// Integer base units from a decimal string; any fractional part is truncated.
pub fn parse_base_units(s: &str) -> Result<u128> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u128>() {
        return Ok(v);
    }
    let d: Decimal = s
        .parse()
        .with_context(|| format!("price {:?} is not a decimal", s))?;
    match d.trunc().to_u128() {
        Some(v) => Ok(v),
        None => anyhow::bail!("price {:?} is not a non-negative amount", s),
    }
}

fn fmt_expiry(end_time: u64) -> String {
    i64::try_from(end_time)
        .ok()
        .and_then(|t| chrono::DateTime::from_timestamp(t, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| end_time.to_string())
}
