mod config;
mod http;
mod metadata;
mod opensea;
mod report;
mod stats;
mod types;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::metadata::{resolve_total_levels, CachedTraitSource, RemoteTraitSource};
use crate::opensea::ListingFetcher;
use crate::stats::RunStats;

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

async fn maybe_write_jsonl(path: &Option<String>, line: &str) {
    if let Some(p) = path.as_ref().map(|x| x.trim().to_string()).filter(|x| !x.is_empty()) {
        if let Err(e) = append_line(&p, line).await {
            tracing::warn!(path = %p, error = %e, "failed to append stats line");
        }
    }
}

async fn append_line(path: &str, line: &str) -> std::io::Result<()> {
    use tokio::io::AsyncWriteExt;
    let mut f = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
    f.write_all(line.as_bytes()).await?;
    f.write_all(b"\n").await?;
    f.flush().await
}

async fn run(s: &Settings) -> Result<()> {
    let stats = RunStats::new(now_ms());

    let fetcher = ListingFetcher::new(s.opensea_host.clone(), s.api_key.clone(), stats.clone())?;
    let prices = fetcher
        .fetch_price_map(&s.collection_slug, s.listings_limit)
        .await
        .context("fetch listings")?;
    if prices.is_empty() {
        tracing::warn!(collection = %s.collection_slug, "no open listings; writing an empty report");
    }

    let source = CachedTraitSource::new(
        &s.cache_dir,
        RemoteTraitSource::new(s.json_url_host.clone(), stats.clone())?,
        stats.clone(),
    );
    let order = prices.sorted_by_price();
    let levels = resolve_total_levels(&source, order.iter().map(|(t, _)| *t)).await?;

    // nothing is written until every row is known
    let rows = report::build_rows(&prices, &levels, &s.contract_address)?;
    report::write_report(&s.output_path, &rows)?;
    stats.set_rows_written(rows.len() as u64);
    tracing::info!(rows = rows.len(), path = %s.output_path, "report written");

    let ss = stats.snapshot(now_ms());
    tracing::info!(
        elapsed_ms = ss.elapsed_ms,
        listings_seen = ss.listings_seen,
        duplicates_skipped = ss.duplicates_skipped,
        duplicates_replaced = ss.duplicates_replaced,
        cache_hits = ss.cache_hits,
        remote_fetches = ss.remote_fetches,
        rows_written = ss.rows_written,
        "stats"
    );
    let line = serde_json::to_string(&ss).unwrap_or_default();
    maybe_write_jsonl(&s.stats_jsonl_path, &line).await;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let s = Settings::from_env()?;
    run(&s).await
}
