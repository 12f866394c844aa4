use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::TraitSource;
use crate::stats::RunStats;
use crate::types::Trait;

/// File-backed cache in front of another `TraitSource`.
///
/// One `{token_id}.json` file per token. A present file is trusted as already
/// filtered and is never refreshed. Writes are plain overwrites, so only one
/// resolver may use a directory at a time.
pub struct CachedTraitSource<S> {
    dir: PathBuf,
    inner: S,
    stats: Arc<RunStats>,
}

impl<S: TraitSource> CachedTraitSource<S> {
    pub fn new(dir: impl Into<PathBuf>, inner: S, stats: Arc<RunStats>) -> Self {
        Self {
            dir: dir.into(),
            inner,
            stats,
        }
    }

    pub fn entry_path(&self, token_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", token_id))
    }

    async fn read_entry(path: &Path) -> Result<Vec<Trait>> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("read cache entry {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("decode cache entry {}", path.display()))
    }

    async fn write_entry(&self, path: &Path, traits: &[Trait]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create cache dir {}", self.dir.display()))?;
        let bytes = serde_json::to_vec(traits).context("encode cache entry")?;
        tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("write cache entry {}", path.display()))
    }
}

#[async_trait]
impl<S: TraitSource> TraitSource for CachedTraitSource<S> {
    async fn resolve(&self, token_id: &str) -> Result<Vec<Trait>> {
        let path = self.entry_path(token_id);

        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("stat cache entry {}", path.display()))?;
        if exists {
            self.stats.inc_cache_hit();
            tracing::debug!(token_id = %token_id, source = "cache", "traits resolved");
            return Self::read_entry(&path).await;
        }

        let traits = self.inner.resolve(token_id).await?;
        self.write_entry(&path, &traits).await?;
        tracing::debug!(token_id = %token_id, source = "remote", "traits resolved and cached");
        Ok(traits)
    }
}
