pub mod cache;
pub mod remote;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::types::{TotalLevelMap, Trait};

pub use cache::CachedTraitSource;
pub use remote::RemoteTraitSource;

/// Trait types that count towards a token's total level.
pub const LEVEL_TRAITS: [&str; 5] = ["SUITON", "DOTON", "KINTON", "KATON", "MOKUTON"];

/// Abstraction for where a token's level traits come from (remote metadata, local cache)
#[async_trait]
pub trait TraitSource: Send + Sync {
    /// Level traits of one token, already filtered to `LEVEL_TRAITS`
    async fn resolve(&self, token_id: &str) -> Result<Vec<Trait>>;
}

/// Exact, case-sensitive match against `LEVEL_TRAITS`.
pub fn is_level_trait(trait_type: &str) -> bool {
    LEVEL_TRAITS.contains(&trait_type)
}

pub fn total_level(traits: &[Trait]) -> Result<i64> {
    let mut sum: i64 = 0;
    for t in traits {
        let v: i64 = t
            .value
            .trim()
            .parse()
            .with_context(|| format!("trait {} has non-numeric value {:?}", t.trait_type, t.value))?;
        sum = sum
            .checked_add(v)
            .with_context(|| format!("total level overflow at trait {}", t.trait_type))?;
    }
    Ok(sum)
}

/// Resolves tokens one at a time, in the given order.
pub async fn resolve_total_levels<'a, S, I>(source: &S, token_ids: I) -> Result<TotalLevelMap>
where
    S: TraitSource + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let mut out = TotalLevelMap::new();
    for token_id in token_ids {
        let traits = source
            .resolve(token_id)
            .await
            .with_context(|| format!("resolve traits for token {}", token_id))?;
        let level = total_level(&traits).with_context(|| format!("token {}", token_id))?;
        tracing::info!(token_id = %token_id, traits = traits.len(), total_level = level, "token resolved");
        out.insert(token_id.to_string(), level);
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn tr(trait_type: &str, value: &str) -> Trait {
        Trait {
            trait_type: trait_type.to_string(),
            value: value.to_string(),
        }
    }

    /// In-memory source that counts how often it is asked.
    #[derive(Default)]
    pub(crate) struct CountingSource {
        pub traits: HashMap<String, Vec<Trait>>,
        pub calls: AtomicUsize,
    }

    impl CountingSource {
        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TraitSource for CountingSource {
        async fn resolve(&self, token_id: &str) -> Result<Vec<Trait>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.traits.get(token_id) {
                Some(t) => Ok(t.clone()),
                None => anyhow::bail!("unknown token {}", token_id),
            }
        }
    }

    #[test]
    fn allow_list_is_exact() {
        for t in LEVEL_TRAITS {
            assert!(is_level_trait(t));
        }
        assert!(!is_level_trait("katon"));
        assert!(!is_level_trait("Background"));
        assert!(!is_level_trait(""));
    }

    #[test]
    fn total_level_sums_values() {
        let ts = vec![tr("SUITON", "3"), tr("DOTON", "4"), tr("KINTON", " 5 ")];
        assert_eq!(total_level(&ts).unwrap(), 12);
        assert_eq!(total_level(&[]).unwrap(), 0);
    }

    #[test]
    fn non_numeric_value_fails() {
        assert!(total_level(&[tr("KATON", "high")]).is_err());
    }

    #[tokio::test]
    async fn resolves_each_token_once() {
        let mut src = CountingSource::default();
        src.traits.insert("1".into(), vec![tr("KATON", "2"), tr("DOTON", "3")]);
        src.traits.insert("2".into(), vec![]);

        let levels = resolve_total_levels(&src, ["1", "2"]).await.unwrap();
        assert_eq!(levels.get("1"), Some(&5));
        assert_eq!(levels.get("2"), Some(&0));
        assert_eq!(src.calls(), 2);
    }

    #[tokio::test]
    async fn resolver_error_stops_the_run() {
        let src = CountingSource::default();
        assert!(resolve_total_levels(&src, ["404"]).await.is_err());
    }
}
