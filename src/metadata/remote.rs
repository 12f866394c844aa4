use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::{is_level_trait, TraitSource};
use crate::http;
use crate::stats::RunStats;
use crate::types::Trait;

/// Per-token metadata served as `{base_url}{token_id}.json`
pub struct RemoteTraitSource {
    base_url: String,
    http: reqwest::Client,
    stats: Arc<RunStats>,
}

impl RemoteTraitSource {
    pub fn new(base_url: String, stats: Arc<RunStats>) -> Result<Self> {
        Ok(Self {
            base_url,
            http: http::json_client()?,
            stats,
        })
    }

    pub fn token_url(&self, token_id: &str) -> String {
        format!("{}{}.json", self.base_url, token_id)
    }
}

#[async_trait]
impl TraitSource for RemoteTraitSource {
    async fn resolve(&self, token_id: &str) -> Result<Vec<Trait>> {
        let url = self.token_url(token_id);
        tracing::debug!(url = %url, "fetching token metadata");
        self.stats.inc_remote_fetch();

        let body = http::get_text(self.http.get(&url), "token metadata").await?;
        let meta: TokenMetadata =
            serde_json::from_str(&body).context("decode token metadata json failed")?;

        level_traits(meta.attributes)
            .with_context(|| format!("token {} metadata", token_id))
    }
}

#[derive(Debug, Deserialize)]
struct TokenMetadata {
    attributes: Vec<RawAttribute>,
}

/// Attribute as published; `value` stays untyped until the allow-list has run.
#[derive(Debug, Deserialize)]
struct RawAttribute {
    trait_type: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// Keeps level traits in source order. Only their values have to be a string or number.
fn level_traits(attrs: Vec<RawAttribute>) -> Result<Vec<Trait>> {
    let mut out = Vec::new();
    for a in attrs.into_iter().filter(|a| is_level_trait(&a.trait_type)) {
        let value = match a.value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            other => anyhow::bail!("trait {} has non-numeric value {}", a.trait_type, other),
        };
        out.push(Trait {
            trait_type: a.trait_type,
            value,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::tests::serve_once;

    fn decode(body: &str) -> Result<Vec<Trait>> {
        let meta: TokenMetadata = serde_json::from_str(body)?;
        level_traits(meta.attributes)
    }

    #[test]
    fn token_url_appends_json_suffix() {
        let src = RemoteTraitSource::new("https://meta.example/cnp/".to_string(), RunStats::new(0)).unwrap();
        assert_eq!(src.token_url("123"), "https://meta.example/cnp/123.json");
    }

    #[test]
    fn metadata_is_filtered_to_level_traits() {
        let got = decode(
            r#"{
                "name": "CNP #123",
                "attributes": [
                    {"trait_type": "Background", "value": "Red"},
                    {"trait_type": "KATON", "value": 3},
                    {"trait_type": "katon", "value": 9},
                    {"trait_type": "DOTON", "value": "2", "display_type": "number"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].trait_type, "KATON");
        assert_eq!(got[0].value, "3");
        assert_eq!(got[1].trait_type, "DOTON");
        assert_eq!(got[1].value, "2");
    }

    #[test]
    fn odd_values_outside_the_allow_list_are_ignored() {
        let got = decode(
            r#"{"attributes":[
                {"trait_type":"Genesis","value":true},
                {"trait_type":"Edition","value":null},
                {"trait_type":"Tags","value":["a","b"]},
                {"trait_type":"Unnamed"},
                {"trait_type":"KATON","value":"3"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(got, vec![Trait { trait_type: "KATON".into(), value: "3".into() }]);
    }

    #[test]
    fn non_scalar_level_value_is_an_error() {
        assert!(decode(r#"{"attributes":[{"trait_type":"SUITON","value":null}]}"#).is_err());
        assert!(decode(r#"{"attributes":[{"trait_type":"SUITON","value":false}]}"#).is_err());
    }

    #[test]
    fn missing_attributes_is_an_error() {
        assert!(serde_json::from_str::<TokenMetadata>(r#"{"name": "CNP #1"}"#).is_err());
    }

    #[tokio::test]
    async fn resolves_over_http() {
        let base = serve_once(
            "200 OK",
            r#"{"attributes":[{"trait_type":"Genesis","value":true},{"trait_type":"MOKUTON","value":4}]}"#,
        )
        .await;
        let stats = RunStats::new(0);
        let src = RemoteTraitSource::new(format!("{}/meta/", base), stats.clone()).unwrap();

        let got = src.resolve("12").await.unwrap();
        assert_eq!(got, vec![Trait { trait_type: "MOKUTON".into(), value: "4".into() }]);
        assert_eq!(stats.snapshot(0).remote_fetches, 1);
    }

    #[tokio::test]
    async fn server_error_fails_the_resolve() {
        let base = serve_once("500 Internal Server Error", "metadata backend down").await;
        let src = RemoteTraitSource::new(format!("{}/meta/", base), RunStats::new(0)).unwrap();

        let err = src.resolve("12").await.unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("status=500"));
        assert!(msg.contains("metadata backend down"));
    }
}
