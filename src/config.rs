use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_key: String,
    pub contract_address: String,
    pub json_url_host: String,

    #[serde(default = "default_opensea_host")]
    pub opensea_host: String,
    #[serde(default = "default_collection_slug")]
    pub collection_slug: String,
    #[serde(default = "default_listings_limit")]
    pub listings_limit: usize,

    // Local files
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "default_output_path")]
    pub output_path: String,

    // Stats
    pub stats_jsonl_path: Option<String>,
}

fn default_opensea_host() -> String {
    "https://api.opensea.io".to_string()
}

fn default_collection_slug() -> String {
    "very-long-cnp".to_string()
}

fn default_listings_limit() -> usize {
    100
}

fn default_cache_dir() -> String {
    "token_cache".to_string()
}

fn default_output_path() -> String {
    "token_id_to_price_and_total_level.csv".to_string()
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let c = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;
        Ok(c.try_deserialize()?)
    }
}
