use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Whole-process configuration, layered `defaults < NBA_INGEST.toml <
/// NBA_* env`, the single-file/single-prefix layering the rest of this
/// codebase's config types use. Field names double as the `NBA_`-stripped,
/// lowercased env var suffix `figment` matches against, so
/// `NBA_API_RATE_LIMIT` lands on `api_rate_limit` with no custom mapping.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IngestConfig {
    pub raw_root: String,
    pub api_rate_limit: f64,
    pub api_timeout: u64,
    pub connect_timeout_secs: u64,
    pub api_max_retries: u32,
    pub api_proxy: Option<String>,
    pub db_pool_size: u32,
    /// Filter the raw harvester's game discovery to regular-season games
    /// only, and log the excluded count rather than silently dropping rows
    /// when the season-type column is absent.
    pub regular_season_only: bool,
    /// Bound on concurrently in-flight games during the load stage.
    pub load_concurrency: usize,
    pub inter_game_sleep_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            raw_root: "raw".to_string(),
            api_rate_limit: 5.0,
            api_timeout: 30,
            connect_timeout_secs: 10,
            api_max_retries: 5,
            api_proxy: None,
            db_pool_size: 10,
            regular_season_only: true,
            load_concurrency: 3,
            inter_game_sleep_ms: 100,
        }
    }
}

impl IngestConfig {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file("NBA_INGEST.toml"))
            .merge(Env::prefixed("NBA_"))
    }

    pub fn load() -> figment::Result<Self> {
        Self::figment().extract()
    }
}
