pub mod clients;
pub mod fetcher;
pub mod manifest;
pub mod persist;
pub mod quarantine;
pub mod rate_limiter;

pub use clients::{GamebookClient, ReferenceSiteClient, StatsApiClient};
pub use fetcher::{Accept, FetchError, Fetcher, FetcherConfig};
pub use manifest::{
    read_manifest, update_manifest, EndpointError, EndpointResult, GameRecord, GameTeams,
    Manifest, ManifestError, ManifestSummary,
};
pub use persist::{write_json, PersistError, WriteResult};
pub use quarantine::{append_quarantine, default_quarantine_path, QuarantineError};
pub use rate_limiter::RateLimiter;
