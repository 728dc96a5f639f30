pub mod clock;
pub mod config;
pub mod crosswalk;
pub mod extract;
pub mod harvester;
pub mod models;
pub mod orchestrator;
pub mod preprocess;
pub mod reader;
pub mod season;
pub mod transform;

pub use config::IngestConfig;
pub use harvester::{harvest_date, DateHarvestSummary};
pub use orchestrator::{run_silver_load, GameResult, SilverLoadSummary};
