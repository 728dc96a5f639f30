mod fk;
pub mod loaders;
pub mod models;
mod pool;
mod schema;
mod url;

pub(crate) use schema::*;

pub use fk::partition_by_existing_game_ids;
pub use pool::{get_pool, ConnectionPool};
pub use url::postgres_url_from_environment;

pub use diesel::{Connection, PgConnection};
