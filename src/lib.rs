//! Response visibility and roster consistency for a course feedback platform.

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod logic;
pub mod model;

pub use config::Config;
pub use error::{Error, Result};

/// Client for the database server used by `#[backend_test]` tests, from `FEEDBACK_DB_URI`.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let config = Config::load().unwrap();
    mongodb::Client::with_uri_str(config.db_uri()).await.unwrap()
}

/// A fresh database name for each `#[backend_test]` test, so tests do not collide.
#[cfg(test)]
pub(crate) fn database() -> String {
    let random: u32 = rand::random();
    let db = format!("test{random}");
    info!("Using database {db}");
    db
}
