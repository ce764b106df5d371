//! # Redis
//!
//! Single storage backend for the application.
//!
//! ## Layout
//!
//! - Subject records: one hash per user and record kind
//!   (`user:<id>`, `perfil:<id>`, `pessoal:<id>`), field name to canonical
//!   text value. See [`crate::store`].
//! - Posts: JSON document at `post:<id>`, plus the sorted set `posts:index`
//!   scored by creation time for newest-first listing.
//! - Finances: JSON document at `finance:<id>`, plus `finances:index`.
//!
//! Record writes are single-hash operations, so each field update is atomic
//! at Redis's single-key granularity. No transaction ever spans fields.
use std::time::Duration;

use redis::{
    Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).unwrap();
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .unwrap();

    connection_manager
}
