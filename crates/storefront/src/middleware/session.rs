//! Session middleware configuration.
//!
//! Sessions live in a bounded moka cache. Each record is evicted at its own
//! expiry date, and the oldest records go first once the cache is full.
//! Sessions only hold the visitor identifier, so losing one just starts a
//! new visitor.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use tower_sessions::{
    Expiry as SessionExpiry, SessionManagerLayer, SessionStore,
    cookie::time::OffsetDateTime,
    session::{Id, Record},
    session_store,
};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "jt_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Upper bound on stored sessions.
const MAX_SESSIONS: u64 = 100_000;

/// Evicts each record when its own expiry date passes.
struct RecordExpiry;

impl RecordExpiry {
    fn remaining(record: &Record) -> Duration {
        let left = record.expiry_date - OffsetDateTime::now_utc();
        Duration::try_from(left).unwrap_or(Duration::ZERO)
    }
}

impl Expiry<Id, Record> for RecordExpiry {
    fn expire_after_create(&self, _id: &Id, record: &Record, _at: Instant) -> Option<Duration> {
        Some(Self::remaining(record))
    }

    fn expire_after_update(
        &self,
        _id: &Id,
        record: &Record,
        _at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(Self::remaining(record))
    }
}

/// In-memory session store with bounded size and per-record expiry.
#[derive(Clone, Debug)]
pub struct MokaStore {
    records: Cache<Id, Record>,
}

impl Default for MokaStore {
    fn default() -> Self {
        Self::new(MAX_SESSIONS)
    }
}

impl MokaStore {
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let records = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(RecordExpiry)
            .build();
        Self { records }
    }
}

#[async_trait]
impl SessionStore for MokaStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.records.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .records
            .get(session_id)
            .await
            .filter(|record| record.expiry_date > OffsetDateTime::now_utc()))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.invalidate(session_id).await;
        Ok(())
    }
}

/// Create the session layer backed by a [`MokaStore`].
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MokaStore> {
    SessionManagerLayer::new(MokaStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(SessionExpiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_sessions::cookie::time::Duration as TimeDuration;

    use super::*;

    async fn stored(store: &MokaStore) -> u64 {
        store.records.run_pending_tasks().await;
        store.records.entry_count()
    }

    fn record(ttl: TimeDuration) -> Record {
        Record {
            id: Id::default(),
            data: Default::default(),
            expiry_date: OffsetDateTime::now_utc() + ttl,
        }
    }

    #[tokio::test]
    async fn test_save_load_delete() {
        let store = MokaStore::default();
        let mut rec = record(TimeDuration::minutes(30));
        store.create(&mut rec).await.unwrap();

        assert_eq!(store.load(&rec.id).await.unwrap(), Some(rec.clone()));

        store.delete(&rec.id).await.unwrap();
        assert_eq!(store.load(&rec.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_records_are_evicted() {
        let store = MokaStore::default();
        let mut rec = record(TimeDuration::seconds(-1));
        store.create(&mut rec).await.unwrap();

        assert_eq!(store.load(&rec.id).await.unwrap(), None);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(stored(&store).await, 0);
    }

    #[tokio::test]
    async fn test_store_is_bounded() {
        let store = MokaStore::new(10);
        for _ in 0..200 {
            let mut rec = record(TimeDuration::minutes(30));
            store.create(&mut rec).await.unwrap();
        }
        assert!(stored(&store).await <= 10);
    }
}
