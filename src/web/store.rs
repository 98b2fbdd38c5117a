//! In-memory session store that forgets expired sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};
use tracing::{debug, error};

/// How often expired sessions are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Session records keyed by id. Only holds the visitor id per session.
#[derive(Clone, Debug, Default)]
pub(crate) struct VisitorStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

impl VisitorStore {
    /// Drops every record that expired before `now`, returns how many went.
    async fn delete_expired_at(&self, now: OffsetDateTime) -> usize {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| record.expiry_date > now);
        before - records.len()
    }

    /// Number of stored sessions.
    #[cfg(test)]
    async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Sweeps expired sessions forever; spawn it next to the server.
    pub(crate) async fn sweep_expired(self) {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(err) = self.delete_expired().await {
                error!("Failed to delete expired sessions: {}", err);
            }
        }
    }
}

#[async_trait]
impl SessionStore for VisitorStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.lock().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .records
            .lock()
            .await
            .get(session_id)
            .filter(|record| record.expiry_date > now)
            .cloned())
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for VisitorStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let removed = self.delete_expired_at(OffsetDateTime::now_utc()).await;
        if removed > 0 {
            debug!("Deleted {} expired sessions", removed);
        }
        Ok(())
    }
}
