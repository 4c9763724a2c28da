use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

struct SessionSlot<S> {
    state: Arc<Mutex<S>>,
    last_seen: Instant,
}

/// In-memory sessions keyed by id. Each session has its own async mutex,
/// so mutations within a session are serialized while sessions proceed in parallel.
pub struct SessionStore<S> {
    sessions: DashMap<Uuid, SessionSlot<S>>,
    idle_ttl: Duration,
}

impl<S> SessionStore<S> {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_ttl,
        }
    }

    pub fn insert(&self, state: S) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            SessionSlot {
                state: Arc::new(Mutex::new(state)),
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Handle to a session; lock it to read or mutate. Refreshes the idle timer.
    pub fn get(&self, id: &Uuid) -> Option<Arc<Mutex<S>>> {
        let mut slot = self.sessions.get_mut(id)?;
        slot.last_seen = Instant::now();
        Some(slot.state.clone())
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle longer than the TTL. Sessions with a live handle are kept.
    pub fn purge_idle(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.idle_ttl;

        self.sessions.retain(|_, slot| {
            slot.last_seen.elapsed() < ttl || Arc::strong_count(&slot.state) > 1
        });

        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            info!("Purged {} idle sessions", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store: SessionStore<Vec<u32>> = SessionStore::new(Duration::from_secs(60));
        let id = store.insert(Vec::new());

        {
            let session = store.get(&id).unwrap();
            session.lock().await.push(7);
        }

        let session = store.get(&id).unwrap();
        assert_eq!(*session.lock().await, vec![7]);
        assert!(store.get(&Uuid::new_v4()).is_none());

        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_mutations_are_serialized_per_session() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let id = store.insert(0u64);

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let session = store.get(&id).unwrap();
                let mut counter = session.lock().await;
                let current = *counter;
                tokio::task::yield_now().await;
                *counter = current + 1;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let session = store.get(&id).unwrap();
        assert_eq!(*session.lock().await, 32);
    }

    #[tokio::test]
    async fn test_purge_idle_keeps_sessions_in_use() {
        let store: SessionStore<u8> = SessionStore::new(Duration::ZERO);
        let idle = store.insert(1);
        let busy = store.insert(2);

        let handle = store.get(&busy).unwrap();
        assert_eq!(store.purge_idle(), 1);
        assert!(!store.contains(&idle));
        assert!(store.contains(&busy));

        drop(handle);
        assert_eq!(store.purge_idle(), 1);
        assert!(store.is_empty());
    }
}
