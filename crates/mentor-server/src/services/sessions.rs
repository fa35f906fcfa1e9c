//! In-memory conversation store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mentor_config::ServerSettings;
use mentor_engine::{Assistant, Session};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

/// A session shared between requests; turns on one session are serialized.
pub type SharedSession = Arc<Mutex<Session>>;

struct Entry {
    session: SharedSession,
    last_used: Instant,
}

impl Entry {
    fn is_idle(&self, now: Instant, idle: Duration) -> bool {
        now.saturating_duration_since(self.last_used) >= idle
    }
}

/// Sessions keyed by id. Nothing is persisted.
///
/// Idle sessions are swept whenever a new one is opened, and the least
/// recently used session is evicted once `capacity` is reached.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    idle: Duration,
    capacity: usize,
}

impl SessionStore {
    pub fn new(idle: Duration, capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle,
            capacity: capacity.max(1),
        }
    }

    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self::new(Duration::from_secs(settings.session_idle_secs), settings.max_sessions)
    }

    /// Opens a session with a fresh id.
    pub async fn create(&self, assistant: &Assistant) -> (String, SharedSession) {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(assistant.session()));
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_idle(now, self.idle));
        if sessions.len() < before {
            info!("Expired {} idle sessions", before - sessions.len());
        }

        while sessions.len() >= self.capacity {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            info!("Evicted session {} (capacity {})", oldest, self.capacity);
        }

        sessions.insert(
            id.clone(),
            Entry {
                session: Arc::clone(&session),
                last_used: now,
            },
        );
        info!("Opened session {}", id);
        (id, session)
    }

    /// Returns the session and marks it used; idle sessions count as gone.
    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        if sessions.get(id)?.is_idle(now, self.idle) {
            sessions.remove(id);
            info!("Session {} expired", id);
            return None;
        }

        let entry = sessions.get_mut(id)?;
        entry.last_used = now;
        Some(Arc::clone(&entry.session))
    }

    /// Returns `true` if the session existed.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!("Closed session {}", id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_config::MentorConfig;

    fn assistant() -> Assistant {
        let mut config = MentorConfig::default();
        config.llm.offline = true;
        Assistant::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn create_get_remove() {
        let assistant = assistant();
        let store = SessionStore::from_settings(&ServerSettings::default());
        let (a, _) = store.create(&assistant).await;
        let (b, _) = store.create(&assistant).await;
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);

        assert!(store.get(&a).await.is_some());
        assert!(store.remove(&a).await);
        assert!(!store.remove(&a).await);
        assert!(store.get(&a).await.is_none());
    }

    #[tokio::test]
    async fn idle_sessions_expire() {
        let assistant = assistant();
        let store = SessionStore::new(Duration::from_millis(50), 16);
        let (a, _) = store.create(&assistant).await;
        let (b, _) = store.create(&assistant).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(store.get(&a).await.is_none());
        assert_eq!(store.len().await, 1);

        store.create(&assistant).await;
        assert!(store.get(&b).await.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let assistant = assistant();
        let store = SessionStore::new(Duration::from_secs(60), 2);
        let (a, _) = store.create(&assistant).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let (b, _) = store.create(&assistant).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(store.get(&a).await.is_some());
        tokio::time::sleep(Duration::from_millis(5)).await;

        let (c, _) = store.create(&assistant).await;
        assert_eq!(store.len().await, 2);
        assert!(store.get(&b).await.is_none());
        assert!(store.get(&a).await.is_some());
        assert!(store.get(&c).await.is_some());
    }
}
