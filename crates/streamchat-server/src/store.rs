//! Session store: maps session IDs to live chat sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use streamchat_ai::{HistoryPolicy, Session, Turn};
use streamchat_common::SessionId;
use tokio::sync::{watch, Mutex, MutexGuard, RwLock, TryLockError};

/// One stored session plus the visible turns as of its last finished
/// submission.
///
/// The mutex is held for the length of one submission. Readers that must
/// not wait (a new connection saying hello) use [`SessionSlot::visible_turns`].
pub struct SessionSlot {
    session: Mutex<Session>,
    visible: watch::Sender<Vec<Turn>>,
}

impl SessionSlot {
    fn new(session: Session) -> Self {
        let (visible, _) = watch::channel(visible_of(&session));
        Self {
            session: Mutex::new(session),
            visible,
        }
    }

    /// Take the session for a submission, or fail at once if another
    /// connection is using it.
    pub fn try_lock(&self) -> Result<MutexGuard<'_, Session>, TryLockError> {
        self.session.try_lock()
    }

    /// Visible (non-system) turns as of the last [`publish`](Self::publish).
    pub fn visible_turns(&self) -> Vec<Turn> {
        self.visible.borrow().clone()
    }

    /// Record the session's current visible turns for non-blocking readers.
    pub fn publish(&self, session: &Session) {
        self.visible.send_replace(visible_of(session));
    }
}

fn visible_of(session: &Session) -> Vec<Turn> {
    session.transcript().visible().cloned().collect()
}

pub type SharedSession = Arc<SessionSlot>;

struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// Result of [`SessionStore::attach`].
pub struct Attached {
    pub id: SessionId,
    pub session: SharedSession,
    /// `true` when an existing session was found under the requested id.
    pub resumed: bool,
}

/// Thread-safe session store.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Entry>>>,
    system_prompt: Arc<str>,
    history: Arc<dyn HistoryPolicy>,
}

impl SessionStore {
    /// New sessions are seeded with `system_prompt` and project history with `history`.
    pub fn new(system_prompt: impl Into<String>, history: Arc<dyn HistoryPolicy>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            system_prompt: Arc::from(system_prompt.into()),
            history,
        }
    }

    /// Return the session stored under `requested`, or create a fresh one
    /// under a new id when the id is absent or unknown.
    pub async fn attach(&self, requested: Option<SessionId>) -> Attached {
        let mut map = self.sessions.write().await;
        let now = Instant::now();

        if let Some(id) = requested {
            if let Some(entry) = map.get_mut(&id) {
                entry.last_seen = now;
                return Attached {
                    session: entry.session.clone(),
                    id,
                    resumed: true,
                };
            }
            tracing::debug!(session = %id, "Unknown session requested, starting a new one");
        }

        let id = SessionId::new();
        let session = Arc::new(SessionSlot::new(
            Session::new(&*self.system_prompt).with_history_policy(self.history.clone()),
        ));
        map.insert(
            id.clone(),
            Entry {
                session: session.clone(),
                last_seen: now,
            },
        );
        tracing::info!(session = %id, "Session created");

        Attached {
            id,
            session,
            resumed: false,
        }
    }

    /// Mark a session as used now.
    pub async fn touch(&self, id: &SessionId) {
        if let Some(entry) = self.sessions.write().await.get_mut(id) {
            entry.last_seen = Instant::now();
        }
    }

    /// Remove sessions idle longer than `max_idle`. Sessions still held by a
    /// connection are kept. Returns how many were removed.
    pub async fn reap_stale(&self, max_idle: Duration) -> usize {
        let mut map = self.sessions.write().await;
        let now = Instant::now();
        let before = map.len();
        map.retain(|id, entry| {
            let in_use = Arc::strong_count(&entry.session) > 1;
            let stale = !in_use && now.duration_since(entry.last_seen) > max_idle;
            if stale {
                tracing::info!(session = %id, "Reaping stale session");
            }
            !stale
        });
        before - map.len()
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
