use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::session::{AuthEvent, Session};

/// Callback invoked on every session change
pub type AuthListener = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

/// Registered session-change listeners
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, AuthListener)>>,
}

impl ListenerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(self: &Arc<Self>, listener: AuthListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, listener));
        tracing::debug!("Session listener {} subscribed ({} active)", id, self.len());

        Subscription {
            id,
            registry: Arc::downgrade(self),
            active: true,
        }
    }

    /// Invoke every listener with the new session state
    ///
    /// Listeners run outside the registry lock, so a listener may unsubscribe itself.
    pub fn emit(&self, event: AuthEvent, session: Option<&Session>) {
        let snapshot: Vec<AuthListener> = self.lock().iter().map(|(_, l)| l.clone()).collect();
        tracing::debug!(
            "Emitting {:?} to {} session listener(s)",
            event,
            snapshot.len()
        );
        for listener in snapshot {
            listener(event, session);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn remove(&self, id: u64) {
        self.lock().retain(|(listener_id, _)| *listener_id != id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(u64, AuthListener)>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle returned by `on_auth_state_change`
///
/// Dropping the handle unsubscribes as well, so a listener cannot outlive its owner.
pub struct Subscription {
    id: u64,
    registry: Weak<ListenerRegistry>,
    active: bool,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
            tracing::debug!("Session listener {} unsubscribed", self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
