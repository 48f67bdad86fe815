use std::rc::{Rc, Weak};
use std::sync::Arc;

use clonegpt_sync::{CacheStore, ChannelBackend, CrossTabSyncBus, SyncBusOptions, TabScope, TabScopeHandlers};
use clonegpt_types::{CacheKey, RateLimitConfig, SessionSyncMessage, SyncConfig, SyncError};
use parking_lot::RwLock;
use uuid::Uuid;

use super::SessionState;
use crate::rate_limit::{
    MonitorOptions, RateLimitListener, RateLimitMonitor, StatusFetcher, CACHE_PREFIX,
};

/// Owns a tab's session, its query cache, and the session sync bus.
///
/// Dropping the last `Rc` unmounts the provider and closes the channel.
pub struct SessionProvider {
    tab_id: Uuid,
    session: Arc<RwLock<SessionState>>,
    cache: Arc<dyn CacheStore>,
    bus: CrossTabSyncBus<SessionSyncMessage>,
}

impl SessionProvider {
    pub fn mount(
        backend: Arc<dyn ChannelBackend>,
        cache: Arc<dyn CacheStore>,
        config: &SyncConfig,
    ) -> Rc<Self> {
        let tab_id = Uuid::new_v4();
        let session = Arc::new(RwLock::new(SessionState::Anonymous));

        let handler = {
            let session = Arc::clone(&session);
            let cache = Arc::clone(&cache);
            move |message: SessionSyncMessage| {
                handle_remote(tab_id, &session, cache.as_ref(), message);
            }
        };
        let bus = CrossTabSyncBus::with_handler(backend, SyncBusOptions::from(config), handler);

        tracing::info!(
            "[Session] Provider mounted in tab {} (sync {})",
            tab_id,
            if bus.is_connected() { "on" } else { "off" }
        );
        Rc::new(Self { tab_id, session, cache, bus })
    }

    /// Accessor for consumers further down the tree.
    pub fn scope(self: &Rc<Self>) -> SessionScope {
        SessionScope { provider: Rc::downgrade(self) }
    }

    pub fn tab_id(&self) -> Uuid {
        self.tab_id
    }

    pub fn session(&self) -> SessionState {
        self.session.read().clone()
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub fn sync_bus(&self) -> &CrossTabSyncBus<SessionSyncMessage> {
        &self.bus
    }

    /// Replace the local session and tell other tabs to drop their
    /// per-user rate-limit entries.
    pub fn sign_in(&self, state: SessionState) {
        let user_id = state.user_id().map(str::to_string);
        *self.session.write() = state;
        if let Some(user_id) = user_id {
            tracing::info!("[Session] Tab {} signed in as {}", self.tab_id, user_id);
            self.bus.post_message(&SessionSyncMessage::SessionRefreshed { user_id });
        }
    }

    pub fn sign_out(&self, scope: TabScope) {
        let user_id = self.session.read().user_id().map(str::to_string);
        TabScopeHandlers::new()
            .this_tab(|| {
                tracing::info!("[Session] Tab {} signed out", self.tab_id);
                clear_local(&self.session, self.cache.as_ref());
            })
            .other_tabs(|| self.bus.post_message(&SessionSyncMessage::Logout { user_id }))
            .run(scope);
    }

    /// Monitor for `resource`, keyed on the current session's user and
    /// watching `config.watched_reasons`.
    pub fn rate_limit_monitor(
        &self,
        resource: &str,
        config: &RateLimitConfig,
        fetcher: Arc<dyn StatusFetcher>,
        listener: Arc<dyn RateLimitListener>,
    ) -> RateLimitMonitor {
        let session = self.session.read();
        let user_id = session.user_id().unwrap_or("anonymous");
        let key = RateLimitMonitor::cache_key(resource, user_id);
        RateLimitMonitor::new(
            MonitorOptions::from_config(key, config, Arc::clone(&self.cache), fetcher)
                .listener(listener),
        )
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        tracing::debug!("[Session] Provider in tab {} unmounted", self.tab_id);
    }
}

fn handle_remote(
    tab_id: Uuid,
    session: &RwLock<SessionState>,
    cache: &dyn CacheStore,
    message: SessionSyncMessage,
) {
    match message {
        SessionSyncMessage::Logout { user_id } => {
            tracing::info!(
                "[Session] Tab {} following logout from another tab ({})",
                tab_id,
                user_id.as_deref().unwrap_or("unknown user")
            );
            clear_local(session, cache);
        }
        SessionSyncMessage::SessionRefreshed { user_id } => {
            let removed = cache.remove_prefix(&CacheKey::new([CACHE_PREFIX]));
            tracing::debug!(
                "[Session] Session refreshed for {}, dropped {} rate-limit entries",
                user_id,
                removed
            );
        }
    }
}

fn clear_local(session: &RwLock<SessionState>, cache: &dyn CacheStore) {
    *session.write() = SessionState::Anonymous;
    cache.clear();
}

/// Handle to the provider that fails fast once the provider is gone.
#[derive(Clone)]
pub struct SessionScope {
    provider: Weak<SessionProvider>,
}

impl SessionScope {
    /// A scope with no provider above it.
    pub fn detached() -> Self {
        Self { provider: Weak::new() }
    }

    pub fn session_sync(&self) -> Result<Rc<SessionProvider>, SyncError> {
        self.provider
            .upgrade()
            .ok_or_else(|| SyncError::OutsideProvider { context: "SessionSync".to_string() })
    }

    pub fn is_mounted(&self) -> bool {
        self.provider.strong_count() > 0
    }
}
