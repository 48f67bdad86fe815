//! Typed publish/subscribe between tabs of one origin.

mod guard;

use clonegpt_types::{SyncConfig, SyncError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::channel::{ChannelBackend, ChannelListener, ChannelPort};
use guard::ProcessingGuard;

type Handler<M> = Arc<dyn Fn(M) + Send + Sync>;

/// Channel name and on/off switch. Changing either re-subscribes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncBusOptions {
    pub name: String,
    pub enabled: bool,
}

impl SyncBusOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), enabled: true }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl From<&SyncConfig> for SyncBusOptions {
    fn from(config: &SyncConfig) -> Self {
        Self { name: config.channel_name.clone(), enabled: config.enabled }
    }
}

/// Broadcasts messages of type `M` to sibling tabs and hands incoming ones to
/// an optional handler.
///
/// Two buses with the same name in one tab see each other's messages, so
/// names must be unique per purpose. If the runtime cannot open the channel
/// the bus logs once and stays inert.
pub struct CrossTabSyncBus<M> {
    backend: Arc<dyn ChannelBackend>,
    options: SyncBusOptions,
    handler: Option<Handler<M>>,
    port: Option<Box<dyn ChannelPort>>,
    processing: Arc<AtomicBool>,
}

impl<M> CrossTabSyncBus<M>
where
    M: Serialize + DeserializeOwned + 'static,
{
    /// Send-only bus.
    pub fn new(backend: Arc<dyn ChannelBackend>, options: SyncBusOptions) -> Self {
        Self::build(backend, options, None)
    }

    pub fn with_handler<F>(backend: Arc<dyn ChannelBackend>, options: SyncBusOptions, handler: F) -> Self
    where
        F: Fn(M) + Send + Sync + 'static,
    {
        Self::build(backend, options, Some(Arc::new(handler)))
    }

    fn build(
        backend: Arc<dyn ChannelBackend>,
        options: SyncBusOptions,
        handler: Option<Handler<M>>,
    ) -> Self {
        let mut bus = Self {
            backend,
            options,
            handler,
            port: None,
            processing: Arc::new(AtomicBool::new(false)),
        };
        bus.connect();
        bus
    }

    /// Broadcast to other tabs. Inert when disabled, unsupported, or closed.
    pub fn post_message(&self, message: &M) {
        let Some(port) = &self.port else {
            tracing::debug!("[SyncBus] '{}' inactive, message not sent", self.options.name);
            return;
        };
        let payload = match serde_json::to_value(message) {
            Ok(v) => v,
            Err(e) => {
                let err = SyncError::Encode { message: e.to_string() };
                tracing::warn!("[SyncBus] '{}': {}", self.options.name, err);
                return;
            }
        };
        if let Err(e) = port.post(payload) {
            tracing::warn!("[SyncBus] '{}' post failed: {}", self.options.name, e);
        }
    }

    /// Apply new options, re-subscribing only if name or enabled changed.
    pub fn reconfigure(&mut self, options: SyncBusOptions) {
        if options == self.options {
            return;
        }
        self.disconnect();
        self.options = options;
        self.connect();
    }

    fn connect(&mut self) {
        if !self.options.enabled {
            tracing::debug!("[SyncBus] '{}' disabled", self.options.name);
            return;
        }
        let mut port = match self.backend.open(&self.options.name) {
            Ok(port) => port,
            Err(e) => {
                tracing::warn!(
                    "[SyncBus] Could not open '{}': {}. Cross-tab sync disabled",
                    self.options.name,
                    e
                );
                return;
            }
        };
        if let Some(handler) = &self.handler {
            let listener = make_listener(
                self.options.name.clone(),
                Arc::clone(handler),
                Arc::clone(&self.processing),
            );
            if let Err(e) = port.subscribe(listener) {
                tracing::warn!("[SyncBus] Could not subscribe to '{}': {}", self.options.name, e);
            }
        }
        tracing::debug!("[SyncBus] Subscribed to '{}'", self.options.name);
        self.port = Some(port);
    }
}

impl<M> CrossTabSyncBus<M> {
    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn options(&self) -> &SyncBusOptions {
        &self.options
    }

    pub fn is_connected(&self) -> bool {
        self.port.as_ref().is_some_and(|p| !p.is_closed())
    }

    /// Tear down. Safe to call more than once.
    pub fn close(&mut self) {
        self.disconnect();
    }

    fn disconnect(&mut self) {
        if let Some(mut port) = self.port.take() {
            port.close();
            tracing::debug!("[SyncBus] Closed '{}'", self.options.name);
        }
    }
}

impl<M> Drop for CrossTabSyncBus<M> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn make_listener<M>(name: String, handler: Handler<M>, processing: Arc<AtomicBool>) -> ChannelListener
where
    M: DeserializeOwned + 'static,
{
    Arc::new(move |payload: Value| {
        let Some(_guard) = ProcessingGuard::try_acquire(&processing) else {
            tracing::debug!("[SyncBus] '{}' busy, dropping re-entrant message", name);
            return;
        };
        match serde_json::from_value::<M>(payload) {
            Ok(message) => handler(message),
            Err(e) => {
                let err = SyncError::Decode { message: e.to_string() };
                tracing::warn!("[SyncBus] '{}': {}", name, err);
            }
        }
    })
}
