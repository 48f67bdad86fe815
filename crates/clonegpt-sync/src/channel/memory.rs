//! Same-process fan-out channel.
//!
//! Each "tab" opens its own port on a shared hub. Delivery is synchronous:
//! `post` returns after every other subscriber's listener has run.

use clonegpt_types::SyncError;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use super::{ChannelBackend, ChannelListener, ChannelPort};

struct Subscriber {
    port_id: u64,
    listener: ChannelListener,
}

#[derive(Default)]
struct HubInner {
    channels: DashMap<String, Vec<Subscriber>>,
    next_port_id: AtomicU64,
}

impl HubInner {
    /// Listeners are cloned out so they run without the registry lock held;
    /// handlers are free to post again.
    fn listeners(&self, name: &str, except: Option<u64>) -> Vec<ChannelListener> {
        self.channels
            .get(name)
            .map(|subs| {
                subs.iter()
                    .filter(|s| Some(s.port_id) != except)
                    .map(|s| Arc::clone(&s.listener))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn deliver(&self, name: &str, except: Option<u64>, payload: &Value) -> usize {
        let listeners = self.listeners(name, except);
        for listener in &listeners {
            listener(payload.clone());
        }
        listeners.len()
    }

    fn unsubscribe(&self, name: &str, port_id: u64) {
        let now_empty = match self.channels.get_mut(name) {
            Some(mut subs) => {
                subs.retain(|s| s.port_id != port_id);
                subs.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.channels.remove_if(name, |_, subs| subs.is_empty());
        }
    }
}

/// In-process hub shared by every tab that should see each other's messages.
#[derive(Clone, Default)]
pub struct MemoryChannelHub {
    inner: Arc<HubInner>,
}

impl MemoryChannelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide hub.
    pub fn global() -> &'static MemoryChannelHub {
        static INSTANCE: OnceLock<MemoryChannelHub> = OnceLock::new();
        INSTANCE.get_or_init(MemoryChannelHub::new)
    }

    /// Deliver to every subscriber of `name`, as if posted by a tab that has
    /// no port of its own. Returns the number of listeners reached.
    pub fn publish(&self, name: &str, payload: Value) -> usize {
        self.inner.deliver(name, None, &payload)
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.inner.channels.get(name).map(|subs| subs.len()).unwrap_or(0)
    }
}

impl ChannelBackend for MemoryChannelHub {
    fn open(&self, name: &str) -> Result<Box<dyn ChannelPort>, SyncError> {
        let id = self.inner.next_port_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("[MemoryChannel] Opened port {} on '{}'", id, name);
        Ok(Box::new(MemoryPort {
            hub: Arc::clone(&self.inner),
            name: name.to_string(),
            id,
            subscribed: false,
            closed: false,
        }))
    }
}

struct MemoryPort {
    hub: Arc<HubInner>,
    name: String,
    id: u64,
    subscribed: bool,
    closed: bool,
}

impl ChannelPort for MemoryPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn post(&self, payload: Value) -> Result<(), SyncError> {
        if self.closed {
            return Err(SyncError::ChannelClosed { name: self.name.clone() });
        }
        let reached = self.hub.deliver(&self.name, Some(self.id), &payload);
        tracing::trace!("[MemoryChannel] Port {} reached {} listener(s)", self.id, reached);
        Ok(())
    }

    fn subscribe(&mut self, listener: ChannelListener) -> Result<(), SyncError> {
        if self.closed {
            return Err(SyncError::ChannelClosed { name: self.name.clone() });
        }
        if self.subscribed {
            self.hub.unsubscribe(&self.name, self.id);
        }
        self.hub
            .channels
            .entry(self.name.clone())
            .or_default()
            .push(Subscriber { port_id: self.id, listener });
        self.subscribed = true;
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.subscribed {
            self.hub.unsubscribe(&self.name, self.id);
            self.subscribed = false;
        }
        tracing::debug!("[MemoryChannel] Closed port {} on '{}'", self.id, self.name);
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for MemoryPort {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    fn recorder() -> (ChannelListener, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (Arc::new(move |v| sink.lock().push(v)), seen)
    }

    #[test]
    fn test_fan_out_skips_sender() {
        let hub = MemoryChannelHub::new();
        let mut a = hub.open("session").unwrap();
        let mut b = hub.open("session").unwrap();
        let mut c = hub.open("other").unwrap();
        let (la, seen_a) = recorder();
        let (lb, seen_b) = recorder();
        let (lc, seen_c) = recorder();
        a.subscribe(la).unwrap();
        b.subscribe(lb).unwrap();
        c.subscribe(lc).unwrap();

        a.post(json!({ "type": "LOGOUT" })).unwrap();

        assert!(seen_a.lock().is_empty());
        assert_eq!(seen_b.lock().len(), 1);
        assert!(seen_c.lock().is_empty());
    }

    #[test]
    fn test_closed_port_stops_receiving_and_rejects_posts() {
        let hub = MemoryChannelHub::new();
        let a = hub.open("session").unwrap();
        let mut b = hub.open("session").unwrap();
        let (lb, seen_b) = recorder();
        b.subscribe(lb).unwrap();
        assert_eq!(hub.subscriber_count("session"), 1);

        b.close();
        b.close();
        assert!(b.is_closed());
        assert_eq!(hub.subscriber_count("session"), 0);

        a.post(json!(1)).unwrap();
        assert!(seen_b.lock().is_empty());
        assert!(matches!(b.post(json!(2)), Err(SyncError::ChannelClosed { .. })));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let hub = MemoryChannelHub::new();
        {
            let mut port = hub.open("session").unwrap();
            let (l, _) = recorder();
            port.subscribe(l).unwrap();
            assert_eq!(hub.subscriber_count("session"), 1);
        }
        assert_eq!(hub.subscriber_count("session"), 0);
    }

    #[test]
    fn test_resubscribe_replaces_listener() {
        let hub = MemoryChannelHub::new();
        let mut port = hub.open("session").unwrap();
        let (first, seen_first) = recorder();
        let (second, seen_second) = recorder();
        port.subscribe(first).unwrap();
        port.subscribe(second).unwrap();

        assert_eq!(hub.publish("session", json!("ping")), 1);
        assert!(seen_first.lock().is_empty());
        assert_eq!(seen_second.lock().len(), 1);
    }
}
