use clonegpt_sync::{ChannelBackend, ChannelListener, ChannelPort};
use clonegpt_types::SyncError;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{BroadcastChannel, MessageEvent};

/// Backend over the browser's `BroadcastChannel`.
///
/// The platform already excludes the posting context from delivery, so
/// ports map one-to-one onto native channels.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebBroadcastChannel;

impl WebBroadcastChannel {
    pub fn is_supported() -> bool {
        js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("BroadcastChannel"))
            .unwrap_or(false)
    }
}

impl ChannelBackend for WebBroadcastChannel {
    fn open(&self, name: &str) -> Result<Box<dyn ChannelPort>, SyncError> {
        if !Self::is_supported() {
            return Err(SyncError::Unsupported);
        }
        let channel = BroadcastChannel::new(name).map_err(platform_error)?;
        log::debug!("Opened BroadcastChannel '{}'", name);
        Ok(Box::new(BroadcastPort {
            channel,
            name: name.to_string(),
            on_message: None,
            closed: false,
        }))
    }
}

struct BroadcastPort {
    channel: BroadcastChannel,
    name: String,
    // Must outlive the `onmessage` registration.
    on_message: Option<Closure<dyn FnMut(MessageEvent)>>,
    closed: bool,
}

impl ChannelPort for BroadcastPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn post(&self, payload: Value) -> Result<(), SyncError> {
        if self.closed {
            return Err(SyncError::ChannelClosed { name: self.name.clone() });
        }
        let js = payload
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| SyncError::Encode { message: e.to_string() })?;
        self.channel.post_message(&js).map_err(platform_error)
    }

    fn subscribe(&mut self, listener: ChannelListener) -> Result<(), SyncError> {
        if self.closed {
            return Err(SyncError::ChannelClosed { name: self.name.clone() });
        }
        let name = self.name.clone();
        let closure = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            match serde_wasm_bindgen::from_value::<Value>(event.data()) {
                Ok(payload) => listener(payload),
                Err(e) => log::warn!("Dropping undecodable message on '{}': {}", name, e),
            }
        });
        self.channel.set_onmessage(Some(closure.as_ref().unchecked_ref()));
        self.on_message = Some(closure);
        Ok(())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.channel.set_onmessage(None);
        self.channel.close();
        self.on_message = None;
        log::debug!("Closed BroadcastChannel '{}'", self.name);
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for BroadcastPort {
    fn drop(&mut self) {
        self.close();
    }
}

fn platform_error(e: JsValue) -> SyncError {
    SyncError::Platform { message: e.as_string().unwrap_or_else(|| format!("{:?}", e)) }
}
