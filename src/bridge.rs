//! In-process bridge between the sampler and the UI.
//!
//! Two channels cross it, both carrying JSON:
//! - named events pushed by the backend (`metrics-update`) to any number of
//!   listeners;
//! - named commands (`get_system_info`) invoked by the UI and answered once.
//!
//! A [`Listener`] is a scoped subscription: dropping it (or calling
//! [`Listener::unlisten`]) removes it from the bridge. Delivery happens under
//! the registry lock, so once `unlisten` returns no further events arrive;
//! events already queued stay receivable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use iced::futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use iced::futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub const METRICS_EVENT: &str = "metrics-update";
pub const GET_SYSTEM_INFO: &str = "get_system_info";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("command `{command}` failed: {reason}")]
    CommandFailed { command: String, reason: String },
    #[error("failed to encode payload: {0}")]
    Encode(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

type CommandHandler = Box<dyn Fn() -> Result<serde_json::Value, String> + Send + Sync>;

#[derive(Default)]
struct Registry {
    listeners: HashMap<String, Vec<(u64, UnboundedSender<String>)>>,
}

struct Inner {
    registry: Mutex<Registry>,
    commands: Mutex<HashMap<String, CommandHandler>>,
    next_id: AtomicU64,
}

impl Inner {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_listener(&self, event: &str, id: u64) {
        let mut registry = self.registry();
        if let Some(list) = registry.listeners.get_mut(event) {
            list.retain(|(lid, _)| *lid != id);
            if list.is_empty() {
                registry.listeners.remove(event);
            }
        }
    }
}

/// Cheap-to-clone handle; every clone talks to the same registry.
#[derive(Clone)]
pub struct EventBridge {
    inner: Arc<Inner>,
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridge")
            .field("listeners", &self.inner.registry().listeners.len())
            .finish()
    }
}

impl EventBridge {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry::default()),
                commands: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Subscribe to `event`. The subscription lives as long as the returned
    /// handle.
    pub fn listen(&self, event: &str) -> Listener {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded();
        self.inner
            .registry()
            .listeners
            .entry(event.to_owned())
            .or_default()
            .push((id, tx));
        tracing::debug!(event, id, "listener registered");
        Listener {
            id,
            event: event.to_owned(),
            rx,
            bridge: Arc::downgrade(&self.inner),
            active: true,
        }
    }

    /// Serialize `payload` and deliver it to every listener of `event`.
    /// Returns how many listeners received it.
    pub fn emit<T: Serialize>(&self, event: &str, payload: &T) -> Result<usize, BridgeError> {
        let json = serde_json::to_string(payload).map_err(|e| BridgeError::Encode(e.to_string()))?;
        Ok(self.emit_raw(event, json))
    }

    /// Deliver an already-encoded payload.
    pub fn emit_raw(&self, event: &str, payload: String) -> usize {
        let mut registry = self.inner.registry();
        let Some(list) = registry.listeners.get_mut(event) else {
            return 0;
        };
        // Receivers that went away without unlistening are pruned here.
        list.retain(|(_, tx)| tx.unbounded_send(payload.clone()).is_ok());
        let delivered = list.len();
        if list.is_empty() {
            registry.listeners.remove(event);
        }
        delivered
    }

    #[cfg(test)]
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .registry()
            .listeners
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Register (or replace) the handler answering `command`.
    pub fn register_command<F>(&self, command: &str, handler: F)
    where
        F: Fn() -> Result<serde_json::Value, String> + Send + Sync + 'static,
    {
        self.inner
            .commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(command.to_owned(), Box::new(handler));
    }

    /// Run `command` and decode its JSON answer.
    pub fn invoke<T: DeserializeOwned>(&self, command: &str) -> Result<T, BridgeError> {
        let value = {
            let commands = self
                .inner
                .commands
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let handler = commands
                .get(command)
                .ok_or_else(|| BridgeError::UnknownCommand(command.to_owned()))?;
            handler().map_err(|reason| BridgeError::CommandFailed {
                command: command.to_owned(),
                reason,
            })?
        };
        serde_json::from_value(value).map_err(|e| BridgeError::Decode(e.to_string()))
    }
}

/// Receiving end of a subscription.
pub struct Listener {
    id: u64,
    event: String,
    rx: UnboundedReceiver<String>,
    bridge: Weak<Inner>,
    active: bool,
}

impl Listener {
    /// Wait for the next payload. `None` once unsubscribed and drained, or
    /// once the bridge is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.next().await
    }

    #[cfg(test)]
    /// Non-blocking receive: `Ok(Some)` for a payload, `Ok(None)` when the
    /// subscription is closed and drained, `Err(())` when nothing is queued.
    pub fn try_recv(&mut self) -> Result<Option<String>, ()> {
        self.rx.try_next().map_err(|_| ())
    }

    /// Remove this subscription from the bridge. Safe to call more than once,
    /// and before any event was ever delivered.
    pub fn unlisten(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(inner) = self.bridge.upgrade() {
            inner.remove_listener(&self.event, self.id);
        }
        self.rx.close();
        tracing::debug!(event = %self.event, id = self.id, "listener removed");
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.unlisten();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SystemIdentity;

    #[test]
    fn test_emit_reaches_every_listener() {
        let bridge = EventBridge::new();
        let mut a = bridge.listen(METRICS_EVENT);
        let mut b = bridge.listen(METRICS_EVENT);
        let _other = bridge.listen("other");

        assert_eq!(bridge.emit(METRICS_EVENT, &vec![1, 2]).unwrap(), 2);
        assert_eq!(a.try_recv(), Ok(Some("[1,2]".to_string())));
        assert_eq!(b.try_recv(), Ok(Some("[1,2]".to_string())));
        assert_eq!(a.try_recv(), Err(()));
    }

    #[test]
    fn test_emit_without_listeners() {
        let bridge = EventBridge::new();
        assert_eq!(bridge.emit_raw(METRICS_EVENT, "{}".into()), 0);
    }

    #[test]
    fn test_payloads_arrive_in_order() {
        let bridge = EventBridge::new();
        let mut l = bridge.listen(METRICS_EVENT);
        for i in 0..5 {
            bridge.emit(METRICS_EVENT, &i).unwrap();
        }
        let got: Vec<String> = (0..5).map(|_| l.try_recv().unwrap().unwrap()).collect();
        assert_eq!(got, vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn test_unlisten_keeps_queued_and_stops_new() {
        let bridge = EventBridge::new();
        let mut l = bridge.listen(METRICS_EVENT);
        bridge.emit_raw(METRICS_EVENT, "last".into());
        l.unlisten();
        assert_eq!(bridge.emit_raw(METRICS_EVENT, "late".into()), 0);
        assert_eq!(l.try_recv(), Ok(Some("last".to_string())));
        assert_eq!(l.try_recv(), Ok(None));
    }

    #[test]
    fn test_unlisten_is_idempotent_before_any_event() {
        let bridge = EventBridge::new();
        let mut l = bridge.listen(METRICS_EVENT);
        assert_eq!(bridge.listener_count(METRICS_EVENT), 1);
        l.unlisten();
        l.unlisten();
        assert!(!l.is_active());
        assert_eq!(bridge.listener_count(METRICS_EVENT), 0);
        drop(l);
        assert_eq!(bridge.listener_count(METRICS_EVENT), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bridge = EventBridge::new();
        {
            let _l = bridge.listen(METRICS_EVENT);
            assert_eq!(bridge.listener_count(METRICS_EVENT), 1);
        }
        assert_eq!(bridge.listener_count(METRICS_EVENT), 0);
    }

    #[test]
    fn test_listener_outliving_bridge() {
        let bridge = EventBridge::new();
        let mut l = bridge.listen(METRICS_EVENT);
        drop(bridge);
        assert_eq!(l.try_recv(), Ok(None));
        l.unlisten();
    }

    #[test]
    fn test_invoke_decodes_response() {
        let bridge = EventBridge::new();
        bridge.register_command(GET_SYSTEM_INFO, || {
            Ok(serde_json::json!({"username": "ada", "hostname": "box", "os": "linux"}))
        });
        let id: SystemIdentity = bridge.invoke(GET_SYSTEM_INFO).unwrap();
        assert_eq!(id.username, "ada");
        assert_eq!(id.hostname, "box");
    }

    #[test]
    fn test_invoke_errors() {
        let bridge = EventBridge::new();
        assert_eq!(
            bridge.invoke::<SystemIdentity>(GET_SYSTEM_INFO),
            Err(BridgeError::UnknownCommand(GET_SYSTEM_INFO.into()))
        );

        bridge.register_command(GET_SYSTEM_INFO, || Err("no user".into()));
        assert!(matches!(
            bridge.invoke::<SystemIdentity>(GET_SYSTEM_INFO),
            Err(BridgeError::CommandFailed { .. })
        ));

        bridge.register_command(GET_SYSTEM_INFO, || Ok(serde_json::json!({"username": 3})));
        assert!(matches!(
            bridge.invoke::<SystemIdentity>(GET_SYSTEM_INFO),
            Err(BridgeError::Decode(_))
        ));
    }
}
