//! Realtime event channel: one logical subscription to server-pushed events
//! while a session is live, fanning frames out to registered listeners.
//!
//! Frames are JSON text of shape `{"type": ..., "payload": ...}`. Delivery is
//! synchronous and in registration order; a panicking listener never starves
//! the others. `close()` is synchronous from the caller's point of view: once
//! it returns, no listener observes another event, even for frames already in
//! flight. A generation counter ties every connection attempt and every
//! dispatch to the `open()` call that started it, so stale readers go inert
//! instead of racing a newer session.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::{Mutex, ReentrantMutex};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;

/// Bounded reconnect policy: doubling delay, hard attempt cap, and an
/// immediate stop whenever the owning session ends (close/open bump the
/// generation, which every retry checks).
const MAX_CONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_BASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
}

/// Known event tags. The server-side set is open; tags without a variant are
/// dropped before dispatch so additions never crash an older client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EventKind {
    NewAnnouncement,
    NewMessage,
}

impl EventKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "newAnnouncement" => Some(EventKind::NewAnnouncement),
            "newMessage" => Some(EventKind::NewMessage),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            EventKind::NewAnnouncement => "newAnnouncement",
            EventKind::NewMessage => "newMessage",
        }
    }
}

#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub kind: EventKind,
    pub payload: Value,
}

impl InboundEvent {
    /// Decode the payload into a typed record; `None` when the shape does
    /// not fit (the caller decides whether that matters).
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.payload.clone()).ok()
    }
}

type ListenerFn = Arc<dyn Fn(&InboundEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, ListenerFn)>,
}

/// Handle returned by `add_listener`. Cancelling removes exactly that
/// registration; it is idempotent and a no-op after the channel closed.
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub fn cancel(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

pub struct EventChannel {
    config: ClientConfig,
    state: Mutex<ChannelState>,
    registry: Arc<Mutex<Registry>>,
    // Held for the whole fan-out of one frame; close() takes it so it cannot
    // return while a delivery is in progress. Reentrant so a listener may
    // close the channel from inside its own callback.
    dispatch_gate: ReentrantMutex<()>,
    generation: AtomicU64,
    conn_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl EventChannel {
    pub fn new(config: ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            state: Mutex::new(ChannelState::Closed),
            registry: Arc::new(Mutex::new(Registry::default())),
            dispatch_gate: ReentrantMutex::new(()),
            generation: AtomicU64::new(0),
            conn_task: Mutex::new(None),
        })
    }

    pub fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    /// Register a callback. Listeners survive transient reconnects and are
    /// dropped on explicit close or when reconnects are exhausted.
    pub fn add_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&InboundEvent) + Send + Sync + 'static,
    {
        let mut reg = self.registry.lock();
        let id = reg.next_id;
        reg.next_id += 1;
        reg.entries.push((id, Arc::new(listener)));
        Subscription { id, registry: Arc::downgrade(&self.registry) }
    }

    /// Establish the connection for the given bearer token. Any previous
    /// connection becomes stale immediately (its reader goes inert).
    pub fn open(self: &Arc<Self>, token: &str) {
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.lock() = ChannelState::Connecting;
        let chan = Arc::clone(self);
        let token = token.to_string();
        let handle = tokio::spawn(async move { chan.run(token, gen).await });
        if let Some(old) = self.conn_task.lock().replace(handle) {
            old.abort();
        }
    }

    /// Tear the channel down. Synchronous: after this returns no listener is
    /// invoked again and pending reconnects stop.
    pub fn close(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.conn_task.lock().take() {
            task.abort();
        }
        // Wait out any in-flight delivery, then drop the registry.
        let _gate = self.dispatch_gate.lock();
        self.registry.lock().entries.clear();
        *self.state.lock() = ChannelState::Closed;
        debug!("realtime: channel closed");
    }

    async fn run(self: Arc<Self>, token: String, gen: u64) {
        let mut attempt: u32 = 0;
        loop {
            if self.generation.load(Ordering::SeqCst) != gen {
                return;
            }
            let url = match self.config.ws_url(&token) {
                Ok(u) => u,
                Err(e) => {
                    warn!("realtime: cannot build ws url: {}", e);
                    break;
                }
            };
            match connect_async(url.as_str()).await {
                Ok((mut stream, _resp)) => {
                    if self.generation.load(Ordering::SeqCst) != gen {
                        return;
                    }
                    *self.state.lock() = ChannelState::Open;
                    info!("realtime: connected");
                    attempt = 0;
                    while let Some(msg) = stream.next().await {
                        if self.generation.load(Ordering::SeqCst) != gen {
                            return;
                        }
                        match msg {
                            Ok(Message::Text(text)) => self.dispatch_frame(gen, &text),
                            Ok(Message::Close(_)) => break,
                            Ok(_) => {}
                            Err(e) => {
                                debug!("realtime: read error: {}", e);
                                break;
                            }
                        }
                    }
                    if self.generation.load(Ordering::SeqCst) != gen {
                        return;
                    }
                    *self.state.lock() = ChannelState::Connecting;
                    debug!("realtime: connection lost");
                }
                Err(e) => {
                    debug!("realtime: connect failed: {}", e);
                }
            }
            attempt += 1;
            if attempt >= MAX_CONNECT_ATTEMPTS {
                warn!("realtime: giving up after {} attempts, live updates unavailable", attempt);
                break;
            }
            let delay = RECONNECT_BASE_DELAY * 2u32.pow(attempt - 1);
            tokio::time::sleep(delay).await;
        }
        // Terminal disconnect for this generation: registry handles go inert.
        if self.generation.load(Ordering::SeqCst) == gen {
            let _gate = self.dispatch_gate.lock();
            self.registry.lock().entries.clear();
            *self.state.lock() = ChannelState::Closed;
        }
    }

    /// Parse one frame and fan it out. Unknown tags and non-JSON frames are
    /// dropped silently; a duplicate frame is two deliveries (suppression is
    /// a listener policy, not ours). Order follows registration order.
    fn dispatch_frame(&self, gen: u64, text: &str) {
        let parsed: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                debug!("realtime: dropping unparseable frame: {}", e);
                return;
            }
        };
        let tag = parsed.get("type").and_then(|t| t.as_str()).unwrap_or_default();
        let Some(kind) = EventKind::from_tag(tag) else {
            debug!("realtime: ignoring event type '{}'", tag);
            return;
        };
        let payload = parsed.get("payload").cloned().unwrap_or(Value::Null);
        let event = InboundEvent { kind, payload };

        let _gate = self.dispatch_gate.lock();
        if self.generation.load(Ordering::SeqCst) != gen {
            return;
        }
        let snapshot: Vec<(u64, ListenerFn)> = self
            .registry
            .lock()
            .entries
            .iter()
            .map(|(id, l)| (*id, l.clone()))
            .collect();
        for (id, listener) in snapshot {
            // A listener may have closed the channel mid-delivery.
            if self.generation.load(Ordering::SeqCst) != gen {
                break;
            }
            if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                warn!("realtime: listener {} panicked, continuing with the rest", id);
            }
        }
    }
}
