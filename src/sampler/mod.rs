//! The sampler set: one periodic sampler and three event-driven listeners,
//! all behind the same [`Subscription`] lifecycle so the controller can
//! switch them on and off as a unit.

pub mod gps;
pub mod periodic;
pub mod radio;
pub mod screen;

use std::future::Future;
use std::pin::Pin;

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SubscriptionError;

pub use gps::GpsStatusListener;
pub use periodic::{PeriodicReader, PeriodicSampler};
pub use radio::RadioSignalListener;
pub use screen::ScreenStateListener;

pub type DeactivateFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SubscriptionError>> + Send + 'a>>;

/// A switchable event subscription.
///
/// `activate` subscribes before returning. `deactivate` resolves once the
/// subscription is gone from its source; on an inactive subscription it is a
/// no-op returning `Ok`.
pub trait Subscription: Send {
    fn name(&self) -> &'static str;
    fn activate(&mut self) -> Result<(), SubscriptionError>;
    fn deactivate(&mut self) -> DeactivateFuture<'_>;
    fn is_active(&self) -> bool;
}

struct Live {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// A spawned task draining one broadcast stream into a callback until cancelled.
pub struct ListenerTask {
    name: &'static str,
    live: Option<Live>,
}

impl ListenerTask {
    pub fn new(name: &'static str) -> Self {
        Self { name, live: None }
    }

    /// Subscribes before returning, so every event published after this call
    /// reaches `on_event`.
    pub fn start<E, F>(
        &mut self,
        source: &broadcast::Sender<E>,
        mut on_event: F,
    ) -> Result<(), SubscriptionError>
    where
        E: Clone + Send + 'static,
        F: FnMut(E) + Send + 'static,
    {
        if self.live.is_some() {
            return Err(SubscriptionError::AlreadyActive(self.name));
        }
        let runtime = Handle::try_current().map_err(|_| SubscriptionError::NoRuntime(self.name))?;

        let mut rx = source.subscribe();
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let name = self.name;

        let handle = runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(event) => on_event(event),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(listener = name, skipped, "listener fell behind, events lost");
                        }
                        Err(RecvError::Closed) => {
                            debug!(listener = name, "event source closed");
                            break;
                        }
                    }
                }
            }
        });

        debug!(listener = self.name, "listener registered");
        self.live = Some(Live { token, handle });
        Ok(())
    }

    /// Cancels the task and waits for it to go away. The receiver lives in
    /// the task, so once this resolves the source no longer counts this
    /// listener and nothing published afterwards reaches `on_event`.
    /// Stopping twice is benign; a task that already exited on its own is
    /// reported so the caller can log it.
    pub async fn stop(&mut self) -> Result<(), SubscriptionError> {
        let Some(live) = self.live.take() else {
            debug!(listener = self.name, "listener already unregistered");
            return Ok(());
        };

        let exited = live.handle.is_finished();
        live.token.cancel();
        live.handle.abort();
        if let Err(e) = live.handle.await {
            if e.is_panic() {
                warn!(listener = self.name, "listener task panicked");
                return Err(SubscriptionError::ListenerExited(self.name));
            }
        }
        debug!(listener = self.name, "listener unregistered");

        if exited {
            Err(SubscriptionError::ListenerExited(self.name))
        } else {
            Ok(())
        }
    }

    pub fn is_active(&self) -> bool {
        self.live.is_some()
    }
}

impl Drop for ListenerTask {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            live.token.cancel();
            live.handle.abort();
        }
    }
}
