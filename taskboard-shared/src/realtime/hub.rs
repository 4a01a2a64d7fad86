/// Per-project broadcast channels
///
/// The hub maps project ids to `tokio::sync::broadcast` senders. A channel
/// is created on first subscription and pruned once it has no receivers.
/// Delivery is at-most-once and in publish order per receiver; a receiver
/// that falls more than `capacity` events behind loses the oldest ones and
/// sees `RecvError::Lagged`.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::realtime::{RealtimeHub, TaskEvent};
///
/// # async fn example() {
/// let hub = RealtimeHub::new(RealtimeHub::DEFAULT_CAPACITY);
/// let mut rx = hub.subscribe(7).await;
///
/// hub.publish(7, TaskEvent::TaskDeleted { id: 3 }).await;
/// assert_eq!(rx.recv().await.unwrap(), TaskEvent::TaskDeleted { id: 3 });
/// # }
/// ```

use std::collections::HashMap;

use tokio::sync::{broadcast, watch, RwLock};

use super::event::TaskEvent;

/// Channel name for a project, as reported to clients
pub fn channel_name(project_id: i64) -> String {
    format!("project_{}", project_id)
}

pub struct RealtimeHub {
    channels: RwLock<HashMap<i64, broadcast::Sender<TaskEvent>>>,
    capacity: usize,
    closed: watch::Sender<bool>,
}

impl RealtimeHub {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            closed: watch::channel(false).0,
        }
    }

    /// Subscribes to a project's events from now on
    ///
    /// After [`shutdown`](Self::shutdown) the returned receiver is already
    /// closed.
    pub async fn subscribe(&self, project_id: i64) -> broadcast::Receiver<TaskEvent> {
        if self.is_closed() {
            let (_, rx) = broadcast::channel(1);
            return rx;
        }

        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(project_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0);

        tracing::debug!(
            project_id,
            channel = %channel_name(project_id),
            subscribers = sender.receiver_count() + 1,
            "Realtime subscription added"
        );
        sender.subscribe()
    }

    /// Sends an event to every current subscriber of the project
    ///
    /// Returns the number of subscribers reached. With no subscribers this is
    /// a no-op and any leftover channel is pruned.
    pub async fn publish(&self, project_id: i64, event: TaskEvent) -> usize {
        let sender = {
            let channels = self.channels.read().await;
            match channels.get(&project_id) {
                Some(sender) => sender.clone(),
                None => return 0,
            }
        };

        let name = event.name();
        match sender.send(event) {
            Ok(delivered) => {
                tracing::debug!(project_id, event = name, delivered, "Realtime event published");
                delivered
            }
            Err(_) => {
                self.release(project_id).await;
                0
            }
        }
    }

    /// Drops the project's channel if nobody listens to it anymore
    ///
    /// Callers invoke this after dropping a receiver.
    pub async fn release(&self, project_id: i64) {
        let mut channels = self.channels.write().await;
        if let Some(sender) = channels.get(&project_id) {
            if sender.receiver_count() == 0 {
                channels.remove(&project_id);
                tracing::debug!(project_id, "Realtime channel pruned");
            }
        }
    }

    pub async fn subscriber_count(&self, project_id: i64) -> usize {
        self.channels
            .read()
            .await
            .get(&project_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Closes every channel; receivers drain what they hold and then end
    pub async fn shutdown(&self) {
        self.closed.send_replace(true);
        let mut channels = self.channels.write().await;
        let count = channels.len();
        channels.clear();
        tracing::info!(channels = count, "Realtime hub shut down");
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Flips to `true` when [`shutdown`](Self::shutdown) runs
    ///
    /// Connections hold one so they can end even while subscribed to nothing.
    pub fn closed_signal(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
