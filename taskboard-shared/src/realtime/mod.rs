/// Realtime fan-out of task mutations
///
/// Handlers publish a [`TaskEvent`] to the [`RealtimeHub`] after each task
/// write; WebSocket connections subscribe per project and forward what
/// they receive. Nothing is persisted or replayed.
///
/// - [`hub`]: project id → broadcast channel registry
/// - [`event`]: wire frames in both directions

pub mod event;
pub mod hub;

pub use event::{ClientMessage, ServerMessage, TaskEvent};
pub use hub::{channel_name, RealtimeHub};
