use tokio::sync::mpsc;
use tracing::warn;

use super::cache::{CachedState, StateChange};
use super::decode;
use super::events::GatewayEvent;

/// Applies the gateway event stream to the cached state.
///
/// The connection's read loop feeds frames here in arrival order. This is
/// the only writer the cache ever sees.
pub struct GatewayDispatcher {
    cache: CachedState,
}

impl GatewayDispatcher {
    pub fn new() -> Self {
        Self {
            cache: CachedState::new(),
        }
    }

    /// Read access to the cached state.
    pub fn cache(&self) -> &CachedState {
        &self.cache
    }

    /// Register a change observer on the underlying cache.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StateChange> {
        self.cache.subscribe()
    }

    /// Decode one raw frame and apply it. An undecodable frame is logged
    /// and dropped; the stream keeps flowing.
    pub fn handle_frame(&mut self, raw: &str) {
        match decode::decode_frame(raw) {
            Ok(Some(event)) => self.apply(event),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "dropping undecodable gateway frame"),
        }
    }

    /// Apply one decoded event to the cache.
    pub fn apply(&mut self, event: GatewayEvent) {
        match event {
            GatewayEvent::Ready(ready) => self.cache.apply_ready(ready),
            GatewayEvent::GuildCreate(result) => self.cache.upsert_guild(result),
            GatewayEvent::GuildDelete(marker) => self.cache.remove_guild(&marker),
            GatewayEvent::ChannelCreate(channel) => self.cache.add_channel(channel),
            GatewayEvent::ChannelUpdate(channel) => self.cache.replace_channel(channel),
            GatewayEvent::ChannelDelete(channel) => self.cache.remove_channel(&channel),
            GatewayEvent::MessageCreate(message) => {
                // New authors surface here first; this is how the user
                // cache grows past the snapshot.
                if let Some(author) = message.author.clone() {
                    self.cache.upsert_user(author);
                }
                self.cache.upsert_message(&message);
            }
            GatewayEvent::UserUpdate(user) => self.cache.replace_current_user(user),
        }
    }
}

impl Default for GatewayDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
