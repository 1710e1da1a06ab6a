use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::warn;

use crate::model::{
    Channel, CurrentUser, Guild, Member, Message, Snowflake, UnavailableGuild, User,
};

use super::decode::Fallible;
use super::events::ReadyEvent;

/// Names the collection a cache mutation touched. Published to subscribers
/// so UI layers can re-render just the affected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Guilds,
    Members,
    Dms,
    CurrentUser,
    Users,
}

/// In-memory mirror of the chat state a session sees, kept current by the
/// gateway event stream.
///
/// Single-writer by construction: every mutation takes `&mut self`, and the
/// dispatcher that owns the cache applies events in arrival order. Readers
/// either share that execution context or react to [`StateChange`]
/// notifications.
pub struct CachedState {
    /// Guilds the user is in, keyed by guild ID.
    guilds: HashMap<Snowflake, Guild>,
    /// The session user's own membership per guild, keyed by guild ID.
    /// `None` records a guild whose snapshot member list carried no row
    /// for the current user.
    members: HashMap<Snowflake, Option<Member>>,
    /// DM channels, in the order the snapshot delivered them.
    dms: Vec<Channel>,
    /// The session user's own profile.
    user: Option<CurrentUser>,
    /// Every user seen so far. Populated from the snapshot, grows as new
    /// users appear in later events, never pruned.
    users: HashMap<Snowflake, User>,
    /// Live change subscribers. Closed receivers are pruned on publish.
    observers: Vec<mpsc::UnboundedSender<StateChange>>,
}

impl CachedState {
    pub fn new() -> Self {
        Self {
            guilds: HashMap::new(),
            members: HashMap::new(),
            dms: Vec::new(),
            user: None,
            users: HashMap::new(),
            observers: Vec::new(),
        }
    }

    /// Register a change observer. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StateChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    fn publish(&mut self, change: StateChange) {
        self.observers.retain(|tx| tx.send(change).is_ok());
    }

    // ── Snapshot ────────────────────────────────────────────────────

    /// Populate the cache from the session's initial snapshot.
    ///
    /// Entities that failed to decode are logged and skipped; everything
    /// else lands whole. `merged_members` aligns positionally with
    /// `guilds`, failed entries included, so the pairing walks both
    /// sequences by index and skips indices whose guild didn't decode.
    pub fn apply_ready(&mut self, ready: ReadyEvent) {
        let ReadyEvent {
            guilds,
            private_channels,
            users,
            user,
            merged_members,
        } = ready;

        for result in &guilds {
            match result {
                Ok(guild) => {
                    self.guilds.insert(guild.id.clone(), guild.clone());
                }
                Err(err) => warn!(error = %err, "skipping guild from ready snapshot"),
            }
        }

        self.dms = private_channels
            .into_iter()
            .filter_map(|result| match result {
                Ok(channel) => Some(channel),
                Err(err) => {
                    warn!(error = %err, "skipping private channel from ready snapshot");
                    None
                }
            })
            .collect();

        for result in users {
            match result {
                Ok(seen) => {
                    self.users.insert(seen.id.clone(), seen);
                }
                Err(err) => warn!(error = %err, "skipping user from ready snapshot"),
            }
        }

        for (idx, guild_members) in merged_members.iter().enumerate() {
            let Some(Ok(guild)) = guilds.get(idx) else {
                continue;
            };
            let own = guild_members.iter().find(|m| m.user_id == user.id).cloned();
            self.members.insert(guild.id.clone(), own);
        }

        self.user = Some(user);

        self.publish(StateChange::Guilds);
        self.publish(StateChange::Members);
        self.publish(StateChange::Dms);
        self.publish(StateChange::CurrentUser);
        self.publish(StateChange::Users);
    }

    // ── Guilds ──────────────────────────────────────────────────────

    /// Insert or replace a guild, keyed by its ID. A failed decode is
    /// logged and leaves the mapping untouched.
    pub fn upsert_guild(&mut self, result: Fallible<Guild>) {
        match result {
            Ok(guild) => {
                self.guilds.insert(guild.id.clone(), guild);
                self.publish(StateChange::Guilds);
            }
            Err(err) => warn!(error = %err, "skipping undecodable guild"),
        }
    }

    /// Drop the guild the marker names. Unknown IDs are a no-op.
    pub fn remove_guild(&mut self, marker: &UnavailableGuild) {
        if self.guilds.remove(&marker.id).is_some() {
            self.publish(StateChange::Guilds);
        }
    }

    // ── Channels ────────────────────────────────────────────────────

    /// Append a channel to its owning guild's channel list. Private
    /// channels and channels of unknown guilds are no-ops.
    pub fn add_channel(&mut self, channel: Channel) {
        let Some(guild_id) = channel.guild_id.clone() else {
            return;
        };
        let Some(guild) = self.guilds.get_mut(&guild_id) else {
            return;
        };
        guild.channels.push(channel);
        self.publish(StateChange::Guilds);
    }

    /// Remove every channel matching the given channel's ID from its
    /// owning guild's channel list.
    pub fn remove_channel(&mut self, channel: &Channel) {
        let Some(guild_id) = channel.guild_id.as_ref() else {
            return;
        };
        let Some(guild) = self.guilds.get_mut(guild_id) else {
            return;
        };
        let before = guild.channels.len();
        guild.channels.retain(|c| c.id != channel.id);
        if guild.channels.len() != before {
            self.publish(StateChange::Guilds);
        }
    }

    /// Replace the first channel whose ID matches the given channel's,
    /// within its owning guild's channel list.
    pub fn replace_channel(&mut self, channel: Channel) {
        let Some(guild_id) = channel.guild_id.clone() else {
            return;
        };
        let Some(guild) = self.guilds.get_mut(&guild_id) else {
            return;
        };
        if let Some(slot) = guild.channels.iter_mut().find(|c| c.id == channel.id) {
            *slot = channel;
            self.publish(StateChange::Guilds);
        }
    }

    // ── Messages ────────────────────────────────────────────────────

    /// Advance the last-message pointer of the DM channel the message was
    /// posted in. Messages outside the DM list are a no-op; bodies are
    /// never stored here.
    pub fn upsert_message(&mut self, message: &Message) {
        if let Some(dm) = self.dms.iter_mut().find(|c| c.id == message.channel_id) {
            dm.last_message_id = Some(message.id.clone());
            self.publish(StateChange::Dms);
        }
    }

    // ── Users ───────────────────────────────────────────────────────

    /// Insert or replace a user, keyed by its ID.
    pub fn upsert_user(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
        self.publish(StateChange::Users);
    }

    /// Replace the session user's own profile, whether or not one is set.
    pub fn replace_current_user(&mut self, user: CurrentUser) {
        self.user = Some(user);
        self.publish(StateChange::CurrentUser);
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn guilds(&self) -> &HashMap<Snowflake, Guild> {
        &self.guilds
    }

    pub fn guild(&self, id: &str) -> Option<&Guild> {
        self.guilds.get(id)
    }

    /// Own-membership per guild. A present `None` means the guild is known
    /// but the snapshot had no membership row for the current user.
    pub fn members(&self) -> &HashMap<Snowflake, Option<Member>> {
        &self.members
    }

    pub fn dms(&self) -> &[Channel] {
        &self.dms
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn users(&self) -> &HashMap<Snowflake, User> {
        &self.users
    }
}

impl Default for CachedState {
    fn default() -> Self {
        Self::new()
    }
}
