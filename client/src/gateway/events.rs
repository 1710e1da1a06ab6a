use crate::model::{Channel, CurrentUser, Guild, Member, Message, UnavailableGuild, User};

use super::decode::Fallible;

/// Bulk initial state, delivered once per session as the first dispatch.
///
/// The batched sequences arrive as per-entity decode results: one malformed
/// guild or user must not cost the session the rest of the snapshot.
/// `merged_members` aligns positionally with `guilds`, failed entries
/// included, so consumers must walk both by index rather than zip filtered
/// views.
#[derive(Debug)]
pub struct ReadyEvent {
    /// Guilds the user is in.
    pub guilds: Vec<Fallible<Guild>>,
    /// DM and group-DM channels.
    pub private_channels: Vec<Fallible<Channel>>,
    /// Users visible to the session at connect time.
    pub users: Vec<Fallible<User>>,
    /// The session user's own profile.
    pub user: CurrentUser,
    /// Per-guild member lists, one entry per element of `guilds`, in the
    /// same order.
    pub merged_members: Vec<Vec<Member>>,
}

/// A decoded gateway dispatch, ready to apply to the cache.
///
/// Built by [`super::decode::decode_frame`] rather than derived with serde:
/// the ready snapshot decodes its batched sequences element by element.
#[derive(Debug)]
pub enum GatewayEvent {
    /// Initial session snapshot.
    Ready(ReadyEvent),
    /// A guild was joined or became available.
    GuildCreate(Fallible<Guild>),
    /// A guild was left or became unavailable.
    GuildDelete(UnavailableGuild),
    /// A channel was created.
    ChannelCreate(Channel),
    /// A channel's properties changed.
    ChannelUpdate(Channel),
    /// A channel was deleted.
    ChannelDelete(Channel),
    /// A message was posted.
    MessageCreate(Message),
    /// The session user's own profile changed.
    UserUpdate(CurrentUser),
}
