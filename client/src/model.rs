use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique stable identifier for any entity (guild, channel, user, message).
/// Minted by the server; the client only ever compares and stores them.
pub type Snowflake = String;

bitflags! {
    /// Public profile flags (badges). Carried on the wire as a raw integer;
    /// see [`User::flags`] for the typed view.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UserFlags: u64 {
        const STAFF              = 1 << 0;
        const PARTNER            = 1 << 1;
        const HYPESQUAD_EVENTS   = 1 << 2;
        const BUG_HUNTER         = 1 << 3;
        const EARLY_SUPPORTER    = 1 << 9;
        const VERIFIED_BOT       = 1 << 16;
        const EARLY_BOT_DEVELOPER = 1 << 17;
        const CERTIFIED_MODERATOR = 1 << 18;
    }
}

/// Any user seen on the wire, from the initial snapshot or later events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
    /// Raw flag bits as sent by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_flags: Option<u64>,
}

impl User {
    /// Typed view of `public_flags`. Bits this client doesn't know are dropped.
    pub fn flags(&self) -> UserFlags {
        UserFlags::from_bits_truncate(self.public_flags.unwrap_or(0))
    }
}

/// The session user's own profile. Richer than [`User`]: the server only
/// discloses email and security state for the account itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Snowflake,
    pub username: String,
    pub discriminator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub mfa_enabled: bool,
}

/// A user's membership record within one guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: Snowflake,
    /// Per-guild nickname, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    pub joined_at: DateTime<Utc>,
}

/// Numeric channel type as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelKind {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    Category,
    /// A type this client doesn't know. Preserved so re-encoding is lossless.
    Unknown(u8),
}

impl From<u8> for ChannelKind {
    fn from(raw: u8) -> Self {
        match raw {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::Category,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::GuildText => 0,
            ChannelKind::Dm => 1,
            ChannelKind::GuildVoice => 2,
            ChannelKind::GroupDm => 3,
            ChannelKind::Category => 4,
            ChannelKind::Unknown(other) => other,
        }
    }
}

/// A channel, either inside a guild or a private (DM/group DM) channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    /// Absent for private channels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    /// ID of the most recent message posted in this channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_id: Option<Snowflake>,
    /// The other parties of a DM or group DM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<User>>,
}

impl Channel {
    /// True for channels that live outside any guild (DMs and group DMs).
    pub fn is_private(&self) -> bool {
        self.guild_id.is_none()
    }
}

/// A message as delivered by the gateway. The cache only reads the id and
/// channel id; the rest is for message views further up the stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Stub payload identifying a guild that became unavailable or was left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailableGuild {
    pub id: Snowflake,
    #[serde(default)]
    pub unavailable: bool,
}

/// A guild the session user belongs to, as preloaded by the ready snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Snowflake>,
    /// Channels of this guild, kept current by the channel events.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channels: Vec<Channel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,
}
