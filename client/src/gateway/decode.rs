use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::model::{CurrentUser, Member};

use super::events::{GatewayEvent, ReadyEvent};

/// Decode failure for a gateway frame or a single entity within one.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame envelope or a whole dispatch payload failed to parse.
    #[error("malformed {context} payload: {source}")]
    Frame {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// One element of a batched sequence failed to parse. The rest of the
    /// batch is unaffected.
    #[error("failed to decode {entity}: {source}")]
    Entity {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// A dispatch frame arrived without an event type.
    #[error("dispatch frame missing event type")]
    MissingEventType,
}

/// Result of decoding one entity out of a batched payload.
pub type Fallible<T> = Result<T, DecodeError>;

/// Raw frame envelope. Only opcode 0 (dispatch) carries state for the cache;
/// heartbeats, hello and friends belong to the connection layer.
#[derive(Deserialize)]
struct Frame {
    op: u8,
    #[serde(default)]
    t: Option<String>,
    #[serde(default)]
    d: Value,
}

/// READY with its batched sequences still undecoded. Each element is
/// decoded on its own so one bad entity cannot poison the batch.
#[derive(Deserialize)]
struct RawReady {
    guilds: Vec<Value>,
    #[serde(default)]
    private_channels: Vec<Value>,
    #[serde(default)]
    users: Vec<Value>,
    user: CurrentUser,
    #[serde(default)]
    merged_members: Vec<Vec<Member>>,
}

const OP_DISPATCH: u8 = 0;

/// Decode one raw frame from the gateway.
///
/// `Ok(None)` means the frame was valid but carries nothing for the cache:
/// a non-dispatch opcode, or an event type this client doesn't track.
pub fn decode_frame(raw: &str) -> Result<Option<GatewayEvent>, DecodeError> {
    let frame: Frame = serde_json::from_str(raw).map_err(|source| DecodeError::Frame {
        context: "frame",
        source,
    })?;

    if frame.op != OP_DISPATCH {
        return Ok(None);
    }
    let Some(event_type) = frame.t.as_deref() else {
        return Err(DecodeError::MissingEventType);
    };

    let event = match event_type {
        "READY" => GatewayEvent::Ready(decode_ready(frame.d)?),
        "GUILD_CREATE" => GatewayEvent::GuildCreate(decode_entity(frame.d, "guild")),
        "GUILD_DELETE" => GatewayEvent::GuildDelete(payload(frame.d, "guild delete")?),
        "CHANNEL_CREATE" => GatewayEvent::ChannelCreate(payload(frame.d, "channel")?),
        "CHANNEL_UPDATE" => GatewayEvent::ChannelUpdate(payload(frame.d, "channel")?),
        "CHANNEL_DELETE" => GatewayEvent::ChannelDelete(payload(frame.d, "channel")?),
        "MESSAGE_CREATE" => GatewayEvent::MessageCreate(payload(frame.d, "message")?),
        "USER_UPDATE" => GatewayEvent::UserUpdate(payload(frame.d, "current user")?),
        other => {
            debug!(event_type = other, "ignoring untracked gateway event");
            return Ok(None);
        }
    };
    Ok(Some(event))
}

fn decode_ready(d: Value) -> Result<ReadyEvent, DecodeError> {
    let raw: RawReady = serde_json::from_value(d).map_err(|source| DecodeError::Frame {
        context: "ready",
        source,
    })?;
    Ok(ReadyEvent {
        guilds: decode_each(raw.guilds, "guild"),
        private_channels: decode_each(raw.private_channels, "private channel"),
        users: decode_each(raw.users, "user"),
        user: raw.user,
        merged_members: raw.merged_members,
    })
}

/// Decode every element of a batched sequence individually, keeping the
/// failures in place so positional alignment with sibling sequences holds.
fn decode_each<T: DeserializeOwned>(values: Vec<Value>, entity: &'static str) -> Vec<Fallible<T>> {
    values
        .into_iter()
        .map(|value| decode_entity(value, entity))
        .collect()
}

fn decode_entity<T: DeserializeOwned>(value: Value, entity: &'static str) -> Fallible<T> {
    serde_json::from_value(value).map_err(|source| DecodeError::Entity { entity, source })
}

/// Wholesale decode of a dispatch payload. Failure drops the whole frame.
fn payload<T: DeserializeOwned>(value: Value, context: &'static str) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|source| DecodeError::Frame { context, source })
}
