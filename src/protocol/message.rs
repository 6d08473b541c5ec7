//! Typed messages for the packets the proxy understands.
//!
//! Full parsing of the protocol is _not_ implemented. The catalogue covers
//! every control message the session state machine reacts to, plus the
//! ordinary traffic of each phase so the log stays readable. Packets outside
//! the catalogue are forwarded untouched and logged as unknown.
//!
//! Messages are decoded for inspection only; forwarding always uses the
//! original frame bytes, so an unread trailing field loses nothing.

use crate::protocol::{decoder, ConnectionState, Decoder, Encoder};
use serde_json::Value;

pub mod handshake;
pub mod login;
pub mod play;
pub mod status;

/// A decoded packet, tagged by message type.
///
/// The variant name doubles as the message name in log lines and in the
/// filter configuration.
#[derive(Debug, Clone, strum::IntoStaticStr)]
pub enum Message {
    Handshake(handshake::Handshake),
    StatusRequest(status::StatusRequest),
    StatusResponse(status::StatusResponse),
    StatusPing(status::StatusPing),
    StatusPong(status::StatusPong),
    LoginStart(login::LoginStart),
    EncryptionResponse(login::EncryptionResponse),
    LoginDisconnect(login::LoginDisconnect),
    EncryptionRequest(login::EncryptionRequest),
    LoginSuccess(login::LoginSuccess),
    SetCompression(login::SetCompression),
    KeepAliveClientbound(play::KeepAlive),
    KeepAliveServerbound(play::KeepAlive),
    JoinGame(play::JoinGame),
    ChatMessageClientbound(play::ChatMessageClientbound),
    ChatMessageServerbound(play::ChatMessageServerbound),
    PlayerFlying(play::PlayerFlying),
    PlayerPosition(play::PlayerPosition),
    PlayDisconnect(play::PlayDisconnect),
}

impl Message {
    /// The message's packet id within its state and direction.
    pub fn id(&self) -> i32 {
        match self {
            Message::Handshake(_) => 0x00,
            Message::StatusRequest(_) => 0x00,
            Message::StatusResponse(_) => 0x00,
            Message::StatusPing(_) => 0x01,
            Message::StatusPong(_) => 0x01,
            Message::LoginStart(_) => 0x00,
            Message::EncryptionResponse(_) => 0x01,
            Message::LoginDisconnect(_) => 0x00,
            Message::EncryptionRequest(_) => 0x01,
            Message::LoginSuccess(_) => 0x02,
            Message::SetCompression(_) => 0x03,
            Message::KeepAliveClientbound(_) => 0x00,
            Message::KeepAliveServerbound(_) => 0x00,
            Message::JoinGame(_) => 0x01,
            Message::ChatMessageClientbound(_) => 0x02,
            Message::ChatMessageServerbound(_) => 0x01,
            Message::PlayerFlying(_) => 0x03,
            Message::PlayerPosition(_) => 0x04,
            Message::PlayDisconnect(_) => 0x40,
        }
    }

    /// The message name shown in log lines and matched by the filter config.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Reads the message body (everything after the packet id).
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        match self {
            Message::Handshake(m) => m.read(decoder),
            Message::StatusRequest(m) => m.read(decoder),
            Message::StatusResponse(m) => m.read(decoder),
            Message::StatusPing(m) => m.read(decoder),
            Message::StatusPong(m) => m.read(decoder),
            Message::LoginStart(m) => m.read(decoder),
            Message::EncryptionResponse(m) => m.read(decoder),
            Message::LoginDisconnect(m) => m.read(decoder),
            Message::EncryptionRequest(m) => m.read(decoder),
            Message::LoginSuccess(m) => m.read(decoder),
            Message::SetCompression(m) => m.read(decoder),
            Message::KeepAliveClientbound(m) => m.read(decoder),
            Message::KeepAliveServerbound(m) => m.read(decoder),
            Message::JoinGame(m) => m.read(decoder),
            Message::ChatMessageClientbound(m) => m.read(decoder),
            Message::ChatMessageServerbound(m) => m.read(decoder),
            Message::PlayerFlying(m) => m.read(decoder),
            Message::PlayerPosition(m) => m.read(decoder),
            Message::PlayDisconnect(m) => m.read(decoder),
        }
    }

    /// Writes the packet id followed by the message body.
    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_var_int(self.id());
        match self {
            Message::Handshake(m) => m.write(encoder),
            Message::StatusRequest(m) => m.write(encoder),
            Message::StatusResponse(m) => m.write(encoder),
            Message::StatusPing(m) => m.write(encoder),
            Message::StatusPong(m) => m.write(encoder),
            Message::LoginStart(m) => m.write(encoder),
            Message::EncryptionResponse(m) => m.write(encoder),
            Message::LoginDisconnect(m) => m.write(encoder),
            Message::EncryptionRequest(m) => m.write(encoder),
            Message::LoginSuccess(m) => m.write(encoder),
            Message::SetCompression(m) => m.write(encoder),
            Message::KeepAliveClientbound(m) => m.write(encoder),
            Message::KeepAliveServerbound(m) => m.write(encoder),
            Message::JoinGame(m) => m.write(encoder),
            Message::ChatMessageClientbound(m) => m.write(encoder),
            Message::ChatMessageServerbound(m) => m.write(encoder),
            Message::PlayerFlying(m) => m.write(encoder),
            Message::PlayerPosition(m) => m.write(encoder),
            Message::PlayDisconnect(m) => m.write(encoder),
        }
    }

    /// The decoded field tree, used for detailed log entries.
    pub fn fields(&self) -> Value {
        let value = match self {
            Message::Handshake(m) => serde_json::to_value(m),
            Message::StatusRequest(m) => serde_json::to_value(m),
            Message::StatusResponse(m) => serde_json::to_value(m),
            Message::StatusPing(m) => serde_json::to_value(m),
            Message::StatusPong(m) => serde_json::to_value(m),
            Message::LoginStart(m) => serde_json::to_value(m),
            Message::EncryptionResponse(m) => serde_json::to_value(m),
            Message::LoginDisconnect(m) => serde_json::to_value(m),
            Message::EncryptionRequest(m) => serde_json::to_value(m),
            Message::LoginSuccess(m) => serde_json::to_value(m),
            Message::SetCompression(m) => serde_json::to_value(m),
            Message::KeepAliveClientbound(m) => serde_json::to_value(m),
            Message::KeepAliveServerbound(m) => serde_json::to_value(m),
            Message::JoinGame(m) => serde_json::to_value(m),
            Message::ChatMessageClientbound(m) => serde_json::to_value(m),
            Message::ChatMessageServerbound(m) => serde_json::to_value(m),
            Message::PlayerFlying(m) => serde_json::to_value(m),
            Message::PlayerPosition(m) => serde_json::to_value(m),
            Message::PlayDisconnect(m) => serde_json::to_value(m),
        };
        value.unwrap_or(Value::Null)
    }
}

/// Creates an empty clientbound (server-to-client) message for the given
/// packet id, or `None` if the id is not in the catalogue.
pub fn create_clientbound(id: i32, state: ConnectionState) -> Option<Message> {
    use ConnectionState::*;
    let message = match (state, id) {
        (Status, 0x00) => Message::StatusResponse(Default::default()),
        (Status, 0x01) => Message::StatusPong(Default::default()),
        (Login, 0x00) => Message::LoginDisconnect(Default::default()),
        (Login, 0x01) => Message::EncryptionRequest(Default::default()),
        (Login, 0x02) => Message::LoginSuccess(Default::default()),
        (Login, 0x03) => Message::SetCompression(Default::default()),
        (Play, 0x00) => Message::KeepAliveClientbound(Default::default()),
        (Play, 0x01) => Message::JoinGame(Default::default()),
        (Play, 0x02) => Message::ChatMessageClientbound(Default::default()),
        (Play, 0x40) => Message::PlayDisconnect(Default::default()),
        _ => return None,
    };
    Some(message)
}

/// Creates an empty serverbound (client-to-server) message for the given
/// packet id, or `None` if the id is not in the catalogue.
pub fn create_serverbound(id: i32, state: ConnectionState) -> Option<Message> {
    use ConnectionState::*;
    let message = match (state, id) {
        (Handshake, 0x00) => Message::Handshake(Default::default()),
        (Status, 0x00) => Message::StatusRequest(Default::default()),
        (Status, 0x01) => Message::StatusPing(Default::default()),
        (Login, 0x00) => Message::LoginStart(Default::default()),
        (Login, 0x01) => Message::EncryptionResponse(Default::default()),
        (Play, 0x00) => Message::KeepAliveServerbound(Default::default()),
        (Play, 0x01) => Message::ChatMessageServerbound(Default::default()),
        (Play, 0x03) => Message::PlayerFlying(Default::default()),
        (Play, 0x04) => Message::PlayerPosition(Default::default()),
        _ => return None,
    };
    Some(message)
}
