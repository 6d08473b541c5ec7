//! Implements the subset of the Minecraft protocol the proxy inspects.

pub mod decoder;
pub mod encoder;
pub mod message;

pub use decoder::{DecodeError, Decoder};
pub use encoder::Encoder;
pub use message::Message;

/// Limit to avoid out-of-memory DOS.
pub(crate) const BUFFER_LIMIT: usize = 1024 * 1024; // 1 MiB

/// Protocol phase of a session.
///
/// Every session starts in `Handshake`. The client's handshake moves it to
/// `Status` or `Login`; the server's login success moves it to `Play`. No
/// other transition is legal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Handshake,
    Status,
    Login,
    Play,
}

/// Which peer produced a stream of bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    Client,
    Server,
}

impl Origin {
    /// Direction label used in log lines and diagnostics.
    pub fn arrow(self) -> &'static str {
        match self {
            Origin::Client => "[C --> S]",
            Origin::Server => "[S --> C]",
        }
    }
}
