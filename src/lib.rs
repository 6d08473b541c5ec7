//! Man-in-the-middle inspection proxy for the Minecraft Java edition protocol.
//!
//! A client is pointed at this proxy as though it were the real server; the
//! proxy opens a matching connection to the real server, forwards traffic in
//! both directions, and writes every decoded packet to a human-readable log
//! file with configurable filtering.
//!
//! The pipeline for one direction (the other is symmetric):
//! raw socket bytes are buffered per direction, complete length-prefixed
//! frames are sliced off the front, the codec strips the optional compression
//! framing and decodes the packet id into a typed message, the session state
//! machine reacts to control messages (handshake address rewrite, compression
//! threshold, encryption notice), and the original or rewritten frame is
//! queued on the opposite socket while a copy of the decoded message goes to
//! the background logger.
//!
//! Encrypted sessions cannot be inspected. When the server requests
//! encryption the proxy warns, keeps forwarding bytes verbatim, and stops
//! decoding once framing no longer parses.

pub mod codec;
pub mod config;
pub mod framing;
pub mod logger;
pub mod protocol;
pub mod proxy;
pub mod server;
