//! Implements proxy session logic.
//!
//! One task per session drives both sockets. Reads land in a per-direction
//! frame reader; every complete frame is decoded, dispatched to the state
//! machine, logged, and forwarded. Writes go through a per-direction queue
//! drained by a dedicated task, so the read path never blocks and frames
//! leave in arrival order.

use crate::{
    codec::{self, COMPRESSION_DISABLED},
    framing::{Frame, FrameReader},
    logger::PacketLogger,
    protocol::{ConnectionState, Message, Origin},
};
use anyhow::{bail, Context};
use tokio::{
    io::AsyncReadExt,
    net::{tcp::OwnedWriteHalf, TcpStream},
    select, task,
};

/// A single client/server pair.
///
/// Owns the protocol state machine: the connection state, the compression
/// threshold, and the degraded-forwarding flags used once the server turns
/// on encryption.
pub struct Session {
    remote_host: String,
    remote_port: u16,
    logger: PacketLogger,
    state: ConnectionState,
    compression_threshold: i32,
    /// Set by a dispatch handler to substitute the forwarded bytes for the
    /// frame being processed. Cleared before every dispatch.
    replacement: Option<Vec<u8>>,
    encryption_requested: bool,
    client_passthrough: bool,
    server_passthrough: bool,
}

impl Session {
    pub fn new(remote_host: impl Into<String>, remote_port: u16, logger: PacketLogger) -> Self {
        Self {
            remote_host: remote_host.into(),
            remote_port,
            logger,
            state: ConnectionState::Handshake,
            compression_threshold: COMPRESSION_DISABLED,
            replacement: None,
            encryption_requested: false,
            client_passthrough: false,
            server_passthrough: false,
        }
    }

    /// Connects to the real server and forwards traffic until either socket
    /// closes or the stream becomes unframeable.
    pub async fn run(mut self, client: TcpStream) -> anyhow::Result<()> {
        tracing::info!(
            "Starting new proxy to {}:{}",
            self.remote_host,
            self.remote_port
        );
        let result = self.drive(client).await;
        tracing::info!("Session closed");
        result
    }

    async fn drive(&mut self, client: TcpStream) -> anyhow::Result<()> {
        let server = TcpStream::connect((self.remote_host.as_str(), self.remote_port))
            .await
            .with_context(|| {
                format!(
                    "connecting to server {}:{}",
                    self.remote_host, self.remote_port
                )
            })?;

        let (mut client_read, client_write) = client.into_split();
        let (mut server_read, server_write) = server.into_split();
        let to_client = spawn_writer(client_write);
        let to_server = spawn_writer(server_write);

        let mut client_frames = FrameReader::new();
        let mut server_frames = FrameReader::new();
        let mut client_buf = [0u8; 4096];
        let mut server_buf = [0u8; 4096];

        loop {
            select! {
                read = client_read.read(&mut client_buf) => {
                    let n = read.context("client read")?;
                    if n == 0 {
                        break;
                    }
                    client_frames.extend(&client_buf[..n]);
                    self.pump(Origin::Client, &mut client_frames, &to_server)?;
                }
                read = server_read.read(&mut server_buf) => {
                    let n = read.context("server read")?;
                    if n == 0 {
                        break;
                    }
                    server_frames.extend(&server_buf[..n]);
                    self.pump(Origin::Server, &mut server_frames, &to_client)?;
                }
            }
        }
        Ok(())
    }

    /// Runs the framing/decode/dispatch pipeline over everything buffered
    /// for one direction.
    fn pump(
        &mut self,
        origin: Origin,
        frames: &mut FrameReader,
        forward: &flume::Sender<Vec<u8>>,
    ) -> anyhow::Result<()> {
        if self.passthrough(origin) {
            forward_bytes(forward, frames.take_buffered())?;
            return Ok(());
        }

        loop {
            match frames.next_frame() {
                Ok(Some(frame)) => self.handle_frame(origin, frame, forward)?,
                Ok(None) => return Ok(()),
                Err(e) if self.encryption_requested => {
                    // The encrypted stream no longer frames. Stop decoding
                    // this direction and keep the bytes flowing.
                    tracing::warn!(
                        "{} stream is not parseable anymore ({e}), forwarding verbatim",
                        origin.arrow()
                    );
                    self.set_passthrough(origin);
                    forward_bytes(forward, frames.take_buffered())?;
                    return Ok(());
                }
                Err(e) => return Err(e).context("framing"),
            }
        }
    }

    fn handle_frame(
        &mut self,
        origin: Origin,
        frame: Frame,
        forward: &flume::Sender<Vec<u8>>,
    ) -> anyhow::Result<()> {
        let state_at_decode = self.state;
        self.replacement = None;

        match codec::decode_packet(frame.body(), origin, self.state, self.compression_threshold) {
            Ok(None) => {} // empty frame, nothing to log
            Ok(Some(decoded)) => {
                if let Some(message) = &decoded.message {
                    self.dispatch(origin, message)?;
                }
                self.logger.log(decoded.message, state_at_decode, origin);
            }
            Err(e) => {
                tracing::warn!("{} PARSING EXCEPTION: {e:#}", origin.arrow());
                self.logger.log(None, state_at_decode, origin);
            }
        }

        let bytes = match self.replacement.take() {
            Some(replacement) => replacement,
            None => frame.into_bytes(),
        };
        forward_bytes(forward, bytes)
    }

    /// Reacts to control messages. Everything else is a no-op here.
    fn dispatch(&mut self, origin: Origin, message: &Message) -> anyhow::Result<()> {
        match (origin, message) {
            (Origin::Client, Message::Handshake(handshake)) => {
                self.state = match handshake.next_state {
                    1 => ConnectionState::Status,
                    2 => ConnectionState::Login,
                    _ => self.state,
                };

                // The real server must see its own address, not ours.
                let mut rewritten = handshake.clone();
                rewritten.server_address = self.remote_host.clone();
                rewritten.server_port = self.remote_port;
                self.replacement = Some(codec::encode_packet(
                    &Message::Handshake(rewritten),
                    self.compression_threshold,
                )?);
            }
            (Origin::Server, Message::LoginSuccess(_)) => {
                self.state = ConnectionState::Play;
            }
            (Origin::Server, Message::SetCompression(set)) => {
                self.compression_threshold = set.threshold;
            }
            (Origin::Server, Message::EncryptionRequest(_)) => {
                tracing::warn!(
                    "server requested encryption; encrypted sessions cannot be inspected \
                     and will be forwarded without decoding"
                );
                self.encryption_requested = true;
            }
            _ => {}
        }
        Ok(())
    }

    fn passthrough(&self, origin: Origin) -> bool {
        match origin {
            Origin::Client => self.client_passthrough,
            Origin::Server => self.server_passthrough,
        }
    }

    fn set_passthrough(&mut self, origin: Origin) {
        match origin {
            Origin::Client => self.client_passthrough = true,
            Origin::Server => self.server_passthrough = true,
        }
    }
}

fn forward_bytes(forward: &flume::Sender<Vec<u8>>, bytes: Vec<u8>) -> anyhow::Result<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    if forward.send(bytes).is_err() {
        bail!("peer write side closed");
    }
    Ok(())
}

/// Drains a FIFO of byte vectors onto one socket. Exactly one write is in
/// flight at a time; a write error after teardown is absorbed silently.
fn spawn_writer(mut writer: OwnedWriteHalf) -> flume::Sender<Vec<u8>> {
    let (sender, receiver) = flume::unbounded::<Vec<u8>>();
    task::spawn(async move {
        use tokio::io::AsyncWriteExt;
        while let Ok(bytes) = receiver.recv_async().await {
            if writer.write_all(&bytes).await.is_err() {
                break;
            }
        }
    });
    sender
}
