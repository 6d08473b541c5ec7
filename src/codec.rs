//! Packet codec: compression framing and message decode/encode.
//!
//! Wire layout of one frame body (after the outer length prefix):
//! * threshold < 0: `id:varint payload`
//! * threshold >= 0: `data_len:varint inner` where `data_len == 0` means the
//!   inner `id:varint payload` is plain, and `data_len > 0` means the inner
//!   bytes are zlib-compressed and inflate to `data_len` bytes.

use crate::protocol::{
    encoder::var_int_size, message, ConnectionState, Decoder, Encoder, Message, Origin,
    BUFFER_LIMIT,
};
use anyhow::{bail, Context};
use flate2::Compression;
use std::{
    borrow::Cow,
    io::{Read, Write},
};

/// Sentinel threshold: compression framing disabled.
pub const COMPRESSION_DISABLED: i32 = -1;

/// The proxy only compresses rewritten packets, which are small and rare, so
/// we avoid spending time on compression quality.
const COMPRESSION_LEVEL: Compression = Compression::fast();

/// Result of decoding one frame body.
#[derive(Debug)]
pub struct DecodedPacket {
    pub id: i32,
    /// `None` when the id is not in the message catalogue. A message whose
    /// body failed to parse is still present, partially read.
    pub message: Option<Message>,
}

/// Decodes one frame body under the given state and compression threshold.
///
/// Returns `Ok(None)` for an empty frame (legal, carries no message).
/// Unknown ids and body parse failures are reported on stderr here and do
/// not fail the call; only unreadable framing (bad compression envelope)
/// does.
pub fn decode_packet(
    body: &[u8],
    origin: Origin,
    state: ConnectionState,
    threshold: i32,
) -> anyhow::Result<Option<DecodedPacket>> {
    if body.is_empty() {
        return Ok(None);
    }

    let mut outer = Decoder::new(body);
    let payload: Cow<[u8]> = if threshold >= 0 {
        let data_length = outer.read_var_int().context("data length")?;
        if data_length == 0 {
            if outer.is_finished() {
                return Ok(None);
            }
            Cow::Borrowed(outer.buffer())
        } else {
            let inflated = decompress(outer.buffer())?;
            if inflated.len() != data_length as usize {
                bail!(
                    "inflated size {} does not match declared data length {data_length}",
                    inflated.len()
                );
            }
            Cow::Owned(inflated)
        }
    } else {
        Cow::Borrowed(outer.buffer())
    };

    let mut decoder = Decoder::new(&payload);
    let id = decoder.read_var_int().context("packet id")?;

    let message = match origin {
        Origin::Client => message::create_serverbound(id, state),
        Origin::Server => message::create_clientbound(id, state),
    };

    let Some(mut message) = message else {
        tracing::warn!("{} NULL MESSAGE WITH ID: {id}", origin.arrow());
        return Ok(Some(DecodedPacket { id, message: None }));
    };

    if let Err(e) = message.read(&mut decoder) {
        tracing::warn!(
            "{} PARSING EXCEPTION: {e} || {}",
            origin.arrow(),
            message.name()
        );
    }

    Ok(Some(DecodedPacket {
        id,
        message: Some(message),
    }))
}

/// Encodes a message to a full frame, outer length prefix included, under
/// the given compression threshold.
pub fn encode_packet(message: &Message, threshold: i32) -> anyhow::Result<Vec<u8>> {
    let mut body = Vec::new();
    message.write(&mut Encoder::new(&mut body));

    let content = if threshold >= 0 {
        let mut content = Vec::with_capacity(body.len() + 1);
        let mut encoder = Encoder::new(&mut content);
        if body.len() < threshold as usize {
            encoder.write_var_int(0);
            content.extend_from_slice(&body);
        } else {
            encoder.write_var_int(i32::try_from(body.len())?);
            content.extend(compress(&body)?);
        }
        content
    } else {
        body
    };

    let content_length = i32::try_from(content.len())?;
    let mut framed = Vec::with_capacity(var_int_size(content_length) + content.len());
    Encoder::new(&mut framed).write_var_int(content_length);
    framed.extend(content);
    Ok(framed)
}

fn compress(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), COMPRESSION_LEVEL);
    encoder.write_all(data).expect("infallible write");
    Ok(encoder.finish()?)
}

fn decompress(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut inflated = Vec::new();
    flate2::read::ZlibDecoder::new(data)
        .take(BUFFER_LIMIT as u64)
        .read_to_end(&mut inflated)
        .context("decompress packet")?;
    Ok(inflated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{login, play};

    fn decode_body(
        body: &[u8],
        origin: Origin,
        state: ConnectionState,
        threshold: i32,
    ) -> DecodedPacket {
        decode_packet(body, origin, state, threshold)
            .unwrap()
            .unwrap()
    }

    fn strip_length_prefix(frame: &[u8]) -> &[u8] {
        let mut decoder = Decoder::new(frame);
        let (length, prefix) = decoder.read_var_int_with_size().unwrap();
        assert_eq!(prefix + length as usize, frame.len());
        &frame[prefix..]
    }

    #[test]
    fn roundtrip_uncompressed() {
        let message = Message::SetCompression(login::SetCompression { threshold: 256 });
        let frame = encode_packet(&message, COMPRESSION_DISABLED).unwrap();

        let decoded = decode_body(
            strip_length_prefix(&frame),
            Origin::Server,
            ConnectionState::Login,
            COMPRESSION_DISABLED,
        );
        assert_eq!(decoded.id, 0x03);
        match decoded.message.unwrap() {
            Message::SetCompression(m) => assert_eq!(m.threshold, 256),
            other => panic!("wrong message: {}", other.name()),
        }
    }

    #[test]
    fn small_body_below_threshold_is_framed_plain() {
        let message = Message::KeepAliveServerbound(play::KeepAlive { keep_alive_id: 7 });
        let frame = encode_packet(&message, 256).unwrap();

        // len | 0x00 | id | payload
        let body = strip_length_prefix(&frame);
        assert_eq!(body[0], 0x00);

        let decoded = decode_body(body, Origin::Client, ConnectionState::Play, 256);
        match decoded.message.unwrap() {
            Message::KeepAliveServerbound(m) => assert_eq!(m.keep_alive_id, 7),
            other => panic!("wrong message: {}", other.name()),
        }
    }

    #[test]
    fn large_body_is_compressed() {
        let message = Message::ChatMessageServerbound(play::ChatMessageServerbound {
            message: "a".repeat(1000),
        });
        let frame = encode_packet(&message, 256).unwrap();

        let body = strip_length_prefix(&frame);
        let mut decoder = Decoder::new(body);
        let data_length = decoder.read_var_int().unwrap();
        assert_eq!(data_length as usize, 1000 + 2 + 1); // string + its prefix + id
        assert!(decoder.buffer().len() < 1000); // actually compressed

        let decoded = decode_body(body, Origin::Client, ConnectionState::Play, 256);
        match decoded.message.unwrap() {
            Message::ChatMessageServerbound(m) => assert_eq!(m.message.len(), 1000),
            other => panic!("wrong message: {}", other.name()),
        }
    }

    #[test]
    fn unknown_id_yields_no_message() {
        let mut body = Vec::new();
        Encoder::new(&mut body).write_var_int(0x7F);
        let decoded = decode_body(
            &body,
            Origin::Client,
            ConnectionState::Play,
            COMPRESSION_DISABLED,
        );
        assert_eq!(decoded.id, 0x7F);
        assert!(decoded.message.is_none());
    }

    #[test]
    fn truncated_body_still_yields_the_message() {
        // LoginStart with the username cut off mid-string.
        let mut body = Vec::new();
        let mut encoder = Encoder::new(&mut body);
        encoder.write_var_int(0x00);
        encoder.write_var_int(20); // string length prefix, no string bytes
        let decoded = decode_body(
            &body,
            Origin::Client,
            ConnectionState::Login,
            COMPRESSION_DISABLED,
        );
        assert!(matches!(decoded.message, Some(Message::LoginStart(_))));
    }

    #[test]
    fn empty_frame_yields_no_packet() {
        assert!(decode_packet(
            &[],
            Origin::Client,
            ConnectionState::Play,
            COMPRESSION_DISABLED
        )
        .unwrap()
        .is_none());

        // Compressed framing: data_length == 0 and nothing after it.
        assert!(
            decode_packet(&[0x00], Origin::Client, ConnectionState::Play, 256)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn corrupt_compressed_block_is_an_error() {
        let mut body = Vec::new();
        let mut encoder = Encoder::new(&mut body);
        encoder.write_var_int(100);
        encoder.write_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert!(decode_packet(&body, Origin::Server, ConnectionState::Play, 256).is_err());
    }

    #[test]
    fn roundtrip_every_catalogued_message_uncompressed_and_compressed() {
        let states = [
            ConnectionState::Handshake,
            ConnectionState::Status,
            ConnectionState::Login,
            ConnectionState::Play,
        ];
        for state in states {
            for id in 0..0x41 {
                for (origin, factory) in [
                    (
                        Origin::Client,
                        message::create_serverbound as fn(i32, ConnectionState) -> Option<Message>,
                    ),
                    (Origin::Server, message::create_clientbound),
                ] {
                    let Some(message) = factory(id, state) else {
                        continue;
                    };
                    for threshold in [COMPRESSION_DISABLED, 0, 1024] {
                        let frame = encode_packet(&message, threshold).unwrap();
                        let decoded = decode_body(
                            strip_length_prefix(&frame),
                            origin,
                            state,
                            threshold,
                        );
                        assert_eq!(decoded.id, id);
                        let roundtripped = decoded.message.unwrap();
                        assert_eq!(roundtripped.name(), message.name());
                        assert_eq!(roundtripped.fields(), message.fields());
                    }
                }
            }
        }
    }
}
