//! Reassembles a raw byte stream into length-prefixed frames.

use crate::protocol::{DecodeError, Decoder, BUFFER_LIMIT};

/// One complete packet sliced off the wire, length prefix included, so the
/// exact original bytes can be forwarded to the opposite socket.
#[derive(Debug)]
pub struct Frame {
    bytes: Vec<u8>,
    body_start: usize,
}

impl Frame {
    /// The packet payload after the length prefix.
    pub fn body(&self) -> &[u8] {
        &self.bytes[self.body_start..]
    }

    /// The full frame, prefix included.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// An unrecoverable framing error. Running out of bytes mid-frame is not an
/// error; it is reported as "no frame yet".
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("negative packet length {0}")]
    NegativeLength(i32),
    #[error("packet length {0} exceeds maximum allowed")]
    TooLarge(usize),
    #[error("malformed length prefix: {0}")]
    BadPrefix(DecodeError),
}

/// Accumulates socket reads and yields complete frames off the front.
///
/// Bytes not yet sliced into a frame stay buffered in arrival order; a
/// partial length prefix is retried once more bytes arrive.
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly read bytes to the inbound buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to slice the next complete frame off the front of the
    /// buffer.
    ///
    /// * Returns `Ok(None)` if the buffer does not yet hold a full frame.
    /// * Returns `Ok(Some(frame))` otherwise; more frames may be available.
    /// * Returns `Err(e)` on a malformed prefix, invalidating the stream.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, FrameError> {
        let mut decoder = Decoder::new(&self.buffer);
        let (length, prefix_size) = match decoder.read_var_int_with_size() {
            Ok(x) => x,
            Err(DecodeError::EndOfStream(_)) => return Ok(None),
            Err(e) => return Err(FrameError::BadPrefix(e)),
        };

        if length < 0 {
            return Err(FrameError::NegativeLength(length));
        }
        let length = length as usize;
        if length > BUFFER_LIMIT {
            return Err(FrameError::TooLarge(length));
        }

        let total = prefix_size + length;
        if self.buffer.len() < total {
            return Ok(None);
        }

        let bytes = self.buffer[..total].to_vec();
        self.buffer.drain(..total);
        Ok(Some(Frame {
            bytes,
            body_start: prefix_size,
        }))
    }

    /// Drains everything currently buffered, frame boundaries ignored. Used
    /// once a direction degrades to verbatim forwarding.
    pub fn take_buffered(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Encoder;

    /// Helper to build one wire frame around a payload.
    fn make_frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        Encoder::new(&mut bytes).write_var_int(payload.len() as i32);
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn single_complete_frame() {
        let mut reader = FrameReader::new();
        reader.extend(&make_frame(b"hello"));

        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.body(), b"hello");
        assert_eq!(frame.into_bytes(), make_frame(b"hello"));
        assert!(reader.next_frame().unwrap().is_none());
        assert!(reader.take_buffered().is_empty());
    }

    #[test]
    fn multiple_frames_in_one_read() {
        let mut reader = FrameReader::new();
        let mut combined = make_frame(b"first");
        combined.extend(make_frame(b"second"));
        reader.extend(&combined);

        assert_eq!(reader.next_frame().unwrap().unwrap().body(), b"first");
        assert_eq!(reader.next_frame().unwrap().unwrap().body(), b"second");
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn zero_length_frame_is_legal() {
        let mut reader = FrameReader::new();
        reader.extend(&make_frame(b""));

        let frame = reader.next_frame().unwrap().unwrap();
        assert!(frame.body().is_empty());
        assert_eq!(frame.into_bytes(), vec![0x00]);
    }

    #[test]
    fn partial_payload_waits_for_more() {
        let mut reader = FrameReader::new();
        let bytes = make_frame(b"fragmented payload");

        reader.extend(&bytes[..7]);
        assert!(reader.next_frame().unwrap().is_none());

        reader.extend(&bytes[7..]);
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.body(), b"fragmented payload");
    }

    #[test]
    fn length_prefix_split_across_reads() {
        // 300-byte payload: the prefix itself is two bytes.
        let payload = vec![0xAB; 300];
        let bytes = make_frame(&payload);
        let mut reader = FrameReader::new();

        reader.extend(&bytes[..1]);
        assert!(reader.next_frame().unwrap().is_none());

        reader.extend(&bytes[1..]);
        assert_eq!(reader.next_frame().unwrap().unwrap().body(), &payload[..]);
    }

    #[test]
    fn byte_at_a_time() {
        let bytes = make_frame(b"hi");
        let mut reader = FrameReader::new();
        let mut frames = Vec::new();
        for byte in &bytes {
            reader.extend(&[*byte]);
            while let Some(frame) = reader.next_frame().unwrap() {
                frames.push(frame);
            }
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].body(), b"hi");
    }

    #[test]
    fn negative_length_is_an_error() {
        let mut reader = FrameReader::new();
        reader.extend(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]); // varint -1
        assert!(matches!(
            reader.next_frame(),
            Err(FrameError::NegativeLength(-1))
        ));
    }

    #[test]
    fn oversized_length_is_an_error() {
        let mut reader = FrameReader::new();
        let mut bytes = Vec::new();
        Encoder::new(&mut bytes).write_var_int(2 * 1024 * 1024);
        reader.extend(&bytes);
        assert!(matches!(reader.next_frame(), Err(FrameError::TooLarge(_))));
    }

    #[test]
    fn take_buffered_drains_everything() {
        let mut reader = FrameReader::new();
        reader.extend(&[0x80, 0x01, 0x02]);
        assert_eq!(reader.take_buffered(), vec![0x80, 0x01, 0x02]);
        assert!(reader.take_buffered().is_empty());
    }
}
