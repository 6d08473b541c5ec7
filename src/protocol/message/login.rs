use crate::protocol::{decoder, Decoder, Encoder};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginStart {
    pub username: String,
}

impl LoginStart {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.username = decoder.read_string()?.to_owned();
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_string(&self.username);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EncryptionResponse {
    pub shared_secret: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl EncryptionResponse {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.shared_secret = decoder.read_byte_array()?;
        self.verify_token = decoder.read_byte_array()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_byte_array(&self.shared_secret);
        encoder.write_byte_array(&self.verify_token);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginDisconnect {
    pub reason: String,
}

impl LoginDisconnect {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.reason = decoder.read_string()?.to_owned();
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_string(&self.reason);
    }
}

/// Start of the encryption handshake. Inspection cannot continue once the
/// stream is encrypted; the session reacts to this message by warning the
/// operator and degrading to verbatim forwarding.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EncryptionRequest {
    pub server_id: String,
    pub public_key: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl EncryptionRequest {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.server_id = decoder.read_string()?.to_owned();
        self.public_key = decoder.read_byte_array()?;
        self.verify_token = decoder.read_byte_array()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_string(&self.server_id);
        encoder.write_byte_array(&self.public_key);
        encoder.write_byte_array(&self.verify_token);
    }
}

/// Moves the session into the Play state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginSuccess {
    pub uuid: String,
    pub username: String,
}

impl LoginSuccess {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.uuid = decoder.read_string()?.to_owned();
        self.username = decoder.read_string()?.to_owned();
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_string(&self.uuid);
        encoder.write_string(&self.username);
    }
}

/// Switches both directions to compressed framing. The packet carrying this
/// message is itself framed in the old scheme; the very next packet uses the
/// new one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SetCompression {
    pub threshold: i32,
}

impl SetCompression {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.threshold = decoder.read_var_int()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_var_int(self.threshold);
    }
}
