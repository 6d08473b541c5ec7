use crate::protocol::{decoder, Decoder, Encoder};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusRequest;

impl StatusRequest {
    pub fn read(&mut self, _decoder: &mut Decoder) -> decoder::Result<()> {
        Ok(())
    }

    pub fn write(&self, _encoder: &mut Encoder) {}
}

/// Server list ping response; the payload is a JSON document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusResponse {
    pub response: String,
}

impl StatusResponse {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.response = decoder.read_string()?.to_owned();
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_string(&self.response);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusPing {
    pub payload: i64,
}

impl StatusPing {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.payload = decoder.read_i64()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_i64(self.payload);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusPong {
    pub payload: i64,
}

impl StatusPong {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.payload = decoder.read_i64()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_i64(self.payload);
    }
}
