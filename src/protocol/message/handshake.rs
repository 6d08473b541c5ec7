use crate::protocol::{decoder, Decoder, Encoder};
use serde::Serialize;

/// First packet of every session. The `next_state` field selects the
/// following protocol phase: 1 for Status, 2 for Login.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Handshake {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: i32,
}

impl Handshake {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.protocol_version = decoder.read_var_int()?;
        self.server_address = decoder.read_string()?.to_owned();
        self.server_port = decoder.read_u16()?;
        self.next_state = decoder.read_var_int()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_var_int(self.protocol_version);
        encoder.write_string(&self.server_address);
        encoder.write_u16(self.server_port);
        encoder.write_var_int(self.next_state);
    }
}
