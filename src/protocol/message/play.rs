use crate::protocol::{decoder, Decoder, Encoder};
use serde::Serialize;

/// Keep-alive, sent periodically in both directions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KeepAlive {
    pub keep_alive_id: i32,
}

impl KeepAlive {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.keep_alive_id = decoder.read_var_int()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_var_int(self.keep_alive_id);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct JoinGame {
    pub entity_id: i32,
    pub gamemode: u8,
    pub dimension: i8,
    pub difficulty: u8,
    pub max_players: u8,
    pub level_type: String,
    pub reduced_debug_info: bool,
}

impl JoinGame {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.entity_id = decoder.read_i32()?;
        self.gamemode = decoder.read_u8()?;
        self.dimension = decoder.read_i8()?;
        self.difficulty = decoder.read_u8()?;
        self.max_players = decoder.read_u8()?;
        self.level_type = decoder.read_string()?.to_owned();
        self.reduced_debug_info = decoder.read_bool()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_i32(self.entity_id);
        encoder.write_u8(self.gamemode);
        encoder.write_i8(self.dimension);
        encoder.write_u8(self.difficulty);
        encoder.write_u8(self.max_players);
        encoder.write_string(&self.level_type);
        encoder.write_bool(self.reduced_debug_info);
    }
}

/// Chat sent to the client; the body is a JSON chat component.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatMessageClientbound {
    pub json_data: String,
    pub position: i8,
}

impl ChatMessageClientbound {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.json_data = decoder.read_string()?.to_owned();
        self.position = decoder.read_i8()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_string(&self.json_data);
        encoder.write_i8(self.position);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatMessageServerbound {
    pub message: String,
}

impl ChatMessageServerbound {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.message = decoder.read_string()?.to_owned();
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_string(&self.message);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerFlying {
    pub on_ground: bool,
}

impl PlayerFlying {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.on_ground = decoder.read_bool()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_bool(self.on_ground);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayerPosition {
    pub x: f64,
    pub feet_y: f64,
    pub z: f64,
    pub on_ground: bool,
}

impl PlayerPosition {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.x = decoder.read_f64()?;
        self.feet_y = decoder.read_f64()?;
        self.z = decoder.read_f64()?;
        self.on_ground = decoder.read_bool()?;
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_f64(self.x);
        encoder.write_f64(self.feet_y);
        encoder.write_f64(self.z);
        encoder.write_bool(self.on_ground);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayDisconnect {
    pub reason: String,
}

impl PlayDisconnect {
    pub fn read(&mut self, decoder: &mut Decoder) -> decoder::Result<()> {
        self.reason = decoder.read_string()?.to_owned();
        Ok(())
    }

    pub fn write(&self, encoder: &mut Encoder) {
        encoder.write_string(&self.reason);
    }
}
