use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::error::SaveResult;
use super::header::FormatLayout;
use crate::stream::{BinaryReader, BinaryWriter};

/// Size of the settings block in format version 4.
pub const SETTINGS_LEN_V4: usize = 5;

const FLAG_LOCKED_TEAMS: u8 = 1 << 0;
const FLAG_TEAM_VIEW: u8 = 1 << 1;
const FLAG_RANDOM_START: u8 = 1 << 2;
const FLAG_FIXED_RESOURCES: u8 = 1 << 3;
const KNOWN_FLAGS: u8 =
    FLAG_LOCKED_TEAMS | FLAG_TEAM_VIEW | FLAG_RANDOM_START | FLAG_FIXED_RESOURCES;

/// Global match options.
///
/// Option values are stored as raw codes. Whether a combination makes sense is
/// for the game to decide; the codec only guarantees the block length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// 0 = very slow .. 4 = very fast
    pub game_speed: u8,

    /// Victory condition code
    pub objective: u8,

    /// Starting goods level code
    pub start_wealth: u8,

    /// Fog-of-war mode code
    pub exploration: u8,

    /// Players cannot change teams after start
    pub locked_teams: bool,

    /// Team members share vision
    pub team_view: bool,

    pub random_start_position: bool,

    /// Resource deposits never run out
    pub fixed_resources: bool,

    /// Flag bits this build does not know, carried through unchanged
    #[serde(skip)]
    unknown_flags: u8,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            game_speed: 2,
            objective: 0,
            start_wealth: 2,
            exploration: 2,
            locked_teams: false,
            team_view: true,
            random_start_position: false,
            fixed_resources: false,
            unknown_flags: 0,
        }
    }
}

impl GameSettings {
    fn flags(&self) -> u8 {
        let mut flags = self.unknown_flags & !KNOWN_FLAGS;
        if self.locked_teams {
            flags |= FLAG_LOCKED_TEAMS;
        }
        if self.team_view {
            flags |= FLAG_TEAM_VIEW;
        }
        if self.random_start_position {
            flags |= FLAG_RANDOM_START;
        }
        if self.fixed_resources {
            flags |= FLAG_FIXED_RESOURCES;
        }
        flags
    }

    pub fn to_block(&self) -> [u8; SETTINGS_LEN_V4] {
        [self.game_speed, self.objective, self.start_wealth, self.exploration, self.flags()]
    }

    pub fn from_block(block: &[u8; SETTINGS_LEN_V4]) -> Self {
        let [game_speed, objective, start_wealth, exploration, flags] = *block;
        Self {
            game_speed,
            objective,
            start_wealth,
            exploration,
            locked_teams: flags & FLAG_LOCKED_TEAMS != 0,
            team_view: flags & FLAG_TEAM_VIEW != 0,
            random_start_position: flags & FLAG_RANDOM_START != 0,
            fixed_resources: flags & FLAG_FIXED_RESOURCES != 0,
            unknown_flags: flags & !KNOWN_FLAGS,
        }
    }

    /// Writes exactly `layout.settings_len` bytes. Bytes past the known
    /// fields are zero; fields past a shorter block are not stored.
    pub fn write<W: Write>(&self, writer: &mut BinaryWriter<W>, layout: &FormatLayout) -> SaveResult<()> {
        let block = self.to_block();
        let known = layout.settings_len.min(block.len());
        writer.write_bytes(&block[..known])?;
        writer.write_bytes(&vec![0; layout.settings_len - known])
    }

    /// Reads exactly `layout.settings_len` bytes. Fields the block does not
    /// reach keep their default values.
    pub fn read<R: Read>(reader: &mut BinaryReader<R>, layout: &FormatLayout) -> SaveResult<Self> {
        let bytes = reader.read_bytes(layout.settings_len, "settings block")?;
        let mut block = Self::default().to_block();
        let known = bytes.len().min(block.len());
        block[..known].copy_from_slice(&bytes[..known]);
        Ok(Self::from_block(&block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_block_is_fixed_length() {
        let layout = FormatLayout::CURRENT;
        for settings in [GameSettings::default(), GameSettings { fixed_resources: true, ..Default::default() }] {
            let mut writer = BinaryWriter::new(Vec::new());
            settings.write(&mut writer, &layout).unwrap();
            assert_eq!(writer.position() as usize, layout.settings_len);

            let mut reader = BinaryReader::new(Cursor::new(writer.into_inner()));
            assert_eq!(GameSettings::read(&mut reader, &layout).unwrap(), settings);
            assert_eq!(reader.position() as usize, layout.settings_len);
        }
    }

    #[test]
    fn test_unknown_flag_bits_survive() {
        let block = [4, 1, 0, 3, 0b1010_0001];
        let settings = GameSettings::from_block(&block);
        assert!(settings.locked_teams);
        assert!(!settings.team_view);
        assert_eq!(settings.to_block(), block);
    }

    #[test]
    fn test_block_length_follows_layout() {
        let settings = GameSettings { game_speed: 4, exploration: 1, locked_teams: true, ..Default::default() };

        let longer = FormatLayout { version: 5, settings_len: 7 };
        let mut writer = BinaryWriter::new(Vec::new());
        settings.write(&mut writer, &longer).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), 7);
        assert_eq!(&bytes[5..], &[0, 0]);

        let mut reader = BinaryReader::new(Cursor::new(bytes));
        assert_eq!(GameSettings::read(&mut reader, &longer).unwrap(), settings);
        assert_eq!(reader.position(), 7);

        let shorter = FormatLayout { version: 3, settings_len: 2 };
        let mut reader = BinaryReader::new(Cursor::new(vec![4, 1]));
        let decoded = GameSettings::read(&mut reader, &shorter).unwrap();
        assert_eq!(decoded.game_speed, 4);
        assert_eq!(decoded.objective, 1);
        assert_eq!(decoded.exploration, GameSettings::default().exploration);
        assert!(decoded.team_view);
    }
}
