use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::error::{SaveError, SaveResult};
use super::MAX_PLAYERS;
use crate::stream::{BinaryReader, BinaryWriter};

/// Encoded size of one roster record.
pub const RECORD_LEN: usize = 8;

/// Who controls a player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerKind {
    Human = 0,
    Ai = 1,
    #[default]
    Closed = 2,
}

impl PlayerKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Human),
            1 => Some(Self::Ai),
            2 => Some(Self::Closed),
            _ => None,
        }
    }

    /// Closed slots keep their position but hold no player.
    pub fn is_occupied(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum AiLevel {
    #[default]
    Easy = 0,
    Medium = 1,
    Hard = 2,
}

impl AiLevel {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Easy),
            1 => Some(Self::Medium),
            2 => Some(Self::Hard),
            _ => None,
        }
    }
}

/// One roster slot. The slot index in the roster is the player's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub nation: u8,
    pub team: u8,
    /// ARGB display color
    pub color: u32,
    pub kind: PlayerKind,
    /// Only meaningful for `PlayerKind::Ai`, but always stored
    pub ai_level: AiLevel,
}

impl PlayerRecord {
    pub fn human(nation: u8, team: u8, color: u32) -> Self {
        Self { nation, team, color, kind: PlayerKind::Human, ai_level: AiLevel::default() }
    }

    pub fn ai(nation: u8, team: u8, color: u32, ai_level: AiLevel) -> Self {
        Self { nation, team, color, kind: PlayerKind::Ai, ai_level }
    }

    pub fn closed() -> Self {
        Self::default()
    }

    pub fn write<W: Write>(&self, writer: &mut BinaryWriter<W>) -> SaveResult<()> {
        writer.write_u8(self.nation)?;
        writer.write_u8(self.team)?;
        writer.write_u32(self.color)?;
        writer.write_u8(self.kind as u8)?;
        writer.write_u8(self.ai_level as u8)?;
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut BinaryReader<R>) -> SaveResult<Self> {
        let nation = reader.read_u8("player nation")?;
        let team = reader.read_u8("player team")?;
        let color = reader.read_u32("player color")?;

        let tag = reader.read_u8("player kind")?;
        let kind =
            PlayerKind::from_u8(tag).ok_or(SaveError::UnknownVariant { field: "player kind", value: tag })?;

        let tag = reader.read_u8("AI level")?;
        let ai_level =
            AiLevel::from_u8(tag).ok_or(SaveError::UnknownVariant { field: "AI level", value: tag })?;

        Ok(Self { nation, team, color, kind, ai_level })
    }
}

pub fn write_roster<W: Write>(writer: &mut BinaryWriter<W>, roster: &[PlayerRecord]) -> SaveResult<()> {
    writer.write_len(roster.len(), "roster")?;
    for record in roster {
        record.write(writer)?;
    }
    Ok(())
}

/// Reads the roster in slot order. Closed and AI slots are kept in place.
pub fn read_roster<R: Read>(reader: &mut BinaryReader<R>) -> SaveResult<Vec<PlayerRecord>> {
    let count = reader.read_u32("roster count")? as usize;

    // Capacity is capped; a corrupt count still ends in `Truncated`
    let mut roster = Vec::with_capacity(count.min(MAX_PLAYERS));
    for _ in 0..count {
        roster.push(PlayerRecord::read(reader)?);
    }

    log::debug!("Read roster with {} slots", roster.len());
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(roster: &[PlayerRecord]) -> Vec<PlayerRecord> {
        let mut writer = BinaryWriter::new(Vec::new());
        write_roster(&mut writer, roster).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), 4 + roster.len() * RECORD_LEN);

        let mut reader = BinaryReader::new(Cursor::new(bytes));
        read_roster(&mut reader).unwrap()
    }

    #[test]
    fn test_slot_order_is_preserved() {
        for n in [0usize, 1, 8] {
            let roster: Vec<PlayerRecord> = (0..n)
                .map(|i| match i % 3 {
                    0 => PlayerRecord::human(i as u8, (i / 2) as u8, 0xFF00_0000 | i as u32),
                    1 => PlayerRecord::ai(i as u8, 1, 0x00FF_0000 + i as u32, AiLevel::Hard),
                    _ => PlayerRecord::closed(),
                })
                .collect();

            let decoded = roundtrip(&roster);
            assert_eq!(decoded.len(), n);
            for (i, record) in decoded.iter().enumerate() {
                assert_eq!(record, &roster[i], "slot {} differs", i);
            }
        }
    }

    #[test]
    fn test_closed_slots_are_not_compacted() {
        let roster = vec![PlayerRecord::closed(), PlayerRecord::human(2, 0, 7), PlayerRecord::closed()];
        let decoded = roundtrip(&roster);
        assert_eq!(decoded[1].kind, PlayerKind::Human);
        assert!(!decoded[0].kind.is_occupied());
        assert!(!decoded[2].kind.is_occupied());
    }

    #[test]
    fn test_unknown_player_kind() {
        let mut writer = BinaryWriter::new(Vec::new());
        writer.write_u32(1).unwrap();
        writer.write_bytes(&[0, 0, 0, 0, 0, 0, 9, 0]).unwrap();

        let mut reader = BinaryReader::new(Cursor::new(writer.into_inner()));
        let err = read_roster(&mut reader).unwrap_err();
        assert!(matches!(err, SaveError::UnknownVariant { field: "player kind", value: 9 }));
    }

    #[test]
    fn test_corrupt_count_runs_out_of_data() {
        let mut writer = BinaryWriter::new(Vec::new());
        writer.write_u32(u32::MAX).unwrap();
        PlayerRecord::human(0, 0, 0).write(&mut writer).unwrap();

        let mut reader = BinaryReader::new(Cursor::new(writer.into_inner()));
        assert!(matches!(read_roster(&mut reader), Err(SaveError::Truncated { .. })));
    }
}
