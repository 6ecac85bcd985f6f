use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use super::error::{SaveError, SaveResult};
use super::settings::SETTINGS_LEN_V4;
use super::{SAVE_VERSION, SIGNATURE, SIGNATURE_LEN};
use crate::stream::{BinaryReader, BinaryWriter};

/// Field sizes that depend on the format version.
///
/// Every version the reader understands has exactly one entry in `LAYOUTS`;
/// anything else is rejected before a single roster byte is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatLayout {
    pub version: u16,
    pub settings_len: usize,
}

impl FormatLayout {
    pub const CURRENT: FormatLayout =
        FormatLayout { version: SAVE_VERSION, settings_len: SETTINGS_LEN_V4 };

    pub fn for_version(version: u16) -> Option<Self> {
        LAYOUTS.iter().copied().find(|layout| layout.version == version)
    }

    /// Oldest and newest readable versions.
    pub fn supported_range() -> (u16, u16) {
        let min = LAYOUTS.iter().map(|l| l.version).min().unwrap_or(SAVE_VERSION);
        let max = LAYOUTS.iter().map(|l| l.version).max().unwrap_or(SAVE_VERSION);
        (min, max)
    }
}

const LAYOUTS: &[FormatLayout] = &[FormatLayout::CURRENT];

/// Identifying metadata at the start of every container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    /// Format version the container was written with
    pub version: u16,

    /// Display name of the map, not used by the simulation
    pub map_name: String,

    /// Tick at which the match began
    pub start_tick: u32,
}

impl Default for SaveHeader {
    fn default() -> Self {
        Self { version: SAVE_VERSION, map_name: String::new(), start_tick: 0 }
    }
}

impl SaveHeader {
    pub fn new(map_name: impl Into<String>, start_tick: u32) -> Self {
        Self { version: SAVE_VERSION, map_name: map_name.into(), start_tick }
    }

    /// Bytes this header occupies on disk.
    pub fn encoded_len(&self) -> usize {
        SIGNATURE_LEN + 2 + 4 + self.map_name.len() + 4
    }

    pub fn write<W: Write>(&self, writer: &mut BinaryWriter<W>) -> SaveResult<()> {
        writer.write_bytes(&SIGNATURE)?;
        writer.write_u16(self.version)?;
        writer.write_string(&self.map_name)?;
        writer.write_u32(self.start_tick)?;
        Ok(())
    }

    /// Decodes the header and resolves the layout for the rest of the container.
    pub fn read<R: Read>(reader: &mut BinaryReader<R>) -> SaveResult<(Self, FormatLayout)> {
        let found = reader.read_array::<SIGNATURE_LEN>("signature")?;
        if found != SIGNATURE {
            return Err(SaveError::FormatMismatch { found });
        }

        let version = reader.read_u16("format version")?;
        let layout = match FormatLayout::for_version(version) {
            Some(layout) => layout,
            None => {
                let (min, max) = FormatLayout::supported_range();
                log::warn!("{}", describe_version_gap(version));
                return Err(SaveError::UnsupportedVersion { found: version, min, max });
            }
        };

        let map_name = reader.read_string("map name")?;
        let start_tick = reader.read_u32("start tick")?;

        Ok((Self { version, map_name, start_tick }, layout))
    }
}

/// Explains how a container version relates to what this build reads.
pub fn describe_version_gap(found: u16) -> String {
    let (min, max) = FormatLayout::supported_range();
    if found < min {
        format!(
            "Savegame version {} is older than the oldest readable version {}; it cannot be loaded",
            found, min
        )
    } else if found > max {
        format!("Savegame version {} was written by a newer build (current: {})", found, max)
    } else {
        format!("Savegame version {} is readable", found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(header: &SaveHeader) -> Vec<u8> {
        let mut writer = BinaryWriter::new(Vec::new());
        header.write(&mut writer).unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_header_roundtrip_and_length() {
        let header = SaveHeader::new("Two Rivers", 1200);
        let bytes = encode(&header);
        assert_eq!(bytes.len(), header.encoded_len());
        assert_eq!(&bytes[..SIGNATURE_LEN], b"RTTRSV");

        let mut reader = BinaryReader::new(Cursor::new(bytes));
        let (decoded, layout) = SaveHeader::read(&mut reader).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(layout, FormatLayout::CURRENT);
    }

    #[test]
    fn test_foreign_signature_stops_after_signature() {
        let mut bytes = encode(&SaveHeader::new("Map", 0));
        bytes[0] = b'X';

        let mut reader = BinaryReader::new(Cursor::new(bytes));
        let err = SaveHeader::read(&mut reader).unwrap_err();
        assert!(matches!(err, SaveError::FormatMismatch { found } if &found == b"XTTRSV"));
        assert_eq!(reader.position(), SIGNATURE_LEN as u64);
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let mut header = SaveHeader::new("Map", 0);
        header.version = SAVE_VERSION + 1;

        let mut reader = BinaryReader::new(Cursor::new(encode(&header)));
        let err = SaveHeader::read(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            SaveError::UnsupportedVersion { found, min: 4, max: 4 } if found == SAVE_VERSION + 1
        ));
    }

    #[test]
    fn test_version_gap_description() {
        assert!(describe_version_gap(2).contains("older"));
        assert!(describe_version_gap(9).contains("newer"));
        assert!(describe_version_gap(SAVE_VERSION).contains("readable"));
    }
}
