use std::io::{Read, Write};
use std::path::Path;

use super::error::{SaveError, SaveResult};
use super::header::{FormatLayout, SaveHeader};
use super::roster::{read_roster, write_roster, PlayerRecord};
use super::settings::GameSettings;
use super::world::{OpaqueWorld, WorldContext, WorldState};
use crate::diplomacy::Diplomacy;
use crate::stream::{BinaryReader, BinaryWriter};

/// How far `Savegame::load` reads into a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadDepth {
    /// Signature, version, map name and start tick
    HeaderOnly,
    /// Everything up to the world payload, for lobby and save-slot screens
    HeaderAndSettings,
    #[default]
    Full,
}

/// Last stage reached by a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStage {
    #[default]
    Fresh,
    HeaderDecoded,
    SettingsDecoded,
    WorldDecoded,
    Failed,
}

/// One persisted game instant.
///
/// Sections are written and read in a fixed order: header, roster, settings,
/// diplomacy, world. A load always starts by discarding whatever the value
/// held before, and a failed load leaves the game data at its reset values.
#[derive(Debug, Clone, Default)]
pub struct Savegame<W = OpaqueWorld> {
    pub header: SaveHeader,
    pub roster: Vec<PlayerRecord>,
    pub settings: GameSettings,
    pub diplomacy: Diplomacy,
    pub world: W,
    stage: LoadStage,
    last_error: Option<String>,
}

impl<W: WorldState> Savegame<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> LoadStage {
        self.stage
    }

    /// Description of the error that ended the last load, if it failed.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of slots that hold a human or AI player.
    pub fn occupied_slots(&self) -> usize {
        self.roster.iter().filter(|record| record.kind.is_occupied()).count()
    }

    /// Resets roster, settings, diplomacy and world.
    pub fn clear_game_data(&mut self) {
        self.roster.clear();
        self.settings = GameSettings::default();
        self.diplomacy.clear();
        self.world = W::default();
    }

    fn world_context(&self, format_version: u16) -> WorldContext {
        WorldContext { format_version, player_count: self.roster.len() }
    }

    /// Writes the whole container in the current format version.
    pub fn save<T: Write>(&self, writer: &mut BinaryWriter<T>, map_name: &str) -> SaveResult<()> {
        let layout = FormatLayout::CURRENT;
        let header = SaveHeader::new(map_name, self.header.start_tick);

        header.write(writer)?;
        write_roster(writer, &self.roster)?;
        self.settings.write(writer, &layout)?;
        self.diplomacy.write(writer)?;
        self.world.write(writer, &self.world_context(layout.version))?;

        log::debug!("Wrote savegame '{}' ({} bytes)", map_name, writer.position());
        Ok(())
    }

    /// Creates `path`, writes the container and syncs it to disk.
    pub fn save_to_path(&self, path: impl AsRef<Path>, map_name: &str) -> SaveResult<()> {
        let path = path.as_ref();
        let mut writer = BinaryWriter::create(path)?;
        self.save(&mut writer, map_name)?;
        writer.sync()?;

        log::info!("Saved '{}' to {}", map_name, path.display());
        Ok(())
    }

    /// Reads a container up to `depth`.
    ///
    /// Previously held data is discarded before the first byte is read. On
    /// error the game data is reset again, `stage()` reports `Failed` and
    /// `last_error()` describes the cause.
    pub fn load<R: Read>(&mut self, reader: &mut BinaryReader<R>, depth: LoadDepth) -> SaveResult<()> {
        self.header = SaveHeader::default();
        self.clear_game_data();
        self.last_error = None;
        self.stage = LoadStage::Fresh;

        match self.load_stages(reader, depth) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>, depth: LoadDepth) -> SaveResult<()> {
        let mut reader = match BinaryReader::open(path.as_ref()) {
            Ok(reader) => reader,
            Err(err) => {
                self.header = SaveHeader::default();
                return Err(self.fail(err));
            }
        };
        self.load(&mut reader, depth)
    }

    fn load_stages<R: Read>(&mut self, reader: &mut BinaryReader<R>, depth: LoadDepth) -> SaveResult<()> {
        let (header, layout) = SaveHeader::read(reader)?;
        self.header = header;
        self.stage = LoadStage::HeaderDecoded;
        if depth == LoadDepth::HeaderOnly {
            return Ok(());
        }

        self.roster = read_roster(reader)?;
        self.settings = GameSettings::read(reader, &layout)?;
        self.diplomacy = Diplomacy::read(reader)?;
        self.stage = LoadStage::SettingsDecoded;
        if depth == LoadDepth::HeaderAndSettings {
            return Ok(());
        }

        let ctx = self.world_context(layout.version);
        self.world = W::read(reader, &ctx).map_err(delegate_error)?;
        self.stage = LoadStage::WorldDecoded;

        log::debug!(
            "Loaded savegame '{}' with {} slots and {} pacts",
            self.header.map_name,
            self.roster.len(),
            self.diplomacy.len()
        );
        Ok(())
    }

    fn fail(&mut self, err: SaveError) -> SaveError {
        self.clear_game_data();
        self.stage = LoadStage::Failed;
        self.last_error = Some(err.to_string());
        log::warn!("Savegame load failed: {}", err);
        err
    }
}

/// Short reads stay `Truncated`; everything else a world codec rejects is a delegate failure.
fn delegate_error(err: SaveError) -> SaveError {
    match err {
        SaveError::Truncated { .. } | SaveError::Io(_) | SaveError::DelegateFailure(_) => err,
        other => SaveError::DelegateFailure(other.to_string()),
    }
}

/// Reads only the header of the container at `path`.
pub fn peek_header(path: impl AsRef<Path>) -> SaveResult<SaveHeader> {
    let mut reader = BinaryReader::open(path)?;
    let (header, _) = SaveHeader::read(&mut reader)?;
    Ok(header)
}
