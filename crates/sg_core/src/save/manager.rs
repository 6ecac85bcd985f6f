use std::fs::{create_dir_all, remove_file, rename};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use super::error::{SaveError, SaveResult};
use super::header::SaveHeader;
use super::savegame::{peek_header, LoadDepth, Savegame};
use super::world::WorldState;
use crate::config::SaveConfig;

/// Numbered save slots plus one auto-save, all inside `SaveConfig::save_dir`.
pub struct SaveManager {
    config: SaveConfig,
}

impl SaveManager {
    pub fn new(config: SaveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    /// Save game to specific slot
    pub fn save_to_slot<W: WorldState>(&self, slot: u8, game: &Savegame<W>, map_name: &str) -> SaveResult<()> {
        self.validate_slot(slot)?;

        let path = self.slot_path(slot);
        Self::write_atomic(&path, game, map_name)?;

        log::info!("Game saved to slot {}", slot);
        Ok(())
    }

    /// Load game from specific slot
    pub fn load_from_slot<W: WorldState>(&self, slot: u8, depth: LoadDepth) -> SaveResult<Savegame<W>> {
        self.validate_slot(slot)?;

        let path = self.slot_path(slot);
        if !path.exists() {
            return Err(SaveError::SlotEmpty { slot });
        }

        let mut game = Savegame::new();
        game.load_from_path(&path, depth)?;

        log::info!("Game loaded from slot {}", slot);
        Ok(game)
    }

    pub fn auto_save<W: WorldState>(&self, game: &Savegame<W>, map_name: &str) -> SaveResult<()> {
        let path = self.auto_save_path();
        Self::write_atomic(&path, game, map_name)?;

        log::debug!("Auto-save completed");
        Ok(())
    }

    pub fn load_auto_save<W: WorldState>(&self) -> SaveResult<Savegame<W>> {
        let mut game = Savegame::new();
        game.load_from_path(self.auto_save_path(), LoadDepth::Full)?;

        log::info!("Auto-save loaded");
        Ok(game)
    }

    pub fn slot_exists(&self, slot: u8) -> bool {
        self.validate_slot(slot).is_ok() && self.slot_path(slot).exists()
    }

    pub fn auto_save_exists(&self) -> bool {
        self.auto_save_path().exists()
    }

    pub fn delete_slot(&self, slot: u8) -> SaveResult<()> {
        self.validate_slot(slot)?;

        let path = self.slot_path(slot);
        if path.exists() {
            remove_file(&path)?;
            log::info!("Deleted save slot {}", slot);
        }

        Ok(())
    }

    /// Slot summary for UI display. Only the container header is read.
    pub fn slot_info(&self, slot: u8) -> SaveResult<Option<SaveSlotInfo>> {
        self.validate_slot(slot)?;

        let path = self.slot_path(slot);
        if !path.exists() {
            return Ok(None);
        }

        let header = peek_header(&path)?;
        let modified = path.metadata()?.modified().ok();

        Ok(Some(SaveSlotInfo { slot, header, modified }))
    }

    /// Occupied slots, most recent first. Unreadable slots are skipped.
    pub fn all_slot_info(&self) -> Vec<SaveSlotInfo> {
        let mut slots = Vec::new();

        for slot in 0..self.config.slot_count {
            match self.slot_info(slot) {
                Ok(Some(info)) => slots.push(info),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping save slot {}: {}", slot, e),
            }
        }

        slots.sort_by(|a, b| b.modified.cmp(&a.modified));
        slots
    }

    fn validate_slot(&self, slot: u8) -> SaveResult<()> {
        if slot >= self.config.slot_count {
            return Err(SaveError::InvalidSlot { slot });
        }
        Ok(())
    }

    pub fn slot_path(&self, slot: u8) -> PathBuf {
        self.config.save_dir.join(format!("save_slot_{}.sav", slot))
    }

    pub fn auto_save_path(&self) -> PathBuf {
        self.config.save_dir.join(&self.config.auto_save_name)
    }

    fn write_atomic<W: WorldState>(path: &Path, game: &Savegame<W>, map_name: &str) -> SaveResult<()> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        // Write to temp file, then rename over the target
        let temp_path = path.with_extension("tmp");
        if let Err(e) = game.save_to_path(&temp_path, map_name) {
            let _ = remove_file(&temp_path);
            return Err(e);
        }

        rename(&temp_path, path)?;

        log::debug!("Saved {:?}", path);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SaveSlotInfo {
    pub slot: u8,
    pub header: SaveHeader,
    /// Last write time of the slot file, if the platform reports one
    pub modified: Option<SystemTime>,
}

impl SaveSlotInfo {
    pub fn format_timestamp(&self) -> String {
        self.modified
            .map(OffsetDateTime::from)
            .and_then(|timestamp| timestamp.format(&Rfc3339).ok())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn display_text(&self) -> String {
        format!(
            "Slot {}: {} (v{}, started at tick {})",
            self.slot, self.header.map_name, self.header.version, self.header.start_tick
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::roster::PlayerRecord;
    use crate::save::world::OpaqueWorld;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> SaveManager {
        SaveManager::new(SaveConfig::with_dir(dir.path().join("saves")))
    }

    fn game() -> Savegame<OpaqueWorld> {
        let mut game = Savegame::new();
        game.roster = vec![PlayerRecord::human(0, 0, 1), PlayerRecord::closed()];
        game.world = OpaqueWorld::new(vec![9; 16]);
        game
    }

    #[test]
    fn test_slot_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager(&temp_dir);

        manager.save_to_slot(1, &game(), "Island").unwrap();
        assert!(manager.slot_exists(1));
        assert!(!manager.slot_exists(0));

        let loaded: Savegame<OpaqueWorld> = manager.load_from_slot(1, LoadDepth::Full).unwrap();
        assert_eq!(loaded.roster, game().roster);
        assert_eq!(loaded.world, game().world);
        assert_eq!(loaded.header.map_name, "Island");
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager(&temp_dir);

        manager.save_to_slot(0, &game(), "Island").unwrap();
        let path = manager.slot_path(0);
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_slot_validation() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager(&temp_dir);

        assert!(manager.validate_slot(0).is_ok());
        assert!(manager.validate_slot(2).is_ok());
        assert!(matches!(manager.validate_slot(3), Err(SaveError::InvalidSlot { slot: 3 })));
        assert!(manager.validate_slot(255).is_err());
        assert!(matches!(
            manager.load_from_slot::<OpaqueWorld>(2, LoadDepth::Full),
            Err(SaveError::SlotEmpty { slot: 2 })
        ));
    }

    #[test]
    fn test_slot_listing_reads_headers() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager(&temp_dir);

        manager.save_to_slot(0, &game(), "First").unwrap();
        manager.save_to_slot(2, &game(), "Third").unwrap();
        std::fs::write(manager.slot_path(1), b"garbage").unwrap();

        let infos = manager.all_slot_info();
        assert_eq!(infos.len(), 2);
        let mut names: Vec<_> = infos.iter().map(|info| info.header.map_name.as_str()).collect();
        names.sort();
        assert_eq!(names, ["First", "Third"]);

        let info = manager.slot_info(0).unwrap().unwrap();
        assert!(info.display_text().contains("First"));
        assert_ne!(info.format_timestamp(), "Unknown");
        assert!(manager.slot_info(1).is_err());
    }

    #[test]
    fn test_auto_save_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager(&temp_dir);

        assert!(!manager.auto_save_exists());
        manager.auto_save(&game(), "Auto").unwrap();
        let loaded: Savegame<OpaqueWorld> = manager.load_auto_save().unwrap();
        assert_eq!(loaded.header.map_name, "Auto");

        manager.save_to_slot(1, &game(), "Gone").unwrap();
        manager.delete_slot(1).unwrap();
        assert!(!manager.slot_exists(1));
        assert!(manager.slot_info(1).unwrap().is_none());
    }
}
