//! sg_tool: inspect, verify and create savegame containers.
//!
//! Usage:
//!   sg_tool inspect match.sav --depth settings --json
//!   sg_tool verify match.sav
//!   sg_tool create --out match.sav --map "Two Rivers" --players 4
//!   sg_tool slots --config saves.yaml

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sg_core::config::load_settings_preset;
use sg_core::save::{
    describe_version_gap, AiLevel, GameSettings, OpaqueWorld, PackedWorld, PlayerRecord, SaveHeader,
    SaveManager, WorldSummary,
};
use sg_core::{Diplomacy, LoadDepth, Pact, PactKind, SaveConfig, SaveError, Savegame};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sg_tool")]
#[command(about = "Inspect, verify and create savegame containers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the contents of a savegame
    Inspect {
        /// Savegame file
        file: PathBuf,

        /// How far to read into the container
        #[arg(long, value_enum, default_value_t = Depth::Settings)]
        depth: Depth,

        /// Print JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Fully load a savegame and report the first error
    Verify {
        /// Savegame file
        file: PathBuf,
    },

    /// Write a sample savegame
    Create {
        /// Output file path
        #[arg(long)]
        out: PathBuf,

        /// Map name stored in the header
        #[arg(long)]
        map: String,

        /// Number of roster slots
        #[arg(long, default_value_t = 2)]
        players: u8,

        /// YAML settings preset
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// List save slots
    Slots {
        /// Save manager YAML config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Depth {
    Header,
    Settings,
    Full,
}

impl From<Depth> for LoadDepth {
    fn from(depth: Depth) -> Self {
        match depth {
            Depth::Header => LoadDepth::HeaderOnly,
            Depth::Settings => LoadDepth::HeaderAndSettings,
            Depth::Full => LoadDepth::Full,
        }
    }
}

#[derive(Debug, Serialize)]
struct PactView {
    slots: (u8, u8),
    kind: &'static str,
    start_tick: u32,
    /// `None` for pacts that never expire
    duration_ticks: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WorldView {
    payload_bytes: usize,
    /// Present when the payload is a packed world summary
    summary: Option<WorldSummary>,
}

#[derive(Debug, Serialize)]
struct SavegameView {
    stage: String,
    header: SaveHeader,
    roster: Vec<PlayerRecord>,
    settings: Option<GameSettings>,
    pacts: Vec<PactView>,
    world: Option<WorldView>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { file, depth, json } => {
            let view = inspect(&file, depth.into())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_view(&view);
            }
        }

        Commands::Verify { file } => {
            println!("🔍 Verifying {}...", file.display());
            let mut game = Savegame::<OpaqueWorld>::new();
            game.load_from_path(&file, LoadDepth::Full)
                .with_context(|| format!("Verification of {} failed", file.display()))?;
            println!(
                "✅ {} is valid (v{}, {} slots, {} pacts, {} world bytes)",
                game.header.map_name,
                game.header.version,
                game.roster.len(),
                game.diplomacy.len(),
                game.world.len()
            );
        }

        Commands::Create { out, map, players, settings } => {
            println!("🔨 Creating savegame...");
            println!("   Map:     {}", map);
            println!("   Players: {}", players);
            println!("   Output:  {}", out.display());

            let settings = match settings {
                Some(path) => load_settings_preset(&path)
                    .with_context(|| format!("Failed to read settings preset {}", path.display()))?,
                None => GameSettings::default(),
            };

            log::debug!("Using settings {:?}", settings);
            let game = build_sample(players, settings);
            game.save_to_path(&out, &map)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("\n✅ Savegame written");
        }

        Commands::Slots { config } => {
            let config = match config {
                Some(path) => SaveConfig::load(&path)?,
                None => SaveConfig::default(),
            };
            list_slots(&SaveManager::new(config));
        }
    }

    Ok(())
}

fn inspect(file: &Path, depth: LoadDepth) -> Result<SavegameView> {
    log::debug!("Inspecting {} at depth {:?}", file.display(), depth);
    let mut game = Savegame::<OpaqueWorld>::new();
    if let Err(e) = game.load_from_path(file, depth) {
        if let SaveError::UnsupportedVersion { found, .. } = &e {
            eprintln!("{}", describe_version_gap(*found));
        }
        return Err(e).with_context(|| format!("Failed to read {}", file.display()));
    }

    let past_header = depth != LoadDepth::HeaderOnly;
    let world = (depth == LoadDepth::Full).then(|| WorldView {
        payload_bytes: game.world.len(),
        summary: PackedWorld::<WorldSummary>::unpack(game.world.as_bytes()).ok().map(|w| w.state),
    });

    Ok(SavegameView {
        stage: format!("{:?}", game.stage()),
        header: game.header.clone(),
        roster: game.roster.clone(),
        settings: past_header.then_some(game.settings),
        pacts: pact_views(&game.diplomacy),
        world,
    })
}

fn pact_views(diplomacy: &Diplomacy) -> Vec<PactView> {
    diplomacy
        .iter()
        .map(|(key, pact)| PactView {
            slots: key.slots(),
            kind: pact.kind.name(),
            start_tick: pact.start_tick,
            duration_ticks: (!pact.is_infinite()).then_some(pact.duration_ticks),
        })
        .collect()
}

fn print_view(view: &SavegameView) {
    println!("📄 {} (format v{})", view.header.map_name, view.header.version);
    println!("   Start tick: {}", view.header.start_tick);
    println!("   Stage:      {}", view.stage);

    if let Some(settings) = &view.settings {
        println!("\n   Settings:   {:?}", settings);
        println!("   Roster:");
        for (slot, record) in view.roster.iter().enumerate() {
            println!(
                "     [{}] {:?} nation={} team={} color={:#010x} ai={:?}",
                slot, record.kind, record.nation, record.team, record.color, record.ai_level
            );
        }
        println!("   Pacts:");
        for pact in &view.pacts {
            let duration = pact.duration_ticks.map_or("infinite".to_string(), |d| format!("{} ticks", d));
            println!(
                "     {} between {} and {} from tick {} ({})",
                pact.kind, pact.slots.0, pact.slots.1, pact.start_tick, duration
            );
        }
    }

    if let Some(world) = &view.world {
        println!("\n   World:      {} bytes", world.payload_bytes);
        if let Some(summary) = &world.summary {
            println!(
                "   Summary:    tick {} on a {}x{} map",
                summary.current_tick, summary.map_width, summary.map_height
            );
        }
    }
}

fn list_slots(manager: &SaveManager) {
    let dir = &manager.config().save_dir;
    let slots = manager.all_slot_info();
    log::debug!("Found {} of {} slots in use", slots.len(), manager.config().slot_count);
    if slots.is_empty() {
        println!("No saves in {}", dir.display());
        return;
    }

    println!("💾 Saves in {}:", dir.display());
    for info in &slots {
        println!("   {}  [{}]", info.display_text(), info.format_timestamp());
    }
    if manager.auto_save_exists() {
        println!("   Auto-save: {}", manager.auto_save_path().display());
    }
}

/// Alternating human and AI slots, allied in pairs, with a packed world summary.
fn build_sample(players: u8, settings: GameSettings) -> Savegame<PackedWorld<WorldSummary>> {
    let mut game = Savegame::<PackedWorld<WorldSummary>>::new();
    game.settings = settings;
    game.roster = (0..players)
        .map(|slot| {
            let color = 0xFF00_0000 | (u32::from(slot) * 0x0030_5070 & 0x00FF_FFFF);
            if slot % 2 == 0 {
                PlayerRecord::human(slot % 4, slot / 2, color)
            } else {
                PlayerRecord::ai(slot % 4, slot / 2, color, AiLevel::Medium)
            }
        })
        .collect();

    for slot in (0..players.saturating_sub(1)).step_by(2) {
        game.diplomacy.insert(slot, slot + 1, Pact::infinite(PactKind::TreatyOfAlliance, 0));
    }
    if players >= 3 {
        game.diplomacy.insert(0, 2, Pact::new(PactKind::NonAggressionPact, 30_000, 0));
    }

    game.world.state = WorldSummary { current_tick: 0, map_width: 128, map_height: 128, notes: Vec::new() };
    game
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sample_roster_and_pacts() {
        let game = build_sample(4, GameSettings::default());
        assert_eq!(game.roster.len(), 4);
        assert_eq!(game.occupied_slots(), 4);
        assert!(game.diplomacy.is_active(0, 1, PactKind::TreatyOfAlliance, 100));
        assert!(game.diplomacy.is_active(2, 3, PactKind::TreatyOfAlliance, 100));
        assert!(game.diplomacy.get(0, 2, PactKind::NonAggressionPact).is_some());

        assert!(build_sample(0, GameSettings::default()).diplomacy.is_empty());
    }

    #[test]
    fn test_inspect_created_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sample.sav");
        build_sample(3, GameSettings::default()).save_to_path(&path, "Sample").unwrap();

        let view = inspect(&path, LoadDepth::Full).unwrap();
        assert_eq!(view.header.map_name, "Sample");
        assert_eq!(view.roster.len(), 3);
        assert_eq!(view.pacts.len(), 2);
        let world = view.world.unwrap();
        assert_eq!(world.summary.unwrap().map_width, 128);

        let view = inspect(&path, LoadDepth::HeaderOnly).unwrap();
        assert!(view.settings.is_none());
        assert!(view.roster.is_empty());
        assert!(view.world.is_none());

        let json = serde_json::to_value(inspect(&path, LoadDepth::HeaderAndSettings).unwrap()).unwrap();
        assert_eq!(json["stage"], "SettingsDecoded");
        assert_eq!(json["pacts"][0]["kind"], "Treaty of alliance");
        assert!(json["pacts"][0]["duration_ticks"].is_null());
    }

    #[test]
    fn test_inspect_rejects_foreign_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        std::fs::write(&path, "just some text").unwrap();

        let err = inspect(&path, LoadDepth::HeaderOnly).unwrap_err();
        assert!(format!("{:#}", err).contains("signature"));
    }
}
