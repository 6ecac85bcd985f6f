// Savegame container: staged, versioned binary snapshot of a running match.
// Header -> roster -> settings -> diplomacy -> world payload, always in that order.

pub mod error;
pub mod header;
pub mod manager;
pub mod roster;
pub mod savegame;
pub mod settings;
pub mod world;

pub use error::{SaveError, SaveResult};
pub use header::{describe_version_gap, FormatLayout, SaveHeader};
pub use manager::{SaveManager, SaveSlotInfo};
pub use roster::{AiLevel, PlayerKind, PlayerRecord};
pub use savegame::{peek_header, LoadDepth, LoadStage, Savegame};
pub use settings::GameSettings;
pub use world::{OpaqueWorld, PackedWorld, WorldContext, WorldState, WorldSummary};

/// Identifies the savegame format family.
pub const SIGNATURE: [u8; SIGNATURE_LEN] = *b"RTTRSV";
pub const SIGNATURE_LEN: usize = 6;

/// Version written by `Savegame::save`. Bump together with a new `FormatLayout` entry.
pub const SAVE_VERSION: u16 = 4;

/// Pact records address players by a single byte.
pub const MAX_PLAYERS: usize = 256;
