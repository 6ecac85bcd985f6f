//! # sg_core - Staged, versioned savegame codec
//!
//! Persists one instant of a running strategy match as a binary container and
//! reads it back, either completely or only as far as a caller needs.
//!
//! ## Layout
//! - `stream`: little-endian byte stream over files or memory
//! - `save`: header, roster, settings and world codecs plus the `Savegame`
//!   orchestrator and slot-based `SaveManager`
//! - `diplomacy`: pacts between player slots
//! - `config`: YAML configuration and settings presets

pub mod config;
pub mod diplomacy;
pub mod save;
pub mod stream;

pub use config::SaveConfig;
pub use diplomacy::{Diplomacy, Pact, PactKind, DURATION_INFINITE};
pub use save::{LoadDepth, LoadStage, SaveError, SaveResult, Savegame};
