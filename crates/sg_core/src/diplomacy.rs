//! Diplomatic pacts between player slots.
//!
//! A pact is identified by the unordered pair of slots plus its kind, so the
//! pair (a, b) and (b, a) name the same relationship and a pair can hold at
//! most one pact of each kind. Durations are counted in ticks from the tick
//! the pact was concluded; [`DURATION_INFINITE`] is a stored value, not a
//! derived flag, and round-trips unchanged.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::save::{SaveError, SaveResult};
use crate::stream::{BinaryReader, BinaryWriter};

/// Pact duration meaning "never expires".
pub const DURATION_INFINITE: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PactKind {
    TreatyOfAlliance = 0,
    NonAggressionPact = 1,
}

impl PactKind {
    pub const ALL: [PactKind; 2] = [PactKind::TreatyOfAlliance, PactKind::NonAggressionPact];

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::TreatyOfAlliance),
            1 => Some(Self::NonAggressionPact),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TreatyOfAlliance => "Treaty of alliance",
            Self::NonAggressionPact => "Non-aggression pact",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pact {
    pub kind: PactKind,
    pub duration_ticks: u32,
    pub start_tick: u32,
}

impl Pact {
    pub fn new(kind: PactKind, duration_ticks: u32, start_tick: u32) -> Self {
        Self { kind, duration_ticks, start_tick }
    }

    pub fn infinite(kind: PactKind, start_tick: u32) -> Self {
        Self::new(kind, DURATION_INFINITE, start_tick)
    }

    pub fn is_infinite(&self) -> bool {
        self.duration_ticks == DURATION_INFINITE
    }

    /// First tick at which the pact no longer holds. `None` for infinite
    /// pacts and for pacts that outlast the `u32` tick range.
    pub fn expires_at(&self) -> Option<u32> {
        if self.is_infinite() {
            None
        } else {
            self.start_tick.checked_add(self.duration_ticks)
        }
    }

    /// Ticks since the pact was concluded, zero before its start tick.
    fn elapsed_at(&self, tick: u32) -> u32 {
        tick.saturating_sub(self.start_tick)
    }

    /// A zero-length pact is expired from the start.
    pub fn is_expired_at(&self, tick: u32) -> bool {
        if self.is_infinite() {
            return false;
        }
        self.duration_ticks == 0 || self.elapsed_at(tick) >= self.duration_ticks
    }

    pub fn is_active_at(&self, tick: u32) -> bool {
        tick >= self.start_tick && !self.is_expired_at(tick)
    }

    /// Ticks left at `tick`. `None` for infinite pacts.
    pub fn remaining_at(&self, tick: u32) -> Option<u32> {
        if self.is_infinite() {
            None
        } else {
            Some(self.duration_ticks - self.elapsed_at(tick).min(self.duration_ticks))
        }
    }
}

/// Unordered slot pair plus pact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PactKey {
    low: u8,
    high: u8,
    kind: PactKind,
}

impl PactKey {
    pub fn new(a: u8, b: u8, kind: PactKind) -> Self {
        Self { low: a.min(b), high: a.max(b), kind }
    }

    pub fn slots(&self) -> (u8, u8) {
        (self.low, self.high)
    }

    pub fn kind(&self) -> PactKind {
        self.kind
    }

    pub fn involves(&self, slot: u8) -> bool {
        self.low == slot || self.high == slot
    }
}

/// All pacts of one match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diplomacy {
    pacts: BTreeMap<PactKey, Pact>,
}

impl Diplomacy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a pact between `a` and `b`, replacing one of the same kind.
    pub fn insert(&mut self, a: u8, b: u8, pact: Pact) -> Option<Pact> {
        self.pacts.insert(PactKey::new(a, b, pact.kind), pact)
    }

    pub fn get(&self, a: u8, b: u8, kind: PactKind) -> Option<&Pact> {
        self.pacts.get(&PactKey::new(a, b, kind))
    }

    pub fn remove(&mut self, a: u8, b: u8, kind: PactKind) -> Option<Pact> {
        self.pacts.remove(&PactKey::new(a, b, kind))
    }

    pub fn is_active(&self, a: u8, b: u8, kind: PactKind, tick: u32) -> bool {
        self.get(a, b, kind).is_some_and(|pact| pact.is_active_at(tick))
    }

    /// Pacts between `a` and `b` that hold at `tick`.
    pub fn active_between(&self, a: u8, b: u8, tick: u32) -> impl Iterator<Item = &Pact> + '_ {
        PactKind::ALL
            .into_iter()
            .filter_map(move |kind| self.get(a, b, kind))
            .filter(move |pact| pact.is_active_at(tick))
    }

    pub fn active_at(&self, tick: u32) -> impl Iterator<Item = (PactKey, &Pact)> + '_ {
        self.iter().filter(move |(_, pact)| pact.is_active_at(tick))
    }

    /// Drops every pact that has run out by `tick`. Returns how many were removed.
    pub fn expire(&mut self, tick: u32) -> usize {
        let before = self.pacts.len();
        self.pacts.retain(|_, pact| !pact.is_expired_at(tick));
        before - self.pacts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PactKey, &Pact)> + '_ {
        self.pacts.iter().map(|(key, pact)| (*key, pact))
    }

    pub fn len(&self) -> usize {
        self.pacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pacts.is_empty()
    }

    pub fn clear(&mut self) {
        self.pacts.clear();
    }

    pub fn write<W: Write>(&self, writer: &mut BinaryWriter<W>) -> SaveResult<()> {
        writer.write_len(self.pacts.len(), "pact list")?;
        for (key, pact) in &self.pacts {
            writer.write_u8(key.low)?;
            writer.write_u8(key.high)?;
            writer.write_u8(pact.kind as u8)?;
            writer.write_u32(pact.duration_ticks)?;
            writer.write_u32(pact.start_tick)?;
        }
        Ok(())
    }

    /// Decodes the pact list. A repeated slot pair and kind keeps the later record.
    pub fn read<R: Read>(reader: &mut BinaryReader<R>) -> SaveResult<Self> {
        let count = reader.read_u32("pact count")? as usize;

        let mut diplomacy = Self::new();
        for _ in 0..count {
            let a = reader.read_u8("pact slot")?;
            let b = reader.read_u8("pact slot")?;
            let tag = reader.read_u8("pact type")?;
            let kind =
                PactKind::from_u8(tag).ok_or(SaveError::UnknownVariant { field: "pact type", value: tag })?;
            let duration_ticks = reader.read_u32("pact duration")?;
            let start_tick = reader.read_u32("pact start tick")?;

            if diplomacy.insert(a, b, Pact::new(kind, duration_ticks, start_tick)).is_some() {
                log::debug!("Duplicate {} between slots {} and {}", kind.name(), a, b);
            }
        }

        Ok(diplomacy)
    }
}
