use std::io::{Read, Write};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::{SaveError, SaveResult};
use crate::stream::{BinaryReader, BinaryWriter};

const CHECKSUM_LEN: usize = 32;
const LZ4_SIZE_PREFIX_LEN: usize = 4;

/// What a world codec may know about the container it is embedded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldContext {
    pub format_version: u16,
    pub player_count: usize,
}

/// Codec for the simulation payload that closes every container.
///
/// The savegame never looks inside the payload. Implementations must consume
/// exactly the bytes they wrote; a short stream should surface as
/// `SaveError::Truncated`, anything else they reject is reported to the caller
/// as `SaveError::DelegateFailure`.
pub trait WorldState: Default {
    fn write<W: Write>(&self, writer: &mut BinaryWriter<W>, ctx: &WorldContext) -> SaveResult<()>;

    fn read<R: Read>(reader: &mut BinaryReader<R>, ctx: &WorldContext) -> SaveResult<Self>;
}

/// World payload kept as raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpaqueWorld {
    bytes: Vec<u8>,
}

impl OpaqueWorld {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl WorldState for OpaqueWorld {
    fn write<W: Write>(&self, writer: &mut BinaryWriter<W>, _ctx: &WorldContext) -> SaveResult<()> {
        writer.write_len(self.bytes.len(), "world payload")?;
        writer.write_bytes(&self.bytes)
    }

    fn read<R: Read>(reader: &mut BinaryReader<R>, _ctx: &WorldContext) -> SaveResult<Self> {
        let len = reader.read_u32("world payload length")? as usize;
        let bytes = reader.read_bytes(len, "world payload")?;
        Ok(Self { bytes })
    }
}

/// Serde state stored as MessagePack, LZ4-compressed, with a SHA-256 trailer.
///
/// On disk: `u32` length, then `compressed || sha256(compressed)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedWorld<T> {
    pub state: T,
}

impl<T> PackedWorld<T> {
    pub fn new(state: T) -> Self {
        Self { state }
    }
}

impl<T: Serialize + DeserializeOwned> PackedWorld<T> {
    /// Builds the payload stored after the diplomacy section.
    pub fn pack(&self) -> SaveResult<Vec<u8>> {
        // Named fields keep older payloads readable when the state grows
        let encoded = to_vec_named(&self.state)
            .map_err(|e| SaveError::DelegateFailure(format!("cannot encode world state: {}", e)))?;

        let mut payload = compress_prepend_size(&encoded);
        let digest = Sha256::digest(&payload);
        payload.extend_from_slice(&digest);
        Ok(payload)
    }

    /// Verifies the digest trailer before touching the compressed block.
    pub fn unpack(payload: &[u8]) -> SaveResult<Self> {
        let body_len = payload.len().saturating_sub(CHECKSUM_LEN);
        if body_len < LZ4_SIZE_PREFIX_LEN {
            return Err(SaveError::DelegateFailure(format!(
                "world payload of {} bytes cannot hold a compressed block and its digest",
                payload.len()
            )));
        }

        let (body, trailer) = payload.split_at(body_len);
        if Sha256::digest(body).as_slice() != trailer {
            return Err(SaveError::DelegateFailure("world checksum mismatch".to_string()));
        }

        let encoded = decompress_size_prepended(body)
            .map_err(|e| SaveError::DelegateFailure(format!("world block does not decompress: {}", e)))?;
        let state = from_slice(&encoded)
            .map_err(|e| SaveError::DelegateFailure(format!("world state does not decode: {}", e)))?;

        Ok(Self { state })
    }
}

impl<T: Serialize + DeserializeOwned + Default> WorldState for PackedWorld<T> {
    fn write<W: Write>(&self, writer: &mut BinaryWriter<W>, _ctx: &WorldContext) -> SaveResult<()> {
        let payload = self.pack()?;
        writer.write_len(payload.len(), "packed world")?;
        writer.write_bytes(&payload)
    }

    fn read<R: Read>(reader: &mut BinaryReader<R>, ctx: &WorldContext) -> SaveResult<Self> {
        let len = reader.read_u32("packed world length")? as usize;
        let payload = reader.read_bytes(len, "packed world")?;
        let world = Self::unpack(&payload)?;

        log::debug!(
            "Unpacked {} byte world payload for {} players (format v{})",
            payload.len(),
            ctx.player_count,
            ctx.format_version
        );
        Ok(world)
    }
}

/// Minimal serde world used by tools and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSummary {
    pub current_tick: u32,
    pub map_width: u16,
    pub map_height: u16,
    #[serde(default)]
    pub notes: Vec<String>,
}
