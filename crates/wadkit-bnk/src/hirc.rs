//! HIRC (object hierarchy) records.
//!
//! Each record is `object_type:u8, length:u32` followed by `length` bytes of
//! type-specific body. Only the handful of types needed for audio lookup
//! are interpreted; everything else is kept as opaque bytes.

use wadkit_common::BinaryReader;

use crate::Result;

/// Object type tags.
pub mod object_type {
    /// Generic/event object.
    pub const GENERIC: u8 = 1;
    /// Sound source object.
    pub const SOUND: u8 = 2;
    /// Action object.
    pub const ACTION: u8 = 3;
}

/// Size of the `object_type` + `length` record header.
pub const RECORD_HEADER_LEN: usize = 5;

/// Bytes of a sound object body consumed by its fixed fields.
const SOUND_FIXED_LEN: usize = 21;

/// A sound-source object (type 2).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SoundObject<'a> {
    pub id: u32,
    pub storage_type: u32,
    pub audio_id: u32,
    pub source_id: u32,
    pub sound_type: u8,
    /// Remaining `length - 21` bytes.
    pub data: &'a [u8],
}

/// An action object (type 3).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ActionObject {
    pub scope: u8,
    pub action_type: u8,
    pub game_object_id: u32,
    /// Parameter type bytes, parallel to `parameter_values`.
    pub parameter_types: Vec<u8>,
    pub parameter_values: Vec<u8>,
}

/// One HIRC record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum HircObject<'a> {
    /// Type 1: id plus `length - 4` opaque bytes.
    Generic { id: u32, data: &'a [u8] },
    /// Type 2.
    Sound(SoundObject<'a>),
    /// Type 3.
    Action(ActionObject),
    /// Any other type, or a known type whose body is too short for its
    /// fields. Body uninterpreted.
    Unknown { object_type: u8, data: &'a [u8] },
}

impl<'a> HircObject<'a> {
    /// The record's type tag.
    pub fn object_type(&self) -> u8 {
        match self {
            HircObject::Generic { .. } => object_type::GENERIC,
            HircObject::Sound(_) => object_type::SOUND,
            HircObject::Action(_) => object_type::ACTION,
            HircObject::Unknown { object_type, .. } => *object_type,
        }
    }

    /// Read one record and leave `reader` at the start of the next one.
    ///
    /// Fails if the record header or body runs past the end of `reader`. A
    /// body too short for its type's fields is kept as [`HircObject::Unknown`].
    pub fn read(reader: &mut BinaryReader<'a>) -> Result<Self> {
        let object_type = reader.read_u8()?;
        let length = reader.read_u32()? as usize;
        let body = reader.read_bytes(length)?;

        let mut body_reader = BinaryReader::new(body);
        let parsed = match object_type {
            object_type::GENERIC => Self::read_generic(&mut body_reader, length),
            object_type::SOUND => Self::read_sound(&mut body_reader, length),
            object_type::ACTION => Self::read_action(&mut body_reader),
            _ => Ok(HircObject::Unknown {
                object_type,
                data: body,
            }),
        };

        Ok(parsed.unwrap_or_else(|e| {
            tracing::debug!(
                "HIRC type {} record of {} bytes is malformed, keeping it raw: {}",
                object_type,
                length,
                e
            );
            HircObject::Unknown {
                object_type,
                data: body,
            }
        }))
    }

    fn read_generic(reader: &mut BinaryReader<'a>, length: usize) -> Result<Self> {
        let id = reader.read_u32()?;
        Ok(HircObject::Generic {
            id,
            data: reader.read_bytes(length.saturating_sub(4))?,
        })
    }

    fn read_sound(reader: &mut BinaryReader<'a>, length: usize) -> Result<Self> {
        let id = reader.read_u32()?;
        reader.skip(4)?;
        let storage_type = reader.read_u32()?;
        let audio_id = reader.read_u32()?;
        let source_id = reader.read_u32()?;
        let sound_type = reader.read_u8()?;
        let data = reader.read_bytes(length.saturating_sub(SOUND_FIXED_LEN))?;

        Ok(HircObject::Sound(SoundObject {
            id,
            storage_type,
            audio_id,
            source_id,
            sound_type,
            data,
        }))
    }

    fn read_action(reader: &mut BinaryReader<'a>) -> Result<Self> {
        let scope = reader.read_u8()?;
        let action_type = reader.read_u8()?;
        let game_object_id = reader.read_u32()?;
        reader.skip(1)?;
        let parameter_count = reader.read_u8()? as usize;
        let parameter_types = reader.read_bytes(parameter_count)?.to_vec();
        let parameter_values = reader.read_bytes(parameter_count)?.to_vec();

        // Whatever follows the parameters is dropped with the rest of the body.
        Ok(HircObject::Action(ActionObject {
            scope,
            action_type,
            game_object_id,
            parameter_types,
            parameter_values,
        }))
    }
}

/// Read a HIRC section body: `count:u32` then `count` records.
///
/// A record that overruns the section ends parsing; every record read
/// before it is kept. Malformed bodies inside the section do not stop it.
pub fn read_objects<'a>(body: &'a [u8]) -> Vec<HircObject<'a>> {
    let mut reader = BinaryReader::new(body);
    let count = match reader.read_u32() {
        Ok(count) => count as usize,
        Err(e) => {
            tracing::warn!("HIRC section too short for its record count: {}", e);
            return Vec::new();
        }
    };

    // Every record needs at least its header, which bounds a bogus count.
    let mut objects = Vec::with_capacity(count.min(reader.remaining() / RECORD_HEADER_LEN));
    for index in 0..count {
        let start = reader.position();
        match HircObject::read(&mut reader) {
            Ok(object) => objects.push(object),
            Err(e) => {
                tracing::warn!(
                    "HIRC record {}/{} at offset {} truncated, keeping {} records: {}",
                    index,
                    count,
                    start,
                    objects.len(),
                    e
                );
                break;
            }
        }
    }

    objects
}
