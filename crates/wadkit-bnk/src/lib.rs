//! Sound bank parser.
//!
//! Sound banks (`.bnk`) are sequences of tagged sections, each a 4-byte tag
//! followed by a u32 body length:
//!
//! - `BKHD` - bank version and id
//! - `DIDX` - index of embedded audio: `{id, offset, size}` records
//! - `DATA` - the embedded audio, sliced using the DIDX offsets
//! - `HIRC` - object hierarchy (sounds, actions, events)
//! - `STID` - bank id to name table
//!
//! Other sections are skipped. Parsing never copies audio data; the
//! returned [`Bank`] borrows from the input buffer.
//!
//! # Example
//!
//! ```no_run
//! use wadkit_bnk::Bank;
//!
//! let data = std::fs::read("vo_events.bnk")?;
//! let bank = Bank::parse(&data)?;
//!
//! for (source, audio) in bank.audio_sources() {
//!     println!("{}: {} bytes", source.id, audio.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod bank;
mod error;
pub mod hirc;

pub use bank::{tag, Bank, DidxRecord, SectionHeader, SoundSourceIndexEntry, StringIdEntry};
pub use error::{Error, Result};
pub use hirc::{ActionObject, HircObject, SoundObject};
