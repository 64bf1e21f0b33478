//! Payload format detection.

use std::fmt;

use wadkit_bnk::Bank;
use wadkit_common::PathIdentity;
use wadkit_rst::StringTable;
use wadkit_wpk::Package;

use crate::transcode::TranscodeRequest;
use crate::Result;

/// Container format of an entry payload, decided by its leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum FormatKind {
    /// Audio package (`r3d2`).
    Package,
    /// Sound bank (`BKHD`).
    Bank,
    /// String table (`RST`).
    StringTable,
    /// No known signature.
    NoMatch,
}

impl FormatKind {
    /// Detect the format of a payload. Only exact prefixes match.
    pub fn detect(data: &[u8]) -> Self {
        if Package::is_package(data) {
            FormatKind::Package
        } else if Bank::is_bank(data) {
            FormatKind::Bank
        } else if StringTable::is_string_table(data) {
            FormatKind::StringTable
        } else {
            FormatKind::NoMatch
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormatKind::Package => "package",
            FormatKind::Bank => "bank",
            FormatKind::StringTable => "string table",
            FormatKind::NoMatch => "unknown",
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded container.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "format", rename_all = "snake_case"))]
pub enum Decoded<'a> {
    Package(Package<'a>),
    Bank(Bank<'a>),
    StringTable(StringTable),
}

impl<'a> Decoded<'a> {
    /// Detect and decode a payload. Returns `None` when no format matches.
    pub fn decode(data: &'a [u8]) -> Result<Option<Self>> {
        let decoded = match FormatKind::detect(data) {
            FormatKind::Package => Decoded::Package(Package::parse(data)?),
            FormatKind::Bank => Decoded::Bank(Bank::parse(data)?),
            FormatKind::StringTable => Decoded::StringTable(StringTable::parse(data)?),
            FormatKind::NoMatch => return Ok(None),
        };
        Ok(Some(decoded))
    }

    pub fn kind(&self) -> FormatKind {
        match self {
            Decoded::Package(_) => FormatKind::Package,
            Decoded::Bank(_) => FormatKind::Bank,
            Decoded::StringTable(_) => FormatKind::StringTable,
        }
    }

    /// Audio blobs that should be handed to an external transcoder.
    pub fn transcode_requests(&self, identity: &PathIdentity) -> Vec<TranscodeRequest<'a>> {
        match self {
            Decoded::Package(package) => TranscodeRequest::from_package(identity, package),
            Decoded::Bank(bank) => TranscodeRequest::from_bank(identity, bank),
            Decoded::StringTable(_) => Vec::new(),
        }
    }
}
