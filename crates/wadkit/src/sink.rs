//! Output sink for extracted entries.

use wadkit_common::PathIdentity;

use crate::detect::Decoded;
use crate::transcode::TranscodeRequest;
use crate::Result;

/// Receives what the extractor produces for each entry.
///
/// Every processed entry reaches exactly one of [`Sink::decoded`],
/// [`Sink::unknown`], [`Sink::redirect`] or [`Sink::failed`]. An error
/// returned from a sink stops the extraction.
pub trait Sink {
    /// A payload decoded as a known container.
    fn decoded(&mut self, identity: &PathIdentity, decoded: &Decoded<'_>) -> Result<()>;

    /// A payload with no recognised signature.
    fn unknown(&mut self, identity: &PathIdentity, data: &[u8]) -> Result<()>;

    /// An entry whose data lives in another archive.
    fn redirect(&mut self, _identity: &PathIdentity, _target: Option<&str>) -> Result<()> {
        Ok(())
    }

    /// An entry that could not be read or decoded. The identity is missing
    /// when the table record itself was invalid and carried no hash.
    fn failed(
        &mut self,
        _identity: Option<&PathIdentity>,
        _error: &(dyn std::error::Error + 'static),
    ) -> Result<()> {
        Ok(())
    }

    /// An audio blob found inside a decoded container.
    fn transcode(&mut self, _request: &TranscodeRequest<'_>) -> Result<()> {
        Ok(())
    }
}
