//! Capabilities a platform layer provides for one connected tag.
//!
//! Discovery and anticollision happen outside this crate. What arrives here is
//! a handle per tag technology, mirroring how the platform exposes a tag as
//! several "tech" views (Ultralight, Classic, NDEF). Every accessor connects
//! the handle through [`connect`], which closes it again on every exit path.

use crate::{classic::ClassicSize, error::TagError, keys::AuthKey, ultralight::UltralightType};
use scopeguard::ScopeGuard;
use tracing::warn;

/// Size in bytes of one Ultralight page
pub const PAGE_SIZE: usize = 4;
/// Size in bytes of one Classic block
pub const BLOCK_SIZE: usize = 16;
/// Pages returned by one Ultralight READ command
pub const PAGES_PER_READ: usize = 4;

/// Exclusive I/O channel to one tag.
pub trait TagSession {
    fn connect(&mut self) -> Result<(), TagError>;
    fn close(&mut self) -> Result<(), TagError>;
    fn is_connected(&self) -> bool;
}

/// Page-addressed memory: MIFARE Ultralight and Ultralight C.
pub trait UltralightSession: TagSession {
    /// Variant reported by the tag, available before connecting
    fn ultralight_type(&self) -> UltralightType;

    /// Reads [`PAGES_PER_READ`] pages starting at `page`.
    ///
    /// Reads past the last page wrap around to page 0, as the tag does.
    fn read_pages(&mut self, page: usize) -> Result<[u8; PAGE_SIZE * PAGES_PER_READ], TagError>;

    fn write_page(&mut self, page: usize, data: &[u8; PAGE_SIZE]) -> Result<(), TagError>;
}

/// Sector and block addressed memory: MIFARE Classic.
pub trait ClassicSession: TagSession {
    fn size(&self) -> ClassicSize;

    /// Presents `key` as key A for `sector`.
    ///
    /// `Ok(false)` means the tag rejected the key. Errors are reserved for a
    /// broken link.
    fn authenticate_sector_with_key_a(
        &mut self,
        sector: usize,
        key: &AuthKey,
    ) -> Result<bool, TagError>;

    /// Reads one block by absolute block index. The sector holding the block
    /// must have been authenticated in this session.
    fn read_block(&mut self, block: usize) -> Result<[u8; BLOCK_SIZE], TagError>;
}

/// A tag that already carries an NDEF structure.
pub trait NdefSession: TagSession {
    fn is_writable(&self) -> bool;

    /// Largest NDEF message, in bytes, the tag can hold
    fn max_size(&self) -> usize;

    /// The message currently stored, if any
    fn read_ndef_message(&mut self) -> Result<Option<Vec<u8>>, TagError>;

    fn write_ndef_message(&mut self, message: &[u8]) -> Result<(), TagError>;
}

/// A tag that can be given an NDEF structure.
pub trait NdefFormatableSession: TagSession {
    /// Formats the tag and writes `message` as its first content.
    fn format(&mut self, message: &[u8]) -> Result<(), TagError>;
}

/// The NDEF views of one tag. A tag offers at most one of them in practice.
pub trait NdefTag {
    fn ndef(&mut self) -> Option<&mut dyn NdefSession>;
    fn ndef_formatable(&mut self) -> Option<&mut dyn NdefFormatableSession>;
}

/// A connected session that closes itself when dropped.
pub type Connected<'a, S> = ScopeGuard<&'a mut S, fn(&mut S)>;

/// Connects `session` and returns a guard that closes it when dropped.
///
/// The guard is armed before connecting, so a failed connect still closes
/// the handle.
pub fn connect<S: TagSession + ?Sized>(session: &mut S) -> Result<Connected<'_, S>, TagError> {
    let mut guard: Connected<'_, S> = scopeguard::guard(session, close_quietly::<S> as fn(&mut S));
    guard.connect()?;
    Ok(guard)
}

fn close_quietly<S: TagSession + ?Sized>(session: &mut S) {
    if let Err(err) = session.close() {
        warn!(error = %err, "failed to close tag session");
    }
}
