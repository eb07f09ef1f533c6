//! Page-addressed access to MIFARE Ultralight tags.
//!
//! Memory is a run of 4-byte pages. Pages 0-3 hold the serial number, lock
//! bytes and capability container. On the Ultralight C the last four pages
//! carry the 3DES key and cannot be read back, so dumps stop short of them.

use crate::{
    codec,
    error::TagError,
    session::{self, UltralightSession, PAGES_PER_READ, PAGE_SIZE},
};
use tracing::{debug, warn};

/// Variant reported by an Ultralight tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UltralightType {
    /// MF0ICU1, 16 pages, no authentication
    Ultralight,
    /// MF0ICU2, 48 pages, 3DES authentication
    UltralightC,
    Unknown,
}

/// Page geometry of one Ultralight variant.
pub trait PageLayout {
    const PAGES: usize;
    /// Pages at the end of memory that can never be read
    const PROTECTED_PAGES: usize;
    /// First page after the manufacturer and system pages
    const FIRST_USER_PAGE: usize = 4;

    fn readable_pages() -> usize {
        Self::PAGES - Self::PROTECTED_PAGES
    }

    /// Number of whole [`PAGES_PER_READ`] groups before the protected pages
    fn readable_groups() -> usize {
        Self::readable_pages() / PAGES_PER_READ
    }

    fn size() -> usize {
        Self::PAGES * PAGE_SIZE
    }
}

pub struct UltralightLayout;

impl PageLayout for UltralightLayout {
    const PAGES: usize = 16;
    const PROTECTED_PAGES: usize = 0;
}

pub struct UltralightCLayout;

impl PageLayout for UltralightCLayout {
    const PAGES: usize = 48;
    const PROTECTED_PAGES: usize = 4;
}

/// Highest start page accepted by [`read_page_group`]
pub const LAST_GROUP_START: usize = UltralightCLayout::PAGES - PAGES_PER_READ;

/// Dumps the readable memory of an Ultralight C, one 4-page group per line.
///
/// Each line reads `page<N>:<hex>` where `N` is the first page of the group.
/// A plain Ultralight yields an empty report. `None` means the tag is of
/// another type or the session failed; the failure is logged.
pub fn read_all<S: UltralightSession + ?Sized>(session: &mut S) -> Option<String> {
    match dump_pages(session) {
        Ok(report) => report,
        Err(err) => {
            warn!(error = %err, "failed to read ultralight pages");
            None
        }
    }
}

fn dump_pages<S: UltralightSession + ?Sized>(session: &mut S) -> Result<Option<String>, TagError> {
    let mut tag = session::connect(session)?;
    match tag.ultralight_type() {
        UltralightType::UltralightC => {
            let mut report = String::new();
            for group in 0..UltralightCLayout::readable_groups() {
                let page = group * PAGES_PER_READ;
                let data = tag.read_pages(page)?;
                let hex = codec::bytes_to_hex(Some(&data[..])).unwrap_or_default();
                report.push_str(&format!("page{page}:{hex}\n"));
            }
            Ok(Some(report))
        }
        UltralightType::Ultralight => Ok(Some(String::new())),
        UltralightType::Unknown => Ok(None),
    }
}

/// Reads the 4 pages starting at `start_page` and decodes them as text.
///
/// Trailing zero bytes are dropped before decoding; invalid UTF-8 sequences
/// are replaced. `start_page` must lie in `0..=44`.
pub fn read_page_group<S: UltralightSession + ?Sized>(
    session: &mut S,
    start_page: usize,
) -> Option<String> {
    if start_page > LAST_GROUP_START {
        debug!(start_page, "page group outside readable range");
        return None;
    }

    let result = session::connect(session).and_then(|mut tag| match tag.ultralight_type() {
        UltralightType::UltralightC => {
            let data = tag.read_pages(start_page)?;
            let text = String::from_utf8_lossy(codec::trim_trailing_zeros(&data)).into_owned();
            Ok(Some(text))
        }
        UltralightType::Ultralight => Ok(Some(String::new())),
        UltralightType::Unknown => Ok(None),
    });

    result.unwrap_or_else(|err| {
        warn!(error = %err, start_page, "failed to read ultralight page group");
        None
    })
}

/// Pads `data` with zeros up to a whole number of pages.
pub fn pad_to_pages(data: &[u8]) -> Vec<u8> {
    let mut padded = data.to_vec();
    let remainder = padded.len() % PAGE_SIZE;
    if remainder != 0 {
        padded.resize(padded.len() + PAGE_SIZE - remainder, 0);
    }
    padded
}

/// Writes `data` page by page starting at `start_page`.
///
/// The final page is zero padded. Writes are best effort: a page that fails
/// is logged and the remaining pages are still attempted. Only an
/// Ultralight C is written; a plain Ultralight is left untouched.
///
/// Nothing stops a caller from overwriting pages 0-3; start at
/// [`PageLayout::FIRST_USER_PAGE`] unless that is the intent.
pub fn write_groups<S: UltralightSession + ?Sized>(
    session: &mut S,
    start_page: usize,
    data: &[u8],
) -> Result<(), TagError> {
    let mut tag = session::connect(session)?;
    match tag.ultralight_type() {
        UltralightType::UltralightC => {}
        UltralightType::Ultralight => {
            debug!("plain ultralight, skipping page write");
            return Ok(());
        }
        UltralightType::Unknown => return Err(TagError::UnsupportedFamily),
    }

    let padded = pad_to_pages(data);
    for (offset, chunk) in padded.chunks_exact(PAGE_SIZE).enumerate() {
        let page = start_page + offset;
        let mut bytes = [0u8; PAGE_SIZE];
        bytes.copy_from_slice(chunk);
        if let Err(err) = tag.write_page(page, &bytes) {
            warn!(error = %err, page, "failed to write ultralight page");
        }
    }
    Ok(())
}
