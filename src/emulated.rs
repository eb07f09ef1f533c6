//! In-memory tags that implement the session traits.
//!
//! They keep their memory in plain vectors, count how often they were
//! closed, and can be told to fail specific operations, which makes them the
//! stand-in for a reader in tests and demos.

use crate::{
    classic::{self, ClassicSize},
    error::TagError,
    keys::AuthKey,
    session::{
        ClassicSession, NdefFormatableSession, NdefSession, NdefTag, TagSession, UltralightSession,
        BLOCK_SIZE, PAGES_PER_READ, PAGE_SIZE,
    },
    ultralight::{PageLayout, UltralightCLayout, UltralightLayout, UltralightType},
};
use std::collections::BTreeSet;

/// Access bits and general purpose byte of a factory fresh trailer
const FACTORY_ACCESS_BITS: [u8; 4] = [0xFF, 0x07, 0x80, 0x69];

fn ensure_connected(connected: bool) -> Result<(), TagError> {
    if connected {
        Ok(())
    } else {
        Err(TagError::SessionUnavailable("session is not connected".into()))
    }
}

fn connect_unless(fail: bool, connected: &mut bool) -> Result<(), TagError> {
    if fail {
        return Err(TagError::SessionUnavailable("tag out of range".into()));
    }
    *connected = true;
    Ok(())
}

/// An Ultralight or Ultralight C held in memory.
#[derive(Debug, Clone)]
pub struct EmulatedUltralight {
    kind: UltralightType,
    pages: Vec<[u8; PAGE_SIZE]>,
    connected: bool,
    close_count: usize,
    fail_connect: bool,
    fail_reads: bool,
    failing_pages: BTreeSet<usize>,
    write_log: Vec<(usize, [u8; PAGE_SIZE])>,
}

impl EmulatedUltralight {
    pub fn new(kind: UltralightType) -> Self {
        let pages = match kind {
            UltralightType::UltralightC => UltralightCLayout::PAGES,
            _ => UltralightLayout::PAGES,
        };
        EmulatedUltralight {
            kind,
            pages: vec![[0; PAGE_SIZE]; pages],
            connected: false,
            close_count: 0,
            fail_connect: false,
            fail_reads: false,
            failing_pages: BTreeSet::new(),
            write_log: Vec::new(),
        }
    }

    pub fn with_page(mut self, page: usize, data: [u8; PAGE_SIZE]) -> Self {
        self.pages[page] = data;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_page(mut self, page: usize) -> Self {
        self.failing_pages.insert(page);
        self
    }

    pub fn page(&self, page: usize) -> Option<[u8; PAGE_SIZE]> {
        self.pages.get(page).copied()
    }

    /// Pages written successfully, in order
    pub fn write_log(&self) -> &[(usize, [u8; PAGE_SIZE])] {
        &self.write_log
    }

    pub fn close_count(&self) -> usize {
        self.close_count
    }
}

impl TagSession for EmulatedUltralight {
    fn connect(&mut self) -> Result<(), TagError> {
        connect_unless(self.fail_connect, &mut self.connected)
    }

    fn close(&mut self) -> Result<(), TagError> {
        self.connected = false;
        self.close_count += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl UltralightSession for EmulatedUltralight {
    fn ultralight_type(&self) -> UltralightType {
        self.kind
    }

    fn read_pages(&mut self, page: usize) -> Result<[u8; PAGE_SIZE * PAGES_PER_READ], TagError> {
        ensure_connected(self.connected)?;
        if self.fail_reads {
            return Err(TagError::Io("read timed out".into()));
        }
        if page >= self.pages.len() {
            return Err(TagError::Io(format!("page {page} out of range")));
        }

        let mut data = [0; PAGE_SIZE * PAGES_PER_READ];
        for (i, chunk) in data.chunks_exact_mut(PAGE_SIZE).enumerate() {
            chunk.copy_from_slice(&self.pages[(page + i) % self.pages.len()]);
        }
        Ok(data)
    }

    fn write_page(&mut self, page: usize, data: &[u8; PAGE_SIZE]) -> Result<(), TagError> {
        ensure_connected(self.connected)?;
        if self.failing_pages.contains(&page) {
            return Err(TagError::Io(format!("write to page {page} not acknowledged")));
        }
        let slot = self
            .pages
            .get_mut(page)
            .ok_or_else(|| TagError::Io(format!("page {page} out of range")))?;
        *slot = *data;
        self.write_log.push((page, *data));
        Ok(())
    }
}

/// A Classic tag held in memory, factory keyed unless told otherwise.
#[derive(Debug, Clone)]
pub struct EmulatedClassic {
    size: ClassicSize,
    blocks: Vec<[u8; BLOCK_SIZE]>,
    sector_keys: Vec<AuthKey>,
    authenticated: Option<usize>,
    auth_attempts: usize,
    read_log: Vec<usize>,
    failing_blocks: BTreeSet<usize>,
    connected: bool,
    close_count: usize,
}

impl EmulatedClassic {
    pub fn new(size: ClassicSize) -> Self {
        let mut tag = EmulatedClassic {
            size,
            blocks: vec![[0; BLOCK_SIZE]; size.block_count()],
            sector_keys: vec![AuthKey::DEFAULT; size.sector_count()],
            authenticated: None,
            auth_attempts: 0,
            read_log: Vec::new(),
            failing_blocks: BTreeSet::new(),
            connected: false,
            close_count: 0,
        };
        for sector in 0..size.sector_count() {
            tag.write_trailer(sector);
        }
        tag
    }

    fn write_trailer(&mut self, sector: usize) {
        let key = self.sector_keys[sector];
        let trailer = classic::sector_to_block(sector) + classic::blocks_in_sector(sector) - 1;
        let block = &mut self.blocks[trailer];
        block[..6].copy_from_slice(key.as_bytes());
        block[6..10].copy_from_slice(&FACTORY_ACCESS_BITS);
        block[10..].copy_from_slice(AuthKey::DEFAULT.as_bytes());
    }

    pub fn with_block(mut self, block: usize, data: [u8; BLOCK_SIZE]) -> Self {
        self.blocks[block] = data;
        self
    }

    /// Replaces key A of `sector`
    pub fn with_sector_key(mut self, sector: usize, key: AuthKey) -> Self {
        self.sector_keys[sector] = key;
        self.write_trailer(sector);
        self
    }

    pub fn failing_block(mut self, block: usize) -> Self {
        self.failing_blocks.insert(block);
        self
    }

    /// Blocks read, in order
    pub fn read_log(&self) -> &[usize] {
        &self.read_log
    }

    pub fn auth_attempts(&self) -> usize {
        self.auth_attempts
    }

    pub fn close_count(&self) -> usize {
        self.close_count
    }
}

impl TagSession for EmulatedClassic {
    fn connect(&mut self) -> Result<(), TagError> {
        connect_unless(false, &mut self.connected)
    }

    fn close(&mut self) -> Result<(), TagError> {
        self.connected = false;
        self.authenticated = None;
        self.close_count += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl ClassicSession for EmulatedClassic {
    fn size(&self) -> ClassicSize {
        self.size
    }

    fn authenticate_sector_with_key_a(
        &mut self,
        sector: usize,
        key: &AuthKey,
    ) -> Result<bool, TagError> {
        ensure_connected(self.connected)?;
        let expected = self
            .sector_keys
            .get(sector)
            .ok_or_else(|| TagError::Io(format!("sector {sector} out of range")))?;
        self.auth_attempts += 1;
        if expected == key {
            self.authenticated = Some(sector);
            Ok(true)
        } else {
            self.authenticated = None;
            Ok(false)
        }
    }

    fn read_block(&mut self, block: usize) -> Result<[u8; BLOCK_SIZE], TagError> {
        ensure_connected(self.connected)?;
        if self.failing_blocks.contains(&block) {
            return Err(TagError::Io(format!("read of block {block} timed out")));
        }
        let data = *self
            .blocks
            .get(block)
            .ok_or_else(|| TagError::Io(format!("block {block} out of range")))?;
        let sector = classic::block_to_sector(block);
        if self.authenticated != Some(sector) {
            return Err(TagError::Unauthenticated { sector });
        }
        self.read_log.push(block);
        Ok(data)
    }
}

/// A tag seen through its NDEF views.
#[derive(Debug, Clone)]
pub struct EmulatedNdefTag {
    formatted: bool,
    formatable: bool,
    writable: bool,
    max_size: usize,
    message: Option<Vec<u8>>,
    fail_writes: bool,
    fail_connect: bool,
    connected: bool,
    close_count: usize,
}

impl EmulatedNdefTag {
    /// A tag that already carries NDEF and holds `max_size` bytes.
    pub fn formatted(max_size: usize) -> Self {
        EmulatedNdefTag {
            formatted: true,
            formatable: false,
            writable: true,
            max_size,
            message: None,
            fail_writes: false,
            fail_connect: false,
            connected: false,
            close_count: 0,
        }
    }

    /// A blank tag that can be NDEF formatted.
    pub fn formatable() -> Self {
        EmulatedNdefTag {
            formatted: false,
            formatable: true,
            ..Self::formatted(137)
        }
    }

    /// A tag offering neither NDEF view.
    pub fn unsupported() -> Self {
        EmulatedNdefTag {
            formatted: false,
            formatable: false,
            ..Self::formatted(0)
        }
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn with_message(mut self, message: Vec<u8>) -> Self {
        self.message = Some(message);
        self
    }

    pub fn message(&self) -> Option<&[u8]> {
        self.message.as_deref()
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    pub fn close_count(&self) -> usize {
        self.close_count
    }
}

impl TagSession for EmulatedNdefTag {
    fn connect(&mut self) -> Result<(), TagError> {
        connect_unless(self.fail_connect, &mut self.connected)
    }

    fn close(&mut self) -> Result<(), TagError> {
        self.connected = false;
        self.close_count += 1;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl NdefSession for EmulatedNdefTag {
    fn is_writable(&self) -> bool {
        self.writable
    }

    fn max_size(&self) -> usize {
        self.max_size
    }

    fn read_ndef_message(&mut self) -> Result<Option<Vec<u8>>, TagError> {
        ensure_connected(self.connected)?;
        Ok(self.message.clone())
    }

    fn write_ndef_message(&mut self, message: &[u8]) -> Result<(), TagError> {
        ensure_connected(self.connected)?;
        if self.fail_writes {
            return Err(TagError::Io("tag lost during write".into()));
        }
        if !self.writable {
            return Err(TagError::ReadOnly);
        }
        if message.len() > self.max_size {
            return Err(TagError::InsufficientCapacity {
                needed: message.len(),
                available: self.max_size,
            });
        }
        self.message = Some(message.to_vec());
        Ok(())
    }
}

impl NdefFormatableSession for EmulatedNdefTag {
    fn format(&mut self, message: &[u8]) -> Result<(), TagError> {
        ensure_connected(self.connected)?;
        if self.fail_writes {
            return Err(TagError::Io("tag lost during format".into()));
        }
        self.formatted = true;
        self.formatable = false;
        self.message = Some(message.to_vec());
        Ok(())
    }
}

impl NdefTag for EmulatedNdefTag {
    fn ndef(&mut self) -> Option<&mut dyn NdefSession> {
        if self.formatted {
            Some(self as &mut dyn NdefSession)
        } else {
            None
        }
    }

    fn ndef_formatable(&mut self) -> Option<&mut dyn NdefFormatableSession> {
        if !self.formatted && self.formatable {
            Some(self as &mut dyn NdefFormatableSession)
        } else {
            None
        }
    }
}
