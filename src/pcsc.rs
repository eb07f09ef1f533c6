//! Tag sessions over a PC/SC contactless reader.
//!
//! Uses the pseudo-APDUs that ACR122-class readers translate into MIFARE
//! commands. The reader cannot tell Ultralight variants or Classic sizes
//! apart, so the caller states what it expects to find on the reader.

use crate::{
    classic::{self, ClassicSize},
    error::TagError,
    keys::AuthKey,
    session::{ClassicSession, TagSession, UltralightSession, BLOCK_SIZE, PAGES_PER_READ, PAGE_SIZE},
    ultralight::UltralightType,
};
use pcsc::{Card, Context, Disposition, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE};
use std::ffi::CString;
use tracing::debug;

const SW_OK: [u8; 2] = [0x90, 0x00];
const SW_AUTH_FAILED: [u8; 2] = [0x63, 0x00];
const KEY_TYPE_A: u8 = 0x60;
const KEY_SLOT: u8 = 0x00;

impl From<pcsc::Error> for TagError {
    fn from(err: pcsc::Error) -> Self {
        TagError::Io(err.to_string())
    }
}

/// A PC/SC reader and the card currently connected on it.
pub struct PcscReader {
    ctx: Context,
    reader: CString,
    card: Option<Card>,
}

impl PcscReader {
    pub fn new(reader: CString) -> Result<Self, TagError> {
        let ctx = Context::establish(Scope::User).map_err(|err| {
            TagError::SessionUnavailable(format!("PC/SC service unavailable: {err}"))
        })?;
        Ok(PcscReader { ctx, reader, card: None })
    }

    /// Opens the first reader the PC/SC service lists.
    pub fn first_available() -> Result<Self, TagError> {
        let ctx = Context::establish(Scope::User).map_err(|err| {
            TagError::SessionUnavailable(format!("PC/SC service unavailable: {err}"))
        })?;
        let reader = ctx
            .list_readers_owned()?
            .into_iter()
            .next()
            .ok_or_else(|| TagError::SessionUnavailable("no reader connected".into()))?;
        debug!(reader = ?reader, "using PC/SC reader");
        Ok(PcscReader { ctx, reader, card: None })
    }

    /// Sends `apdu` and splits the response into data and status word.
    fn exchange(&self, apdu: &[u8]) -> Result<(Vec<u8>, [u8; 2]), TagError> {
        let card = self
            .card
            .as_ref()
            .ok_or_else(|| TagError::SessionUnavailable("no card connected".into()))?;
        let mut buffer = [0u8; MAX_BUFFER_SIZE];
        let response = card.transmit(apdu, &mut buffer)?;
        if response.len() < 2 {
            return Err(TagError::Io(format!("short response from reader: {response:02X?}")));
        }
        let (data, sw) = response.split_at(response.len() - 2);
        Ok((data.to_vec(), [sw[0], sw[1]]))
    }

    fn transmit(&self, apdu: &[u8]) -> Result<Vec<u8>, TagError> {
        let (data, sw) = self.exchange(apdu)?;
        if sw != SW_OK {
            return Err(TagError::Io(format!(
                "reader returned SW1={:02X} SW2={:02X}",
                sw[0], sw[1]
            )));
        }
        Ok(data)
    }

    /// READ BINARY of `len` bytes at `address`
    fn read_binary(&self, address: usize, len: u8) -> Result<Vec<u8>, TagError> {
        let data = self.transmit(&[0xFF, 0xB0, 0x00, address_byte(address)?, len])?;
        if data.len() < usize::from(len) {
            return Err(TagError::Io(format!("expected {len} bytes, got {}", data.len())));
        }
        Ok(data)
    }

    /// UPDATE BINARY of `data` at `address`
    fn update_binary(&self, address: usize, data: &[u8]) -> Result<(), TagError> {
        let len = u8::try_from(data.len()).map_err(|_| TagError::Io("update too long".into()))?;
        let mut apdu = vec![0xFF, 0xD6, 0x00, address_byte(address)?, len];
        apdu.extend_from_slice(data);
        self.transmit(&apdu).map(|_| ())
    }
}

fn address_byte(address: usize) -> Result<u8, TagError> {
    u8::try_from(address)
        .map_err(|_| TagError::Io(format!("address {address} beyond reader addressing")))
}

impl TagSession for PcscReader {
    fn connect(&mut self) -> Result<(), TagError> {
        if self.card.is_some() {
            return Ok(());
        }
        let card = self
            .ctx
            .connect(&self.reader, ShareMode::Shared, Protocols::ANY)
            .map_err(|err| TagError::SessionUnavailable(format!("no tag on reader: {err}")))?;
        self.card = Some(card);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TagError> {
        match self.card.take() {
            Some(card) => card.disconnect(Disposition::LeaveCard).map_err(|(_, err)| err.into()),
            None => Ok(()),
        }
    }

    fn is_connected(&self) -> bool {
        self.card.is_some()
    }
}

/// An Ultralight on a PC/SC reader.
pub struct PcscUltralight {
    reader: PcscReader,
    kind: UltralightType,
}

impl PcscUltralight {
    pub fn new(reader: PcscReader, kind: UltralightType) -> Self {
        PcscUltralight { reader, kind }
    }
}

impl TagSession for PcscUltralight {
    fn connect(&mut self) -> Result<(), TagError> {
        self.reader.connect()
    }

    fn close(&mut self) -> Result<(), TagError> {
        self.reader.close()
    }

    fn is_connected(&self) -> bool {
        self.reader.is_connected()
    }
}

impl UltralightSession for PcscUltralight {
    fn ultralight_type(&self) -> UltralightType {
        self.kind
    }

    fn read_pages(&mut self, page: usize) -> Result<[u8; PAGE_SIZE * PAGES_PER_READ], TagError> {
        let data = self.reader.read_binary(page, (PAGE_SIZE * PAGES_PER_READ) as u8)?;
        let mut pages = [0u8; PAGE_SIZE * PAGES_PER_READ];
        pages.copy_from_slice(&data[..PAGE_SIZE * PAGES_PER_READ]);
        Ok(pages)
    }

    fn write_page(&mut self, page: usize, data: &[u8; PAGE_SIZE]) -> Result<(), TagError> {
        self.reader.update_binary(page, data)
    }
}

/// A Classic on a PC/SC reader.
pub struct PcscClassic {
    reader: PcscReader,
    size: ClassicSize,
}

impl PcscClassic {
    pub fn new(reader: PcscReader, size: ClassicSize) -> Self {
        PcscClassic { reader, size }
    }
}

impl TagSession for PcscClassic {
    fn connect(&mut self) -> Result<(), TagError> {
        self.reader.connect()
    }

    fn close(&mut self) -> Result<(), TagError> {
        self.reader.close()
    }

    fn is_connected(&self) -> bool {
        self.reader.is_connected()
    }
}

impl ClassicSession for PcscClassic {
    fn size(&self) -> ClassicSize {
        self.size
    }

    fn authenticate_sector_with_key_a(
        &mut self,
        sector: usize,
        key: &AuthKey,
    ) -> Result<bool, TagError> {
        // LOAD KEYS into the reader's volatile slot, then GENERAL AUTHENTICATE
        let mut load = vec![0xFF, 0x82, 0x00, KEY_SLOT, 0x06];
        load.extend_from_slice(key.as_bytes());
        self.reader.transmit(&load)?;

        let block = address_byte(classic::sector_to_block(sector))?;
        let auth = [0xFF, 0x86, 0x00, 0x00, 0x05, 0x01, 0x00, block, KEY_TYPE_A, KEY_SLOT];
        match self.reader.exchange(&auth)?.1 {
            SW_OK => Ok(true),
            SW_AUTH_FAILED => Ok(false),
            [sw1, sw2] => Err(TagError::Io(format!(
                "authentication returned SW1={sw1:02X} SW2={sw2:02X}"
            ))),
        }
    }

    fn read_block(&mut self, block: usize) -> Result<[u8; BLOCK_SIZE], TagError> {
        let data = self.reader.read_binary(block, BLOCK_SIZE as u8)?;
        let mut bytes = [0u8; BLOCK_SIZE];
        bytes.copy_from_slice(&data[..BLOCK_SIZE]);
        Ok(bytes)
    }
}
