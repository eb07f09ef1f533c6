//! NDEF messages and the well-known text record.
//!
//! A message is a run of records, each framed by a flags byte, the type
//! length, a 1 or 4 byte payload length and an optional id length. The text
//! record payload starts with a status byte whose low 6 bits hold the length
//! of the language code that follows; the rest is the text.

use crate::{
    error::TagError,
    session::{self, NdefSession},
};
use binrw::{BinRead, BinWrite};
use std::io::Cursor;
use tracing::{debug, warn};

const FLAG_MB: u8 = 0x80;
const FLAG_ME: u8 = 0x40;
const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;

/// Record type of the well-known text record
pub const RTD_TEXT: &[u8] = b"T";
/// Record type of the Android application record
pub const ANDROID_APPLICATION_TYPE: &[u8] = b"android.com:pkg";

const STATUS_UTF16: u8 = 0x80;
const LANGUAGE_LENGTH_MASK: u8 = 0x3F;
/// Longest language code the status byte can describe
pub const MAX_LANGUAGE_CODE_LEN: usize = LANGUAGE_LENGTH_MASK as usize;

/// Type name format of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tnf {
    Empty,
    WellKnown,
    Mime,
    AbsoluteUri,
    External,
    Unknown,
    Unchanged,
    Reserved,
}

impl Tnf {
    fn from_bits(bits: u8) -> Tnf {
        match bits & TNF_MASK {
            0x00 => Tnf::Empty,
            0x01 => Tnf::WellKnown,
            0x02 => Tnf::Mime,
            0x03 => Tnf::AbsoluteUri,
            0x04 => Tnf::External,
            0x05 => Tnf::Unknown,
            0x06 => Tnf::Unchanged,
            _ => Tnf::Reserved,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Tnf::Empty => 0x00,
            Tnf::WellKnown => 0x01,
            Tnf::Mime => 0x02,
            Tnf::AbsoluteUri => 0x03,
            Tnf::External => 0x04,
            Tnf::Unknown => 0x05,
            Tnf::Unchanged => 0x06,
            Tnf::Reserved => 0x07,
        }
    }
}

/// On-the-wire framing of one record.
#[derive(BinRead, BinWrite, Debug)]
#[brw(big)]
struct RecordFrame {
    flags: u8,
    type_length: u8,
    #[br(if(flags & FLAG_SR != 0))]
    short_payload_length: Option<u8>,
    #[br(if(flags & FLAG_SR == 0))]
    payload_length: Option<u32>,
    #[br(if(flags & FLAG_IL != 0))]
    id_length: Option<u8>,
    #[br(count = type_length as usize)]
    record_type: Vec<u8>,
    #[br(count = id_length.unwrap_or(0) as usize)]
    id: Vec<u8>,
    #[br(count = short_payload_length.map(u32::from).or(payload_length).unwrap_or(0) as usize)]
    payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NdefRecord {
    pub tnf: Tnf,
    pub record_type: Vec<u8>,
    pub id: Vec<u8>,
    pub payload: Vec<u8>,
}

impl NdefRecord {
    pub fn new(tnf: Tnf, record_type: &[u8], id: &[u8], payload: Vec<u8>) -> Self {
        NdefRecord {
            tnf,
            record_type: record_type.to_vec(),
            id: id.to_vec(),
            payload,
        }
    }

    /// Well-known text record, UTF-8 encoded, with an empty id.
    pub fn text(text: &str, language_code: &str) -> Result<NdefRecord, TagError> {
        validate_language_code(language_code)?;

        let language = language_code.as_bytes();
        let mut payload = Vec::with_capacity(1 + language.len() + text.len());
        payload.push(language.len() as u8);
        payload.extend_from_slice(language);
        payload.extend_from_slice(text.as_bytes());

        Ok(NdefRecord::new(Tnf::WellKnown, RTD_TEXT, &[], payload))
    }

    /// Android application record naming `package`.
    ///
    /// A phone that reads a message containing this record hands it to the
    /// named application.
    pub fn application(package: &str) -> NdefRecord {
        NdefRecord::new(Tnf::External, ANDROID_APPLICATION_TYPE, &[], package.as_bytes().to_vec())
    }

    pub fn is_text(&self) -> bool {
        self.tnf == Tnf::WellKnown && self.record_type == RTD_TEXT
    }

    fn frame(&self, first: bool, last: bool) -> Result<RecordFrame, TagError> {
        let type_length = u8::try_from(self.record_type.len())
            .map_err(|_| TagError::MalformedMessage("record type longer than 255 bytes".into()))?;
        let id_length = u8::try_from(self.id.len())
            .map_err(|_| TagError::MalformedMessage("record id longer than 255 bytes".into()))?;
        let short = u8::try_from(self.payload.len()).ok();

        let mut flags = self.tnf.bits();
        if first {
            flags |= FLAG_MB;
        }
        if last {
            flags |= FLAG_ME;
        }
        if short.is_some() {
            flags |= FLAG_SR;
        }
        if id_length > 0 {
            flags |= FLAG_IL;
        }

        let payload_length = match short {
            Some(_) => None,
            None => Some(
                u32::try_from(self.payload.len())
                    .map_err(|_| TagError::MalformedMessage("payload longer than 4 GiB".into()))?,
            ),
        };

        Ok(RecordFrame {
            flags,
            type_length,
            short_payload_length: short,
            payload_length,
            id_length: (id_length > 0).then_some(id_length),
            record_type: self.record_type.clone(),
            id: self.id.clone(),
            payload: self.payload.clone(),
        })
    }
}

/// An ordered list of records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NdefMessage {
    pub records: Vec<NdefRecord>,
}

impl NdefMessage {
    pub fn new(records: Vec<NdefRecord>) -> Self {
        NdefMessage { records }
    }

    pub fn first(&self) -> Option<&NdefRecord> {
        self.records.first()
    }

    /// Appends `record`, e.g. an [`NdefRecord::application`] record.
    pub fn with_record(mut self, record: NdefRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TagError> {
        let mut cursor = Cursor::new(Vec::new());
        let last = self.records.len().saturating_sub(1);
        for (index, record) in self.records.iter().enumerate() {
            record.frame(index == 0, index == last)?.write(&mut cursor)?;
        }
        Ok(cursor.into_inner())
    }

    /// Parses records up to the one flagged as message end.
    ///
    /// Chunked records are rejected; tags written by this crate never use
    /// them.
    pub fn parse(bytes: &[u8]) -> Result<NdefMessage, TagError> {
        if bytes.is_empty() {
            return Err(TagError::MalformedMessage("empty message".into()));
        }

        let mut cursor = Cursor::new(bytes);
        let mut records = Vec::new();
        loop {
            let frame = RecordFrame::read(&mut cursor)?;
            if frame.flags & FLAG_CF != 0 {
                return Err(TagError::MalformedMessage("chunked records are not supported".into()));
            }
            if records.is_empty() && frame.flags & FLAG_MB == 0 {
                return Err(TagError::MalformedMessage("first record lacks the begin flag".into()));
            }
            let end = frame.flags & FLAG_ME != 0;
            records.push(NdefRecord {
                tnf: Tnf::from_bits(frame.flags),
                record_type: frame.record_type,
                id: frame.id,
                payload: frame.payload,
            });
            if end || cursor.position() as usize >= bytes.len() {
                break;
            }
        }
        Ok(NdefMessage { records })
    }
}

/// Language code and text of a decoded text record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub language_code: String,
    pub text: String,
}

fn validate_language_code(language_code: &str) -> Result<(), TagError> {
    if !language_code.is_ascii() || language_code.len() > MAX_LANGUAGE_CODE_LEN {
        return Err(TagError::InvalidLanguageCode(language_code.to_string()));
    }
    Ok(())
}

/// Builds a message holding one UTF-8 text record.
pub fn encode_text_record(text: &str, language_code: &str) -> Result<NdefMessage, TagError> {
    Ok(NdefMessage::new(vec![NdefRecord::text(text, language_code)?]))
}

/// Decodes the first record of `message` as a text record.
///
/// The payload is always read as UTF-8; the UTF-16 flag of the status byte
/// is not consulted, so UTF-16 text comes back garbled. The record type is
/// not checked either.
pub fn decode_text_record(message: &NdefMessage) -> Result<TextRecord, TagError> {
    let record = message.first().ok_or(TagError::RecordNotFound)?;
    if !record.is_text() {
        debug!(tnf = ?record.tnf, "first record is not a text record");
    }

    let (&status, rest) = record.payload.split_first().ok_or(TagError::RecordNotFound)?;
    if status & STATUS_UTF16 != 0 {
        debug!("text record flags UTF-16, decoding as UTF-8");
    }
    let language_length = usize::from(status & LANGUAGE_LENGTH_MASK);
    if language_length > rest.len() {
        return Err(TagError::RecordNotFound);
    }
    let (language, text) = rest.split_at(language_length);

    Ok(TextRecord {
        language_code: String::from_utf8_lossy(language).into_owned(),
        text: String::from_utf8_lossy(text).into_owned(),
    })
}

/// Parses raw message bytes and decodes their first text record.
pub fn decode_text_message(bytes: &[u8]) -> Result<TextRecord, TagError> {
    let message = NdefMessage::parse(bytes).map_err(|err| {
        debug!(error = %err, "cannot parse NDEF message");
        TagError::RecordNotFound
    })?;
    decode_text_record(&message)
}

/// Reads the tag's NDEF message and decodes its first text record.
pub fn read_text_record<S: NdefSession + ?Sized>(session: &mut S) -> Result<TextRecord, TagError> {
    let mut tag = session::connect(session)?;
    let bytes = tag.read_ndef_message().map_err(|err| {
        warn!(error = %err, "failed to read NDEF message");
        err
    })?;
    match bytes {
        Some(bytes) => decode_text_message(&bytes),
        None => Err(TagError::RecordNotFound),
    }
}

const TLV_NULL: u8 = 0x00;
const TLV_NDEF: u8 = 0x03;
const TLV_TERMINATOR: u8 = 0xFE;
const TLV_LONG_LENGTH: u8 = 0xFF;

/// Wraps message bytes in an NDEF TLV followed by a terminator, the layout
/// Type 2 tags expect from page 4 on.
pub fn wrap_tlv(message: &[u8]) -> Result<Vec<u8>, TagError> {
    let mut tlv = Vec::with_capacity(message.len() + 5);
    tlv.push(TLV_NDEF);
    match message.len() {
        len if len < usize::from(TLV_LONG_LENGTH) => tlv.push(len as u8),
        len => {
            let len = u16::try_from(len)
                .map_err(|_| TagError::MalformedMessage("message too long for a TLV".into()))?;
            tlv.push(TLV_LONG_LENGTH);
            tlv.extend_from_slice(&len.to_be_bytes());
        }
    }
    tlv.extend_from_slice(message);
    tlv.push(TLV_TERMINATOR);
    Ok(tlv)
}

/// Finds the first NDEF TLV in tag memory and returns its value.
///
/// Null TLVs are skipped, other TLVs are stepped over by their length.
pub fn unwrap_tlv(memory: &[u8]) -> Result<&[u8], TagError> {
    let truncated = || TagError::MalformedMessage("TLV runs past the end of memory".into());
    let mut pos = 0;
    while pos < memory.len() {
        let tag = memory[pos];
        pos += 1;
        match tag {
            TLV_NULL => continue,
            TLV_TERMINATOR => break,
            _ => {}
        }

        let first = *memory.get(pos).ok_or_else(truncated)?;
        pos += 1;
        let len = if first == TLV_LONG_LENGTH {
            let bytes = memory.get(pos..pos + 2).ok_or_else(truncated)?;
            pos += 2;
            usize::from(u16::from_be_bytes([bytes[0], bytes[1]]))
        } else {
            usize::from(first)
        };

        let value = memory.get(pos..pos + len).ok_or_else(truncated)?;
        if tag == TLV_NDEF {
            return Ok(value);
        }
        pos += len;
    }
    Err(TagError::RecordNotFound)
}
