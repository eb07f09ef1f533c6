//! Memory access for MIFARE Ultralight and MIFARE Classic tags, plus a codec
//! for NDEF text records.
//!
//! Tags are reached through the session traits in [`session`]. Every read or
//! write opens the session on entry and closes it on every exit path, and
//! failures on the tag are logged through `tracing` and reported as absent
//! results rather than panics.

pub mod classic;
pub mod codec;
pub mod config;
pub mod emulated;
pub mod error;
pub mod keys;
pub mod ndef;
#[cfg(feature = "pcsc")]
pub mod pcsc;
pub mod session;
pub mod tech;
pub mod ultralight;
pub mod writer;

pub use classic::ClassicSize;
pub use config::AccessConfig;
pub use error::TagError;
pub use keys::AuthKey;
pub use ndef::{NdefMessage, NdefRecord, TextRecord, Tnf};
pub use session::{
    ClassicSession, NdefFormatableSession, NdefSession, NdefTag, TagSession, UltralightSession,
};
pub use tech::{TagFamily, Technology};
pub use ultralight::UltralightType;
pub use writer::WriteOutcome;
