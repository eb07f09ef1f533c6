//! Writing a text record to whatever NDEF view a tag offers.

use crate::{
    config::AccessConfig,
    error::TagError,
    ndef::{self, NdefMessage, NdefRecord},
    session::{self, NdefFormatableSession, NdefSession, NdefTag},
};
use std::fmt;
use tracing::{debug, warn};

/// Result of [`write_text_record`], one per condition shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOutcome {
    Success,
    NoSession,
    ReadOnly,
    InsufficientCapacity { needed: usize, available: usize },
    UnsupportedFormat,
    WriteFailed,
}

impl WriteOutcome {
    /// Message for the user.
    pub fn message(&self) -> &'static str {
        match self {
            WriteOutcome::Success => "Text written to tag",
            WriteOutcome::NoSession => "No tag detected, hold the tag against the reader",
            WriteOutcome::ReadOnly => "Tag is read-only",
            WriteOutcome::InsufficientCapacity { .. } => "Tag is too small for this text",
            WriteOutcome::UnsupportedFormat => "Tag does not support NDEF",
            WriteOutcome::WriteFailed => "Writing to the tag failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WriteOutcome::Success)
    }

    pub fn into_result(self) -> Result<(), TagError> {
        match self {
            WriteOutcome::Success => Ok(()),
            WriteOutcome::NoSession => Err(TagError::SessionUnavailable("no tag session".into())),
            WriteOutcome::ReadOnly => Err(TagError::ReadOnly),
            WriteOutcome::InsufficientCapacity { needed, available } => {
                Err(TagError::InsufficientCapacity { needed, available })
            }
            WriteOutcome::UnsupportedFormat => Err(TagError::UnsupportedFormat),
            WriteOutcome::WriteFailed => Err(TagError::Io("write failed".into())),
        }
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Builds the text message described by `config`: one text record in the
/// configured language, followed by an application record when a package
/// is configured.
pub fn text_message(text: &str, config: &AccessConfig) -> Result<NdefMessage, TagError> {
    let message = ndef::encode_text_record(text, &config.language_code)?;
    Ok(match &config.application_package {
        Some(package) => message.with_record(NdefRecord::application(package)),
        None => message,
    })
}

/// Writes `message` to the tag.
///
/// Checks run in a fixed order and stop at the first failure: a tag must be
/// present, then if it carries NDEF it must be writable and large enough.
/// A tag without NDEF is formatted with the message when it can be, and
/// reported as unsupported otherwise.
pub fn write_text_record<T: NdefTag + ?Sized>(
    tag: Option<&mut T>,
    message: &NdefMessage,
) -> WriteOutcome {
    let Some(tag) = tag else {
        return WriteOutcome::NoSession;
    };

    let bytes = match message.to_bytes() {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "cannot encode NDEF message");
            return WriteOutcome::WriteFailed;
        }
    };

    let outcome = if let Some(ndef) = tag.ndef() {
        write_formatted(ndef, &bytes)
    } else if let Some(formatable) = tag.ndef_formatable() {
        format_with(formatable, &bytes)
    } else {
        WriteOutcome::UnsupportedFormat
    };

    debug!(?outcome, size = bytes.len(), "NDEF write finished");
    outcome
}

/// Encodes `text` per `config` and writes it, see [`write_text_record`].
pub fn write_text<T: NdefTag + ?Sized>(
    tag: Option<&mut T>,
    text: &str,
    config: &AccessConfig,
) -> WriteOutcome {
    match text_message(text, config) {
        Ok(message) => write_text_record(tag, &message),
        Err(err) => {
            warn!(error = %err, "cannot build text message");
            WriteOutcome::WriteFailed
        }
    }
}

fn write_formatted(session: &mut dyn NdefSession, bytes: &[u8]) -> WriteOutcome {
    let mut tag = match session::connect(session) {
        Ok(tag) => tag,
        Err(err) => {
            warn!(error = %err, "cannot connect NDEF session");
            return WriteOutcome::WriteFailed;
        }
    };

    if !tag.is_writable() {
        return WriteOutcome::ReadOnly;
    }
    let available = tag.max_size();
    if available < bytes.len() {
        return WriteOutcome::InsufficientCapacity {
            needed: bytes.len(),
            available,
        };
    }

    match tag.write_ndef_message(bytes) {
        Ok(()) => WriteOutcome::Success,
        Err(err) => {
            warn!(error = %err, "failed to write NDEF message");
            WriteOutcome::WriteFailed
        }
    }
}

fn format_with(session: &mut dyn NdefFormatableSession, bytes: &[u8]) -> WriteOutcome {
    let result = session::connect(session).and_then(|mut tag| tag.format(bytes));
    match result {
        Ok(()) => WriteOutcome::Success,
        Err(err) => {
            warn!(error = %err, "failed to format tag");
            WriteOutcome::WriteFailed
        }
    }
}
