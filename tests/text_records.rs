mod common;

use common::*;
use mifare_ndef::{ndef, writer, NdefRecord, WriteOutcome};

#[test]
fn written_text_reads_back() {
    let config = AccessConfig::from_json(r#"{"language_code": "fr"}"#).unwrap();
    let mut tag = EmulatedNdefTag::formatted(144);

    let outcome = writer::write_text(Some(&mut tag), "bonjour à tous", &config);
    assert_eq!(outcome, WriteOutcome::Success);

    let record = ndef::read_text_record(&mut tag).unwrap();
    assert_eq!(record.language_code, "fr");
    assert_eq!(record.text, "bonjour à tous");
    assert_eq!(tag.close_count(), 2);
}

#[test]
fn application_record_follows_text() {
    let config = AccessConfig {
        application_package: Some("com.example.reader".into()),
        ..AccessConfig::default()
    };
    let mut tag = EmulatedNdefTag::formatable();

    assert!(writer::write_text(Some(&mut tag), "你好", &config).is_success());
    assert!(tag.is_formatted());

    let message = mifare_ndef::NdefMessage::parse(tag.message().unwrap()).unwrap();
    assert_eq!(message.records.len(), 2);
    assert_eq!(message.records[1], NdefRecord::application("com.example.reader"));

    let record = ndef::decode_text_record(&message).unwrap();
    assert_eq!(record.language_code, "en");
    assert_eq!(record.text, "你好");
}

#[test]
fn blank_tag_has_no_text() {
    let mut tag = EmulatedNdefTag::formatted(144);
    assert!(matches!(ndef::read_text_record(&mut tag), Err(TagError::RecordNotFound)));

    let mut garbage = EmulatedNdefTag::formatted(144).with_message(vec![0x00, 0x01]);
    assert!(matches!(ndef::read_text_record(&mut garbage), Err(TagError::RecordNotFound)));
}

#[test]
fn write_failures_surface_as_outcomes() {
    let config = AccessConfig::default();

    let mut locked = EmulatedNdefTag::formatted(144).read_only();
    let outcome = writer::write_text(Some(&mut locked), "text", &config);
    assert_eq!(outcome, WriteOutcome::ReadOnly);
    assert!(matches!(outcome.into_result(), Err(TagError::ReadOnly)));

    let mut bare = EmulatedNdefTag::unsupported();
    assert_eq!(
        writer::write_text(Some(&mut bare), "text", &config),
        WriteOutcome::UnsupportedFormat
    );

    assert_eq!(
        writer::write_text::<EmulatedNdefTag>(None, "text", &config),
        WriteOutcome::NoSession
    );
}

#[test]
fn long_language_code_fails_the_write() {
    let config = AccessConfig {
        language_code: "x".repeat(64),
        ..AccessConfig::default()
    };
    assert!(config.validate().is_err());

    let mut tag = EmulatedNdefTag::formatted(144);
    assert_eq!(
        writer::write_text(Some(&mut tag), "text", &config),
        WriteOutcome::WriteFailed
    );
    assert_eq!(tag.message(), None);
}
