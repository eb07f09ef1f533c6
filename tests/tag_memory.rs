mod common;

use common::*;
use mifare_ndef::{classic, ndef, tech, ultralight, NdefMessage, TagFamily};

#[test]
fn locked_sector_is_left_out_of_classic_dump() {
    let mut tag = classic_with_locked_sector()
        .with_block(12, [0xAB; 16])
        .with_block(16, [0x5A; 16]);

    let dump = classic::read_all_blocks(&mut tag).expect("dump");
    let blocks: Vec<&str> = dump.split_whitespace().collect();

    assert_eq!(blocks.len(), 60);
    assert!(!dump.contains(&"ab".repeat(16)));
    assert!(dump.contains(&format!("0x{}", "5a".repeat(16))));
    assert!(!tag.read_log().iter().any(|block| (12..16).contains(block)));
    assert_eq!(tag.auth_attempts(), 16);
    assert_eq!(tag.close_count(), 1);
}

#[test]
fn private_key_opens_only_its_sector() {
    let mut tag = classic_with_locked_sector();
    let dump = classic::read_all_blocks_with_key(&mut tag, &PRIVATE_KEY).expect("dump");
    assert_eq!(dump.split_whitespace().count(), 4);
    assert_eq!(tag.read_log(), &[12, 13, 14, 15]);
}

#[test]
fn classic_tag_is_classified_before_reading() {
    assert_eq!(tech::classify_family(CLASSIC_TECHS), TagFamily::Classic);
    assert_eq!(tech::mifare_type_name(CLASSIC_TECHS).as_deref(), Some("MifareClassic"));
    assert!(!tech::supports_ndef(CLASSIC_TECHS));
}

#[test]
fn ultralight_page_group_reads_text() {
    let mut tag = ultralight_c_with_text(b"hello world");
    assert_eq!(ultralight::read_page_group(&mut tag, 4).as_deref(), Some("hello world"));
    assert_eq!(ultralight::read_page_group(&mut tag, 44).as_deref(), Some(""));
    assert_eq!(ultralight::read_page_group(&mut tag, 45), None);
    assert_eq!(tag.close_count(), 2);
}

#[test]
fn five_bytes_take_two_pages() {
    let mut tag = EmulatedUltralight::new(UltralightType::UltralightC);
    ultralight::write_groups(&mut tag, 4, b"abcde").unwrap();

    assert_eq!(tag.write_log(), &[(4, *b"abcd"), (5, [b'e', 0, 0, 0])]);
    assert_eq!(ultralight::read_page_group(&mut tag, 4).as_deref(), Some("abcde"));
}

#[test]
fn ultralight_variants_report_differently() {
    let mut plain = EmulatedUltralight::new(UltralightType::Ultralight);
    assert_eq!(ultralight::read_all(&mut plain).as_deref(), Some(""));
    ultralight::write_groups(&mut plain, 4, b"ignored").unwrap();
    assert!(plain.write_log().is_empty());

    let mut unknown = EmulatedUltralight::new(UltralightType::Unknown);
    assert_eq!(ultralight::read_all(&mut unknown), None);
    assert!(matches!(
        ultralight::write_groups(&mut unknown, 4, b"x"),
        Err(TagError::UnsupportedFamily)
    ));
    assert_eq!(unknown.close_count(), 2);
}

#[test]
fn text_message_survives_ultralight_memory() {
    assert_eq!(tech::classify_family(ULTRALIGHT_TECHS), TagFamily::Ultralight);

    let message = ndef::encode_text_record("hi", "en").unwrap().to_bytes().unwrap();
    let mut tag = EmulatedUltralight::new(UltralightType::UltralightC);
    ultralight::write_groups(&mut tag, 4, &ndef::wrap_tlv(&message).unwrap()).unwrap();

    let memory: Vec<u8> = (4..16).filter_map(|page| tag.page(page)).flatten().collect();
    let stored = ndef::unwrap_tlv(&memory).unwrap();
    assert_eq!(stored, &message[..]);

    let record = ndef::decode_text_record(&NdefMessage::parse(stored).unwrap()).unwrap();
    assert_eq!(record.language_code, "en");
    assert_eq!(record.text, "hi");
}
