//! Shared fixtures for the integration tests.

#![allow(dead_code, unused_imports)]

pub use mifare_ndef::{
    emulated::{EmulatedClassic, EmulatedNdefTag, EmulatedUltralight},
    AccessConfig, AuthKey, ClassicSize, TagError, UltralightType,
};

pub const CLASSIC_TECHS: &[&str] = &[
    "android.nfc.tech.NfcA",
    "android.nfc.tech.MifareClassic",
    "android.nfc.tech.NdefFormatable",
];

pub const ULTRALIGHT_TECHS: &[&str] = &[
    "android.nfc.tech.NfcA",
    "android.nfc.tech.MifareUltralight",
    "android.nfc.tech.Ndef",
];

/// A key no factory tag carries
pub const PRIVATE_KEY: AuthKey = AuthKey::new([0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC]);

/// A 1K Classic whose sector 3 is locked with [`PRIVATE_KEY`].
pub fn classic_with_locked_sector() -> EmulatedClassic {
    EmulatedClassic::new(ClassicSize::OneK).with_sector_key(3, PRIVATE_KEY)
}

/// An Ultralight C with `text` written from page 4 on.
pub fn ultralight_c_with_text(text: &[u8]) -> EmulatedUltralight {
    let mut tag = EmulatedUltralight::new(UltralightType::UltralightC);
    for (offset, chunk) in text.chunks(4).enumerate() {
        let mut page = [0u8; 4];
        page[..chunk.len()].copy_from_slice(chunk);
        tag = tag.with_page(4 + offset, page);
    }
    tag
}
