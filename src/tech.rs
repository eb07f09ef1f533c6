//! Classification of a tag from the technologies it advertises.
//!
//! Platforms report technologies as fully qualified class names such as
//! `android.nfc.tech.MifareClassic`; only the part after the last `.` is
//! significant here.

use std::fmt;

/// Technology advertised by a tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Technology {
    NfcA,
    NfcB,
    NfcF,
    NfcV,
    IsoDep,
    Ndef,
    NdefFormatable,
    MifareClassic,
    MifareUltralight,
    NfcBarcode,
    Other(String),
}

impl Technology {
    /// Parses a fully qualified or simple technology name.
    pub fn from_identifier(identifier: &str) -> Technology {
        match simplify_identifier(identifier) {
            "NfcA" => Technology::NfcA,
            "NfcB" => Technology::NfcB,
            "NfcF" => Technology::NfcF,
            "NfcV" => Technology::NfcV,
            "IsoDep" => Technology::IsoDep,
            "Ndef" => Technology::Ndef,
            "NdefFormatable" => Technology::NdefFormatable,
            "MifareClassic" => Technology::MifareClassic,
            "MifareUltralight" => Technology::MifareUltralight,
            "NfcBarcode" => Technology::NfcBarcode,
            other => Technology::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Technology::NfcA => "NfcA",
            Technology::NfcB => "NfcB",
            Technology::NfcF => "NfcF",
            Technology::NfcV => "NfcV",
            Technology::IsoDep => "IsoDep",
            Technology::Ndef => "Ndef",
            Technology::NdefFormatable => "NdefFormatable",
            Technology::MifareClassic => "MifareClassic",
            Technology::MifareUltralight => "MifareUltralight",
            Technology::NfcBarcode => "NfcBarcode",
            Technology::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// Memory family of a tag.
///
/// Ultralight tags are further split into plain and C by
/// [`crate::ultralight::UltralightType`], which only a live session reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagFamily {
    /// Sector and block addressed, see [`crate::classic`]
    Classic,
    /// Page addressed, see [`crate::ultralight`]
    Ultralight,
    /// ISO 14443-3A without a memory model this crate knows
    NfcA,
    Unknown,
}

/// Part of `identifier` after the last `.`, or all of it when there is none.
pub fn simplify_identifier(identifier: &str) -> &str {
    identifier.rsplit('.').next().unwrap_or(identifier)
}

/// Picks the family of a tag: Classic, then Ultralight, then NfcA.
///
/// Precedence is fixed and independent of the order the identifiers come in.
pub fn classify_family<S: AsRef<str>>(identifiers: &[S]) -> TagFamily {
    let techs: Vec<Technology> = identifiers
        .iter()
        .map(|id| Technology::from_identifier(id.as_ref()))
        .collect();

    if techs.contains(&Technology::MifareClassic) {
        TagFamily::Classic
    } else if techs.contains(&Technology::MifareUltralight) {
        TagFamily::Ultralight
    } else if techs.contains(&Technology::NfcA) {
        TagFamily::NfcA
    } else {
        TagFamily::Unknown
    }
}

/// Whether the tag already exposes an NDEF mapping.
pub fn supports_ndef<S: AsRef<str>>(identifiers: &[S]) -> bool {
    identifiers
        .iter()
        .any(|id| Technology::from_identifier(id.as_ref()) == Technology::Ndef)
}

/// Simple names of all identifiers, each followed by a comma.
pub fn tech_list_string<S: AsRef<str>>(identifiers: &[S]) -> String {
    identifiers
        .iter()
        .map(|id| format!("{},", simplify_identifier(id.as_ref())))
        .collect()
}

/// Simple name of the first MIFARE technology in `identifiers`, in the order
/// given.
pub fn mifare_type_name<S: AsRef<str>>(identifiers: &[S]) -> Option<String> {
    identifiers
        .iter()
        .map(|id| Technology::from_identifier(id.as_ref()))
        .find(|tech| matches!(tech, Technology::MifareClassic | Technology::MifareUltralight))
        .map(|tech| tech.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NFC_A: &str = "android.nfc.tech.NfcA";
    const CLASSIC: &str = "android.nfc.tech.MifareClassic";
    const ULTRALIGHT: &str = "android.nfc.tech.MifareUltralight";
    const NDEF: &str = "android.nfc.tech.Ndef";

    #[test]
    fn simplify_keeps_last_segment() {
        assert_eq!(simplify_identifier(CLASSIC), "MifareClassic");
        assert_eq!(simplify_identifier("a.b."), "");
        assert_eq!(simplify_identifier("NfcA"), "NfcA");
    }

    #[test]
    fn classic_wins_regardless_of_order() {
        assert_eq!(classify_family(&[NFC_A, CLASSIC]), TagFamily::Classic);
        assert_eq!(classify_family(&[CLASSIC, NFC_A]), TagFamily::Classic);
        assert_eq!(classify_family(&[ULTRALIGHT, CLASSIC]), TagFamily::Classic);
    }

    #[test]
    fn ultralight_beats_nfc_a() {
        assert_eq!(classify_family(&[NFC_A, ULTRALIGHT, NDEF]), TagFamily::Ultralight);
    }

    #[test]
    fn nfc_a_only_and_unknown() {
        assert_eq!(classify_family(&[NFC_A, NDEF]), TagFamily::NfcA);
        assert_eq!(classify_family(&["android.nfc.tech.IsoDep"]), TagFamily::Unknown);
        assert_eq!(classify_family::<&str>(&[]), TagFamily::Unknown);
    }

    #[test]
    fn ndef_support_requires_ndef_tech() {
        assert!(supports_ndef(&[NFC_A, NDEF]));
        assert!(!supports_ndef(&[NFC_A, "android.nfc.tech.NdefFormatable"]));
    }

    #[test]
    fn owned_identifiers_are_accepted() {
        let ids = vec![NFC_A.to_string(), CLASSIC.to_string()];
        assert_eq!(classify_family(&ids), TagFamily::Classic);
    }

    #[test]
    fn tech_list_is_comma_terminated() {
        assert_eq!(tech_list_string(&[NFC_A, CLASSIC]), "NfcA,MifareClassic,");
        assert_eq!(tech_list_string::<&str>(&[]), "");
    }

    #[test]
    fn mifare_name_follows_given_order() {
        assert_eq!(
            mifare_type_name(&[NFC_A, ULTRALIGHT, CLASSIC]).as_deref(),
            Some("MifareUltralight")
        );
        assert_eq!(mifare_type_name(&[NFC_A]), None);
    }

    #[test]
    fn unknown_technologies_keep_their_name() {
        let tech = Technology::from_identifier("com.vendor.tech.Felica");
        assert_eq!(tech, Technology::Other("Felica".into()));
        assert_eq!(tech.to_string(), "Felica");
    }
}
