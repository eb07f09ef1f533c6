//! Sector-addressed access to MIFARE Classic tags.
//!
//! Memory is split into sectors, each guarded by its own key pair. The first
//! 32 sectors hold 4 blocks of 16 bytes; on a 4K tag the remaining 8 sectors
//! hold 16 blocks each. The last block of every sector is the trailer, which
//! stores key A, the access bits and key B.

use crate::{
    codec,
    error::TagError,
    keys::AuthKey,
    session::{self, ClassicSession, BLOCK_SIZE},
};
use tracing::{debug, warn};

/// Sectors that use the small 4-block layout
const SMALL_SECTORS: usize = 32;
const BLOCKS_PER_SMALL_SECTOR: usize = 4;
const BLOCKS_PER_LARGE_SECTOR: usize = 16;

/// Capacity variant of a Classic tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassicSize {
    Mini,
    OneK,
    TwoK,
    FourK,
}

impl ClassicSize {
    /// Maps a capacity in bytes to its variant
    pub fn from_bytes(size: usize) -> Option<ClassicSize> {
        match size {
            320 => Some(ClassicSize::Mini),
            1024 => Some(ClassicSize::OneK),
            2048 => Some(ClassicSize::TwoK),
            4096 => Some(ClassicSize::FourK),
            _ => None,
        }
    }

    pub fn bytes(self) -> usize {
        self.block_count() * BLOCK_SIZE
    }

    pub fn sector_count(self) -> usize {
        match self {
            ClassicSize::Mini => 5,
            ClassicSize::OneK => 16,
            ClassicSize::TwoK => 32,
            ClassicSize::FourK => 40,
        }
    }

    pub fn block_count(self) -> usize {
        (0..self.sector_count()).map(blocks_in_sector).sum()
    }
}

pub fn blocks_in_sector(sector: usize) -> usize {
    if sector < SMALL_SECTORS {
        BLOCKS_PER_SMALL_SECTOR
    } else {
        BLOCKS_PER_LARGE_SECTOR
    }
}

/// First absolute block of `sector`
pub fn sector_to_block(sector: usize) -> usize {
    if sector < SMALL_SECTORS {
        sector * BLOCKS_PER_SMALL_SECTOR
    } else {
        SMALL_SECTORS * BLOCKS_PER_SMALL_SECTOR + (sector - SMALL_SECTORS) * BLOCKS_PER_LARGE_SECTOR
    }
}

/// Sector holding the absolute block `block`
pub fn block_to_sector(block: usize) -> usize {
    let small_blocks = SMALL_SECTORS * BLOCKS_PER_SMALL_SECTOR;
    if block < small_blocks {
        block / BLOCKS_PER_SMALL_SECTOR
    } else {
        SMALL_SECTORS + (block - small_blocks) / BLOCKS_PER_LARGE_SECTOR
    }
}

/// Whether `block` holds its sector's keys and access bits
pub fn is_trailer_block(block: usize) -> bool {
    let sector = block_to_sector(block);
    block == sector_to_block(sector) + blocks_in_sector(sector) - 1
}

/// Dumps every block the factory key opens, as space separated hex.
///
/// See [`read_all_blocks_with_key`].
pub fn read_all_blocks<S: ClassicSession + ?Sized>(session: &mut S) -> Option<String> {
    read_all_blocks_with_key(session, &AuthKey::DEFAULT)
}

/// Dumps every block of every sector that accepts `key` as key A.
///
/// Sectors are authenticated once each and visited in order. A sector that
/// rejects the key is skipped without reading any of its blocks. Trailer
/// blocks are included. Each block is followed by a single space.
///
/// Returns `None` if the session fails; the failure is logged.
pub fn read_all_blocks_with_key<S: ClassicSession + ?Sized>(
    session: &mut S,
    key: &AuthKey,
) -> Option<String> {
    match dump_blocks(session, key) {
        Ok(report) => Some(report),
        Err(err) => {
            warn!(error = %err, "failed to read classic blocks");
            None
        }
    }
}

fn dump_blocks<S: ClassicSession + ?Sized>(
    session: &mut S,
    key: &AuthKey,
) -> Result<String, TagError> {
    let mut tag = session::connect(session)?;
    let size = tag.size();
    let mut report = String::new();

    for sector in 0..size.sector_count() {
        match tag.authenticate_sector_with_key_a(sector, key) {
            Ok(true) => {}
            Ok(false) | Err(TagError::Unauthenticated { .. }) => {
                debug!(sector, "sector rejected key, skipping");
                continue;
            }
            Err(err) => return Err(err),
        }

        let first = sector_to_block(sector);
        for block in first..first + blocks_in_sector(sector) {
            let data = tag.read_block(block)?;
            if let Some(hex) = codec::bytes_to_hex(Some(&data[..])) {
                report.push_str(&hex);
                report.push(' ');
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulated::EmulatedClassic;

    #[test]
    fn sizes_match_capacity() {
        assert_eq!(ClassicSize::Mini.bytes(), 320);
        assert_eq!(ClassicSize::OneK.bytes(), 1024);
        assert_eq!(ClassicSize::TwoK.bytes(), 2048);
        assert_eq!(ClassicSize::FourK.bytes(), 4096);
        assert_eq!(ClassicSize::FourK.block_count(), 256);
        assert_eq!(ClassicSize::from_bytes(4096), Some(ClassicSize::FourK));
        assert_eq!(ClassicSize::from_bytes(1000), None);
    }

    #[test]
    fn large_sectors_follow_small_ones() {
        assert_eq!(sector_to_block(31), 124);
        assert_eq!(sector_to_block(32), 128);
        assert_eq!(sector_to_block(39), 240);
        assert_eq!(block_to_sector(127), 31);
        assert_eq!(block_to_sector(143), 32);
        assert_eq!(block_to_sector(144), 33);
    }

    #[test]
    fn trailers_end_each_sector() {
        assert!(is_trailer_block(3));
        assert!(is_trailer_block(63));
        assert!(!is_trailer_block(4));
        assert!(!is_trailer_block(131));
        assert!(is_trailer_block(143));
        assert!(is_trailer_block(255));
    }

    #[test]
    fn dump_includes_all_blocks_and_trailers() {
        let mut tag = EmulatedClassic::new(ClassicSize::OneK).with_block(1, [0xAB; 16]);
        let report = read_all_blocks(&mut tag).unwrap();
        let blocks: Vec<&str> = report.split_whitespace().collect();

        assert_eq!(blocks.len(), 64);
        assert_eq!(blocks[1], format!("0x{}", "ab".repeat(16)));
        // factory trailer: key A, access bits, key B
        assert_eq!(blocks[3], "0xffffffffffffff078069ffffffffffff");
        assert!(report.ends_with(' '));
        assert_eq!(tag.close_count(), 1);
    }

    #[test]
    fn sector_is_authenticated_once() {
        let mut tag = EmulatedClassic::new(ClassicSize::OneK);
        read_all_blocks(&mut tag).unwrap();
        assert_eq!(tag.auth_attempts(), 16);
    }

    #[test]
    fn rejected_sector_is_skipped() {
        let mut tag =
            EmulatedClassic::new(ClassicSize::OneK).with_sector_key(3, AuthKey::NFC_FORUM);
        let report = read_all_blocks(&mut tag).unwrap();
        assert_eq!(report.split_whitespace().count(), 60);
        assert!(tag.read_log().iter().all(|block| block_to_sector(*block) != 3));
    }

    #[test]
    fn custom_key_opens_matching_sectors_only() {
        let key = AuthKey::MIFARE_APPLICATION_DIRECTORY;
        let mut tag = EmulatedClassic::new(ClassicSize::Mini).with_sector_key(0, key);
        let report = read_all_blocks_with_key(&mut tag, &key).unwrap();
        assert_eq!(report.split_whitespace().count(), 4);
    }

    #[test]
    fn four_k_dump_reads_large_sectors_whole() {
        let mut tag = EmulatedClassic::new(ClassicSize::FourK);
        let report = read_all_blocks(&mut tag).unwrap();
        assert_eq!(report.split_whitespace().count(), 256);
    }

    #[test]
    fn lost_tag_yields_none() {
        let mut tag = EmulatedClassic::new(ClassicSize::OneK).failing_block(17);
        assert_eq!(read_all_blocks(&mut tag), None);
        assert_eq!(tag.close_count(), 1);
    }
}
