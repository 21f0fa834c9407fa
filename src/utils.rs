// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Checksum engines and general utility functions
//!
//! This submodule provides the two checksum algorithms shared by the protocol
//! layers (the ones'-complement 16-bit Internet checksum used by IPv4 and
//! ICMP, and the CRC32c checksum used by SCTP) along with bounds-checked
//! slice helpers used throughout the parsers.

use crc::{Crc, CRC_32_ISCSI};

/// CRC-32/iSCSI (Castagnoli), the polynomial and bit order mandated for SCTP
/// by RFC 9260 Appendix B.
const CRC32C: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// Sums the buffer as big-endian 16-bit words with end-around carry, zero
/// padding any odd trailing byte. Returns the folded (uncomplemented) sum.
pub fn ones_complement_16bit(bytes: &[u8]) -> u16 {
    let mut res: u16 = 0;
    let mut iter = bytes.iter();
    while let Some(&first) = iter.next() {
        let second = *iter.next().unwrap_or(&0);
        res = ones_complement_add(res, (first as u16) << 8 | (second as u16));
    }

    res
}

#[inline]
pub fn ones_complement_add(a: u16, b: u16) -> u16 {
    let new = a.wrapping_add(b);
    if new < a {
        new.wrapping_add(1)
    } else {
        new
    }
}

/// The RFC 1071 Internet checksum of the buffer: the complement of the folded
/// ones'-complement sum. The checksum field itself must be zeroed in `bytes`.
///
/// An empty (or all-zero) buffer checksums to `0xFFFF`.
#[inline]
pub fn internet_checksum(bytes: &[u8]) -> u16 {
    !ones_complement_16bit(bytes)
}

/// Verifies an Internet checksum by re-running the folding sum over the buffer
/// as-is, transmitted checksum field included. A buffer carrying a correct
/// checksum folds to all-ones.
#[inline]
pub fn verify_internet_checksum(bytes: &[u8]) -> bool {
    ones_complement_16bit(bytes) == 0xFFFF
}

/// CRC32c over `bytes` with the 4-byte checksum field at `chksum_offset`
/// treated as zero.
///
/// Both generation and validation go through this one function, so the wire
/// convention (the finalized CRC-32/iSCSI value, stored big-endian) cannot
/// drift between the two paths.
///
/// # Panics
///
/// Panics if `bytes` does not cover `chksum_offset + 4`; callers length-check
/// the buffer before computing the checksum.
pub fn crc32c_zeroed(bytes: &[u8], chksum_offset: usize) -> u32 {
    let mut digest = CRC32C.digest();
    digest.update(&bytes[..chksum_offset]);
    digest.update(&[0u8; 4]);
    digest.update(&bytes[chksum_offset + 4..]);
    digest.finalize()
}

#[inline]
pub(crate) fn to_array<const T: usize>(bytes: &[u8], start: usize) -> Option<[u8; T]> {
    Some(*get_array(bytes, start)?)
}

#[inline]
pub(crate) fn get_array<const T: usize>(bytes: &[u8], start: usize) -> Option<&[u8; T]> {
    bytes.get(start..start.checked_add(T)?)?.try_into().ok()
}

/// Rounds `unpadded_len` up to the next multiple of `T`.
#[inline]
pub(crate) fn padded_length<const T: usize>(unpadded_len: usize) -> usize {
    unpadded_len + ((T - (unpadded_len % T)) % T)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 1071 §3 worked example.
    const RFC1071_SAMPLE: [u8; 8] = [0x00, 0x01, 0xF2, 0x03, 0xF4, 0xF5, 0xF6, 0xF7];

    #[test]
    fn ones_complement_matches_rfc1071_vector() {
        assert_eq!(ones_complement_16bit(&RFC1071_SAMPLE), 0xDDF2);
        assert_eq!(internet_checksum(&RFC1071_SAMPLE), !0xDDF2);
    }

    #[test]
    fn ones_complement_odd_length_pads_with_zero() {
        assert_eq!(ones_complement_16bit(&[0xFF]), 0xFF00);
        assert_eq!(ones_complement_16bit(&[0x12, 0x34, 0x56]), 0x6834);
    }

    #[test]
    fn empty_buffer_checksums_to_all_ones() {
        assert_eq!(internet_checksum(&[]), 0xFFFF);
        assert_eq!(internet_checksum(&[0, 0, 0, 0]), 0xFFFF);
    }

    #[test]
    fn generated_checksum_verifies_in_place() {
        let mut buf = Vec::from(RFC1071_SAMPLE);
        buf.extend([0u8, 0u8]);
        let chksum = internet_checksum(&buf);
        let end = buf.len();
        buf[end - 2..].copy_from_slice(&chksum.to_be_bytes());
        assert!(verify_internet_checksum(&buf));

        buf[0] ^= 0x10;
        assert!(!verify_internet_checksum(&buf));
    }

    #[test]
    fn crc32c_known_vector() {
        // CRC-32/iSCSI check value for "123456789"
        assert_eq!(CRC32C.checksum(b"123456789"), 0xE3069283);
    }

    #[test]
    fn crc32c_zeroed_ignores_checksum_field() {
        let with_field = [1u8, 2, 3, 4, 0xAA, 0xBB, 0xCC, 0xDD, 5, 6, 7, 8];
        let without_field = [1u8, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8];
        assert_eq!(
            crc32c_zeroed(&with_field, 4),
            CRC32C.checksum(&without_field)
        );
    }

    #[test]
    fn padded_length_rounds_up_to_word() {
        assert_eq!(padded_length::<4>(0), 0);
        assert_eq!(padded_length::<4>(4), 4);
        assert_eq!(padded_length::<4>(5), 8);
        assert_eq!(padded_length::<4>(7), 8);
    }

    #[test]
    fn get_array_is_bounds_checked() {
        let bytes = [1u8, 2, 3, 4];
        assert_eq!(to_array::<2>(&bytes, 2), Some([3, 4]));
        assert_eq!(to_array::<2>(&bytes, 3), None);
        assert_eq!(to_array::<2>(&bytes, usize::MAX), None);
    }
}
