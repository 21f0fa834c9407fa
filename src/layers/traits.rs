// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Traits shared by every wire structure in this library.
//!
//! Each layer implements the same contract: [`FromBytes`] deserializes a byte
//! buffer into a validated owned value, [`ToBytes`] serializes that value back
//! to its exact wire representation, and [`LayerLength`] reports the wire
//! length the serialized form will occupy. [`LengthPrefixed`] extends the
//! contract for self-framing structures that can be read from a byte stream
//! in two reads (a fixed prefix to learn the total length, then the
//! remainder).

use crate::error::ValidationError;

/// A trait for deserializing a wire structure from a byte buffer.
pub trait FromBytes: Sized {
    /// Parses and validates the structure from `bytes`, failing with a
    /// [`ValidationError`] describing the first violated invariant.
    ///
    /// Parsing is all-or-nothing: no partially constructed value is ever
    /// observable.
    fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError>;
}

/// A trait for serializing a wire structure into its binary representation.
///
/// Serialization always succeeds: every invariant was enforced when the value
/// was constructed or parsed, and length/checksum fields are re-derived from
/// the actual content rather than trusted from stored state.
pub trait ToBytes {
    /// Appends the structure's byte representation to the given byte vector,
    /// recalculating any length and checksum fields.
    fn to_bytes_extended(&self, bytes: &mut Vec<u8>);

    /// The structure's byte representation as a freshly allocated buffer.
    #[inline]
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.to_bytes_extended(&mut bytes);
        bytes
    }
}

/// A trait for retrieving the wire length (in bytes) of a structure.
pub trait LayerLength {
    /// The length (in bytes) the structure occupies on the wire, including
    /// any trailing alignment padding.
    fn len(&self) -> usize;
}

/// A self-framing wire structure whose total length can be learned from a
/// fixed-size prefix.
///
/// This is the seam the stream adapters build on: read [`PREFIX_LEN`] bytes,
/// derive the total wire length, read the remainder, then hand the complete
/// buffer to [`FromBytes::from_bytes`]. Keeping the framing logic separate
/// from the buffer-based codec lets the same validation serve sockets, files
/// and in-memory buffers without duplication.
///
/// [`PREFIX_LEN`]: LengthPrefixed::PREFIX_LEN
pub trait LengthPrefixed: FromBytes {
    /// The number of leading bytes needed to learn the structure's total
    /// wire length.
    const PREFIX_LEN: usize;

    /// The total wire length of the structure, derived from a prefix of at
    /// least [`PREFIX_LEN`](LengthPrefixed::PREFIX_LEN) bytes.
    fn total_len(prefix: &[u8]) -> Result<usize, ValidationError>;
}
