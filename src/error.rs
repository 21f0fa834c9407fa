// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Validation errors raised by the wire codecs.
//!
//! Every `from_bytes` entry point in this crate fails fast with a
//! [`ValidationError`] naming the layer that rejected the input, the kind of
//! invariant violated (carrying the offending value for diagnostics) and a
//! short static description. No partial results are ever produced.

use thiserror::Error;

/// An error found while validating a byte buffer against a wire structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{layer}: {reason} ({kind})")]
pub struct ValidationError {
    /// The wire structure that rejected the input (e.g. `"Ipv4"`, `"Sctp DATA chunk"`).
    pub layer: &'static str,
    /// The violated invariant, carrying the offending value.
    pub kind: ValidationErrorKind,
    /// A static description of the specific rule that failed.
    pub reason: &'static str,
}

/// The kinds of invariant a wire structure can violate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ValidationErrorKind {
    /// A type/discriminator field did not match any known or permitted variant.
    #[error("unrecognized type discriminator {0}")]
    InvalidType(u16),
    /// A declared length field conflicts with the structure's fixed expectation
    /// or with the actual composition of its contents.
    #[error("invalid length field {0}")]
    InvalidLength(usize),
    /// A computed checksum did not match the transmitted value. Carries the
    /// transmitted (invalid) checksum; 16-bit checksums are widened.
    #[error("invalid checksum {0:#010x}")]
    InvalidChecksum(u32),
    /// A field with a valid-range constraint fell outside it.
    #[error("value {0} outside permitted range")]
    OutOfRange(usize),
    /// Fewer bytes were available than a length field promised.
    #[error("insufficient bytes ({available} available, {required} required)")]
    InsufficientBytes { required: usize, available: usize },
    /// Bytes remained past the end of the structure.
    #[error("{0} excess bytes at end of structure")]
    ExcessBytes(usize),
    /// A field value violated a structural rule not covered by the kinds above.
    #[error("invalid field value")]
    InvalidValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_offending_value() {
        let err = ValidationError {
            layer: "Sctp",
            kind: ValidationErrorKind::InvalidChecksum(0xDEADBEEF),
            reason: "CRC32c checksum mismatch",
        };
        let rendered = err.to_string();
        assert!(rendered.contains("Sctp"));
        assert!(rendered.contains("0xdeadbeef"));
        assert!(rendered.contains("CRC32c checksum mismatch"));
    }

    #[test]
    fn kinds_compare_structurally() {
        assert_eq!(
            ValidationErrorKind::InvalidType(14),
            ValidationErrorKind::InvalidType(14)
        );
        assert_ne!(
            ValidationErrorKind::InvalidLength(3),
            ValidationErrorKind::InvalidLength(4)
        );
    }
}
