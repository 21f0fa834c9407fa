// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Blocking stream adapters.
//!
//! These adapters frame [`LengthPrefixed`] structures over any
//! [`std::io::Read`]/[`std::io::Write`] transport: a fixed prefix is read to
//! learn the total wire length, the remainder is read, and the complete
//! buffer goes through the same [`FromBytes`] validation as any in-memory
//! parse. Async equivalents live in the `tokio` module behind the `tokio`
//! feature.
//!
//! [`FromBytes`]: crate::layers::traits::FromBytes

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::error::ValidationError;
use crate::layers::traits::{FromBytes, LengthPrefixed, ToBytes};

/// An error raised while reading or writing a wire structure over a stream:
/// either the transport failed or the received bytes did not validate.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream I/O failed")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Reads one complete `T` from the stream: its length prefix first, then the
/// remainder of its wire form, validated as a whole.
pub fn read_from_stream<T: LengthPrefixed, R: Read>(reader: &mut R) -> Result<T, StreamError> {
    let mut buf = vec![0u8; T::PREFIX_LEN];
    reader.read_exact(&mut buf)?;

    let total_len = T::total_len(&buf)?;
    if total_len > buf.len() {
        buf.resize(total_len, 0);
        reader.read_exact(&mut buf[T::PREFIX_LEN..])?;
    }

    Ok(T::from_bytes(&buf)?)
}

/// Serializes `value` and writes its complete wire form to the stream.
pub fn write_to_stream<T: ToBytes + ?Sized, W: Write>(
    value: &T,
    writer: &mut W,
) -> Result<(), StreamError> {
    writer.write_all(&value.to_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::ip::{Ipv4Datagram, Ipv4Header};
    use std::io::Cursor;

    fn sample_datagram() -> Ipv4Datagram {
        let header = Ipv4Header::new(
            u32::from_be_bytes([10, 0, 0, 1]),
            u32::from_be_bytes([10, 0, 0, 2]),
            17,
        );
        Ipv4Datagram::new(header, vec![0x11; 13]).unwrap()
    }

    #[test]
    fn datagram_survives_a_write_read_cycle() {
        let datagram = sample_datagram();
        let mut transport = Cursor::new(Vec::new());
        write_to_stream(&datagram, &mut transport).unwrap();

        transport.set_position(0);
        let read: Ipv4Datagram = read_from_stream(&mut transport).unwrap();
        assert_eq!(read, datagram);
    }

    #[test]
    fn back_to_back_datagrams_are_framed_correctly() {
        let first = sample_datagram();
        let second = Ipv4Datagram::new(Ipv4Header::new(1, 2, 6), vec![0xFF; 3]).unwrap();

        let mut transport = Cursor::new(Vec::new());
        write_to_stream(&first, &mut transport).unwrap();
        write_to_stream(&second, &mut transport).unwrap();

        transport.set_position(0);
        assert_eq!(read_from_stream::<Ipv4Datagram, _>(&mut transport).unwrap(), first);
        assert_eq!(read_from_stream::<Ipv4Datagram, _>(&mut transport).unwrap(), second);
    }

    #[test]
    fn truncated_stream_surfaces_as_io_error() {
        let bytes = sample_datagram().to_bytes();
        let mut transport = Cursor::new(bytes[..bytes.len() - 4].to_vec());
        let err = read_from_stream::<Ipv4Datagram, _>(&mut transport).unwrap_err();
        assert!(matches!(err, StreamError::Io(_)));
    }

    #[test]
    fn invalid_prefix_surfaces_as_validation_error() {
        // Total Length of 5 can never hold an IPv4 header.
        let mut transport = Cursor::new(vec![0x45, 0x00, 0x00, 0x05]);
        let err = read_from_stream::<Ipv4Datagram, _>(&mut transport).unwrap_err();
        assert!(matches!(err, StreamError::Invalid(_)));
    }
}
