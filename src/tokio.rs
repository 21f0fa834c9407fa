// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Async stream adapters (enabled by the `tokio` feature).
//!
//! The same framing as [`crate::stream`], over [`AsyncRead`]/[`AsyncWrite`]
//! transports, plus a cancellable read for service shutdown paths.

use std::future::Future;

use ::tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::layers::traits::{FromBytes, LengthPrefixed, ToBytes};
use crate::stream::StreamError;

/// Reads one complete `T` from the stream: its length prefix first, then the
/// remainder of its wire form, validated as a whole.
pub async fn read_from_stream<T, R>(reader: &mut R) -> Result<T, StreamError>
where
    T: LengthPrefixed,
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; T::PREFIX_LEN];
    reader.read_exact(&mut buf).await?;

    let total_len = T::total_len(&buf)?;
    if total_len > buf.len() {
        buf.resize(total_len, 0);
        reader.read_exact(&mut buf[T::PREFIX_LEN..]).await?;
    }

    Ok(T::from_bytes(&buf)?)
}

/// Like [`read_from_stream`], racing the read against a caller-supplied
/// cancellation future. Returns `Ok(None)` if `cancel` completes first; when
/// both are ready, cancellation wins.
///
/// A cancelled read may leave a partially consumed structure in the
/// transport, so the stream should not be reused for framing afterwards.
pub async fn read_from_stream_cancellable<T, R, C>(
    reader: &mut R,
    cancel: C,
) -> Result<Option<T>, StreamError>
where
    T: LengthPrefixed,
    R: AsyncRead + Unpin,
    C: Future<Output = ()>,
{
    ::tokio::select! {
        biased;
        _ = cancel => Ok(None),
        result = read_from_stream(reader) => result.map(Some),
    }
}

/// Serializes `value` and writes its complete wire form to the stream.
pub async fn write_to_stream<T, W>(value: &T, writer: &mut W) -> Result<(), StreamError>
where
    T: ToBytes + ?Sized,
    W: AsyncWrite + Unpin,
{
    writer.write_all(&value.to_bytes()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::ip::{Ipv4Datagram, Ipv4Header};
    use ::tokio::test as tokio_test;

    fn sample_datagram() -> Ipv4Datagram {
        let header = Ipv4Header::new(
            u32::from_be_bytes([10, 0, 0, 1]),
            u32::from_be_bytes([10, 0, 0, 2]),
            17,
        );
        Ipv4Datagram::new(header, vec![0x22; 9]).unwrap()
    }

    #[tokio_test]
    async fn datagram_survives_a_write_read_cycle() {
        let datagram = sample_datagram();
        let mut transport = Vec::new();
        write_to_stream(&datagram, &mut transport).await.unwrap();

        let mut reader = transport.as_slice();
        let read: Ipv4Datagram = read_from_stream(&mut reader).await.unwrap();
        assert_eq!(read, datagram);
        assert!(reader.is_empty());
    }

    #[tokio_test]
    async fn truncated_stream_surfaces_as_io_error() {
        let bytes = sample_datagram().to_bytes();
        let mut reader = &bytes[..bytes.len() - 1];
        let err = read_from_stream::<Ipv4Datagram, _>(&mut reader)
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Io(_)));
    }

    #[tokio_test]
    async fn pending_cancellation_lets_the_read_complete() {
        let bytes = sample_datagram().to_bytes();
        let mut reader = bytes.as_slice();
        let read =
            read_from_stream_cancellable::<Ipv4Datagram, _, _>(&mut reader, std::future::pending())
                .await
                .unwrap();
        assert_eq!(read, Some(sample_datagram()));
    }

    #[tokio_test]
    async fn completed_cancellation_wins_over_a_ready_read() {
        let bytes = sample_datagram().to_bytes();
        let mut reader = bytes.as_slice();
        let read =
            read_from_stream_cancellable::<Ipv4Datagram, _, _>(&mut reader, std::future::ready(()))
                .await
                .unwrap();
        assert_eq!(read, None);
    }
}
