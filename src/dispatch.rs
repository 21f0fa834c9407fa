// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Protocol dispatch: from raw bytes to a parsed datagram, and from a
//! datagram's Protocol field to a parsed upper-layer payload.
//!
//! [`parse_ip`] switches on the IP version nibble (only IPv4 is implemented;
//! version 6 is recognized and rejected explicitly). Upper-layer dispatch
//! goes through a registry keyed by IP protocol number so new payload
//! parsers can be wired in one place.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::error::{ValidationError, ValidationErrorKind};
use crate::layers::icmp::IcmpMessage;
use crate::layers::ip::Ipv4Datagram;
use crate::layers::traits::FromBytes;

/// The IP protocol number of ICMP.
pub const PROTO_ICMP: u8 = 1;

/// A parsed upper-layer payload of an IPv4 datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpperLayer {
    Icmp(IcmpMessage),
}

/// A parser for one upper-layer protocol's payload bytes.
pub type UpperLayerParser = fn(&[u8]) -> Result<UpperLayer, ValidationError>;

static UPPER_LAYER_PARSERS: Lazy<HashMap<u8, UpperLayerParser>> = Lazy::new(|| {
    let mut parsers: HashMap<u8, UpperLayerParser> = HashMap::new();
    parsers.insert(PROTO_ICMP, |payload| {
        Ok(UpperLayer::Icmp(IcmpMessage::from_bytes(payload)?))
    });
    parsers
});

/// Parses an IP datagram from raw bytes, switching on the version nibble.
pub fn parse_ip(bytes: &[u8]) -> Result<Ipv4Datagram, ValidationError> {
    let &first = bytes.first().ok_or(ValidationError {
        layer: "Ip",
        kind: ValidationErrorKind::InsufficientBytes {
            required: 1,
            available: 0,
        },
        reason: "missing version octet",
    })?;

    match first >> 4 {
        4 => Ipv4Datagram::from_bytes(bytes),
        6 => Err(ValidationError {
            layer: "Ip",
            kind: ValidationErrorKind::InvalidType(6),
            reason: "IPv6 parsing is not yet supported",
        }),
        version => Err(ValidationError {
            layer: "Ip",
            kind: ValidationErrorKind::InvalidType(version as u16),
            reason: "unrecognized IP version nibble",
        }),
    }
}

/// Parses `payload` with the parser registered for the given IP protocol
/// number, failing if no parser is registered for it.
pub fn dispatch_protocol(protocol: u8, payload: &[u8]) -> Result<UpperLayer, ValidationError> {
    let parser = UPPER_LAYER_PARSERS.get(&protocol).ok_or(ValidationError {
        layer: "Ip",
        kind: ValidationErrorKind::InvalidType(protocol as u16),
        reason: "no parser registered for this IP protocol number",
    })?;
    parser(payload)
}

/// Parses a datagram's payload according to its header's Protocol field.
pub fn dispatch_datagram(datagram: &Ipv4Datagram) -> Result<UpperLayer, ValidationError> {
    dispatch_protocol(datagram.header().protocol(), datagram.payload())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::icmp::EchoMessage;
    use crate::layers::ip::Ipv4Header;
    use crate::layers::traits::ToBytes;

    fn echo_datagram() -> Ipv4Datagram {
        let header = Ipv4Header::new(
            u32::from_be_bytes([127, 0, 0, 1]),
            u32::from_be_bytes([192, 168, 0, 1]),
            PROTO_ICMP,
        );
        let echo = IcmpMessage::Echo(EchoMessage {
            identifier: 99,
            sequence: 1,
            payload: vec![0xAA; 4],
        });
        Ipv4Datagram::new(header, echo.to_bytes()).unwrap()
    }

    #[test]
    fn icmp_payload_dispatches_through_the_registry() {
        let datagram = echo_datagram();
        match dispatch_datagram(&datagram).unwrap() {
            UpperLayer::Icmp(IcmpMessage::Echo(echo)) => assert_eq!(echo.identifier, 99),
            other => panic!("dispatched to {other:?}"),
        }
    }

    #[test]
    fn unregistered_protocol_is_rejected_with_its_number() {
        // 132 is SCTP's protocol number; SCTP rides its own transport path
        // rather than the datagram registry in this library.
        let err = dispatch_protocol(132, &[]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidType(132));
    }

    #[test]
    fn parse_ip_accepts_version_four() {
        let bytes = echo_datagram().to_bytes();
        let datagram = parse_ip(&bytes).unwrap();
        assert_eq!(datagram.header().protocol(), PROTO_ICMP);
    }

    #[test]
    fn parse_ip_rejects_version_six_explicitly() {
        let err = parse_ip(&[0x60, 0, 0, 0]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidType(6));
        assert!(err.reason.contains("IPv6"));
    }

    #[test]
    fn parse_ip_rejects_other_versions() {
        let err = parse_ip(&[0x90, 0, 0, 0]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidType(9));
    }
}
