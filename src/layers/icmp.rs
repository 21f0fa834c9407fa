// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! ICMP messages (RFC 792).
//!
//! Every message shares the 4-byte header (type, code, checksum over the
//! whole message); the remainder is typed per message. Error messages carry
//! an [`OriginalDatagram`]: the full IPv4 header of the offending datagram
//! plus the first 8 bytes of its payload.

use crate::error::{ValidationError, ValidationErrorKind};
use crate::layers::ip::Ipv4Header;
use crate::layers::traits::*;
use crate::utils;

const LAYER_ICMP: &str = "Icmp";

const ICMP_TYPE_ECHO_REPLY: u8 = 0;
const ICMP_TYPE_DEST_UNREACHABLE: u8 = 3;
const ICMP_TYPE_SOURCE_QUENCH: u8 = 4;
const ICMP_TYPE_REDIRECT: u8 = 5;
const ICMP_TYPE_ECHO: u8 = 8;
const ICMP_TYPE_TIME_EXCEEDED: u8 = 11;
const ICMP_TYPE_PARAM_PROBLEM: u8 = 12;
const ICMP_TYPE_TIMESTAMP: u8 = 13;
const ICMP_TYPE_TIMESTAMP_REPLY: u8 = 14;

/// The number of leading payload bytes an ICMP error message samples from the
/// offending datagram.
const DATA_SAMPLE_LEN: usize = 8;

/// The fixed length of a Timestamp or Timestamp Reply message.
const TIMESTAMP_MSG_LEN: usize = 20;

/// The context an ICMP error message carries about the datagram that
/// triggered it: the complete IPv4 header plus the first 8 bytes of the
/// payload (enough to identify the upper-layer conversation).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginalDatagram {
    header: Ipv4Header,
    data_sample: [u8; DATA_SAMPLE_LEN],
}

impl OriginalDatagram {
    pub fn new(header: Ipv4Header, data_sample: [u8; DATA_SAMPLE_LEN]) -> Self {
        OriginalDatagram {
            header,
            data_sample,
        }
    }

    /// The offending datagram's IPv4 header, options included.
    #[inline]
    pub fn header(&self) -> &Ipv4Header {
        &self.header
    }

    /// The first 8 bytes of the offending datagram's payload.
    #[inline]
    pub fn data_sample(&self) -> &[u8; DATA_SAMPLE_LEN] {
        &self.data_sample
    }
}

impl FromBytes for OriginalDatagram {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let header = Ipv4Header::from_bytes(bytes)?;
        let sample_end = header.len() + DATA_SAMPLE_LEN;
        if bytes.len() < sample_end {
            return Err(ValidationError {
                layer: LAYER_ICMP,
                kind: ValidationErrorKind::InsufficientBytes {
                    required: sample_end,
                    available: bytes.len(),
                },
                reason: "original datagram must carry 8 bytes of payload after its header",
            });
        }
        if bytes.len() > sample_end {
            return Err(ValidationError {
                layer: LAYER_ICMP,
                kind: ValidationErrorKind::ExcessBytes(bytes.len() - sample_end),
                reason: "excess bytes after the original datagram's payload sample",
            });
        }

        Ok(OriginalDatagram {
            data_sample: utils::to_array(bytes, header.len()).unwrap(),
            header,
        })
    }
}

impl LayerLength for OriginalDatagram {
    fn len(&self) -> usize {
        self.header.len() + DATA_SAMPLE_LEN
    }
}

impl ToBytes for OriginalDatagram {
    fn to_bytes_extended(&self, bytes: &mut Vec<u8>) {
        self.header.to_bytes_extended(bytes);
        bytes.extend(self.data_sample);
    }
}

/// The identifier/sequence pair and opaque payload shared by Echo and Echo
/// Reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EchoMessage {
    pub identifier: u16,
    pub sequence: u16,
    pub payload: Vec<u8>,
}

/// The body shared by Timestamp and Timestamp Reply: three timestamps in
/// milliseconds since midnight UT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimestampMessage {
    pub identifier: u16,
    pub sequence: u16,
    pub originate: u32,
    pub receive: u32,
    pub transmit: u32,
}

/// An ICMP message, keyed by its type octet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IcmpMessage {
    /// Echo Reply (type 0).
    EchoReply(EchoMessage),
    /// Destination Unreachable (type 3, codes 0-5).
    DestinationUnreachable {
        code: u8,
        original: OriginalDatagram,
    },
    /// Source Quench (type 4).
    SourceQuench { original: OriginalDatagram },
    /// Redirect (type 5, codes 0-3), carrying the gateway to use instead.
    Redirect {
        code: u8,
        gateway: u32,
        original: OriginalDatagram,
    },
    /// Echo request (type 8).
    Echo(EchoMessage),
    /// Time Exceeded (type 11, codes 0-1).
    TimeExceeded {
        code: u8,
        original: OriginalDatagram,
    },
    /// Parameter Problem (type 12), pointing at the offending octet of the
    /// original header.
    ParameterProblem {
        pointer: u8,
        original: OriginalDatagram,
    },
    /// Timestamp request (type 13).
    Timestamp(TimestampMessage),
    /// Timestamp Reply (type 14).
    TimestampReply(TimestampMessage),
}

impl IcmpMessage {
    /// The message's type octet.
    #[inline]
    pub fn message_type(&self) -> u8 {
        match self {
            Self::EchoReply(_) => ICMP_TYPE_ECHO_REPLY,
            Self::DestinationUnreachable { .. } => ICMP_TYPE_DEST_UNREACHABLE,
            Self::SourceQuench { .. } => ICMP_TYPE_SOURCE_QUENCH,
            Self::Redirect { .. } => ICMP_TYPE_REDIRECT,
            Self::Echo(_) => ICMP_TYPE_ECHO,
            Self::TimeExceeded { .. } => ICMP_TYPE_TIME_EXCEEDED,
            Self::ParameterProblem { .. } => ICMP_TYPE_PARAM_PROBLEM,
            Self::Timestamp(_) => ICMP_TYPE_TIMESTAMP,
            Self::TimestampReply(_) => ICMP_TYPE_TIMESTAMP_REPLY,
        }
    }

    /// The message's code octet.
    #[inline]
    pub fn code(&self) -> u8 {
        match self {
            Self::DestinationUnreachable { code, .. }
            | Self::Redirect { code, .. }
            | Self::TimeExceeded { code, .. } => *code,
            _ => 0,
        }
    }

    /// The transmitted checksum of a serialized copy of this message.
    #[inline]
    pub fn chksum(&self) -> u16 {
        let bytes = self.to_bytes();
        u16::from_be_bytes([bytes[2], bytes[3]])
    }
}

fn check_code(code: u8, max: u8) -> Result<(), ValidationError> {
    if code > max {
        return Err(ValidationError {
            layer: LAYER_ICMP,
            kind: ValidationErrorKind::InvalidValue,
            reason: "code octet outside the range its message type permits",
        });
    }
    Ok(())
}

fn check_unused_zero(bytes: &[u8]) -> Result<(), ValidationError> {
    if bytes.iter().any(|&b| b != 0) {
        return Err(ValidationError {
            layer: LAYER_ICMP,
            kind: ValidationErrorKind::InvalidValue,
            reason: "unused octets of an ICMP message must be zero",
        });
    }
    Ok(())
}

fn parse_echo_body(body: &[u8]) -> Result<EchoMessage, ValidationError> {
    if body.len() < 4 {
        return Err(ValidationError {
            layer: LAYER_ICMP,
            kind: ValidationErrorKind::InsufficientBytes {
                required: 8,
                available: 4 + body.len(),
            },
            reason: "echo message truncated before its identifier/sequence pair",
        });
    }
    Ok(EchoMessage {
        identifier: u16::from_be_bytes([body[0], body[1]]),
        sequence: u16::from_be_bytes([body[2], body[3]]),
        payload: body[4..].to_vec(),
    })
}

fn parse_timestamp_body(bytes: &[u8]) -> Result<TimestampMessage, ValidationError> {
    if bytes.len() < TIMESTAMP_MSG_LEN {
        return Err(ValidationError {
            layer: LAYER_ICMP,
            kind: ValidationErrorKind::InsufficientBytes {
                required: TIMESTAMP_MSG_LEN,
                available: bytes.len(),
            },
            reason: "timestamp message must be exactly 20 bytes",
        });
    }
    if bytes.len() > TIMESTAMP_MSG_LEN {
        return Err(ValidationError {
            layer: LAYER_ICMP,
            kind: ValidationErrorKind::ExcessBytes(bytes.len() - TIMESTAMP_MSG_LEN),
            reason: "timestamp message must be exactly 20 bytes",
        });
    }
    Ok(TimestampMessage {
        identifier: u16::from_be_bytes([bytes[4], bytes[5]]),
        sequence: u16::from_be_bytes([bytes[6], bytes[7]]),
        originate: u32::from_be_bytes(utils::to_array(bytes, 8).unwrap()),
        receive: u32::from_be_bytes(utils::to_array(bytes, 12).unwrap()),
        transmit: u32::from_be_bytes(utils::to_array(bytes, 16).unwrap()),
    })
}

impl FromBytes for IcmpMessage {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        if bytes.len() < 4 {
            return Err(ValidationError {
                layer: LAYER_ICMP,
                kind: ValidationErrorKind::InsufficientBytes {
                    required: 4,
                    available: bytes.len(),
                },
                reason: "ICMP message truncated before its checksum",
            });
        }

        // The checksum spans the whole message, so it is validated before any
        // per-type interpretation of the remaining bytes.
        if !utils::verify_internet_checksum(bytes) {
            let transmitted = u16::from_be_bytes([bytes[2], bytes[3]]);
            return Err(ValidationError {
                layer: LAYER_ICMP,
                kind: ValidationErrorKind::InvalidChecksum(transmitted as u32),
                reason: "ICMP message checksum mismatch",
            });
        }

        let msg_type = bytes[0];
        let code = bytes[1];
        match msg_type {
            ICMP_TYPE_ECHO_REPLY => {
                check_code(code, 0)?;
                Ok(Self::EchoReply(parse_echo_body(&bytes[4..])?))
            }
            ICMP_TYPE_DEST_UNREACHABLE => {
                check_code(code, 5)?;
                check_unused_zero(&bytes[4..8.min(bytes.len())])?;
                Ok(Self::DestinationUnreachable {
                    code,
                    original: OriginalDatagram::from_bytes(bytes.get(8..).unwrap_or(&[]))?,
                })
            }
            ICMP_TYPE_SOURCE_QUENCH => {
                check_code(code, 0)?;
                check_unused_zero(&bytes[4..8.min(bytes.len())])?;
                Ok(Self::SourceQuench {
                    original: OriginalDatagram::from_bytes(bytes.get(8..).unwrap_or(&[]))?,
                })
            }
            ICMP_TYPE_REDIRECT => {
                check_code(code, 3)?;
                let gateway = utils::to_array(bytes, 4)
                    .map(u32::from_be_bytes)
                    .ok_or(ValidationError {
                        layer: LAYER_ICMP,
                        kind: ValidationErrorKind::InsufficientBytes {
                            required: 8,
                            available: bytes.len(),
                        },
                        reason: "redirect message truncated before its gateway address",
                    })?;
                Ok(Self::Redirect {
                    code,
                    gateway,
                    original: OriginalDatagram::from_bytes(&bytes[8..])?,
                })
            }
            ICMP_TYPE_ECHO => {
                check_code(code, 0)?;
                Ok(Self::Echo(parse_echo_body(&bytes[4..])?))
            }
            ICMP_TYPE_TIME_EXCEEDED => {
                check_code(code, 1)?;
                check_unused_zero(&bytes[4..8.min(bytes.len())])?;
                Ok(Self::TimeExceeded {
                    code,
                    original: OriginalDatagram::from_bytes(bytes.get(8..).unwrap_or(&[]))?,
                })
            }
            ICMP_TYPE_PARAM_PROBLEM => {
                check_code(code, 0)?;
                if bytes.len() < 8 {
                    return Err(ValidationError {
                        layer: LAYER_ICMP,
                        kind: ValidationErrorKind::InsufficientBytes {
                            required: 8,
                            available: bytes.len(),
                        },
                        reason: "parameter problem message truncated before its pointer",
                    });
                }
                check_unused_zero(&bytes[5..8])?;
                Ok(Self::ParameterProblem {
                    pointer: bytes[4],
                    original: OriginalDatagram::from_bytes(&bytes[8..])?,
                })
            }
            ICMP_TYPE_TIMESTAMP => {
                check_code(code, 0)?;
                Ok(Self::Timestamp(parse_timestamp_body(bytes)?))
            }
            ICMP_TYPE_TIMESTAMP_REPLY => {
                check_code(code, 0)?;
                Ok(Self::TimestampReply(parse_timestamp_body(bytes)?))
            }
            _ => Err(ValidationError {
                layer: LAYER_ICMP,
                kind: ValidationErrorKind::InvalidType(msg_type as u16),
                reason: "unrecognized ICMP message type",
            }),
        }
    }
}

impl LayerLength for IcmpMessage {
    fn len(&self) -> usize {
        match self {
            Self::EchoReply(echo) | Self::Echo(echo) => 8 + echo.payload.len(),
            Self::DestinationUnreachable { original, .. }
            | Self::SourceQuench { original }
            | Self::Redirect { original, .. }
            | Self::TimeExceeded { original, .. }
            | Self::ParameterProblem { original, .. } => 8 + original.len(),
            Self::Timestamp(_) | Self::TimestampReply(_) => TIMESTAMP_MSG_LEN,
        }
    }
}

impl ToBytes for IcmpMessage {
    fn to_bytes_extended(&self, bytes: &mut Vec<u8>) {
        let start = bytes.len();
        bytes.push(self.message_type());
        bytes.push(self.code());
        bytes.extend([0u8; 2]); // checksum, patched below
        match self {
            Self::EchoReply(echo) | Self::Echo(echo) => {
                bytes.extend(echo.identifier.to_be_bytes());
                bytes.extend(echo.sequence.to_be_bytes());
                bytes.extend(&echo.payload);
            }
            Self::DestinationUnreachable { original, .. }
            | Self::SourceQuench { original }
            | Self::TimeExceeded { original, .. } => {
                bytes.extend([0u8; 4]);
                original.to_bytes_extended(bytes);
            }
            Self::Redirect {
                gateway, original, ..
            } => {
                bytes.extend(gateway.to_be_bytes());
                original.to_bytes_extended(bytes);
            }
            Self::ParameterProblem { pointer, original } => {
                bytes.push(*pointer);
                bytes.extend([0u8; 3]);
                original.to_bytes_extended(bytes);
            }
            Self::Timestamp(ts) | Self::TimestampReply(ts) => {
                bytes.extend(ts.identifier.to_be_bytes());
                bytes.extend(ts.sequence.to_be_bytes());
                bytes.extend(ts.originate.to_be_bytes());
                bytes.extend(ts.receive.to_be_bytes());
                bytes.extend(ts.transmit.to_be_bytes());
            }
        }

        let chksum = utils::internet_checksum(&bytes[start..]);
        bytes[start + 2..start + 4].copy_from_slice(&chksum.to_be_bytes());
    }
}
