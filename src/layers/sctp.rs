// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! SCTP packet, chunk, parameter and error-cause codecs (RFC 9260).
//!
//! An [`SctpPacket`] is the 12-byte common header (ports, verification tag,
//! CRC32c) followed by its chunks. Every chunk is a TLV padded to a
//! 4-byte boundary on the wire; chunk value areas in turn carry their own
//! TLVs (variable parameters in INIT/INIT ACK, error causes in ABORT/ERROR,
//! heartbeat info in HEARTBEAT/HEARTBEAT ACK) with the same alignment rule,
//! except that the final TLV's padding is not counted in the enclosing
//! chunk's length field.
//!
//! Parsing is strict so that serialization is its exact inverse: padding
//! bytes must be zero, declared lengths must match the re-derived
//! composition, and unknown type discriminators are rejected rather than
//! skipped. One deliberate laxity: a 12-byte packet carrying no chunks at
//! all is accepted and parses to an empty chunk list, mirroring what
//! [`SctpPacket::new`] with no chunks serializes to, even though a
//! conformant sender always bundles at least one chunk (RFC 9260 section
//! 3).

use bitflags::bitflags;

use crate::error::{ValidationError, ValidationErrorKind};
use crate::layers::traits::*;
use crate::utils;

const LAYER_SCTP: &str = "Sctp";

const CHUNK_TYPE_DATA: u8 = 0;
const CHUNK_TYPE_INIT: u8 = 1;
const CHUNK_TYPE_INIT_ACK: u8 = 2;
const CHUNK_TYPE_SACK: u8 = 3;
const CHUNK_TYPE_HEARTBEAT: u8 = 4;
const CHUNK_TYPE_HEARTBEAT_ACK: u8 = 5;
const CHUNK_TYPE_ABORT: u8 = 6;
const CHUNK_TYPE_SHUTDOWN: u8 = 7;
const CHUNK_TYPE_SHUTDOWN_ACK: u8 = 8;
const CHUNK_TYPE_ERROR: u8 = 9;
const CHUNK_TYPE_COOKIE_ECHO: u8 = 10;
const CHUNK_TYPE_COOKIE_ACK: u8 = 11;
const CHUNK_TYPE_SHUTDOWN_COMPLETE: u8 = 14;

// Variable parameter types
const PARAM_TYPE_HEARTBEAT_INFO: u16 = 1;
const PARAM_TYPE_IPV4_ADDRESS: u16 = 5;
const PARAM_TYPE_IPV6_ADDRESS: u16 = 6;
const PARAM_TYPE_STATE_COOKIE: u16 = 7;
const PARAM_TYPE_UNRECOGNIZED_PARAM: u16 = 8;
const PARAM_TYPE_COOKIE_PRESERVATIVE: u16 = 9;
const PARAM_TYPE_HOSTNAME_ADDR: u16 = 11;
const PARAM_TYPE_SUPP_ADDR_TYPES: u16 = 12;

/// The variable parameters an INIT chunk may carry.
const INIT_ALLOWED_PARAMS: [u16; 5] = [
    PARAM_TYPE_IPV4_ADDRESS,
    PARAM_TYPE_IPV6_ADDRESS,
    PARAM_TYPE_COOKIE_PRESERVATIVE,
    PARAM_TYPE_HOSTNAME_ADDR,
    PARAM_TYPE_SUPP_ADDR_TYPES,
];

/// The variable parameters an INIT ACK chunk may carry.
const INIT_ACK_ALLOWED_PARAMS: [u16; 5] = [
    PARAM_TYPE_STATE_COOKIE,
    PARAM_TYPE_IPV4_ADDRESS,
    PARAM_TYPE_IPV6_ADDRESS,
    PARAM_TYPE_UNRECOGNIZED_PARAM,
    PARAM_TYPE_HOSTNAME_ADDR,
];

// Error cause codes
const ERR_CODE_INVALID_STREAM_ID: u16 = 1;
const ERR_CODE_MISSING_MAND_PARAM: u16 = 2;
const ERR_CODE_STALE_COOKIE: u16 = 3;
const ERR_CODE_OUT_OF_RESOURCE: u16 = 4;
const ERR_CODE_UNRESOLVABLE_ADDRESS: u16 = 5;
const ERR_CODE_UNRECOGNIZED_CHUNK: u16 = 6;
const ERR_CODE_INVALID_MAND_PARAM: u16 = 7;
const ERR_CODE_UNRECOGNIZED_PARAMS: u16 = 8;
const ERR_CODE_NO_USER_DATA: u16 = 9;
const ERR_CODE_COOKIE_RCVD_SHUTTING_DOWN: u16 = 10;
const ERR_CODE_RESTART_ASSOC_NEW_ADDR: u16 = 11;
const ERR_CODE_USER_INITIATED_ABORT: u16 = 12;
const ERR_CODE_PROTOCOL_VIOLATION: u16 = 13;

// ABORT and SHUTDOWN COMPLETE chunk flags
const ABORT_FLAGS_T_BIT: u8 = 0b_0000_0001;
const SHUTDOWN_COMPLETE_FLAGS_T_BIT: u8 = 0b_0000_0001;

/// The offset of the CRC32c checksum within the SCTP common header.
const CHKSUM_OFFSET: usize = 8;

bitflags! {
    /// The flag bits of a DATA chunk.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DataChunkFlags: u8 {
        const IMMEDIATE = 0b_0000_1000;
        const UNORDERED = 0b_0000_0100;
        const BEGINNING_FRAGMENT = 0b_0000_0010;
        const ENDING_FRAGMENT = 0b_0000_0001;
    }
}

// =============================================================================
//                          TLV walking and emission
// =============================================================================

/// Walks the TLVs of a chunk value area, handing each one's type, declared
/// length and value bytes to `visit`.
///
/// Every TLV except the last is padded to a 4-byte boundary with zero bytes;
/// the final TLV's padding is never counted in the enclosing chunk's length,
/// so an area ending exactly on a padded (rather than declared) boundary is
/// rejected.
fn walk_tlvs(
    layer: &'static str,
    area: &[u8],
    mut visit: impl FnMut(u16, u16, &[u8]) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    let mut cursor = 0;
    while cursor < area.len() {
        let remaining = &area[cursor..];
        let header = utils::get_array::<4>(remaining, 0).ok_or(ValidationError {
            layer,
            kind: ValidationErrorKind::InsufficientBytes {
                required: 4,
                available: remaining.len(),
            },
            reason: "TLV truncated before its length field",
        })?;
        let tlv_type = u16::from_be_bytes([header[0], header[1]]);
        let length = u16::from_be_bytes([header[2], header[3]]);
        if (length as usize) < 4 || length as usize > remaining.len() {
            return Err(ValidationError {
                layer,
                kind: ValidationErrorKind::InvalidLength(length as usize),
                reason: "TLV length field out of bounds",
            });
        }

        visit(tlv_type, length, &remaining[4..length as usize])?;

        let end = cursor + length as usize;
        if end == area.len() {
            break;
        }
        let padded_end = cursor + utils::padded_length::<4>(length as usize);
        if padded_end > area.len() {
            return Err(ValidationError {
                layer,
                kind: ValidationErrorKind::InvalidLength(length as usize),
                reason: "TLV padding overruns the chunk value area",
            });
        }
        if padded_end == area.len() {
            return Err(ValidationError {
                layer,
                kind: ValidationErrorKind::InvalidLength(length as usize),
                reason: "padding of the final TLV must not be counted in the chunk length",
            });
        }
        if area[end..padded_end].iter().any(|&b| b != 0) {
            return Err(ValidationError {
                layer,
                kind: ValidationErrorKind::InvalidValue,
                reason: "TLV padding bytes must be zero",
            });
        }
        cursor = padded_end;
    }
    Ok(())
}

/// Serializes a TLV list, zero padding each entry but the last to a 4-byte
/// boundary (the inverse of [`walk_tlvs`]).
fn extend_tlvs<T: ToBytes>(items: &[T], bytes: &mut Vec<u8>) {
    for (idx, item) in items.iter().enumerate() {
        let start = bytes.len();
        item.to_bytes_extended(bytes);
        if idx + 1 != items.len() {
            while (bytes.len() - start) % 4 != 0 {
                bytes.push(0);
            }
        }
    }
}

/// The serialized length of a TLV list, inter-TLV padding included.
fn tlv_area_len<T: LayerLength>(items: &[T]) -> usize {
    let mut len = 0;
    for (idx, item) in items.iter().enumerate() {
        len += if idx + 1 == items.len() {
            item.len()
        } else {
            utils::padded_length::<4>(item.len())
        };
    }
    len
}

/// Requires that every TLV in `items` fits its 16-bit length field.
fn check_tlv_lens<T: LayerLength>(items: &[T]) -> Result<(), ValidationError> {
    for item in items {
        if item.len() > u16::MAX as usize {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidLength(item.len()),
                reason: "TLV cannot exceed a 16-bit length field",
            });
        }
    }
    Ok(())
}

/// Requires that a chunk's unpadded length fits its 16-bit length field.
fn check_chunk_len(unpadded_len: usize) -> Result<(), ValidationError> {
    if unpadded_len > u16::MAX as usize {
        return Err(ValidationError {
            layer: LAYER_SCTP,
            kind: ValidationErrorKind::InvalidLength(unpadded_len),
            reason: "chunk cannot exceed a 16-bit length field",
        });
    }
    Ok(())
}

// =============================================================================
//                            Variable Parameters
// =============================================================================

/// A variable parameter carried by an INIT, INIT ACK, HEARTBEAT or
/// HEARTBEAT ACK chunk, keyed by its 16-bit parameter type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkParameter {
    /// Heartbeat Info (1): sender-opaque bytes reflected by the peer.
    HeartbeatInfo(Vec<u8>),
    /// IPv4 Address (5).
    Ipv4Address(u32),
    /// IPv6 Address (6).
    Ipv6Address(u128),
    /// State Cookie (7).
    StateCookie(Vec<u8>),
    /// Unrecognized Parameter (8): the offending TLV, reflected verbatim.
    UnrecognizedParameter(Vec<u8>),
    /// Cookie Preservative (9): requested cookie lifespan increment (ms).
    CookiePreservative(u32),
    /// Host Name Address (11).
    HostnameAddress(Vec<u8>),
    /// Supported Address Types (12).
    SupportedAddressTypes(Vec<u16>),
}

impl ChunkParameter {
    /// The parameter's 16-bit type discriminator.
    #[inline]
    pub fn param_type(&self) -> u16 {
        match self {
            Self::HeartbeatInfo(_) => PARAM_TYPE_HEARTBEAT_INFO,
            Self::Ipv4Address(_) => PARAM_TYPE_IPV4_ADDRESS,
            Self::Ipv6Address(_) => PARAM_TYPE_IPV6_ADDRESS,
            Self::StateCookie(_) => PARAM_TYPE_STATE_COOKIE,
            Self::UnrecognizedParameter(_) => PARAM_TYPE_UNRECOGNIZED_PARAM,
            Self::CookiePreservative(_) => PARAM_TYPE_COOKIE_PRESERVATIVE,
            Self::HostnameAddress(_) => PARAM_TYPE_HOSTNAME_ADDR,
            Self::SupportedAddressTypes(_) => PARAM_TYPE_SUPP_ADDR_TYPES,
        }
    }

    /// Builds a parameter from the pieces of one TLV: its type, declared
    /// length and value bytes.
    fn parse_tlv(
        param_type: u16,
        length: u16,
        value: &[u8],
    ) -> Result<Self, ValidationError> {
        let fixed_len_err = ValidationError {
            layer: LAYER_SCTP,
            kind: ValidationErrorKind::InvalidLength(length as usize),
            reason: "fixed-size parameter with a mismatched length field",
        };
        match param_type {
            PARAM_TYPE_HEARTBEAT_INFO => Ok(Self::HeartbeatInfo(value.to_vec())),
            PARAM_TYPE_IPV4_ADDRESS => {
                if length != 8 {
                    return Err(fixed_len_err);
                }
                Ok(Self::Ipv4Address(u32::from_be_bytes(
                    utils::to_array(value, 0).unwrap(),
                )))
            }
            PARAM_TYPE_IPV6_ADDRESS => {
                if length != 20 {
                    return Err(fixed_len_err);
                }
                Ok(Self::Ipv6Address(u128::from_be_bytes(
                    utils::to_array(value, 0).unwrap(),
                )))
            }
            PARAM_TYPE_STATE_COOKIE => Ok(Self::StateCookie(value.to_vec())),
            PARAM_TYPE_UNRECOGNIZED_PARAM => Ok(Self::UnrecognizedParameter(value.to_vec())),
            PARAM_TYPE_COOKIE_PRESERVATIVE => {
                if length != 8 {
                    return Err(fixed_len_err);
                }
                Ok(Self::CookiePreservative(u32::from_be_bytes(
                    utils::to_array(value, 0).unwrap(),
                )))
            }
            PARAM_TYPE_HOSTNAME_ADDR => Ok(Self::HostnameAddress(value.to_vec())),
            PARAM_TYPE_SUPP_ADDR_TYPES => {
                if value.len() % 2 != 0 {
                    return Err(ValidationError {
                        layer: LAYER_SCTP,
                        kind: ValidationErrorKind::InvalidLength(length as usize),
                        reason: "Supported Address Types value must be a list of 16-bit types",
                    });
                }
                Ok(Self::SupportedAddressTypes(
                    value
                        .chunks_exact(2)
                        .map(|c| u16::from_be_bytes(c.try_into().unwrap()))
                        .collect(),
                ))
            }
            _ => Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidType(param_type),
                reason: "unrecognized chunk parameter type",
            }),
        }
    }
}

impl LayerLength for ChunkParameter {
    /// The parameter's unpadded TLV length.
    fn len(&self) -> usize {
        4 + match self {
            Self::HeartbeatInfo(v)
            | Self::StateCookie(v)
            | Self::UnrecognizedParameter(v)
            | Self::HostnameAddress(v) => v.len(),
            Self::Ipv4Address(_) | Self::CookiePreservative(_) => 4,
            Self::Ipv6Address(_) => 16,
            Self::SupportedAddressTypes(types) => 2 * types.len(),
        }
    }
}

impl ToBytes for ChunkParameter {
    fn to_bytes_extended(&self, bytes: &mut Vec<u8>) {
        bytes.extend(self.param_type().to_be_bytes());
        bytes.extend(
            u16::try_from(self.len())
                .expect("too many bytes in SCTP chunk parameter to represent in a 16-bit Length field")
                .to_be_bytes(),
        );
        match self {
            Self::HeartbeatInfo(v)
            | Self::StateCookie(v)
            | Self::UnrecognizedParameter(v)
            | Self::HostnameAddress(v) => bytes.extend(v),
            Self::Ipv4Address(addr) => bytes.extend(addr.to_be_bytes()),
            Self::Ipv6Address(addr) => bytes.extend(addr.to_be_bytes()),
            Self::CookiePreservative(lifespan) => bytes.extend(lifespan.to_be_bytes()),
            Self::SupportedAddressTypes(types) => {
                for t in types {
                    bytes.extend(t.to_be_bytes());
                }
            }
        }
    }
}

/// Parses the parameter TLVs of a chunk value area, rejecting any parameter
/// type outside the chunk's allow-list.
fn parse_parameter_list(
    area: &[u8],
    allowed: &[u16],
) -> Result<Vec<ChunkParameter>, ValidationError> {
    let mut params = Vec::new();
    walk_tlvs(LAYER_SCTP, area, |param_type, length, value| {
        if !allowed.contains(&param_type) {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidType(param_type),
                reason: "parameter type not permitted in this chunk",
            });
        }
        params.push(ChunkParameter::parse_tlv(param_type, length, value)?);
        Ok(())
    })?;
    Ok(params)
}

fn check_params_allowed(
    params: &[ChunkParameter],
    allowed: &[u16],
) -> Result<(), ValidationError> {
    match params.iter().find(|p| !allowed.contains(&p.param_type())) {
        Some(p) => Err(ValidationError {
            layer: LAYER_SCTP,
            kind: ValidationErrorKind::InvalidType(p.param_type()),
            reason: "parameter type not permitted in this chunk",
        }),
        None => Ok(()),
    }
}

// =============================================================================
//                               Error Causes
// =============================================================================

/// An error cause carried by an ABORT or ERROR chunk, keyed by its 16-bit
/// cause code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorCause {
    /// Invalid Stream Identifier (1).
    InvalidStreamIdentifier(u16),
    /// Missing Mandatory Parameter (2): the absent parameter types.
    MissingMandatoryParameter(Vec<u16>),
    /// Stale Cookie Error (3): staleness in microseconds.
    StaleCookie(u32),
    /// Out of Resource (4).
    OutOfResource,
    /// Unresolvable Address (5): the offending address TLV.
    UnresolvableAddress(Vec<u8>),
    /// Unrecognized Chunk Type (6): the offending chunk, header included.
    UnrecognizedChunkType(Vec<u8>),
    /// Invalid Mandatory Parameter (7).
    InvalidMandatoryParameter,
    /// Unrecognized Parameters (8): the offending parameter TLVs.
    UnrecognizedParameters(Vec<u8>),
    /// No User Data (9): the TSN of the empty DATA chunk.
    NoUserData(u32),
    /// Cookie Received While Shutting Down (10).
    CookieReceivedWhileShuttingDown,
    /// Restart of an Association with New Addresses (11): the new address
    /// TLVs.
    RestartWithNewAddresses(Vec<u8>),
    /// User-Initiated Abort (12): the upper layer's abort reason.
    UserInitiatedAbort(Vec<u8>),
    /// Protocol Violation (13): additional diagnostic information.
    ProtocolViolation(Vec<u8>),
}

impl ErrorCause {
    /// The cause's 16-bit code.
    #[inline]
    pub fn cause_code(&self) -> u16 {
        match self {
            Self::InvalidStreamIdentifier(_) => ERR_CODE_INVALID_STREAM_ID,
            Self::MissingMandatoryParameter(_) => ERR_CODE_MISSING_MAND_PARAM,
            Self::StaleCookie(_) => ERR_CODE_STALE_COOKIE,
            Self::OutOfResource => ERR_CODE_OUT_OF_RESOURCE,
            Self::UnresolvableAddress(_) => ERR_CODE_UNRESOLVABLE_ADDRESS,
            Self::UnrecognizedChunkType(_) => ERR_CODE_UNRECOGNIZED_CHUNK,
            Self::InvalidMandatoryParameter => ERR_CODE_INVALID_MAND_PARAM,
            Self::UnrecognizedParameters(_) => ERR_CODE_UNRECOGNIZED_PARAMS,
            Self::NoUserData(_) => ERR_CODE_NO_USER_DATA,
            Self::CookieReceivedWhileShuttingDown => ERR_CODE_COOKIE_RCVD_SHUTTING_DOWN,
            Self::RestartWithNewAddresses(_) => ERR_CODE_RESTART_ASSOC_NEW_ADDR,
            Self::UserInitiatedAbort(_) => ERR_CODE_USER_INITIATED_ABORT,
            Self::ProtocolViolation(_) => ERR_CODE_PROTOCOL_VIOLATION,
        }
    }

    fn parse_tlv(code: u16, length: u16, value: &[u8]) -> Result<Self, ValidationError> {
        let fixed_len_err = ValidationError {
            layer: LAYER_SCTP,
            kind: ValidationErrorKind::InvalidLength(length as usize),
            reason: "fixed-size error cause with a mismatched length field",
        };
        match code {
            ERR_CODE_INVALID_STREAM_ID => {
                if length != 8 {
                    return Err(fixed_len_err);
                }
                if value[2] != 0 || value[3] != 0 {
                    return Err(ValidationError {
                        layer: LAYER_SCTP,
                        kind: ValidationErrorKind::InvalidValue,
                        reason: "reserved octets of an Invalid Stream Identifier cause must be zero",
                    });
                }
                Ok(Self::InvalidStreamIdentifier(u16::from_be_bytes([
                    value[0], value[1],
                ])))
            }
            ERR_CODE_MISSING_MAND_PARAM => {
                if length < 8 || (length - 8) % 2 != 0 {
                    return Err(ValidationError {
                        layer: LAYER_SCTP,
                        kind: ValidationErrorKind::InvalidLength(length as usize),
                        reason: "Missing Mandatory Parameter cause length does not fit its layout",
                    });
                }
                let count = u32::from_be_bytes(utils::to_array(value, 0).unwrap());
                let types: Vec<u16> = value[4..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes(c.try_into().unwrap()))
                    .collect();
                if count as usize != types.len() {
                    return Err(ValidationError {
                        layer: LAYER_SCTP,
                        kind: ValidationErrorKind::InvalidValue,
                        reason: "missing-parameter count disagrees with the listed types",
                    });
                }
                Ok(Self::MissingMandatoryParameter(types))
            }
            ERR_CODE_STALE_COOKIE => {
                if length != 8 {
                    return Err(fixed_len_err);
                }
                Ok(Self::StaleCookie(u32::from_be_bytes(
                    utils::to_array(value, 0).unwrap(),
                )))
            }
            ERR_CODE_OUT_OF_RESOURCE => {
                if length != 4 {
                    return Err(fixed_len_err);
                }
                Ok(Self::OutOfResource)
            }
            ERR_CODE_UNRESOLVABLE_ADDRESS => Ok(Self::UnresolvableAddress(value.to_vec())),
            ERR_CODE_UNRECOGNIZED_CHUNK => Ok(Self::UnrecognizedChunkType(value.to_vec())),
            ERR_CODE_INVALID_MAND_PARAM => {
                if length != 4 {
                    return Err(fixed_len_err);
                }
                Ok(Self::InvalidMandatoryParameter)
            }
            ERR_CODE_UNRECOGNIZED_PARAMS => Ok(Self::UnrecognizedParameters(value.to_vec())),
            ERR_CODE_NO_USER_DATA => {
                if length != 8 {
                    return Err(fixed_len_err);
                }
                Ok(Self::NoUserData(u32::from_be_bytes(
                    utils::to_array(value, 0).unwrap(),
                )))
            }
            ERR_CODE_COOKIE_RCVD_SHUTTING_DOWN => {
                if length != 4 {
                    return Err(fixed_len_err);
                }
                Ok(Self::CookieReceivedWhileShuttingDown)
            }
            ERR_CODE_RESTART_ASSOC_NEW_ADDR => Ok(Self::RestartWithNewAddresses(value.to_vec())),
            ERR_CODE_USER_INITIATED_ABORT => Ok(Self::UserInitiatedAbort(value.to_vec())),
            ERR_CODE_PROTOCOL_VIOLATION => Ok(Self::ProtocolViolation(value.to_vec())),
            _ => Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidType(code),
                reason: "unrecognized error cause code",
            }),
        }
    }
}

impl LayerLength for ErrorCause {
    /// The cause's unpadded TLV length.
    fn len(&self) -> usize {
        4 + match self {
            Self::InvalidStreamIdentifier(_) | Self::StaleCookie(_) | Self::NoUserData(_) => 4,
            Self::MissingMandatoryParameter(types) => 4 + 2 * types.len(),
            Self::OutOfResource
            | Self::InvalidMandatoryParameter
            | Self::CookieReceivedWhileShuttingDown => 0,
            Self::UnresolvableAddress(v)
            | Self::UnrecognizedChunkType(v)
            | Self::UnrecognizedParameters(v)
            | Self::RestartWithNewAddresses(v)
            | Self::UserInitiatedAbort(v)
            | Self::ProtocolViolation(v) => v.len(),
        }
    }
}

impl ToBytes for ErrorCause {
    fn to_bytes_extended(&self, bytes: &mut Vec<u8>) {
        bytes.extend(self.cause_code().to_be_bytes());
        bytes.extend(
            u16::try_from(self.len())
                .expect("too many bytes in SCTP error cause to represent in a 16-bit Length field")
                .to_be_bytes(),
        );
        match self {
            Self::InvalidStreamIdentifier(stream_id) => {
                bytes.extend(stream_id.to_be_bytes());
                bytes.extend([0u8; 2]);
            }
            Self::MissingMandatoryParameter(types) => {
                bytes.extend((types.len() as u32).to_be_bytes());
                for t in types {
                    bytes.extend(t.to_be_bytes());
                }
            }
            Self::StaleCookie(staleness) => bytes.extend(staleness.to_be_bytes()),
            Self::NoUserData(tsn) => bytes.extend(tsn.to_be_bytes()),
            Self::OutOfResource
            | Self::InvalidMandatoryParameter
            | Self::CookieReceivedWhileShuttingDown => (),
            Self::UnresolvableAddress(v)
            | Self::UnrecognizedChunkType(v)
            | Self::UnrecognizedParameters(v)
            | Self::RestartWithNewAddresses(v)
            | Self::UserInitiatedAbort(v)
            | Self::ProtocolViolation(v) => bytes.extend(v),
        }
    }
}

fn parse_error_causes(area: &[u8]) -> Result<Vec<ErrorCause>, ValidationError> {
    let mut causes = Vec::new();
    walk_tlvs(LAYER_SCTP, area, |code, length, value| {
        causes.push(ErrorCause::parse_tlv(code, length, value)?);
        Ok(())
    })?;
    Ok(causes)
}

// =============================================================================
//                                   Chunks
// =============================================================================

/// A DATA chunk (type 0). Always carries at least one byte of user data; a
/// payloadless DATA chunk is a protocol violation (RFC 9260 section 3.3.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataChunk {
    flags: DataChunkFlags,
    tsn: u32,
    stream_id: u16,
    stream_seq: u16,
    proto_id: u32,
    user_data: Vec<u8>,
}

impl DataChunk {
    /// A DATA chunk, failing if `user_data` is empty or overflows the
    /// chunk's 16-bit length field.
    pub fn new(
        flags: DataChunkFlags,
        tsn: u32,
        stream_id: u16,
        stream_seq: u16,
        proto_id: u32,
        user_data: Vec<u8>,
    ) -> Result<Self, ValidationError> {
        if user_data.is_empty() {
            return Err(ValidationError {
                layer: "Sctp DATA chunk",
                kind: ValidationErrorKind::InvalidLength(16),
                reason: "DATA chunk must carry at least one byte of user data",
            });
        }
        check_chunk_len(16 + user_data.len())?;
        Ok(DataChunk {
            flags,
            tsn,
            stream_id,
            stream_seq,
            proto_id,
            user_data,
        })
    }

    fn parse(flags: u8, chunk: &[u8]) -> Result<Self, ValidationError> {
        if chunk.len() < 17 {
            return Err(ValidationError {
                layer: "Sctp DATA chunk",
                kind: ValidationErrorKind::InvalidLength(chunk.len()),
                reason: "DATA chunk must be at least 17 bytes (one byte of user data)",
            });
        }
        let flags = DataChunkFlags::from_bits(flags).ok_or(ValidationError {
            layer: "Sctp DATA chunk",
            kind: ValidationErrorKind::InvalidValue,
            reason: "undefined flag bits set in DATA chunk",
        })?;
        Ok(DataChunk {
            flags,
            tsn: u32::from_be_bytes(utils::to_array(chunk, 4).unwrap()),
            stream_id: u16::from_be_bytes([chunk[8], chunk[9]]),
            stream_seq: u16::from_be_bytes([chunk[10], chunk[11]]),
            proto_id: u32::from_be_bytes(utils::to_array(chunk, 12).unwrap()),
            user_data: chunk[16..].to_vec(),
        })
    }

    #[inline]
    pub fn flags(&self) -> DataChunkFlags {
        self.flags
    }

    #[inline]
    pub fn set_flags(&mut self, flags: DataChunkFlags) {
        self.flags = flags;
    }

    #[inline]
    pub fn tsn(&self) -> u32 {
        self.tsn
    }

    #[inline]
    pub fn set_tsn(&mut self, tsn: u32) {
        self.tsn = tsn;
    }

    #[inline]
    pub fn stream_id(&self) -> u16 {
        self.stream_id
    }

    #[inline]
    pub fn set_stream_id(&mut self, stream_id: u16) {
        self.stream_id = stream_id;
    }

    #[inline]
    pub fn stream_seq(&self) -> u16 {
        self.stream_seq
    }

    #[inline]
    pub fn set_stream_seq(&mut self, stream_seq: u16) {
        self.stream_seq = stream_seq;
    }

    #[inline]
    pub fn proto_id(&self) -> u32 {
        self.proto_id
    }

    #[inline]
    pub fn set_proto_id(&mut self, proto_id: u32) {
        self.proto_id = proto_id;
    }

    #[inline]
    pub fn user_data(&self) -> &[u8] {
        &self.user_data
    }

    /// Replaces the user data, failing if `user_data` is empty or overflows
    /// the chunk's 16-bit length field.
    pub fn set_user_data(&mut self, user_data: Vec<u8>) -> Result<(), ValidationError> {
        if user_data.is_empty() {
            return Err(ValidationError {
                layer: "Sctp DATA chunk",
                kind: ValidationErrorKind::InvalidLength(16),
                reason: "DATA chunk must carry at least one byte of user data",
            });
        }
        check_chunk_len(16 + user_data.len())?;
        self.user_data = user_data;
        Ok(())
    }
}

/// The shared shape of the INIT (type 1) and INIT ACK (type 2) chunks: five
/// fixed fields followed by variable parameters. The two differ only in
/// which parameter types they permit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitFields {
    pub init_tag: u32,
    pub a_rwnd: u32,
    pub ostreams: u16,
    pub istreams: u16,
    pub init_tsn: u32,
}

impl InitFields {
    fn parse(chunk: &[u8]) -> Result<Self, ValidationError> {
        if chunk.len() < 20 {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidLength(chunk.len()),
                reason: "INIT/INIT ACK chunk must be at least 20 bytes",
            });
        }
        Ok(InitFields {
            init_tag: u32::from_be_bytes(utils::to_array(chunk, 4).unwrap()),
            a_rwnd: u32::from_be_bytes(utils::to_array(chunk, 8).unwrap()),
            ostreams: u16::from_be_bytes([chunk[12], chunk[13]]),
            istreams: u16::from_be_bytes([chunk[14], chunk[15]]),
            init_tsn: u32::from_be_bytes(utils::to_array(chunk, 16).unwrap()),
        })
    }

    fn extend(&self, bytes: &mut Vec<u8>) {
        bytes.extend(self.init_tag.to_be_bytes());
        bytes.extend(self.a_rwnd.to_be_bytes());
        bytes.extend(self.ostreams.to_be_bytes());
        bytes.extend(self.istreams.to_be_bytes());
        bytes.extend(self.init_tsn.to_be_bytes());
    }
}

/// An INIT chunk (type 1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitChunk {
    fields: InitFields,
    params: Vec<ChunkParameter>,
}

impl InitChunk {
    /// An INIT chunk, failing if any parameter type is not permitted in INIT
    /// or the parameters overflow the chunk's 16-bit length field.
    pub fn new(fields: InitFields, params: Vec<ChunkParameter>) -> Result<Self, ValidationError> {
        check_params_allowed(&params, &INIT_ALLOWED_PARAMS)?;
        check_tlv_lens(&params)?;
        check_chunk_len(20 + tlv_area_len(&params))?;
        Ok(InitChunk { fields, params })
    }

    fn parse(chunk: &[u8]) -> Result<Self, ValidationError> {
        Ok(InitChunk {
            fields: InitFields::parse(chunk)?,
            params: parse_parameter_list(&chunk[20..], &INIT_ALLOWED_PARAMS)?,
        })
    }

    #[inline]
    pub fn fields(&self) -> &InitFields {
        &self.fields
    }

    #[inline]
    pub fn fields_mut(&mut self) -> &mut InitFields {
        &mut self.fields
    }

    #[inline]
    pub fn params(&self) -> &[ChunkParameter] {
        &self.params
    }

    /// Replaces the parameter list, failing if any parameter type is not
    /// permitted in INIT or the parameters overflow the chunk's 16-bit
    /// length field.
    pub fn set_params(&mut self, params: Vec<ChunkParameter>) -> Result<(), ValidationError> {
        check_params_allowed(&params, &INIT_ALLOWED_PARAMS)?;
        check_tlv_lens(&params)?;
        check_chunk_len(20 + tlv_area_len(&params))?;
        self.params = params;
        Ok(())
    }
}

/// An INIT ACK chunk (type 2).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitAckChunk {
    fields: InitFields,
    params: Vec<ChunkParameter>,
}

impl InitAckChunk {
    /// An INIT ACK chunk, failing if any parameter type is not permitted in
    /// INIT ACK or the parameters overflow the chunk's 16-bit length field.
    pub fn new(fields: InitFields, params: Vec<ChunkParameter>) -> Result<Self, ValidationError> {
        check_params_allowed(&params, &INIT_ACK_ALLOWED_PARAMS)?;
        check_tlv_lens(&params)?;
        check_chunk_len(20 + tlv_area_len(&params))?;
        Ok(InitAckChunk { fields, params })
    }

    fn parse(chunk: &[u8]) -> Result<Self, ValidationError> {
        Ok(InitAckChunk {
            fields: InitFields::parse(chunk)?,
            params: parse_parameter_list(&chunk[20..], &INIT_ACK_ALLOWED_PARAMS)?,
        })
    }

    #[inline]
    pub fn fields(&self) -> &InitFields {
        &self.fields
    }

    #[inline]
    pub fn fields_mut(&mut self) -> &mut InitFields {
        &mut self.fields
    }

    #[inline]
    pub fn params(&self) -> &[ChunkParameter] {
        &self.params
    }

    /// Replaces the parameter list, failing if any parameter type is not
    /// permitted in INIT ACK or the parameters overflow the chunk's 16-bit
    /// length field.
    pub fn set_params(&mut self, params: Vec<ChunkParameter>) -> Result<(), ValidationError> {
        check_params_allowed(&params, &INIT_ACK_ALLOWED_PARAMS)?;
        check_tlv_lens(&params)?;
        check_chunk_len(20 + tlv_area_len(&params))?;
        self.params = params;
        Ok(())
    }
}

/// A SACK chunk (type 3). Its length field must account for exactly the
/// declared number of gap ack blocks and duplicate TSNs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SackChunk {
    cum_tsn_ack: u32,
    a_rwnd: u32,
    gap_ack_blocks: Vec<(u16, u16)>,
    duplicate_tsns: Vec<u32>,
}

impl SackChunk {
    /// A SACK chunk, failing if the blocks and duplicate TSNs overflow the
    /// chunk's 16-bit length field.
    pub fn new(
        cum_tsn_ack: u32,
        a_rwnd: u32,
        gap_ack_blocks: Vec<(u16, u16)>,
        duplicate_tsns: Vec<u32>,
    ) -> Result<Self, ValidationError> {
        check_chunk_len(16 + 4 * gap_ack_blocks.len() + 4 * duplicate_tsns.len())?;
        Ok(SackChunk {
            cum_tsn_ack,
            a_rwnd,
            gap_ack_blocks,
            duplicate_tsns,
        })
    }

    #[inline]
    pub fn cum_tsn_ack(&self) -> u32 {
        self.cum_tsn_ack
    }

    #[inline]
    pub fn set_cum_tsn_ack(&mut self, cum_tsn_ack: u32) {
        self.cum_tsn_ack = cum_tsn_ack;
    }

    #[inline]
    pub fn a_rwnd(&self) -> u32 {
        self.a_rwnd
    }

    #[inline]
    pub fn set_a_rwnd(&mut self, a_rwnd: u32) {
        self.a_rwnd = a_rwnd;
    }

    /// Gap ack blocks as (start, end) offsets relative to the cumulative
    /// TSN ack.
    #[inline]
    pub fn gap_ack_blocks(&self) -> &[(u16, u16)] {
        &self.gap_ack_blocks
    }

    #[inline]
    pub fn duplicate_tsns(&self) -> &[u32] {
        &self.duplicate_tsns
    }

    fn parse(chunk: &[u8]) -> Result<Self, ValidationError> {
        if chunk.len() < 16 {
            return Err(ValidationError {
                layer: "Sctp SACK chunk",
                kind: ValidationErrorKind::InvalidLength(chunk.len()),
                reason: "SACK chunk must be at least 16 bytes",
            });
        }
        let gap_count = u16::from_be_bytes([chunk[12], chunk[13]]) as usize;
        let dup_count = u16::from_be_bytes([chunk[14], chunk[15]]) as usize;
        if chunk.len() != 16 + 4 * gap_count + 4 * dup_count {
            return Err(ValidationError {
                layer: "Sctp SACK chunk",
                kind: ValidationErrorKind::InvalidLength(chunk.len()),
                reason: "SACK chunk length disagrees with its block and TSN counts",
            });
        }
        let gap_ack_blocks = chunk[16..16 + 4 * gap_count]
            .chunks_exact(4)
            .map(|c| {
                (
                    u16::from_be_bytes([c[0], c[1]]),
                    u16::from_be_bytes([c[2], c[3]]),
                )
            })
            .collect();
        let duplicate_tsns = chunk[16 + 4 * gap_count..]
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes(c.try_into().unwrap()))
            .collect();
        Ok(SackChunk {
            cum_tsn_ack: u32::from_be_bytes(utils::to_array(chunk, 4).unwrap()),
            a_rwnd: u32::from_be_bytes(utils::to_array(chunk, 8).unwrap()),
            gap_ack_blocks,
            duplicate_tsns,
        })
    }
}

/// A HEARTBEAT chunk (type 4): a single Heartbeat Info TLV.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeartbeatChunk {
    heartbeat_info: Vec<u8>,
}

impl HeartbeatChunk {
    /// A HEARTBEAT chunk, failing if the info overflows the chunk's 16-bit
    /// length field.
    pub fn new(heartbeat_info: Vec<u8>) -> Result<Self, ValidationError> {
        check_chunk_len(8 + heartbeat_info.len())?;
        Ok(HeartbeatChunk { heartbeat_info })
    }

    /// The sender-opaque Heartbeat Info value.
    #[inline]
    pub fn heartbeat_info(&self) -> &[u8] {
        &self.heartbeat_info
    }
}

/// A HEARTBEAT ACK chunk (type 5): the reflected Heartbeat Info TLV.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeartbeatAckChunk {
    heartbeat_info: Vec<u8>,
}

impl HeartbeatAckChunk {
    /// A HEARTBEAT ACK chunk, failing if the info overflows the chunk's
    /// 16-bit length field.
    pub fn new(heartbeat_info: Vec<u8>) -> Result<Self, ValidationError> {
        check_chunk_len(8 + heartbeat_info.len())?;
        Ok(HeartbeatAckChunk { heartbeat_info })
    }

    /// The reflected Heartbeat Info value.
    #[inline]
    pub fn heartbeat_info(&self) -> &[u8] {
        &self.heartbeat_info
    }
}

/// Parses the value area of a HEARTBEAT or HEARTBEAT ACK chunk: exactly one
/// Heartbeat Info TLV, its padding not counted in the chunk length.
fn parse_heartbeat_info(area: &[u8]) -> Result<Vec<u8>, ValidationError> {
    let header = utils::get_array::<4>(area, 0).ok_or(ValidationError {
        layer: LAYER_SCTP,
        kind: ValidationErrorKind::InsufficientBytes {
            required: 4,
            available: area.len(),
        },
        reason: "heartbeat chunk truncated before its info TLV",
    })?;
    let tlv_type = u16::from_be_bytes([header[0], header[1]]);
    if tlv_type != PARAM_TYPE_HEARTBEAT_INFO {
        return Err(ValidationError {
            layer: LAYER_SCTP,
            kind: ValidationErrorKind::InvalidType(tlv_type),
            reason: "heartbeat chunk must carry a Heartbeat Info parameter",
        });
    }
    let length = u16::from_be_bytes([header[2], header[3]]) as usize;
    if length < 4 || length != area.len() {
        return Err(ValidationError {
            layer: LAYER_SCTP,
            kind: ValidationErrorKind::InvalidLength(length),
            reason: "Heartbeat Info TLV must span the whole chunk value",
        });
    }
    Ok(area[4..].to_vec())
}

fn extend_heartbeat_info(info: &[u8], bytes: &mut Vec<u8>) {
    bytes.extend(PARAM_TYPE_HEARTBEAT_INFO.to_be_bytes());
    bytes.extend(
        u16::try_from(4 + info.len())
            .expect("too many bytes in SCTP Heartbeat Info to represent in a 16-bit Length field")
            .to_be_bytes(),
    );
    bytes.extend(info);
}

/// An ABORT chunk (type 6).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbortChunk {
    /// The T bit: set when the sender had no TCB and reflected the peer's
    /// verification tag.
    pub reflected_tag: bool,
    causes: Vec<ErrorCause>,
}

impl AbortChunk {
    /// An ABORT chunk, failing if the causes overflow the chunk's 16-bit
    /// length field.
    pub fn new(reflected_tag: bool, causes: Vec<ErrorCause>) -> Result<Self, ValidationError> {
        check_tlv_lens(&causes)?;
        check_chunk_len(4 + tlv_area_len(&causes))?;
        Ok(AbortChunk {
            reflected_tag,
            causes,
        })
    }

    /// The chunk's error causes (zero or more).
    #[inline]
    pub fn causes(&self) -> &[ErrorCause] {
        &self.causes
    }
}

/// A SHUTDOWN chunk (type 7).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownChunk {
    pub cum_tsn_ack: u32,
}

/// An ERROR chunk (type 9): zero or more error causes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorChunk {
    causes: Vec<ErrorCause>,
}

impl ErrorChunk {
    /// An ERROR chunk, failing if the causes overflow the chunk's 16-bit
    /// length field.
    pub fn new(causes: Vec<ErrorCause>) -> Result<Self, ValidationError> {
        check_tlv_lens(&causes)?;
        check_chunk_len(4 + tlv_area_len(&causes))?;
        Ok(ErrorChunk { causes })
    }

    /// The chunk's error causes (zero or more).
    #[inline]
    pub fn causes(&self) -> &[ErrorCause] {
        &self.causes
    }
}

/// A COOKIE ECHO chunk (type 10).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieEchoChunk {
    cookie: Vec<u8>,
}

impl CookieEchoChunk {
    /// A COOKIE ECHO chunk, failing if the cookie overflows the chunk's
    /// 16-bit length field.
    pub fn new(cookie: Vec<u8>) -> Result<Self, ValidationError> {
        check_chunk_len(4 + cookie.len())?;
        Ok(CookieEchoChunk { cookie })
    }

    #[inline]
    pub fn cookie(&self) -> &[u8] {
        &self.cookie
    }
}

/// A SHUTDOWN COMPLETE chunk (type 14).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownCompleteChunk {
    /// The T bit, as in [`AbortChunk::reflected_tag`].
    pub reflected_tag: bool,
}

/// Any SCTP chunk, keyed by its type octet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SctpChunk {
    Data(DataChunk),
    Init(InitChunk),
    InitAck(InitAckChunk),
    Sack(SackChunk),
    Heartbeat(HeartbeatChunk),
    HeartbeatAck(HeartbeatAckChunk),
    Abort(AbortChunk),
    Shutdown(ShutdownChunk),
    ShutdownAck,
    Error(ErrorChunk),
    CookieEcho(CookieEchoChunk),
    CookieAck,
    ShutdownComplete(ShutdownCompleteChunk),
}

impl SctpChunk {
    /// The chunk's type octet.
    #[inline]
    pub fn chunk_type(&self) -> u8 {
        match self {
            Self::Data(_) => CHUNK_TYPE_DATA,
            Self::Init(_) => CHUNK_TYPE_INIT,
            Self::InitAck(_) => CHUNK_TYPE_INIT_ACK,
            Self::Sack(_) => CHUNK_TYPE_SACK,
            Self::Heartbeat(_) => CHUNK_TYPE_HEARTBEAT,
            Self::HeartbeatAck(_) => CHUNK_TYPE_HEARTBEAT_ACK,
            Self::Abort(_) => CHUNK_TYPE_ABORT,
            Self::Shutdown(_) => CHUNK_TYPE_SHUTDOWN,
            Self::ShutdownAck => CHUNK_TYPE_SHUTDOWN_ACK,
            Self::Error(_) => CHUNK_TYPE_ERROR,
            Self::CookieEcho(_) => CHUNK_TYPE_COOKIE_ECHO,
            Self::CookieAck => CHUNK_TYPE_COOKIE_ACK,
            Self::ShutdownComplete(_) => CHUNK_TYPE_SHUTDOWN_COMPLETE,
        }
    }

    /// The chunk's flags octet.
    #[inline]
    pub fn flags_raw(&self) -> u8 {
        match self {
            Self::Data(data) => data.flags.bits(),
            Self::Abort(abort) if abort.reflected_tag => ABORT_FLAGS_T_BIT,
            Self::ShutdownComplete(sc) if sc.reflected_tag => SHUTDOWN_COMPLETE_FLAGS_T_BIT,
            _ => 0,
        }
    }

    /// The chunk's length field value: its wire length without trailing
    /// padding.
    pub fn unpadded_len(&self) -> usize {
        4 + match self {
            Self::Data(data) => 12 + data.user_data.len(),
            Self::Init(init) => 16 + tlv_area_len(&init.params),
            Self::InitAck(init_ack) => 16 + tlv_area_len(&init_ack.params),
            Self::Sack(sack) => {
                12 + 4 * sack.gap_ack_blocks.len() + 4 * sack.duplicate_tsns.len()
            }
            Self::Heartbeat(hb) => 4 + hb.heartbeat_info.len(),
            Self::HeartbeatAck(hb_ack) => 4 + hb_ack.heartbeat_info.len(),
            Self::Abort(abort) => tlv_area_len(&abort.causes),
            Self::Shutdown(_) => 4,
            Self::Error(error) => tlv_area_len(&error.causes),
            Self::CookieEcho(ce) => ce.cookie.len(),
            Self::ShutdownAck | Self::CookieAck | Self::ShutdownComplete(_) => 0,
        }
    }

    /// Requires a zero flags octet for chunk types that define no flags.
    fn check_flags_zero(flags: u8) -> Result<(), ValidationError> {
        if flags != 0 {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidValue,
                reason: "undefined flag bits set in chunk",
            });
        }
        Ok(())
    }

    fn check_exact_len(chunk: &[u8], expected: usize) -> Result<(), ValidationError> {
        if chunk.len() != expected {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidLength(chunk.len()),
                reason: "fixed-size chunk with a mismatched length field",
            });
        }
        Ok(())
    }
}

impl FromBytes for SctpChunk {
    /// Parses one chunk from a buffer spanning exactly its padded wire form
    /// (the declared length rounded up to a 4-byte boundary).
    fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let header = utils::get_array::<4>(bytes, 0).ok_or(ValidationError {
            layer: LAYER_SCTP,
            kind: ValidationErrorKind::InsufficientBytes {
                required: 4,
                available: bytes.len(),
            },
            reason: "chunk truncated before its length field",
        })?;
        let chunk_type = header[0];
        let flags = header[1];
        let length = u16::from_be_bytes([header[2], header[3]]) as usize;
        if length < 4 {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidLength(length),
                reason: "chunk length field cannot be less than the chunk header",
            });
        }

        let padded = utils::padded_length::<4>(length);
        if bytes.len() < padded {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InsufficientBytes {
                    required: padded,
                    available: bytes.len(),
                },
                reason: "fewer bytes available than the chunk length promises",
            });
        }
        if bytes.len() > padded {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::ExcessBytes(bytes.len() - padded),
                reason: "excess bytes at end of chunk",
            });
        }
        if bytes[length..].iter().any(|&b| b != 0) {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidValue,
                reason: "chunk padding bytes must be zero",
            });
        }
        let chunk = &bytes[..length];

        match chunk_type {
            CHUNK_TYPE_DATA => Ok(Self::Data(DataChunk::parse(flags, chunk)?)),
            CHUNK_TYPE_INIT => {
                Self::check_flags_zero(flags)?;
                Ok(Self::Init(InitChunk::parse(chunk)?))
            }
            CHUNK_TYPE_INIT_ACK => {
                Self::check_flags_zero(flags)?;
                Ok(Self::InitAck(InitAckChunk::parse(chunk)?))
            }
            CHUNK_TYPE_SACK => {
                Self::check_flags_zero(flags)?;
                Ok(Self::Sack(SackChunk::parse(chunk)?))
            }
            CHUNK_TYPE_HEARTBEAT => {
                Self::check_flags_zero(flags)?;
                Ok(Self::Heartbeat(HeartbeatChunk {
                    heartbeat_info: parse_heartbeat_info(&chunk[4..])?,
                }))
            }
            CHUNK_TYPE_HEARTBEAT_ACK => {
                Self::check_flags_zero(flags)?;
                Ok(Self::HeartbeatAck(HeartbeatAckChunk {
                    heartbeat_info: parse_heartbeat_info(&chunk[4..])?,
                }))
            }
            CHUNK_TYPE_ABORT => {
                if flags & !ABORT_FLAGS_T_BIT != 0 {
                    return Err(ValidationError {
                        layer: LAYER_SCTP,
                        kind: ValidationErrorKind::InvalidValue,
                        reason: "undefined flag bits set in ABORT chunk",
                    });
                }
                Ok(Self::Abort(AbortChunk {
                    reflected_tag: flags & ABORT_FLAGS_T_BIT != 0,
                    causes: parse_error_causes(&chunk[4..])?,
                }))
            }
            CHUNK_TYPE_SHUTDOWN => {
                Self::check_flags_zero(flags)?;
                Self::check_exact_len(chunk, 8)?;
                Ok(Self::Shutdown(ShutdownChunk {
                    cum_tsn_ack: u32::from_be_bytes(utils::to_array(chunk, 4).unwrap()),
                }))
            }
            CHUNK_TYPE_SHUTDOWN_ACK => {
                Self::check_flags_zero(flags)?;
                Self::check_exact_len(chunk, 4)?;
                Ok(Self::ShutdownAck)
            }
            CHUNK_TYPE_ERROR => {
                Self::check_flags_zero(flags)?;
                Ok(Self::Error(ErrorChunk {
                    causes: parse_error_causes(&chunk[4..])?,
                }))
            }
            CHUNK_TYPE_COOKIE_ECHO => {
                Self::check_flags_zero(flags)?;
                Ok(Self::CookieEcho(CookieEchoChunk {
                    cookie: chunk[4..].to_vec(),
                }))
            }
            CHUNK_TYPE_COOKIE_ACK => {
                Self::check_flags_zero(flags)?;
                Self::check_exact_len(chunk, 4)?;
                Ok(Self::CookieAck)
            }
            CHUNK_TYPE_SHUTDOWN_COMPLETE => {
                if flags & !SHUTDOWN_COMPLETE_FLAGS_T_BIT != 0 {
                    return Err(ValidationError {
                        layer: LAYER_SCTP,
                        kind: ValidationErrorKind::InvalidValue,
                        reason: "undefined flag bits set in SHUTDOWN COMPLETE chunk",
                    });
                }
                Ok(Self::ShutdownComplete(ShutdownCompleteChunk {
                    reflected_tag: flags & SHUTDOWN_COMPLETE_FLAGS_T_BIT != 0,
                }))
            }
            _ => Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidType(chunk_type as u16),
                reason: "unrecognized chunk type",
            }),
        }
    }
}

impl LayerLength for SctpChunk {
    /// The chunk's padded wire length.
    fn len(&self) -> usize {
        utils::padded_length::<4>(self.unpadded_len())
    }
}

impl ToBytes for SctpChunk {
    fn to_bytes_extended(&self, bytes: &mut Vec<u8>) {
        let start = bytes.len();
        bytes.push(self.chunk_type());
        bytes.push(self.flags_raw());
        bytes.extend(
            u16::try_from(self.unpadded_len())
                .expect("too many bytes in SCTP chunk to represent in a 16-bit Length field")
                .to_be_bytes(),
        );
        match self {
            Self::Data(data) => {
                bytes.extend(data.tsn.to_be_bytes());
                bytes.extend(data.stream_id.to_be_bytes());
                bytes.extend(data.stream_seq.to_be_bytes());
                bytes.extend(data.proto_id.to_be_bytes());
                bytes.extend(&data.user_data);
            }
            Self::Init(init) => {
                init.fields.extend(bytes);
                extend_tlvs(&init.params, bytes);
            }
            Self::InitAck(init_ack) => {
                init_ack.fields.extend(bytes);
                extend_tlvs(&init_ack.params, bytes);
            }
            Self::Sack(sack) => {
                bytes.extend(sack.cum_tsn_ack.to_be_bytes());
                bytes.extend(sack.a_rwnd.to_be_bytes());
                bytes.extend(
                    u16::try_from(sack.gap_ack_blocks.len())
                        .expect("too many Gap Ack Blocks in SCTP SACK chunk to represent in a 16-bit field")
                        .to_be_bytes(),
                );
                bytes.extend(
                    u16::try_from(sack.duplicate_tsns.len())
                        .expect("too many Duplicate TSNs in SCTP SACK chunk to represent in a 16-bit field")
                        .to_be_bytes(),
                );
                for (gap_start, gap_end) in &sack.gap_ack_blocks {
                    bytes.extend(gap_start.to_be_bytes());
                    bytes.extend(gap_end.to_be_bytes());
                }
                for tsn in &sack.duplicate_tsns {
                    bytes.extend(tsn.to_be_bytes());
                }
            }
            Self::Heartbeat(hb) => extend_heartbeat_info(&hb.heartbeat_info, bytes),
            Self::HeartbeatAck(hb_ack) => extend_heartbeat_info(&hb_ack.heartbeat_info, bytes),
            Self::Abort(abort) => extend_tlvs(&abort.causes, bytes),
            Self::Shutdown(shutdown) => bytes.extend(shutdown.cum_tsn_ack.to_be_bytes()),
            Self::Error(error) => extend_tlvs(&error.causes, bytes),
            Self::CookieEcho(ce) => bytes.extend(&ce.cookie),
            Self::ShutdownAck | Self::CookieAck | Self::ShutdownComplete(_) => (),
        }

        while (bytes.len() - start) % 4 != 0 {
            bytes.push(0);
        }
    }
}

// =============================================================================
//                                 SCTP Packet
// =============================================================================

/// A complete SCTP packet: the common header followed by its chunks in wire
/// order.
///
/// The CRC32c checksum is not stored; parsing validates it against the
/// transmitted value and serialization recomputes it over the serialized
/// packet with the checksum field zeroed (RFC 9260 Appendix B).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SctpPacket {
    sport: u16,
    dport: u16,
    verify_tag: u32,
    chunks: Vec<SctpChunk>,
}

impl SctpPacket {
    pub fn new(sport: u16, dport: u16, verify_tag: u32, chunks: Vec<SctpChunk>) -> Self {
        SctpPacket {
            sport,
            dport,
            verify_tag,
            chunks,
        }
    }

    #[inline]
    pub fn sport(&self) -> u16 {
        self.sport
    }

    #[inline]
    pub fn set_sport(&mut self, sport: u16) {
        self.sport = sport;
    }

    #[inline]
    pub fn dport(&self) -> u16 {
        self.dport
    }

    #[inline]
    pub fn set_dport(&mut self, dport: u16) {
        self.dport = dport;
    }

    #[inline]
    pub fn verify_tag(&self) -> u32 {
        self.verify_tag
    }

    #[inline]
    pub fn set_verify_tag(&mut self, verify_tag: u32) {
        self.verify_tag = verify_tag;
    }

    /// The packet's chunks, in wire order.
    #[inline]
    pub fn chunks(&self) -> &[SctpChunk] {
        &self.chunks
    }

    #[inline]
    pub fn chunks_mut(&mut self) -> &mut Vec<SctpChunk> {
        &mut self.chunks
    }

    /// The transmitted CRC32c checksum of a serialized copy of this packet.
    #[inline]
    pub fn chksum(&self) -> u32 {
        let bytes = self.to_bytes();
        u32::from_be_bytes(utils::to_array(&bytes, CHKSUM_OFFSET).unwrap())
    }
}

impl FromBytes for SctpPacket {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        if bytes.len() < 12 {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InsufficientBytes {
                    required: 12,
                    available: bytes.len(),
                },
                reason: "SCTP packet truncated before the end of its common header",
            });
        }

        // The CRC covers the whole packet, so it is validated before any
        // chunk is interpreted.
        let transmitted = u32::from_be_bytes(utils::to_array(bytes, CHKSUM_OFFSET).unwrap());
        if utils::crc32c_zeroed(bytes, CHKSUM_OFFSET) != transmitted {
            return Err(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InvalidChecksum(transmitted),
                reason: "CRC32c checksum mismatch",
            });
        }

        let mut chunks = Vec::new();
        let mut cursor = 12;
        while cursor < bytes.len() {
            let remaining = &bytes[cursor..];
            let header = utils::get_array::<4>(remaining, 0).ok_or(ValidationError {
                layer: LAYER_SCTP,
                kind: ValidationErrorKind::InsufficientBytes {
                    required: 4,
                    available: remaining.len(),
                },
                reason: "chunk truncated before its length field",
            })?;
            let length = u16::from_be_bytes([header[2], header[3]]) as usize;
            if length < 4 {
                return Err(ValidationError {
                    layer: LAYER_SCTP,
                    kind: ValidationErrorKind::InvalidLength(length),
                    reason: "chunk length field cannot be less than the chunk header",
                });
            }
            let padded = utils::padded_length::<4>(length);
            if padded > remaining.len() {
                return Err(ValidationError {
                    layer: LAYER_SCTP,
                    kind: ValidationErrorKind::InsufficientBytes {
                        required: padded,
                        available: remaining.len(),
                    },
                    reason: "fewer bytes available than the chunk length promises",
                });
            }
            chunks.push(SctpChunk::from_bytes(&remaining[..padded])?);
            cursor += padded;
        }

        Ok(SctpPacket {
            sport: u16::from_be_bytes([bytes[0], bytes[1]]),
            dport: u16::from_be_bytes([bytes[2], bytes[3]]),
            verify_tag: u32::from_be_bytes(utils::to_array(bytes, 4).unwrap()),
            chunks,
        })
    }
}

impl LayerLength for SctpPacket {
    fn len(&self) -> usize {
        12 + self.chunks.iter().map(|c| c.len()).sum::<usize>()
    }
}

impl ToBytes for SctpPacket {
    fn to_bytes_extended(&self, bytes: &mut Vec<u8>) {
        let start = bytes.len();
        bytes.extend(self.sport.to_be_bytes());
        bytes.extend(self.dport.to_be_bytes());
        bytes.extend(self.verify_tag.to_be_bytes());
        bytes.extend([0u8; 4]); // checksum, patched below
        for chunk in &self.chunks {
            chunk.to_bytes_extended(bytes);
        }

        let chksum = utils::crc32c_zeroed(&bytes[start..], CHKSUM_OFFSET);
        bytes[start + CHKSUM_OFFSET..start + CHKSUM_OFFSET + 4]
            .copy_from_slice(&chksum.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet_with(chunks: Vec<SctpChunk>) -> SctpPacket {
        SctpPacket::new(2905, 2905, 0xDEADBEEF, chunks)
    }

    /// Wraps a hand-built chunk in a packet, filling in the chunk's length
    /// field, its padding and the packet CRC.
    fn packet_bytes_with_raw_chunk(mut chunk: Vec<u8>) -> Vec<u8> {
        let declared = chunk.len() as u16;
        chunk[2..4].copy_from_slice(&declared.to_be_bytes());
        while chunk.len() % 4 != 0 {
            chunk.push(0);
        }
        let mut bytes = packet_with(Vec::new()).to_bytes();
        bytes.extend(chunk);
        let chksum = utils::crc32c_zeroed(&bytes, CHKSUM_OFFSET);
        bytes[8..12].copy_from_slice(&chksum.to_be_bytes());
        bytes
    }

    /// An INIT chunk (fixed fields zeroed) carrying one raw parameter TLV.
    fn init_chunk_with_param_tlv(tlv: &[u8]) -> Vec<u8> {
        let mut chunk = vec![CHUNK_TYPE_INIT, 0, 0, 0];
        chunk.extend([0u8; 16]);
        chunk.extend(tlv);
        chunk
    }

    #[test]
    fn cookie_ack_round_trips() {
        let packet = packet_with(vec![SctpChunk::CookieAck]);
        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[12..], &[CHUNK_TYPE_COOKIE_ACK, 0, 0, 4]);
        assert_eq!(SctpPacket::from_bytes(&bytes).unwrap(), packet);
    }

    #[test]
    fn corrupt_crc_is_rejected_with_transmitted_value() {
        let mut bytes = packet_with(vec![SctpChunk::CookieAck]).to_bytes();
        bytes[8] ^= 0x01;
        let transmitted = u32::from_be_bytes(bytes[8..12].try_into().unwrap());
        let err = SctpPacket::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidChecksum(transmitted));
    }

    #[test]
    fn data_chunk_round_trips_with_padding() {
        let data = DataChunk::new(
            DataChunkFlags::BEGINNING_FRAGMENT | DataChunkFlags::ENDING_FRAGMENT,
            100,
            7,
            3,
            46, // M3UA
            vec![0xAB; 5],
        )
        .unwrap();
        let packet = packet_with(vec![SctpChunk::Data(data)]);
        let bytes = packet.to_bytes();
        // 12 header + 16 fixed + 5 user data, padded to a word boundary
        assert_eq!(bytes.len(), 12 + 24);
        assert_eq!(bytes[12 + 2..12 + 4], 21u16.to_be_bytes());
        assert_eq!(&bytes[bytes.len() - 3..], &[0, 0, 0]);
        assert_eq!(SctpPacket::from_bytes(&bytes).unwrap(), packet);
    }

    #[test]
    fn payloadless_data_chunk_is_rejected() {
        assert!(DataChunk::new(DataChunkFlags::default(), 0, 0, 0, 0, Vec::new()).is_err());

        let mut bytes = packet_with(vec![SctpChunk::CookieAck]).to_bytes();
        bytes[12..16].copy_from_slice(&[CHUNK_TYPE_DATA, 0, 0, 16]);
        bytes.extend([0u8; 12]);
        let chksum = utils::crc32c_zeroed(&bytes, CHKSUM_OFFSET);
        bytes[8..12].copy_from_slice(&chksum.to_be_bytes());

        let err = SctpPacket::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(16));
    }

    #[test]
    fn nonzero_chunk_padding_is_rejected() {
        let data = DataChunk::new(DataChunkFlags::default(), 1, 1, 0, 0, vec![0xFF]).unwrap();
        let mut bytes = packet_with(vec![SctpChunk::Data(data)]).to_bytes();
        *bytes.last_mut().unwrap() = 0x01;
        let chksum = utils::crc32c_zeroed(&bytes, CHKSUM_OFFSET);
        bytes[8..12].copy_from_slice(&chksum.to_be_bytes());

        let err = SctpPacket::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidValue);
    }

    #[test]
    fn init_with_parameters_round_trips() {
        let fields = InitFields {
            init_tag: 0x01020304,
            a_rwnd: 65536,
            ostreams: 10,
            istreams: 10,
            init_tsn: 1000,
        };
        // The 9-byte hostname forces inter-TLV padding; the final parameter
        // stays unpadded in the chunk length.
        let init = InitChunk::new(
            fields,
            vec![
                ChunkParameter::HostnameAddress(b"host1".to_vec()),
                ChunkParameter::SupportedAddressTypes(vec![5, 6]),
            ],
        )
        .unwrap();
        let chunk = SctpChunk::Init(init);
        assert_eq!(chunk.unpadded_len(), 4 + 16 + 12 + 8);

        let packet = packet_with(vec![chunk]);
        let bytes = packet.to_bytes();
        assert_eq!(SctpPacket::from_bytes(&bytes).unwrap(), packet);
    }

    #[test]
    fn state_cookie_is_not_permitted_in_init() {
        let fields = InitFields {
            init_tag: 1,
            a_rwnd: 1500,
            ostreams: 1,
            istreams: 1,
            init_tsn: 0,
        };
        let err = InitChunk::new(fields, vec![ChunkParameter::StateCookie(vec![0xAA; 4])])
            .unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::InvalidType(PARAM_TYPE_STATE_COOKIE)
        );
    }

    #[test]
    fn init_ack_accepts_state_cookie() {
        let fields = InitFields {
            init_tag: 2,
            a_rwnd: 1500,
            ostreams: 1,
            istreams: 1,
            init_tsn: 0,
        };
        let init_ack = InitAckChunk::new(
            fields,
            vec![
                ChunkParameter::Ipv4Address(u32::from_be_bytes([10, 0, 0, 1])),
                ChunkParameter::StateCookie(vec![0x5A; 16]),
            ],
        )
        .unwrap();
        let packet = packet_with(vec![SctpChunk::InitAck(init_ack)]);
        let bytes = packet.to_bytes();
        assert_eq!(SctpPacket::from_bytes(&bytes).unwrap(), packet);
    }

    #[test]
    fn sack_round_trips_and_checks_counts() {
        let sack = SackChunk::new(5000, 32768, vec![(2, 3), (5, 5)], vec![4998]).unwrap();
        let packet = packet_with(vec![SctpChunk::Sack(sack)]);
        let mut bytes = packet.to_bytes();
        assert_eq!(SctpPacket::from_bytes(&bytes).unwrap(), packet);

        // Claim one more gap block than the chunk holds.
        bytes[12 + 12..12 + 14].copy_from_slice(&3u16.to_be_bytes());
        let chksum = utils::crc32c_zeroed(&bytes, CHKSUM_OFFSET);
        bytes[8..12].copy_from_slice(&chksum.to_be_bytes());
        let err = SctpPacket::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(28));
    }

    #[test]
    fn heartbeat_round_trips() {
        let hb = SctpChunk::Heartbeat(HeartbeatChunk::new(vec![1, 2, 3, 4, 5, 6]).unwrap());
        let packet = packet_with(vec![hb]);
        let bytes = packet.to_bytes();
        assert_eq!(SctpPacket::from_bytes(&bytes).unwrap(), packet);
    }

    #[test]
    fn abort_with_causes_round_trips_t_bit() {
        let abort = SctpChunk::Abort(
            AbortChunk::new(
                true,
                vec![
                    ErrorCause::UserInitiatedAbort(b"operator shutdown".to_vec()),
                    ErrorCause::ProtocolViolation(Vec::new()),
                ],
            )
            .unwrap(),
        );
        let packet = packet_with(vec![abort]);
        let bytes = packet.to_bytes();
        assert_eq!(bytes[12 + 1], ABORT_FLAGS_T_BIT);
        assert_eq!(SctpPacket::from_bytes(&bytes).unwrap(), packet);
    }

    #[test]
    fn error_chunk_may_carry_no_causes() {
        let mut bytes = packet_with(vec![SctpChunk::CookieAck]).to_bytes();
        bytes[12..16].copy_from_slice(&[CHUNK_TYPE_ERROR, 0, 0, 4]);
        let chksum = utils::crc32c_zeroed(&bytes, CHKSUM_OFFSET);
        bytes[8..12].copy_from_slice(&chksum.to_be_bytes());

        let packet = SctpPacket::from_bytes(&bytes).unwrap();
        assert_eq!(packet.chunks(), &[SctpChunk::Error(ErrorChunk::default())]);
    }

    #[test]
    fn error_causes_round_trip() {
        let error = SctpChunk::Error(
            ErrorChunk::new(vec![
                ErrorCause::InvalidStreamIdentifier(99),
                ErrorCause::MissingMandatoryParameter(vec![PARAM_TYPE_IPV4_ADDRESS]),
                ErrorCause::StaleCookie(123456),
                ErrorCause::NoUserData(777),
                ErrorCause::CookieReceivedWhileShuttingDown,
            ])
            .unwrap(),
        );
        let packet = packet_with(vec![error]);
        let bytes = packet.to_bytes();
        assert_eq!(SctpPacket::from_bytes(&bytes).unwrap(), packet);
    }

    #[test]
    fn unknown_chunk_type_is_rejected_with_the_octet() {
        let mut bytes = packet_with(vec![SctpChunk::CookieAck]).to_bytes();
        bytes[12] = 63;
        let chksum = utils::crc32c_zeroed(&bytes, CHKSUM_OFFSET);
        bytes[8..12].copy_from_slice(&chksum.to_be_bytes());

        let err = SctpPacket::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidType(63));
    }

    #[test]
    fn shutdown_sequence_round_trips_in_order() {
        let packet = packet_with(vec![
            SctpChunk::Shutdown(ShutdownChunk { cum_tsn_ack: 42 }),
            SctpChunk::ShutdownAck,
            SctpChunk::ShutdownComplete(ShutdownCompleteChunk {
                reflected_tag: false,
            }),
        ]);
        let bytes = packet.to_bytes();
        let parsed = SctpPacket::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.chunks().len(), 3);
        assert_eq!(parsed, packet);
    }

    #[test]
    fn shutdown_with_wrong_length_is_rejected() {
        let mut bytes = packet_with(vec![SctpChunk::CookieAck]).to_bytes();
        bytes[12..16].copy_from_slice(&[CHUNK_TYPE_SHUTDOWN, 0, 0, 4]);
        let chksum = utils::crc32c_zeroed(&bytes, CHKSUM_OFFSET);
        bytes[8..12].copy_from_slice(&chksum.to_be_bytes());

        let err = SctpPacket::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(4));
    }

    #[test]
    fn truncated_final_chunk_is_rejected() {
        let data = DataChunk::new(DataChunkFlags::default(), 1, 1, 0, 0, vec![1, 2, 3]).unwrap();
        let bytes = packet_with(vec![SctpChunk::Data(data)]).to_bytes();
        let err = SctpPacket::from_bytes(&bytes[..bytes.len() - 2]).unwrap_err();
        // CRC no longer matches once the buffer is cut short
        assert!(matches!(
            err.kind,
            ValidationErrorKind::InvalidChecksum(_)
        ));
    }

    #[test]
    fn cookie_echo_round_trips_unaligned_cookie() {
        let ce = SctpChunk::CookieEcho(CookieEchoChunk::new(vec![0xC0; 9]).unwrap());
        let packet = packet_with(vec![ce, SctpChunk::CookieAck]);
        let bytes = packet.to_bytes();
        // 9-byte cookie pads the first chunk to 16 bytes on the wire
        assert_eq!(bytes.len(), 12 + 16 + 4);
        assert_eq!(SctpPacket::from_bytes(&bytes).unwrap(), packet);
    }

    #[test]
    fn oversized_chunk_contents_fail_construction() {
        let err = CookieEchoChunk::new(vec![0; 70_000]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(70_004));

        let err = DataChunk::new(DataChunkFlags::default(), 0, 0, 0, 0, vec![0; 70_000])
            .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(70_016));

        assert!(HeartbeatChunk::new(vec![0; 70_000]).is_err());
        assert!(HeartbeatAckChunk::new(vec![0; 70_000]).is_err());
        assert!(SackChunk::new(0, 0, vec![(0, 0); 20_000], Vec::new()).is_err());
        assert!(AbortChunk::new(false, vec![ErrorCause::ProtocolViolation(vec![0; 70_000])])
            .is_err());
        assert!(ErrorChunk::new(vec![ErrorCause::ProtocolViolation(vec![0; 70_000])]).is_err());
    }

    #[test]
    fn oversized_parameter_fails_init_construction() {
        let fields = InitFields {
            init_tag: 1,
            a_rwnd: 1500,
            ostreams: 1,
            istreams: 1,
            init_tsn: 0,
        };
        let err = InitChunk::new(
            fields,
            vec![ChunkParameter::HostnameAddress(vec![b'a'; 70_000])],
        )
        .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(70_004));
    }

    #[test]
    fn oversized_user_data_fails_replacement() {
        let mut data =
            DataChunk::new(DataChunkFlags::default(), 1, 1, 0, 0, vec![0xAA]).unwrap();
        let err = data.set_user_data(vec![0; 70_000]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(70_016));
        assert_eq!(data.user_data(), &[0xAA]);
    }

    #[test]
    fn fixed_size_parameters_reject_mismatched_lengths() {
        // Cookie Preservative declared as 10 bytes instead of 8
        let bytes = packet_bytes_with_raw_chunk(init_chunk_with_param_tlv(&[
            0, 9, 0, 10, 0, 0, 0, 0, 0, 0,
        ]));
        let err = SctpPacket::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(10));

        // IPv4 Address declared as 6 bytes instead of 8
        let bytes = packet_bytes_with_raw_chunk(init_chunk_with_param_tlv(&[0, 5, 0, 6, 10, 0]));
        let err = SctpPacket::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(6));

        // IPv6 Address declared as 8 bytes instead of 20
        let bytes =
            packet_bytes_with_raw_chunk(init_chunk_with_param_tlv(&[0, 6, 0, 8, 0, 0, 0, 0]));
        let err = SctpPacket::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(8));
    }

    #[test]
    fn fixed_size_error_causes_reject_mismatched_lengths() {
        // Stale Cookie declared as 10 bytes instead of 8
        let mut chunk = vec![CHUNK_TYPE_ERROR, 0, 0, 0];
        chunk.extend([0, 3, 0, 10, 0, 0, 0, 0, 0, 0]);
        let err = SctpPacket::from_bytes(&packet_bytes_with_raw_chunk(chunk)).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(10));

        // No User Data declared as 6 bytes instead of 8
        let mut chunk = vec![CHUNK_TYPE_ERROR, 0, 0, 0];
        chunk.extend([0, 9, 0, 6, 0, 0]);
        let err = SctpPacket::from_bytes(&packet_bytes_with_raw_chunk(chunk)).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(6));
    }

    #[test]
    fn heartbeat_rejects_foreign_inner_tlv() {
        // An IPv4 Address TLV where Heartbeat Info is required
        let mut chunk = vec![CHUNK_TYPE_HEARTBEAT, 0, 0, 0];
        chunk.extend([0, 5, 0, 8, 10, 0, 0, 1]);
        let err = SctpPacket::from_bytes(&packet_bytes_with_raw_chunk(chunk)).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::InvalidType(PARAM_TYPE_IPV4_ADDRESS)
        );
    }

    #[test]
    fn chunkless_packet_round_trips_empty() {
        let packet = packet_with(Vec::new());
        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), 12);
        let parsed = SctpPacket::from_bytes(&bytes).unwrap();
        assert!(parsed.chunks().is_empty());
        assert_eq!(parsed, packet);
    }
}
