// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! IPv4 header, options grammar and datagram (RFC 791).
//!
//! The options grammar covers the full RFC 791 set implemented by this
//! library: End of Option List, No Operation, Security, Loose/Strict Source
//! Route, Record Route, Stream Identifier and Internet Timestamp. Each option
//! validates its length octet against its type-specific expectation, and the
//! route/timestamp options validate their pointer fields at construction time
//! as well as during parsing, so an out-of-range value can never be
//! represented.

use bitflags::bitflags;
use core::mem;

use crate::error::{ValidationError, ValidationErrorKind};
use crate::layers::traits::*;
use crate::utils;

const LAYER_IPV4: &str = "Ipv4";
const LAYER_IPV4_OPTION: &str = "Ipv4 Option";

// Option type octets (copy flag | class | number)
const OPT_TYPE_EOOL: u8 = 0x00;
const OPT_TYPE_NOP: u8 = 0x01;
const OPT_TYPE_SECURITY: u8 = 0x82;
const OPT_TYPE_LSRR: u8 = 0x83;
const OPT_TYPE_SSRR: u8 = 0x89;
const OPT_TYPE_RECORD_ROUTE: u8 = 0x07;
const OPT_TYPE_STREAM_ID: u8 = 0x88;
const OPT_TYPE_TIMESTAMP: u8 = 0x44;

const SECURITY_OPT_LEN: u8 = 11;
const STREAM_ID_OPT_LEN: u8 = 4;

// Timestamp flag nibble values (RFC 791)
const TS_FLAG_TIMESTAMPS_ONLY: u8 = 0;
const TS_FLAG_ADDRESSED: u8 = 1;
const TS_FLAG_PRESPECIFIED: u8 = 3;

/// The smallest legal route-option pointer: the first address slot starts at
/// octet 4 of the option.
const ROUTE_POINTER_MIN: u8 = 4;
/// The smallest legal timestamp-option pointer (RFC 791: the timestamp area
/// begins at octet 5).
const TIMESTAMP_POINTER_MIN: u8 = 5;

/// The option classes encoded in bits 5-6 of an option-type octet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Ipv4OptionClass {
    Control = 0,
    Reserved1 = 1,
    DebuggingMeasurement = 2,
    Reserved3 = 3,
}

/// Differentiated Services Code Point, the upper 6 bits of the former Type of
/// Service octet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffServ {
    dscp: u8,
}

impl DiffServ {
    /// A `DiffServ` from a 6-bit code point, failing if `dscp` exceeds 63.
    pub fn new(dscp: u8) -> Result<Self, ValidationError> {
        if dscp > 0b0011_1111 {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::OutOfRange(dscp as usize),
                reason: "DSCP is a 6-bit field",
            });
        }
        Ok(DiffServ { dscp })
    }

    #[inline]
    pub fn dscp(&self) -> u8 {
        self.dscp
    }
}

impl From<u8> for DiffServ {
    /// Extracts the code point from a full Type of Service octet.
    #[inline]
    fn from(value: u8) -> Self {
        DiffServ { dscp: value >> 2 }
    }
}

/// Explicit Congestion Notification values, the lower 2 bits of the former
/// Type of Service octet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Ecn {
    /// Non ECN-Capable Transport
    #[default]
    NonEct = 0b00,
    /// ECN Capable Transport, ECT(0)
    Ect0 = 0b10,
    /// ECN Capable Transport, ECT(1)
    Ect1 = 0b01,
    /// Congestion Encountered
    CgstEnc = 0b11,
}

impl From<u8> for Ecn {
    /// Converts the least significant two bits of the given byte into
    /// Explicit Congestion Notification flags.
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Ecn::NonEct,
            0b10 => Ecn::Ect0,
            0b01 => Ecn::Ect1,
            _ => Ecn::CgstEnc,
        }
    }
}

bitflags! {
    /// The three flag bits of an IPv4 header, stored in the top bits of
    /// octet 6.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Ipv4Flags: u8 {
        const RESERVED = 0b1000_0000;
        const DONT_FRAGMENT = 0b0100_0000;
        const MORE_FRAGMENTS = 0b0010_0000;
    }
}

// =============================================================================
//                               IPv4 Options
// =============================================================================

/// A single IPv4 option, keyed by its option-type octet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ipv4Option {
    /// End of Option List (0x00). Terminates the option list; any remaining
    /// bytes up to the IHL boundary are zero padding.
    EndOfOptionList,
    /// No Operation (0x01).
    NoOperation,
    /// Security/RIPSO (0x82), the defunct 11-byte DoD option.
    Security(SecurityOption),
    /// Loose Source and Record Route (0x83).
    LooseSourceRoute(RouteOption),
    /// Strict Source and Record Route (0x89).
    StrictSourceRoute(RouteOption),
    /// Record Route (0x07).
    RecordRoute(RouteOption),
    /// Stream Identifier (0x88).
    StreamIdentifier(u16),
    /// Internet Timestamp (0x44).
    InternetTimestamp(TimestampOption),
}

impl Ipv4Option {
    /// The option-type octet, encoding the copied flag, class and number.
    #[inline]
    pub fn option_type(&self) -> u8 {
        match self {
            Self::EndOfOptionList => OPT_TYPE_EOOL,
            Self::NoOperation => OPT_TYPE_NOP,
            Self::Security(_) => OPT_TYPE_SECURITY,
            Self::LooseSourceRoute(_) => OPT_TYPE_LSRR,
            Self::StrictSourceRoute(_) => OPT_TYPE_SSRR,
            Self::RecordRoute(_) => OPT_TYPE_RECORD_ROUTE,
            Self::StreamIdentifier(_) => OPT_TYPE_STREAM_ID,
            Self::InternetTimestamp(_) => OPT_TYPE_TIMESTAMP,
        }
    }

    /// Whether the option is copied into every fragment on fragmentation.
    #[inline]
    pub fn copied(&self) -> bool {
        self.option_type() & 0b_1000_0000 > 0
    }

    #[inline]
    pub fn option_class(&self) -> Ipv4OptionClass {
        // SAFETY: this value can only ever be between 0 and 3 inclusive
        unsafe { mem::transmute((self.option_type() & 0b_0110_0000) >> 5) }
    }

    /// Parses one option from the front of `bytes`, returning it along with
    /// the number of bytes it consumed.
    fn parse_front(bytes: &[u8]) -> Result<(Self, usize), ValidationError> {
        let &option_type = bytes.first().ok_or(ValidationError {
            layer: LAYER_IPV4_OPTION,
            kind: ValidationErrorKind::InsufficientBytes {
                required: 1,
                available: 0,
            },
            reason: "option list ended before an option-type octet",
        })?;

        match option_type {
            OPT_TYPE_EOOL => return Ok((Self::EndOfOptionList, 1)),
            OPT_TYPE_NOP => return Ok((Self::NoOperation, 1)),
            _ => (),
        }

        let &length = bytes.get(1).ok_or(ValidationError {
            layer: LAYER_IPV4_OPTION,
            kind: ValidationErrorKind::InsufficientBytes {
                required: 2,
                available: 1,
            },
            reason: "sized IPv4 option is missing its length octet",
        })?;

        if (length as usize) > bytes.len() || length < 2 {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::InvalidLength(length as usize),
                reason: "IPv4 option length octet exceeds the remaining option area",
            });
        }
        let body = &bytes[..length as usize];

        let option = match option_type {
            OPT_TYPE_SECURITY => {
                if length != SECURITY_OPT_LEN {
                    return Err(ValidationError {
                        layer: LAYER_IPV4_OPTION,
                        kind: ValidationErrorKind::InvalidLength(length as usize),
                        reason: "Security option must be exactly 11 bytes",
                    });
                }
                Self::Security(SecurityOption {
                    security: u16::from_be_bytes([body[2], body[3]]),
                    compartments: u16::from_be_bytes([body[4], body[5]]),
                    handling: u16::from_be_bytes([body[6], body[7]]),
                    tcc: u32::from_be_bytes([0, body[8], body[9], body[10]]),
                })
            }
            OPT_TYPE_LSRR | OPT_TYPE_SSRR | OPT_TYPE_RECORD_ROUTE => {
                let route = RouteOption::parse(body)?;
                match option_type {
                    OPT_TYPE_LSRR => Self::LooseSourceRoute(route),
                    OPT_TYPE_SSRR => Self::StrictSourceRoute(route),
                    _ => Self::RecordRoute(route),
                }
            }
            OPT_TYPE_STREAM_ID => {
                if length != STREAM_ID_OPT_LEN {
                    return Err(ValidationError {
                        layer: LAYER_IPV4_OPTION,
                        kind: ValidationErrorKind::InvalidLength(length as usize),
                        reason: "Stream Identifier option must be exactly 4 bytes",
                    });
                }
                Self::StreamIdentifier(u16::from_be_bytes([body[2], body[3]]))
            }
            OPT_TYPE_TIMESTAMP => Self::InternetTimestamp(TimestampOption::parse(body)?),
            _ => {
                return Err(ValidationError {
                    layer: LAYER_IPV4_OPTION,
                    kind: ValidationErrorKind::InvalidType(option_type as u16),
                    reason: "unrecognized IPv4 option type octet",
                })
            }
        };

        Ok((option, length as usize))
    }
}

impl FromBytes for Ipv4Option {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let (option, consumed) = Self::parse_front(bytes)?;
        if consumed < bytes.len() {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::ExcessBytes(bytes.len() - consumed),
                reason: "excess bytes at end of IPv4 option",
            });
        }
        Ok(option)
    }
}

impl LayerLength for Ipv4Option {
    fn len(&self) -> usize {
        match self {
            Self::EndOfOptionList | Self::NoOperation => 1,
            Self::Security(_) => SECURITY_OPT_LEN as usize,
            Self::LooseSourceRoute(r) | Self::StrictSourceRoute(r) | Self::RecordRoute(r) => {
                3 + 4 * r.addresses.len()
            }
            Self::StreamIdentifier(_) => STREAM_ID_OPT_LEN as usize,
            Self::InternetTimestamp(ts) => 4 + ts.entries.len() * ts.flag.entry_size(),
        }
    }
}

impl ToBytes for Ipv4Option {
    fn to_bytes_extended(&self, bytes: &mut Vec<u8>) {
        bytes.push(self.option_type());
        match self {
            Self::EndOfOptionList | Self::NoOperation => (),
            Self::Security(sec) => {
                bytes.push(SECURITY_OPT_LEN);
                bytes.extend(sec.security.to_be_bytes());
                bytes.extend(sec.compartments.to_be_bytes());
                bytes.extend(sec.handling.to_be_bytes());
                bytes.extend(&sec.tcc.to_be_bytes()[1..]);
            }
            Self::LooseSourceRoute(r) | Self::StrictSourceRoute(r) | Self::RecordRoute(r) => {
                bytes.push((3 + 4 * r.addresses.len()) as u8);
                bytes.push(r.pointer);
                for addr in &r.addresses {
                    bytes.extend(addr.to_be_bytes());
                }
            }
            Self::StreamIdentifier(id) => {
                bytes.push(STREAM_ID_OPT_LEN);
                bytes.extend(id.to_be_bytes());
            }
            Self::InternetTimestamp(ts) => {
                bytes.push((4 + ts.entries.len() * ts.flag.entry_size()) as u8);
                bytes.push(ts.pointer);
                bytes.push((ts.overflow << 4) | ts.flag as u8);
                for entry in &ts.entries {
                    if let Some(addr) = entry.address {
                        bytes.extend(addr.to_be_bytes());
                    }
                    bytes.extend(entry.timestamp.to_be_bytes());
                }
            }
        }
    }
}

/// The body of the defunct RFC 791 Security option.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecurityOption {
    security: u16,
    compartments: u16,
    handling: u16,
    tcc: u32,
}

impl SecurityOption {
    /// A Security option body, failing if `tcc` exceeds its 24-bit field.
    pub fn new(
        security: u16,
        compartments: u16,
        handling: u16,
        tcc: u32,
    ) -> Result<Self, ValidationError> {
        if tcc > 0x00FF_FFFF {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::OutOfRange(tcc as usize),
                reason: "Transmission Control Code is a 24-bit field",
            });
        }
        Ok(SecurityOption {
            security,
            compartments,
            handling,
            tcc,
        })
    }

    #[inline]
    pub fn security(&self) -> u16 {
        self.security
    }

    #[inline]
    pub fn compartments(&self) -> u16 {
        self.compartments
    }

    #[inline]
    pub fn handling(&self) -> u16 {
        self.handling
    }

    #[inline]
    pub fn tcc(&self) -> u32 {
        self.tcc
    }
}

/// The shared body of the Loose Source Route, Strict Source Route and Record
/// Route options: a pointer into the route data plus an ordered address list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteOption {
    pointer: u8,
    addresses: Vec<u32>,
}

impl RouteOption {
    /// A route option body. The pointer is 1-relative from the start of the
    /// option and must satisfy `4 <= pointer <= length + 1` where
    /// `length = 3 + 4 * addresses.len()`.
    pub fn new(pointer: u8, addresses: Vec<u32>) -> Result<Self, ValidationError> {
        let length = 3 + 4 * addresses.len();
        if length > u8::MAX as usize {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::InvalidLength(length),
                reason: "route option cannot exceed a 1-byte length field",
            });
        }
        if pointer < ROUTE_POINTER_MIN || pointer as usize > length + 1 {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::OutOfRange(pointer as usize),
                reason: "route option pointer must be >= 4 and <= length + 1",
            });
        }
        Ok(RouteOption { pointer, addresses })
    }

    fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        if body.len() < 3 || (body.len() - 3) % 4 != 0 {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::InvalidLength(body.len()),
                reason: "route option length must be 3 plus a multiple of 4",
            });
        }
        let addresses = body[3..]
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes(c.try_into().unwrap()))
            .collect();
        Self::new(body[2], addresses)
    }

    /// The 1-relative offset of the next address slot to process.
    #[inline]
    pub fn pointer(&self) -> u8 {
        self.pointer
    }

    /// The route data, in wire order.
    #[inline]
    pub fn addresses(&self) -> &[u32] {
        &self.addresses
    }
}

/// The flag nibble of an Internet Timestamp option, selecting the entry
/// layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TimestampFlag {
    /// Timestamps only (4-byte entries).
    TimestampsOnly = TS_FLAG_TIMESTAMPS_ONLY,
    /// Each timestamp preceded by the registering address (8-byte entries).
    AddressedTimestamps = TS_FLAG_ADDRESSED,
    /// Addresses prespecified by the sender (8-byte entries).
    PrespecifiedAddresses = TS_FLAG_PRESPECIFIED,
}

impl TimestampFlag {
    #[inline]
    fn entry_size(&self) -> usize {
        match self {
            Self::TimestampsOnly => 4,
            Self::AddressedTimestamps | Self::PrespecifiedAddresses => 8,
        }
    }
}

/// One slot of an Internet Timestamp option. `address` is present exactly
/// when the option's flag records addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimestampEntry {
    pub address: Option<u32>,
    pub timestamp: u32,
}

/// The body of the Internet Timestamp option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimestampOption {
    pointer: u8,
    overflow: u8,
    flag: TimestampFlag,
    entries: Vec<TimestampEntry>,
}

impl TimestampOption {
    /// A timestamp option body. The pointer is 1-relative from the start of
    /// the option and must satisfy `5 <= pointer <= length + 1`; `overflow`
    /// is a 4-bit counter; every entry must match the layout `flag` selects.
    pub fn new(
        pointer: u8,
        overflow: u8,
        flag: TimestampFlag,
        entries: Vec<TimestampEntry>,
    ) -> Result<Self, ValidationError> {
        let length = 4 + entries.len() * flag.entry_size();
        if length > u8::MAX as usize {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::InvalidLength(length),
                reason: "timestamp option cannot exceed a 1-byte length field",
            });
        }
        if pointer < TIMESTAMP_POINTER_MIN || pointer as usize > length + 1 {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::OutOfRange(pointer as usize),
                reason: "timestamp option pointer must be >= 5 and <= length + 1",
            });
        }
        if overflow > 0x0F {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::OutOfRange(overflow as usize),
                reason: "timestamp overflow count is a 4-bit field",
            });
        }
        let records_addresses = flag.entry_size() == 8;
        if entries.iter().any(|e| e.address.is_some() != records_addresses) {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::InvalidValue,
                reason: "timestamp entries must match the layout the flag selects",
            });
        }
        Ok(TimestampOption {
            pointer,
            overflow,
            flag,
            entries,
        })
    }

    fn parse(body: &[u8]) -> Result<Self, ValidationError> {
        if body.len() < 4 {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::InvalidLength(body.len()),
                reason: "timestamp option must be at least 4 bytes",
            });
        }
        let flag = match body[3] & 0x0F {
            TS_FLAG_TIMESTAMPS_ONLY => TimestampFlag::TimestampsOnly,
            TS_FLAG_ADDRESSED => TimestampFlag::AddressedTimestamps,
            TS_FLAG_PRESPECIFIED => TimestampFlag::PrespecifiedAddresses,
            _ => {
                return Err(ValidationError {
                    layer: LAYER_IPV4_OPTION,
                    kind: ValidationErrorKind::InvalidValue,
                    reason: "timestamp option flag must be 0, 1 or 3",
                })
            }
        };
        if (body.len() - 4) % flag.entry_size() != 0 {
            return Err(ValidationError {
                layer: LAYER_IPV4_OPTION,
                kind: ValidationErrorKind::InvalidLength(body.len()),
                reason: "timestamp option length does not fit a whole number of entries",
            });
        }
        let entries = body[4..]
            .chunks_exact(flag.entry_size())
            .map(|chunk| match flag {
                TimestampFlag::TimestampsOnly => TimestampEntry {
                    address: None,
                    timestamp: u32::from_be_bytes(chunk.try_into().unwrap()),
                },
                _ => TimestampEntry {
                    address: Some(u32::from_be_bytes(chunk[..4].try_into().unwrap())),
                    timestamp: u32::from_be_bytes(chunk[4..].try_into().unwrap()),
                },
            })
            .collect();
        Self::new(body[2], body[3] >> 4, flag, entries)
    }

    #[inline]
    pub fn pointer(&self) -> u8 {
        self.pointer
    }

    #[inline]
    pub fn overflow(&self) -> u8 {
        self.overflow
    }

    #[inline]
    pub fn flag(&self) -> TimestampFlag {
        self.flag
    }

    #[inline]
    pub fn entries(&self) -> &[TimestampEntry] {
        &self.entries
    }
}

/// Parses the option area of an IPv4 header (the bytes between offset 20 and
/// the IHL boundary).
///
/// An End of Option List option terminates the list; the remaining padding
/// must be zero and shorter than one 32-bit word, so that the re-derived IHL
/// always matches the wire IHL and serialization reproduces the input
/// byte-for-byte.
fn parse_option_area(area: &[u8]) -> Result<Vec<Ipv4Option>, ValidationError> {
    let mut options = Vec::new();
    let mut remaining = area;
    while !remaining.is_empty() {
        let (option, consumed) = Ipv4Option::parse_front(remaining)?;
        let list_ended = option == Ipv4Option::EndOfOptionList;
        options.push(option);
        remaining = &remaining[consumed..];

        if list_ended {
            if remaining.len() >= 4 {
                return Err(ValidationError {
                    layer: LAYER_IPV4,
                    kind: ValidationErrorKind::InvalidLength(remaining.len()),
                    reason: "more than one word of padding after End of Option List",
                });
            }
            if remaining.iter().any(|&b| b != 0) {
                return Err(ValidationError {
                    layer: LAYER_IPV4,
                    kind: ValidationErrorKind::InvalidValue,
                    reason: "nonzero padding after End of Option List",
                });
            }
            break;
        }
    }
    Ok(options)
}

/// Validates the placement rules for a constructed option list: End of Option
/// List may only appear as the final element, and is required whenever the
/// options do not end on a 32-bit boundary.
fn validate_option_list(options: &[Ipv4Option]) -> Result<usize, ValidationError> {
    let mut byte_len = 0;
    for (idx, option) in options.iter().enumerate() {
        if *option == Ipv4Option::EndOfOptionList && idx + 1 != options.len() {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::InvalidValue,
                reason: "End of Option List may only appear as the final option",
            });
        }
        byte_len += option.len();
    }

    if byte_len % 4 != 0 && options.last() != Some(&Ipv4Option::EndOfOptionList) {
        return Err(ValidationError {
            layer: LAYER_IPV4,
            kind: ValidationErrorKind::InvalidValue,
            reason: "options not ending on a 32-bit boundary must terminate with End of Option List",
        });
    }

    let padded = utils::padded_length::<4>(byte_len);
    if padded > 40 {
        return Err(ValidationError {
            layer: LAYER_IPV4,
            kind: ValidationErrorKind::InvalidLength(padded),
            reason: "IPv4 options cannot exceed 40 bytes (IHL is a 4-bit field)",
        });
    }
    Ok(padded)
}

// =============================================================================
//                          IPv4 Header and Datagram
// =============================================================================

/// An IPv4 header: the fixed 20-byte portion plus the option trailer.
///
/// The header checksum is not stored; it is validated against the transmitted
/// value during parsing and re-derived over the serialized header during
/// serialization. `total_length` describes the full datagram the header
/// belongs to, which may not be attached (ICMP error messages embed a bare
/// header).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ipv4Header {
    dscp: DiffServ,
    ecn: Ecn,
    total_length: u16,
    identifier: u16,
    flags: Ipv4Flags,
    frag_offset: u16,
    ttl: u8,
    protocol: u8,
    saddr: u32,
    daddr: u32,
    options: Vec<Ipv4Option>,
}

impl Ipv4Header {
    /// A minimal header with the given addresses and upper-layer protocol
    /// number: empty options, TTL 64, `total_length` covering the bare
    /// header.
    pub fn new(saddr: u32, daddr: u32, protocol: u8) -> Self {
        Ipv4Header {
            dscp: DiffServ::default(),
            ecn: Ecn::default(),
            total_length: 20,
            identifier: 0,
            flags: Ipv4Flags::default(),
            frag_offset: 0,
            ttl: 64,
            protocol,
            saddr,
            daddr,
            options: Vec::new(),
        }
    }

    /// The Internet Header Length in 32-bit words.
    #[inline]
    pub fn ihl(&self) -> u8 {
        (self.len() / 4) as u8
    }

    #[inline]
    pub fn dscp(&self) -> DiffServ {
        self.dscp
    }

    #[inline]
    pub fn set_dscp(&mut self, dscp: DiffServ) {
        self.dscp = dscp;
    }

    #[inline]
    pub fn ecn(&self) -> Ecn {
        self.ecn
    }

    #[inline]
    pub fn set_ecn(&mut self, ecn: Ecn) {
        self.ecn = ecn;
    }

    /// The length of the datagram this header describes (header + payload).
    #[inline]
    pub fn total_length(&self) -> u16 {
        self.total_length
    }

    #[inline]
    pub fn set_total_length(&mut self, total_length: u16) {
        self.total_length = total_length;
    }

    #[inline]
    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    #[inline]
    pub fn set_identifier(&mut self, identifier: u16) {
        self.identifier = identifier;
    }

    #[inline]
    pub fn flags(&self) -> Ipv4Flags {
        self.flags
    }

    #[inline]
    pub fn set_flags(&mut self, flags: Ipv4Flags) {
        self.flags = flags;
    }

    #[inline]
    pub fn frag_offset(&self) -> u16 {
        self.frag_offset
    }

    /// Sets the fragment offset, failing if it exceeds its 13-bit field.
    pub fn set_frag_offset(&mut self, offset: u16) -> Result<(), ValidationError> {
        if offset > 0b_0001_1111_1111_1111 {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::OutOfRange(offset as usize),
                reason: "fragment offset is a 13-bit field",
            });
        }
        self.frag_offset = offset;
        Ok(())
    }

    #[inline]
    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    #[inline]
    pub fn set_ttl(&mut self, ttl: u8) {
        self.ttl = ttl;
    }

    /// The upper-layer protocol number carried in the datagram's payload.
    #[inline]
    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    #[inline]
    pub fn set_protocol(&mut self, protocol: u8) {
        self.protocol = protocol;
    }

    #[inline]
    pub fn saddr(&self) -> u32 {
        self.saddr
    }

    #[inline]
    pub fn set_saddr(&mut self, saddr: u32) {
        self.saddr = saddr;
    }

    #[inline]
    pub fn daddr(&self) -> u32 {
        self.daddr
    }

    #[inline]
    pub fn set_daddr(&mut self, daddr: u32) {
        self.daddr = daddr;
    }

    #[inline]
    pub fn options(&self) -> &[Ipv4Option] {
        &self.options
    }

    /// Replaces the option list, enforcing the End of Option List placement
    /// rules and the 40-byte option budget.
    pub fn set_options(&mut self, options: Vec<Ipv4Option>) -> Result<(), ValidationError> {
        validate_option_list(&options)?;
        self.options = options;
        Ok(())
    }

    /// The transmitted header checksum of a serialized copy of this header.
    #[inline]
    pub fn chksum(&self) -> u16 {
        let bytes = self.to_bytes();
        u16::from_be_bytes([bytes[10], bytes[11]])
    }
}

impl FromBytes for Ipv4Header {
    /// Parses the header from the front of `bytes`, consuming exactly IHL x 4
    /// bytes and tolerating any trailing payload.
    fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let &version_ihl = bytes.first().ok_or(ValidationError {
            layer: LAYER_IPV4,
            kind: ValidationErrorKind::InsufficientBytes {
                required: 20,
                available: 0,
            },
            reason: "missing version/IHL octet",
        })?;

        let version = version_ihl >> 4;
        if version != 4 {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::InvalidType(version as u16),
                reason: "version nibble of an IPv4 header must be 4",
            });
        }

        let ihl = (version_ihl & 0x0F) as usize;
        if ihl < 5 {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::InvalidLength(ihl),
                reason: "IHL must be at least 5 (20-byte header)",
            });
        }

        let header_len = ihl * 4;
        if bytes.len() < header_len {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::InsufficientBytes {
                    required: header_len,
                    available: bytes.len(),
                },
                reason: "fewer bytes available than the IHL promises",
            });
        }
        let header = &bytes[..header_len];

        if !utils::verify_internet_checksum(header) {
            let transmitted = u16::from_be_bytes([header[10], header[11]]);
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::InvalidChecksum(transmitted as u32),
                reason: "IPv4 header checksum mismatch",
            });
        }

        let options = parse_option_area(&header[20..])?;
        // The re-derived option length must land back on the wire IHL, or the
        // serialized form would not be byte-identical to the input.
        let rederived = 20 + validate_option_list(&options)?;
        if rederived != header_len {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::InvalidLength(ihl),
                reason: "option list ends before the IHL boundary",
            });
        }

        Ok(Ipv4Header {
            dscp: DiffServ::from(header[1]),
            ecn: Ecn::from(header[1]),
            total_length: u16::from_be_bytes([header[2], header[3]]),
            identifier: u16::from_be_bytes([header[4], header[5]]),
            flags: Ipv4Flags::from_bits_truncate(header[6]),
            frag_offset: u16::from_be_bytes([header[6], header[7]]) & 0b_0001_1111_1111_1111,
            ttl: header[8],
            protocol: header[9],
            saddr: u32::from_be_bytes(utils::to_array(header, 12).unwrap()),
            daddr: u32::from_be_bytes(utils::to_array(header, 16).unwrap()),
            options,
        })
    }
}

impl LayerLength for Ipv4Header {
    /// The header's wire length: 20 bytes plus the padded option trailer.
    fn len(&self) -> usize {
        20 + utils::padded_length::<4>(self.options.iter().map(|o| o.len()).sum())
    }
}

impl ToBytes for Ipv4Header {
    fn to_bytes_extended(&self, bytes: &mut Vec<u8>) {
        let start = bytes.len();
        bytes.push(0x40 | self.ihl());
        bytes.push((self.dscp.dscp() << 2) | self.ecn as u8);
        bytes.extend(self.total_length.to_be_bytes());
        bytes.extend(self.identifier.to_be_bytes());
        bytes.extend((((self.flags.bits() as u16) << 8) | self.frag_offset).to_be_bytes());
        bytes.push(self.ttl);
        bytes.push(self.protocol);
        bytes.extend([0u8; 2]); // checksum, patched below
        bytes.extend(self.saddr.to_be_bytes());
        bytes.extend(self.daddr.to_be_bytes());
        for option in &self.options {
            option.to_bytes_extended(bytes);
        }
        while (bytes.len() - start) % 4 != 0 {
            bytes.push(0);
        }

        let chksum = utils::internet_checksum(&bytes[start..]);
        bytes[start + 10..start + 12].copy_from_slice(&chksum.to_be_bytes());
    }
}

/// A complete IPv4 datagram: a header plus the payload its Total Length field
/// spans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ipv4Datagram {
    header: Ipv4Header,
    payload: Vec<u8>,
}

impl Ipv4Datagram {
    /// A datagram from a header and payload, re-deriving the header's Total
    /// Length field and failing if the result exceeds its 16-bit field.
    pub fn new(mut header: Ipv4Header, payload: Vec<u8>) -> Result<Self, ValidationError> {
        let total_length = header.len() + payload.len();
        match u16::try_from(total_length) {
            Ok(l) => header.set_total_length(l),
            Err(_) => {
                return Err(ValidationError {
                    layer: LAYER_IPV4,
                    kind: ValidationErrorKind::InvalidLength(total_length),
                    reason: "datagram cannot exceed a 16-bit Total Length field",
                })
            }
        }
        Ok(Ipv4Datagram { header, payload })
    }

    #[inline]
    pub fn header(&self) -> &Ipv4Header {
        &self.header
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl FromBytes for Ipv4Datagram {
    fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let header = Ipv4Header::from_bytes(bytes)?;

        let total_length = header.total_length() as usize;
        if total_length < header.len() {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::InvalidLength(total_length),
                reason: "Total Length field shorter than the header itself",
            });
        }
        if bytes.len() < total_length {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::InsufficientBytes {
                    required: total_length,
                    available: bytes.len(),
                },
                reason: "fewer bytes available than the Total Length field promises",
            });
        }
        if bytes.len() > total_length {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::ExcessBytes(bytes.len() - total_length),
                reason: "excess bytes at end of IPv4 datagram",
            });
        }

        let payload = bytes[header.len()..].to_vec();
        Ok(Ipv4Datagram { header, payload })
    }
}

impl LayerLength for Ipv4Datagram {
    fn len(&self) -> usize {
        self.header.len() + self.payload.len()
    }
}

impl ToBytes for Ipv4Datagram {
    fn to_bytes_extended(&self, bytes: &mut Vec<u8>) {
        self.header.to_bytes_extended(bytes);
        bytes.extend(&self.payload);
    }
}

impl LengthPrefixed for Ipv4Datagram {
    const PREFIX_LEN: usize = 4;

    fn total_len(prefix: &[u8]) -> Result<usize, ValidationError> {
        let total_length = utils::to_array(prefix, 2)
            .map(u16::from_be_bytes)
            .ok_or(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::InsufficientBytes {
                    required: Self::PREFIX_LEN,
                    available: prefix.len(),
                },
                reason: "prefix too short to hold the Total Length field",
            })? as usize;

        if total_length < 20 {
            return Err(ValidationError {
                layer: LAYER_IPV4,
                kind: ValidationErrorKind::InvalidLength(total_length),
                reason: "Total Length field shorter than a minimal IPv4 header",
            });
        }
        Ok(total_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a 20-byte optionless header with a correct checksum.
    fn minimal_header_bytes() -> Vec<u8> {
        let mut bytes = vec![
            0x45, 0x00, // version/IHL, ToS
            0x00, 0x14, // total length: 20
            0xAB, 0xCD, // identification
            0x40, 0x00, // flags: DF, fragment offset 0
            0x40, 0x01, // TTL 64, protocol ICMP
            0x00, 0x00, // checksum placeholder
            127, 0, 0, 1, // source
            192, 168, 0, 1, // destination
        ];
        let chksum = utils::internet_checksum(&bytes);
        bytes[10..12].copy_from_slice(&chksum.to_be_bytes());
        bytes
    }

    #[test]
    fn minimal_header_parses() {
        let bytes = minimal_header_bytes();
        let header = Ipv4Header::from_bytes(&bytes).unwrap();
        assert_eq!(header.ihl(), 5);
        assert_eq!(header.saddr(), u32::from_be_bytes([127, 0, 0, 1]));
        assert_eq!(header.daddr(), u32::from_be_bytes([192, 168, 0, 1]));
        assert!(header.options().is_empty());
        assert!(header.flags().contains(Ipv4Flags::DONT_FRAGMENT));
        assert_eq!(header.to_bytes(), bytes);
    }

    #[test]
    fn corrupt_checksum_is_rejected_with_transmitted_value() {
        let mut bytes = minimal_header_bytes();
        bytes[10] ^= 0xFF;
        let transmitted = u16::from_be_bytes([bytes[10], bytes[11]]);
        let err = Ipv4Header::from_bytes(&bytes).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::InvalidChecksum(transmitted as u32)
        );
    }

    #[test]
    fn truncated_header_reports_promised_size() {
        let bytes = minimal_header_bytes();
        let err = Ipv4Header::from_bytes(&bytes[..12]).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::InsufficientBytes {
                required: 20,
                available: 12
            }
        );
    }

    #[test]
    fn bad_version_nibble_is_a_type_error() {
        let mut bytes = minimal_header_bytes();
        bytes[0] = 0x65;
        let err = Ipv4Header::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidType(6));
    }

    #[test]
    fn ihl_below_five_is_a_length_error() {
        let mut bytes = minimal_header_bytes();
        bytes[0] = 0x44;
        let err = Ipv4Header::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(4));
    }

    fn header_with_options(options: Vec<Ipv4Option>) -> Vec<u8> {
        let mut header = Ipv4Header::new(
            u32::from_be_bytes([10, 0, 0, 1]),
            u32::from_be_bytes([10, 0, 0, 2]),
            6,
        );
        header.set_options(options).unwrap();
        header.set_total_length(header.len() as u16);
        header.to_bytes()
    }

    #[test]
    fn record_route_option_round_trips() {
        let route = RouteOption::new(4, vec![0x0A000001, 0x0A000002]).unwrap();
        let bytes = header_with_options(vec![
            Ipv4Option::RecordRoute(route.clone()),
            Ipv4Option::EndOfOptionList,
        ]);
        assert_eq!(bytes[0], 0x48); // IHL 8: 20 + 11-byte option + EOOL + padding

        let header = Ipv4Header::from_bytes(&bytes).unwrap();
        assert_eq!(
            header.options(),
            &[
                Ipv4Option::RecordRoute(route),
                Ipv4Option::EndOfOptionList
            ]
        );
        assert_eq!(header.to_bytes(), bytes);
    }

    #[test]
    fn security_and_stream_id_options_round_trip() {
        let sec = SecurityOption::new(0xABCD, 0x1234, 0x5678, 0x00DEAD).unwrap();
        let bytes = header_with_options(vec![
            Ipv4Option::Security(sec),
            Ipv4Option::StreamIdentifier(0xBEEF),
            Ipv4Option::NoOperation,
            Ipv4Option::EndOfOptionList,
        ]);
        let header = Ipv4Header::from_bytes(&bytes).unwrap();
        assert_eq!(header.options().len(), 4);
        assert_eq!(header.to_bytes(), bytes);
    }

    #[test]
    fn timestamp_option_round_trips_in_both_layouts() {
        let plain = TimestampOption::new(
            5,
            0,
            TimestampFlag::TimestampsOnly,
            vec![TimestampEntry {
                address: None,
                timestamp: 0x00112233,
            }],
        )
        .unwrap();
        let addressed = TimestampOption::new(
            5,
            2,
            TimestampFlag::AddressedTimestamps,
            vec![TimestampEntry {
                address: Some(0x0A000001),
                timestamp: 0x44556677,
            }],
        )
        .unwrap();

        let bytes = header_with_options(vec![
            Ipv4Option::InternetTimestamp(plain),
            Ipv4Option::InternetTimestamp(addressed),
        ]);
        let header = Ipv4Header::from_bytes(&bytes).unwrap();
        assert_eq!(header.options().len(), 2);
        assert_eq!(header.to_bytes(), bytes);
    }

    #[test]
    fn route_pointer_below_minimum_fails_construction() {
        let err = RouteOption::new(3, vec![0x7F000001]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::OutOfRange(3));
    }

    #[test]
    fn route_pointer_past_end_fails_construction() {
        // length = 7, so the pointer may be at most 8
        let err = RouteOption::new(9, vec![0x7F000001]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::OutOfRange(9));
    }

    #[test]
    fn unknown_option_type_is_rejected_with_the_octet() {
        let mut bytes = minimal_header_bytes();
        bytes[0] = 0x46;
        bytes.splice(20..20, [0x5E, 0x04, 0x00, 0x00]); // RFC 3692 experiment type
        bytes[2..4].copy_from_slice(&24u16.to_be_bytes());
        bytes[10..12].copy_from_slice(&[0, 0]);
        let chksum = utils::internet_checksum(&bytes);
        bytes[10..12].copy_from_slice(&chksum.to_be_bytes());

        let err = Ipv4Header::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidType(0x5E));
    }

    #[test]
    fn option_length_overrunning_area_is_rejected() {
        let mut bytes = minimal_header_bytes();
        bytes[0] = 0x46;
        bytes.splice(20..20, [0x88, 0x09, 0x00, 0x00]); // stream id claiming 9 bytes
        bytes[2..4].copy_from_slice(&24u16.to_be_bytes());
        bytes[10..12].copy_from_slice(&[0, 0]);
        let chksum = utils::internet_checksum(&bytes);
        bytes[10..12].copy_from_slice(&chksum.to_be_bytes());

        let err = Ipv4Header::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(9));
    }

    #[test]
    fn misplaced_end_of_option_list_fails_construction() {
        let mut header = Ipv4Header::new(1, 2, 6);
        let err = header
            .set_options(vec![Ipv4Option::EndOfOptionList, Ipv4Option::NoOperation])
            .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidValue);
    }

    #[test]
    fn datagram_round_trips_payload() {
        let header = Ipv4Header::new(
            u32::from_be_bytes([127, 0, 0, 1]),
            u32::from_be_bytes([127, 0, 0, 2]),
            17,
        );
        let datagram = Ipv4Datagram::new(header, vec![1, 2, 3, 4, 5]).unwrap();
        let bytes = datagram.to_bytes();
        assert_eq!(bytes.len(), 25);
        assert_eq!(Ipv4Datagram::from_bytes(&bytes).unwrap(), datagram);
    }

    #[test]
    fn datagram_length_mismatches_are_detected() {
        let header = Ipv4Header::new(1, 2, 17);
        let datagram = Ipv4Datagram::new(header, vec![0xAA; 8]).unwrap();
        let bytes = datagram.to_bytes();

        let err = Ipv4Datagram::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert_eq!(
            err.kind,
            ValidationErrorKind::InsufficientBytes {
                required: 28,
                available: 27
            }
        );

        let mut extended = bytes;
        extended.push(0);
        let err = Ipv4Datagram::from_bytes(&extended).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::ExcessBytes(1));
    }

    #[test]
    fn length_prefix_reports_total_length() {
        let bytes = minimal_header_bytes();
        assert_eq!(Ipv4Datagram::total_len(&bytes[..4]).unwrap(), 20);

        let err = Ipv4Datagram::total_len(&[0x45, 0x00, 0x00, 0x05]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidLength(5));
    }
}
