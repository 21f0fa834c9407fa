// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A library for building, inspecting and validating the packet formats
//! carrying SIGTRAN traffic: IPv4 (with its full options grammar), ICMP and
//! SCTP.
//!
//! Every wire structure follows the same contract: parsing validates all
//! invariants up front and fails fast with a typed
//! [`ValidationError`](error::ValidationError), and serializing a parsed
//! structure reproduces the original bytes exactly, with length and checksum
//! fields re-derived from content rather than stored.
//!
//! ```
//! use sigtran::layers::sctp::{SctpChunk, SctpPacket};
//! use sigtran::layers::traits::{FromBytes, ToBytes};
//!
//! let packet = SctpPacket::new(2905, 2905, 0x01020304, vec![SctpChunk::CookieAck]);
//! let bytes = packet.to_bytes();
//! assert_eq!(SctpPacket::from_bytes(&bytes).unwrap(), packet);
//! ```
//!
//! Stream transports are served by the adapters in [`stream`] (blocking) and
//! `tokio` (async, behind the `tokio` feature); IP protocol numbers are
//! mapped to payload parsers in [`dispatch`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::len_without_is_empty)]

pub mod dispatch;
pub mod error;
pub mod layers;
pub mod stream;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod tokio;
pub mod utils;
