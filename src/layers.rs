// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The protocol layers implemented by this library.
//!
//! Each layer module holds the owned wire structures of one protocol family:
//! [`ip`] the IPv4 header, options grammar and datagram, [`icmp`] the ICMP
//! message set, and [`sctp`] the SCTP packet with its chunks, variable
//! parameters and error causes. The [`traits`] module defines the codec
//! contract they all share: validated deserialization via
//! [`FromBytes`](traits::FromBytes) and exact-inverse serialization via
//! [`ToBytes`](traits::ToBytes), so that any value parsed from a buffer
//! serializes back to that same buffer byte for byte.

pub mod icmp;
pub mod ip;
pub mod sctp;
pub mod traits;
