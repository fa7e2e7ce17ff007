// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! WireGuard primitives shared across wgdash.
//!
//! - [`PublicKey`] and [`InterfaceName`]: validated identifiers that are safe to
//!   place on a command line
//! - [`dump`]: parsing of `wg show <interface> dump` output into [`LivePeer`]s
//! - [`conf`]: comment-preserving editing of wg-quick configuration files

pub mod conf;
pub mod dump;
pub mod interface;
pub mod keys;

pub use conf::{ConfigFileError, SectionKind, WgConfig};
pub use dump::{parse_dump, parse_dump_line, LivePeer, PeerStatus, HANDSHAKE_TIMEOUT_SECS};
pub use interface::{InterfaceName, InterfaceNameError};
pub use keys::{KeyError, PublicKey, KEY_LEN};
