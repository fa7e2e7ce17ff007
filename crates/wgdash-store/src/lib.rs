// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Peer record persistence.
//!
//! WireGuard only knows public keys. This crate keeps the metadata wgdash
//! is authoritative for (stable id, display name, tunnel address) behind
//! the [`PeerRecordStore`] trait, with a JSON-file backend for production
//! and an in-memory backend for tests.

pub mod error;
pub mod file;
pub mod memory;
pub mod model;
mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use file::JsonFilePeerStore;
pub use memory::MemoryPeerStore;
pub use model::{parse_internal_ip, NewPeerRecord, PeerId, PeerRecord};
pub use store::PeerRecordStore;
