// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Peer-state reconciliation for one WireGuard interface.
//!
//! The [`ReconciliationEngine`] joins three sources of truth: the live
//! control plane (through a [`ControlChannel`](wgdash_control::ControlChannel)),
//! the durable wg-quick config file (through [`DurableConfig`]) and the
//! peer records (through [`PeerRecordStore`](wgdash_store::PeerRecordStore)).
//! [`PeerService`] is the facade handed to API layers.

pub mod clock;
pub mod durable;
pub mod engine;
pub mod error;
mod locks;
pub mod service;
pub mod view;

#[cfg(test)]
mod fakes;

pub use clock::{Clock, FixedClock, SystemClock};
pub use durable::{ChannelConfigFile, DurableConfig, DurableConfigError, LocalConfigFile};
pub use engine::ReconciliationEngine;
pub use error::{EngineError, ErrorKind, Result, Step};
pub use service::PeerService;
pub use view::{ChannelHealth, Peer, PeerData, PeerListing, NOT_AVAILABLE};
