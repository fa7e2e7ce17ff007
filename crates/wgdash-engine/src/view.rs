// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use wgdash_control::ControlChannelError;
use wgdash_store::{PeerId, PeerRecord};
use wgdash_wg_common::{LivePeer, PeerStatus, PublicKey};

/// Shown in place of an endpoint when the peer has no live session.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerData {
	pub transmitted: u64,
	pub received: u64,
}

/// A peer as presented to API callers. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
	pub id: PeerId,
	pub public_key: PublicKey,
	pub name: String,
	pub internal_ip: IpNet,
	pub external_ip: String,
	pub status: PeerStatus,
	/// Whether the running interface has the peer configured.
	pub enabled: bool,
	pub data: PeerData,
	pub last_seen: DateTime<Utc>,
}

impl Peer {
	/// Merges a record with its live entry (if any) as observed at `now`.
	pub fn project(record: &PeerRecord, live: Option<&LivePeer>, now: DateTime<Utc>) -> Self {
		let (external_ip, status, data, last_seen) = match live {
			Some(live) => (
				live.endpoint_host
					.clone()
					.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
				live.status_at(now),
				PeerData {
					transmitted: live.tx_bytes,
					received: live.rx_bytes,
				},
				live.last_handshake.unwrap_or(DateTime::UNIX_EPOCH),
			),
			None => (
				NOT_AVAILABLE.to_string(),
				PeerStatus::Disconnected,
				PeerData::default(),
				DateTime::UNIX_EPOCH,
			),
		};

		Self {
			id: record.id.clone(),
			public_key: record.public_key,
			name: record.name.clone(),
			internal_ip: record.internal_ip,
			external_ip,
			status,
			enabled: live.is_some(),
			data,
			last_seen,
		}
	}
}

/// State of the control channel as seen by the last read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChannelHealth {
	Ok,
	Degraded { error: String },
}

impl ChannelHealth {
	pub fn degraded(error: &ControlChannelError) -> Self {
		Self::Degraded {
			error: error.to_string(),
		}
	}

	pub fn is_ok(&self) -> bool {
		matches!(self, Self::Ok)
	}
}

/// Result of a listing. An unreachable control plane still yields every
/// record, all disconnected, with the failure reported in `channel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerListing {
	pub peers: Vec<Peer>,
	pub channel: ChannelHealth,
}
