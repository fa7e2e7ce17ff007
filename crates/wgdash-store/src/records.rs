// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::{Result, StoreError};
use crate::model::{NewPeerRecord, PeerId, PeerRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use wgdash_wg_common::PublicKey;

const FORMAT_VERSION: u32 = 1;

/// The in-memory record set shared by both store backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RecordSet {
	#[serde(default = "format_version")]
	version: u32,
	#[serde(default)]
	peers: Vec<PeerRecord>,
}

fn format_version() -> u32 {
	FORMAT_VERSION
}

impl Default for RecordSet {
	fn default() -> Self {
		Self::new()
	}
}

pub(crate) fn normalize_name(name: &str) -> Result<String> {
	let trimmed = name.trim();
	if trimmed.is_empty() {
		return Err(StoreError::EmptyName);
	}
	Ok(trimmed.to_string())
}

impl RecordSet {
	pub(crate) fn new() -> Self {
		Self {
			version: FORMAT_VERSION,
			peers: Vec::new(),
		}
	}

	pub(crate) fn from_records(peers: Vec<PeerRecord>) -> std::result::Result<Self, String> {
		let set = Self {
			version: FORMAT_VERSION,
			peers,
		};
		set.check()?;
		Ok(set)
	}

	/// Checks the invariants a loaded file must satisfy.
	pub(crate) fn check(&self) -> std::result::Result<(), String> {
		if self.version != FORMAT_VERSION {
			return Err(format!("unsupported format version {}", self.version));
		}
		let mut ids = HashSet::new();
		let mut keys = HashSet::new();
		for peer in &self.peers {
			if !ids.insert(peer.id.clone()) {
				return Err(format!("duplicate peer id {}", peer.id));
			}
			if !keys.insert(peer.public_key) {
				return Err(format!("duplicate public key {}", peer.public_key));
			}
			if peer.name.trim().is_empty() {
				return Err(format!("peer {} has an empty name", peer.id));
			}
		}
		Ok(())
	}

	pub(crate) fn records(&self) -> &[PeerRecord] {
		&self.peers
	}

	pub(crate) fn get(&self, id: &PeerId) -> Result<&PeerRecord> {
		self.peers
			.iter()
			.find(|p| &p.id == id)
			.ok_or_else(|| StoreError::NotFound(id.to_string()))
	}

	pub(crate) fn get_by_public_key(&self, key: &PublicKey) -> Result<&PeerRecord> {
		self.peers
			.iter()
			.find(|p| &p.public_key == key)
			.ok_or_else(|| StoreError::NotFound(key.to_string()))
	}

	pub(crate) fn rename(&mut self, id: &PeerId, new_name: &str) -> Result<PeerRecord> {
		let name = normalize_name(new_name)?;
		let record = self
			.peers
			.iter_mut()
			.find(|p| &p.id == id)
			.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
		record.name = name;
		Ok(record.clone())
	}

	pub(crate) fn create(&mut self, new: NewPeerRecord) -> Result<PeerRecord> {
		let name = normalize_name(&new.name)?;
		if self.peers.iter().any(|p| p.public_key == new.public_key) {
			return Err(StoreError::DuplicatePublicKey(new.public_key));
		}
		let record = PeerRecord {
			id: PeerId::generate(),
			public_key: new.public_key,
			name,
			internal_ip: new.internal_ip,
		};
		self.peers.push(record.clone());
		Ok(record)
	}
}
