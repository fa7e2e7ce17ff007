// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Peer record store configuration section.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_STORE_PATH: &str = "/var/lib/wgdash/peers.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreConfigLayer {
	pub path: Option<PathBuf>,
}

impl StoreConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.path.is_some() {
			self.path = other.path;
		}
	}

	pub fn finalize(self) -> StoreConfig {
		StoreConfig {
			path: self.path.unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH)),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
	pub path: PathBuf,
}

impl Default for StoreConfig {
	fn default() -> Self {
		StoreConfigLayer::default().finalize()
	}
}
