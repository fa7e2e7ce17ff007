// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;
use thiserror::Error;
use wgdash_wg_common::PublicKey;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("peer not found: {0}")]
	NotFound(String),

	#[error("peer name must not be empty")]
	EmptyName,

	#[error("a peer with public key {0} already exists")]
	DuplicatePublicKey(PublicKey),

	#[error("I/O error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("corrupt peer store {path}: {message}")]
	Corrupt { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
