// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Peer HTTP handlers.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use serde::Deserialize;
use wgdash_engine::{Peer, PeerListing};
use wgdash_store::{parse_internal_ip, NewPeerRecord, PeerId};
use wgdash_wg_common::PublicKey;

use crate::api::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeerRequest {
	pub public_key: String,
	pub name: String,
	pub internal_ip: String,
}

#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
	pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
	pub name: String,
}

/// GET /api/peers
pub async fn list_peers(State(state): State<AppState>) -> Result<Json<PeerListing>, ApiError> {
	Ok(Json(state.service.list_peers().await?))
}

/// POST /api/peers - Provisions a peer record; the peer starts disabled.
pub async fn create_peer(
	State(state): State<AppState>,
	Json(body): Json<CreatePeerRequest>,
) -> Result<(StatusCode, Json<Peer>), ApiError> {
	let public_key = PublicKey::from_base64(&body.public_key)
		.map_err(|e| ApiError::Validation(format!("publicKey: {e}")))?;
	let internal_ip = parse_internal_ip(&body.internal_ip)
		.map_err(|e| ApiError::Validation(format!("internalIp: {e}")))?;

	let peer = state
		.service
		.create_peer(NewPeerRecord {
			public_key,
			name: body.name,
			internal_ip,
		})
		.await?;
	Ok((StatusCode::CREATED, Json(peer)))
}

/// PUT /api/peers/{id}/enabled
pub async fn set_peer_enabled(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(body): Json<SetEnabledRequest>,
) -> Result<Json<Peer>, ApiError> {
	let peer = state
		.service
		.set_peer_enabled(&PeerId::from(id), body.enabled)
		.await?;
	Ok(Json(peer))
}

/// PUT /api/peers/{id}/name
pub async fn rename_peer(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(body): Json<RenameRequest>,
) -> Result<Json<Peer>, ApiError> {
	let peer = state
		.service
		.rename_peer(&PeerId::from(id), &body.name)
		.await?;
	Ok(Json(peer))
}
