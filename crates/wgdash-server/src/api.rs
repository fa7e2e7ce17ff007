// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::{
	routing::{get, put},
	Router,
};
use wgdash_engine::PeerService;

use crate::routes::{health, peers};

#[derive(Clone)]
pub struct AppState {
	pub service: PeerService,
}

impl AppState {
	pub fn new(service: PeerService) -> Self {
		Self { service }
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health::health_check))
		.route("/api/peers", get(peers::list_peers).post(peers::create_peer))
		.route("/api/peers/{id}/enabled", put(peers::set_peer_enabled))
		.route("/api/peers/{id}/name", put(peers::rename_peer))
		.with_state(state)
}
