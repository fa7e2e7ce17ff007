// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health HTTP handler.

use axum::{extract::State, Json};
use serde::Serialize;
use wgdash_engine::ChannelHealth;

use crate::api::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub version: &'static str,
	pub target: String,
	pub channel: ChannelHealth,
}

/// GET /health - Reports control channel reachability. Always 200; a
/// degraded channel is reported in the body.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
	let channel = state.service.channel_health().await;
	Json(HealthResponse {
		status: if channel.is_ok() { "healthy" } else { "degraded" },
		version: env!("CARGO_PKG_VERSION"),
		target: state.service.channel_target(),
		channel,
	})
}
