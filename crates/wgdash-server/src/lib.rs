// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP API over [`PeerService`](wgdash_engine::PeerService) and the wiring
//! that builds it from a [`ServerConfig`](wgdash_server_config::ServerConfig).

pub mod api;
pub mod error;
pub mod routes;
pub mod setup;

pub use api::{create_router, AppState};
pub use error::{ApiError, ErrorResponse};
pub use setup::{build_channel, build_durable_config, build_service};
