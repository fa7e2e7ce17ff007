// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};
use wgdash_engine::{EngineError, ErrorKind, Step};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error(transparent)]
	Engine(#[from] EngineError),
	#[error("{0}")]
	Validation(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
	/// The half of an enable/disable that failed, for partial failures.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub step: Option<Step>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub desired: Option<bool>,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
	match kind {
		ErrorKind::NotFound => StatusCode::NOT_FOUND,
		ErrorKind::EmptyName => StatusCode::UNPROCESSABLE_ENTITY,
		ErrorKind::Conflict | ErrorKind::PartialFailure => StatusCode::CONFLICT,
		ErrorKind::Unreachable | ErrorKind::AuthFailed | ErrorKind::CommandFailed => {
			StatusCode::BAD_GATEWAY
		}
		ErrorKind::Timeout | ErrorKind::OutcomeUnknown => StatusCode::GATEWAY_TIMEOUT,
		ErrorKind::MalformedConfig | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

fn kind_name(kind: ErrorKind) -> String {
	serde_json::to_value(kind)
		.ok()
		.and_then(|v| v.as_str().map(str::to_string))
		.unwrap_or_else(|| "internal".to_string())
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, body) = match &self {
			ApiError::Validation(message) => (
				StatusCode::UNPROCESSABLE_ENTITY,
				ErrorResponse {
					error: "validation".to_string(),
					message: message.clone(),
					step: None,
					desired: None,
				},
			),
			ApiError::Engine(e) => {
				let kind = e.kind();
				let (step, desired) = match e {
					EngineError::PartialFailure { step, desired, .. } => (Some(*step), Some(*desired)),
					_ => (None, None),
				};
				(
					status_for(kind),
					ErrorResponse {
						error: kind_name(kind),
						message: e.to_string(),
						step,
						desired,
					},
				)
			}
		};

		if status.is_server_error() {
			error!(status = status.as_u16(), error = %self, "request failed");
		} else {
			warn!(status = status.as_u16(), error = %self, "request rejected");
		}
		(status, Json(body)).into_response()
	}
}
