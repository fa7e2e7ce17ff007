// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod control;
mod http;
mod logging;
mod store;
mod wireguard;

pub use control::{ControlConfig, ControlConfigLayer, ControlMode, SshTarget};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use store::{StoreConfig, StoreConfigLayer};
pub use wireguard::{WireguardConfig, WireguardConfigLayer};
