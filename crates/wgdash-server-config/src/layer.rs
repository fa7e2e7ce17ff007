// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::sections::{
	ControlConfigLayer, HttpConfigLayer, LoggingConfigLayer, StoreConfigLayer,
	WireguardConfigLayer,
};

/// One source's view of the configuration; unset sections and fields are
/// `None` so that merging only overrides what the source actually set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfigLayer {
	pub http: Option<HttpConfigLayer>,
	pub wireguard: Option<WireguardConfigLayer>,
	pub control: Option<ControlConfigLayer>,
	pub store: Option<StoreConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	match (base.as_mut(), other) {
		(Some(b), Some(o)) => merge(b, o),
		(None, Some(o)) => *base = Some(o),
		(_, None) => {}
	}
}

impl ServerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_section(&mut self.wireguard, other.wireguard, WireguardConfigLayer::merge);
		merge_section(&mut self.control, other.control, ControlConfigLayer::merge);
		merge_section(&mut self.store, other.store, StoreConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_merge_keeps_untouched_sections() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: Some("0.0.0.0".to_string()),
				port: Some(9000),
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: None,
				port: Some(9100),
			}),
			store: Some(StoreConfigLayer {
				path: Some("/tmp/peers.json".into()),
			}),
			..Default::default()
		});

		let http = base.http.unwrap();
		assert_eq!(http.host.as_deref(), Some("0.0.0.0"));
		assert_eq!(http.port, Some(9100));
		assert_eq!(
			base.store.unwrap().path.as_deref(),
			Some(std::path::Path::new("/tmp/peers.json"))
		);
	}

	#[test]
	fn test_parse_toml_layer() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
[http]
port = 8443

[wireguard]
interface = "wg1"
use_sudo = false

[control]
mode = "ssh"
host = "vpn.example.com"
user = "admin"
"#,
		)
		.unwrap();

		assert_eq!(layer.http.unwrap().port, Some(8443));
		let wg = layer.wireguard.unwrap();
		assert_eq!(wg.interface.as_deref(), Some("wg1"));
		assert_eq!(wg.use_sudo, Some(false));
		assert_eq!(layer.control.unwrap().host.as_deref(), Some("vpn.example.com"));
	}
}
