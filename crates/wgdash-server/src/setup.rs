// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wgdash_control::{
	CommandRenderer, ControlChannel, ExclusiveChannel, LocalChannel, SshChannel, SshConfig,
};
use wgdash_engine::{
	ChannelConfigFile, DurableConfig, LocalConfigFile, PeerService, ReconciliationEngine,
};
use wgdash_server_config::{ControlMode, ServerConfig};
use wgdash_store::{JsonFilePeerStore, StoreError};

const WG_PROGRAM: &str = "wg";

pub fn build_channel(config: &ServerConfig) -> Arc<dyn ControlChannel> {
	let renderer = CommandRenderer::new(WG_PROGRAM, config.wireguard.use_sudo);
	let timeout = Duration::from_secs(config.control.timeout_secs);

	let channel: Arc<dyn ControlChannel> = match &config.control.ssh {
		Some(target) => {
			let mut ssh = SshConfig::new(&target.host, &target.user);
			ssh.port = target.port;
			ssh.identity_file = target.identity_file.clone();
			ssh.connect_timeout = Duration::from_secs(config.control.connect_timeout_secs);
			ssh.command_timeout = timeout;
			Arc::new(SshChannel::new(ssh, renderer))
		}
		None => Arc::new(LocalChannel::new(renderer, timeout)),
	};

	if config.control.exclusive {
		Arc::new(ExclusiveChannel::new(channel))
	} else {
		channel
	}
}

/// The config file is edited in place only when it is local and readable
/// without privilege escalation; otherwise it goes through the channel so
/// that `sudo` and SSH apply to it too.
pub fn build_durable_config(
	config: &ServerConfig,
	channel: Arc<dyn ControlChannel>,
) -> Arc<dyn DurableConfig> {
	let path = config.wireguard.config_path.clone();
	if config.control.mode == ControlMode::Local && !config.wireguard.use_sudo {
		Arc::new(LocalConfigFile::new(path))
	} else {
		Arc::new(ChannelConfigFile::new(channel, path))
	}
}

/// Opens the peer store and assembles the service. Failing to open the
/// store is the one startup error nothing can recover from.
pub async fn build_service(config: &ServerConfig) -> Result<PeerService, StoreError> {
	let store = JsonFilePeerStore::open(&config.store.path).await?;
	let channel = build_channel(config);
	let durable = build_durable_config(config, Arc::clone(&channel));

	info!(
		channel = %channel.describe(),
		durable = %durable.describe(),
		interface = %config.wireguard.interface,
		"peer service ready"
	);

	let engine = ReconciliationEngine::new(
		config.wireguard.interface.clone(),
		channel,
		Arc::new(store),
		durable,
	);
	Ok(PeerService::new(engine))
}

#[cfg(test)]
mod tests {
	use super::*;
	use wgdash_server_config::{finalize, ControlConfigLayer, ServerConfigLayer, StoreConfigLayer};

	fn config(layer: ServerConfigLayer) -> ServerConfig {
		finalize(layer).unwrap()
	}

	#[test]
	fn local_channel_by_default() {
		let config = config(ServerConfigLayer::default());
		assert_eq!(build_channel(&config).describe(), "local");
	}

	#[test]
	fn exclusive_wraps_ssh() {
		let config = config(ServerConfigLayer {
			control: Some(ControlConfigLayer {
				mode: Some(ControlMode::Ssh),
				host: Some("vpn.example.com".into()),
				user: Some("admin".into()),
				exclusive: Some(true),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(
			build_channel(&config).describe(),
			"ssh://admin@vpn.example.com:22 (exclusive)"
		);
	}

	#[test]
	fn sudo_routes_config_through_channel() {
		let config = config(ServerConfigLayer::default());
		let durable = build_durable_config(&config, build_channel(&config));
		assert_eq!(durable.describe(), "/etc/wireguard/wg0.conf on local");
	}

	#[tokio::test]
	async fn unreadable_store_fails_startup() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("peers.json");
		std::fs::write(&path, "not json").unwrap();
		let config = config(ServerConfigLayer {
			store: Some(StoreConfigLayer { path: Some(path) }),
			..Default::default()
		});
		assert!(build_service(&config).await.is_err());
	}
}
