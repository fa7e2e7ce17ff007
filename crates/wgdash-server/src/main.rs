// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! wgdash binary: serves the HTTP API, or runs one peer operation and exits.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wgdash_engine::{Peer, PeerListing, PeerService};
use wgdash_server::{build_service, create_router, AppState};
use wgdash_server_config::{LogFormat, ServerConfig};
use wgdash_store::{parse_internal_ip, NewPeerRecord, PeerId};
use wgdash_wg_common::PublicKey;

/// wgdash - WireGuard peer administration.
#[derive(Parser, Debug)]
#[command(name = "wgdash", about = "WireGuard peer administration", version)]
struct Args {
	/// Config file to use instead of /etc/wgdash/server.toml
	#[arg(short, long, env = "WGDASH_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the HTTP API (the default)
	Serve,
	/// List peers with their live status
	List {
		/// Print JSON instead of a table
		#[arg(long)]
		json: bool,
	},
	/// Add a peer to the running interface and its config file
	Enable { id: String },
	/// Remove a peer from the running interface and its config file
	Disable { id: String },
	/// Change a peer's display name
	Rename { id: String, name: String },
	/// Provision a new peer record (disabled until enabled)
	Add {
		public_key: String,
		name: String,
		internal_ip: String,
	},
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	// Before parsing, so `.env` can supply WGDASH_CONFIG.
	dotenvy::dotenv().ok();
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("wgdash version: {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	let config = match &args.config {
		Some(path) => wgdash_server_config::load_config_with_file(path),
		None => wgdash_server_config::load_config(),
	}
	.context("loading configuration")?;

	init_tracing(&config);

	let service = build_service(&config)
		.await
		.context("opening peer store")?;

	let command = args.command.unwrap_or(Command::Serve);
	let result = run(command, &config, &service).await;

	// Runs on every path so an SSH master never outlives the process.
	service.shutdown().await;
	result
}

async fn run(command: Command, config: &ServerConfig, service: &PeerService) -> anyhow::Result<()> {
	match command {
		Command::Serve => serve(config, service.clone()).await,
		Command::List { json } => {
			let listing = service.list_peers().await?;
			if json {
				println!("{}", serde_json::to_string_pretty(&listing)?);
			} else {
				print_table(&listing);
			}
			Ok(())
		}
		Command::Enable { id } => {
			let peer = service.set_peer_enabled(&PeerId::from(id), true).await?;
			print_peer(&peer)
		}
		Command::Disable { id } => {
			let peer = service.set_peer_enabled(&PeerId::from(id), false).await?;
			print_peer(&peer)
		}
		Command::Rename { id, name } => {
			let peer = service.rename_peer(&PeerId::from(id), &name).await?;
			print_peer(&peer)
		}
		Command::Add {
			public_key,
			name,
			internal_ip,
		} => {
			let public_key = PublicKey::from_base64(&public_key).context("invalid public key")?;
			let internal_ip = parse_internal_ip(&internal_ip).map_err(|e| anyhow!(e))?;
			let peer = service
				.create_peer(NewPeerRecord {
					public_key,
					name,
					internal_ip,
				})
				.await?;
			print_peer(&peer)
		}
		Command::Version => Ok(()),
	}
}

fn init_tracing(config: &ServerConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
	let registry = tracing_subscriber::registry().with(filter);

	match config.logging.format {
		LogFormat::Json => registry.with(fmt.json()).init(),
		LogFormat::Pretty => registry.with(fmt).init(),
	}
}

async fn serve(config: &ServerConfig, service: PeerService) -> anyhow::Result<()> {
	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		interface = %config.wireguard.interface,
		target = %service.channel_target(),
		"starting wgdash"
	);

	let app = create_router(AppState::new(service)).layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("binding {addr}"))?;
	tracing::info!("listening on {}", addr);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	tracing::info!("server shutdown complete");
	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "failed to listen for shutdown signal");
		return;
	}
	tracing::info!("received shutdown signal");
}

fn print_peer(peer: &Peer) -> anyhow::Result<()> {
	println!("{}", serde_json::to_string_pretty(peer)?);
	Ok(())
}

fn print_table(listing: &PeerListing) {
	println!(
		"{:<38} {:<24} {:<13} {:<8} {:<20} {:<16} {:>12} {:>12}",
		"ID", "NAME", "STATUS", "ENABLED", "INTERNAL IP", "EXTERNAL IP", "RX", "TX"
	);
	for peer in &listing.peers {
		println!(
			"{:<38} {:<24} {:<13} {:<8} {:<20} {:<16} {:>12} {:>12}",
			peer.id.as_str(),
			peer.name,
			peer.status.to_string(),
			peer.enabled,
			peer.internal_ip.to_string(),
			peer.external_ip,
			peer.data.received,
			peer.data.transmitted,
		);
	}
	if let wgdash_engine::ChannelHealth::Degraded { error } = &listing.channel {
		eprintln!("warning: control channel degraded: {error}");
	}
}
