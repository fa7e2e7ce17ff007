// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Parsing of `wg show <interface> dump` output.
//!
//! The first line describes the interface itself and is skipped. Every
//! following line is one peer with tab-separated fields:
//!
//! ```text
//! public-key  preshared-key  endpoint  allowed-ips  latest-handshake  rx  tx  keepalive
//! ```
//!
//! Parsing never fails as a whole. Short lines are skipped and unparsable
//! numbers read as zero so that a single odd line cannot hide every peer.

use chrono::{DateTime, Duration, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

/// A peer without a handshake in this many seconds is disconnected.
pub const HANDSHAKE_TIMEOUT_SECS: i64 = 180;

const MIN_FIELDS: usize = 7;
const NONE_MARKER: &str = "(none)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerStatus {
	Connected,
	Disconnected,
}

impl PeerStatus {
	/// Liveness from the latest handshake as seen at `now`.
	pub fn from_handshake(last_handshake: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
		match last_handshake {
			Some(at) if now.signed_duration_since(at) < Duration::seconds(HANDSHAKE_TIMEOUT_SECS) => {
				Self::Connected
			}
			_ => Self::Disconnected,
		}
	}
}

impl fmt::Display for PeerStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Connected => "connected",
			Self::Disconnected => "disconnected",
		})
	}
}

/// One peer as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePeer {
	/// Key text exactly as printed by `wg`.
	pub public_key: String,
	/// Host part of the endpoint, `None` for `(none)`.
	pub endpoint_host: Option<String>,
	/// Address of the first allowed-ips entry.
	pub allowed_ip: Option<IpAddr>,
	/// `None` when the peer never completed a handshake.
	pub last_handshake: Option<DateTime<Utc>>,
	pub rx_bytes: u64,
	pub tx_bytes: u64,
}

impl LivePeer {
	pub fn status_at(&self, now: DateTime<Utc>) -> PeerStatus {
		PeerStatus::from_handshake(self.last_handshake, now)
	}
}

/// Parses a full dump into a map keyed by public key. Later lines win on
/// duplicate keys.
pub fn parse_dump(output: &str) -> HashMap<String, LivePeer> {
	let mut peers = HashMap::new();

	for (idx, line) in output
		.trim_start_matches(['\r', '\n'])
		.lines()
		.enumerate()
		.skip(1)
	{
		match parse_dump_line(line) {
			Some(peer) => {
				peers.insert(peer.public_key.clone(), peer);
			}
			None => {
				if !line.trim().is_empty() {
					debug!(line = idx + 1, "skipping short dump line");
				}
			}
		}
	}

	peers
}

/// Parses one peer line; `None` if it has fewer than seven fields.
pub fn parse_dump_line(line: &str) -> Option<LivePeer> {
	let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
	if fields.len() < MIN_FIELDS {
		return None;
	}

	Some(LivePeer {
		public_key: fields[0].trim().to_string(),
		endpoint_host: parse_endpoint_host(fields[2]),
		allowed_ip: parse_first_allowed_ip(fields[3]),
		last_handshake: parse_handshake(fields[4]),
		rx_bytes: parse_counter(fields[5]),
		tx_bytes: parse_counter(fields[6]),
	})
}

fn parse_endpoint_host(field: &str) -> Option<String> {
	let field = field.trim();
	if field.is_empty() || field == NONE_MARKER {
		return None;
	}
	if let Ok(addr) = field.parse::<SocketAddr>() {
		return Some(addr.ip().to_string());
	}

	let host = field
		.rsplit_once(':')
		.map(|(host, _port)| host)
		.unwrap_or(field)
		.trim_start_matches('[')
		.trim_end_matches(']');
	(!host.is_empty()).then(|| host.to_string())
}

fn parse_first_allowed_ip(field: &str) -> Option<IpAddr> {
	let first = field.split(',').next()?.trim();
	if first.is_empty() || first == NONE_MARKER {
		return None;
	}
	if let Ok(net) = first.parse::<IpNet>() {
		return Some(net.addr());
	}
	first.split('/').next()?.parse().ok()
}

fn parse_handshake(field: &str) -> Option<DateTime<Utc>> {
	match parse_counter(field) {
		0 => None,
		secs => DateTime::from_timestamp(i64::try_from(secs).ok()?, 0),
	}
}

fn parse_counter(field: &str) -> u64 {
	field.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const INTERFACE_LINE: &str = "cHJpdmF0ZQ==\tcHVibGlj\t51820\toff";

	fn now() -> DateTime<Utc> {
		DateTime::from_timestamp(1_700_000_000, 0).unwrap()
	}

	#[test]
	fn parses_connected_peer() {
		let hs = now().timestamp() - 30;
		let dump = format!(
			"{INTERFACE_LINE}\nPKA\t(none)\t1.2.3.4:51820\t10.0.0.2/32\t{hs}\t1000\t2000\toff\n"
		);

		let peers = parse_dump(&dump);
		let peer = &peers["PKA"];
		assert_eq!(peer.endpoint_host.as_deref(), Some("1.2.3.4"));
		assert_eq!(peer.allowed_ip, Some("10.0.0.2".parse().unwrap()));
		assert_eq!(peer.rx_bytes, 1000);
		assert_eq!(peer.tx_bytes, 2000);
		assert_eq!(peer.status_at(now()), PeerStatus::Connected);
	}

	#[test]
	fn first_line_is_always_skipped() {
		let dump = "PKA\t(none)\t1.2.3.4:1\t10.0.0.2/32\t1\t1\t1\toff\n";
		assert!(parse_dump(dump).is_empty());
	}

	#[test]
	fn none_endpoint_and_allowed_ips() {
		let dump = format!("{INTERFACE_LINE}\nPKB\t(none)\t(none)\t(none)\t0\t0\t0\toff");
		let peer = &parse_dump(&dump)["PKB"];
		assert_eq!(peer.endpoint_host, None);
		assert_eq!(peer.allowed_ip, None);
		assert_eq!(peer.last_handshake, None);
		assert_eq!(peer.status_at(now()), PeerStatus::Disconnected);
	}

	#[test]
	fn ipv6_endpoint_host_is_unbracketed() {
		let line = "PKC\t(none)\t[2001:db8::1]:51820\tfd00::2/128,10.0.0.9/32\t5\t1\t2\t25";
		let peer = parse_dump_line(line).unwrap();
		assert_eq!(peer.endpoint_host.as_deref(), Some("2001:db8::1"));
		assert_eq!(peer.allowed_ip, Some("fd00::2".parse().unwrap()));
	}

	#[test]
	fn short_lines_are_skipped() {
		let dump = format!(
			"{INTERFACE_LINE}\nBROKEN\tline\nPKD\t(none)\t(none)\t10.0.0.4/32\t0\t0\t0\toff\n\n"
		);
		let peers = parse_dump(&dump);
		assert_eq!(peers.len(), 1);
		assert!(peers.contains_key("PKD"));
	}

	#[test]
	fn garbage_numbers_degrade_to_zero() {
		let line = "PKE\t(none)\t1.1.1.1:1\t10.0.0.5/32\tsoon\tlots\t-3";
		let peer = parse_dump_line(line).unwrap();
		assert_eq!(peer.last_handshake, None);
		assert_eq!(peer.rx_bytes, 0);
		assert_eq!(peer.tx_bytes, 0);
	}

	#[test]
	fn duplicate_keys_last_line_wins() {
		let dump = format!(
			"{INTERFACE_LINE}\nPKF\t(none)\t(none)\t10.0.0.6/32\t0\t1\t1\toff\nPKF\t(none)\t(none)\t10.0.0.6/32\t0\t9\t9\toff"
		);
		assert_eq!(parse_dump(&dump)["PKF"].rx_bytes, 9);
	}

	#[test]
	fn threshold_boundary_is_disconnected() {
		let at = |secs_ago: i64| Some(now() - Duration::seconds(secs_ago));
		assert_eq!(PeerStatus::from_handshake(at(179), now()), PeerStatus::Connected);
		assert_eq!(PeerStatus::from_handshake(at(180), now()), PeerStatus::Disconnected);
		assert_eq!(PeerStatus::from_handshake(None, now()), PeerStatus::Disconnected);
	}

	proptest! {
		#[test]
		fn lines_with_seven_fields_always_parse(
			fields in prop::collection::vec("[^\t\r\n]{0,24}", 7..10)
		) {
			let line = fields.join("\t");
			prop_assert!(parse_dump_line(&line).is_some());
		}

		#[test]
		fn status_is_a_function_of_handshake_age(age in 0i64..100_000) {
			let line = format!(
				"PK\t(none)\t(none)\t10.0.0.2/32\t{}\t0\t0\toff",
				now().timestamp() - age
			);
			let peer = parse_dump_line(&line).unwrap();
			let expected = if age < HANDSHAKE_TIMEOUT_SECS {
				PeerStatus::Connected
			} else {
				PeerStatus::Disconnected
			};
			prop_assert_eq!(peer.status_at(now()), expected);
		}
	}
}
