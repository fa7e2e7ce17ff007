// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use ipnet::IpNet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;
use wgdash_wg_common::PublicKey;

/// Stable peer identifier, independent of the public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
	/// A fresh id. UUIDv4 keeps ids unique without a counter, so ids of
	/// deleted records are never handed out again.
	pub fn generate() -> Self {
		Self(Uuid::new_v4().to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for PeerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for PeerId {
	fn from(s: &str) -> Self {
		Self(s.to_string())
	}
}

impl From<String> for PeerId {
	fn from(s: String) -> Self {
		Self(s)
	}
}

impl std::str::FromStr for PeerId {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::from(s))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRecord {
	pub id: PeerId,
	pub public_key: PublicKey,
	pub name: String,
	/// Tunnel address routed to the peer.
	#[serde(serialize_with = "serialize_net", deserialize_with = "deserialize_net")]
	pub internal_ip: IpNet,
}

/// Input for provisioning a record; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPeerRecord {
	pub public_key: PublicKey,
	pub name: String,
	pub internal_ip: IpNet,
}

/// Parses a CIDR, accepting a bare address as a single-host network.
pub fn parse_internal_ip(s: &str) -> Result<IpNet, String> {
	let s = s.trim();
	if let Ok(net) = s.parse::<IpNet>() {
		return Ok(net);
	}
	let addr: IpAddr = s
		.parse()
		.map_err(|_| format!("invalid IP address or CIDR: {s}"))?;
	let prefix = if addr.is_ipv4() { 32 } else { 128 };
	IpNet::new(addr, prefix).map_err(|e| e.to_string())
}

fn serialize_net<S: Serializer>(net: &IpNet, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_str(&net.to_string())
}

fn deserialize_net<'de, D: Deserializer<'de>>(deserializer: D) -> Result<IpNet, D::Error> {
	let s = String::deserialize(deserializer)?;
	parse_internal_ip(&s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
	use super::*;
	use wgdash_wg_common::KEY_LEN;

	#[test]
	fn bare_address_becomes_host_network() {
		assert_eq!(
			parse_internal_ip("10.0.0.2").unwrap(),
			"10.0.0.2/32".parse::<IpNet>().unwrap()
		);
		assert_eq!(
			parse_internal_ip("fd00::2").unwrap(),
			"fd00::2/128".parse::<IpNet>().unwrap()
		);
		assert_eq!(
			parse_internal_ip("10.0.0.0/24").unwrap(),
			"10.0.0.0/24".parse::<IpNet>().unwrap()
		);
		assert!(parse_internal_ip("ten.zero").is_err());
	}

	#[test]
	fn record_json_shape() {
		let key = PublicKey::from_bytes([4u8; KEY_LEN]);
		let json = format!(
			r#"{{"id":"1","publicKey":"{key}","name":"John's MacBook Pro","internalIp":"10.0.0.2"}}"#
		);
		let record: PeerRecord = serde_json::from_str(&json).unwrap();
		assert_eq!(record.id, PeerId::from("1"));
		assert_eq!(record.internal_ip.to_string(), "10.0.0.2/32");

		let back = serde_json::to_value(&record).unwrap();
		assert_eq!(back["internalIp"], "10.0.0.2/32");
		assert_eq!(back["publicKey"], key.to_base64());
	}

	#[test]
	fn generated_ids_are_unique() {
		assert_ne!(PeerId::generate(), PeerId::generate());
	}
}
