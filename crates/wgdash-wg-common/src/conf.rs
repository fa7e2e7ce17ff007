// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Comment-preserving editor for wg-quick configuration files.
//!
//! The file is split into a preamble and sections. Every original line is
//! kept verbatim (including its line terminator) so that rendering an
//! unmodified [`WgConfig`] reproduces the input byte-for-byte.
//!
//! A section owns its header, the lines that follow it up to the next
//! header, and its leading trivia: the comment lines directly above the
//! header plus the blank lines above those. Removing a peer removes exactly
//! that span.

use crate::keys::PublicKey;
use ipnet::IpNet;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigFileError {
	#[error("malformed config at line {line}: {reason}")]
	Malformed { line: usize, reason: String },
}

impl ConfigFileError {
	fn malformed(line: usize, reason: impl Into<String>) -> Self {
		Self::Malformed {
			line,
			reason: reason.into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionKind {
	Interface,
	Peer,
	Other(String),
}

#[derive(Debug, Clone)]
struct Section {
	kind: SectionKind,
	header_line: usize,
	leading: Vec<String>,
	lines: Vec<String>,
	public_key: Option<PublicKey>,
}

#[derive(Debug, Clone, Default)]
pub struct WgConfig {
	preamble: Vec<String>,
	sections: Vec<Section>,
}

enum Line<'a> {
	Blank,
	Comment,
	Header(&'a str),
	KeyValue(&'a str, &'a str),
}

fn classify(raw: &str) -> Option<Line<'_>> {
	let content = raw.trim();
	if content.is_empty() {
		return Some(Line::Blank);
	}
	if content.starts_with('#') || content.starts_with(';') {
		return Some(Line::Comment);
	}
	if let Some(rest) = content.strip_prefix('[') {
		return rest.strip_suffix(']').map(|name| Line::Header(name.trim()));
	}
	let (key, value) = content.split_once('=')?;
	let key = key.trim();
	if key.is_empty() {
		return None;
	}
	let value = value.split('#').next().unwrap_or_default().trim();
	Some(Line::KeyValue(key, value))
}

fn is_trivia(raw: &str, comment: bool) -> bool {
	match classify(raw) {
		Some(Line::Comment) => comment,
		Some(Line::Blank) => !comment,
		_ => false,
	}
}

/// Index at which the trailing trivia of `lines` begins.
fn trivia_start(lines: &[String]) -> usize {
	let mut idx = lines.len();
	while idx > 0 && is_trivia(&lines[idx - 1], true) {
		idx -= 1;
	}
	while idx > 0 && is_trivia(&lines[idx - 1], false) {
		idx -= 1;
	}
	idx
}

impl WgConfig {
	pub fn parse(text: &str) -> Result<Self, ConfigFileError> {
		let mut config = WgConfig::default();

		for (idx, raw) in text.split_inclusive('\n').enumerate() {
			let line_no = idx + 1;
			match classify(raw) {
				Some(Line::Blank) | Some(Line::Comment) => config.tail_mut().push(raw.to_string()),
				Some(Line::Header(name)) => {
					let tail = config.tail_mut();
					let leading = tail.split_off(trivia_start(tail));
					let kind = if name.eq_ignore_ascii_case("Interface") {
						SectionKind::Interface
					} else if name.eq_ignore_ascii_case("Peer") {
						SectionKind::Peer
					} else {
						SectionKind::Other(name.to_string())
					};
					config.sections.push(Section {
						kind,
						header_line: line_no,
						leading,
						lines: vec![raw.to_string()],
						public_key: None,
					});
				}
				Some(Line::KeyValue(key, value)) => {
					let section = config
						.sections
						.last_mut()
						.ok_or_else(|| ConfigFileError::malformed(line_no, "key/value outside of a section"))?;
					if section.kind == SectionKind::Peer && key.eq_ignore_ascii_case("PublicKey") {
						if section.public_key.is_some() {
							return Err(ConfigFileError::malformed(line_no, "duplicate PublicKey"));
						}
						let key = PublicKey::from_base64(value)
							.map_err(|e| ConfigFileError::malformed(line_no, e.to_string()))?;
						section.public_key = Some(key);
					}
					section.lines.push(raw.to_string());
				}
				None => {
					return Err(ConfigFileError::malformed(
						line_no,
						"expected a section header, comment or key = value",
					));
				}
			}
		}

		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigFileError> {
		let mut seen = HashSet::new();
		for section in self.sections.iter().filter(|s| s.kind == SectionKind::Peer) {
			let key = section
				.public_key
				.ok_or_else(|| ConfigFileError::malformed(section.header_line, "[Peer] without PublicKey"))?;
			if !seen.insert(key) {
				return Err(ConfigFileError::malformed(
					section.header_line,
					format!("peer {key} appears more than once"),
				));
			}
		}
		Ok(())
	}

	fn tail_mut(&mut self) -> &mut Vec<String> {
		match self.sections.last_mut() {
			Some(section) => &mut section.lines,
			None => &mut self.preamble,
		}
	}

	pub fn peers(&self) -> impl Iterator<Item = &PublicKey> {
		self.sections.iter().filter_map(|s| s.public_key.as_ref())
	}

	pub fn contains_peer(&self, key: &PublicKey) -> bool {
		self.peers().any(|k| k == key)
	}

	pub fn section_kinds(&self) -> impl Iterator<Item = &SectionKind> {
		self.sections.iter().map(|s| &s.kind)
	}

	/// Appends a `[Peer]` stanza. Returns `false` if the peer is already
	/// present, leaving the config untouched.
	pub fn add_peer(&mut self, key: &PublicKey, allowed_ips: &[IpNet]) -> bool {
		if self.contains_peer(key) {
			return false;
		}

		let is_empty = self.sections.is_empty() && self.preamble.is_empty();
		if let Some(last) = self.tail_mut().last_mut() {
			if !last.ends_with('\n') {
				last.push('\n');
			}
		}

		let allowed = allowed_ips
			.iter()
			.map(|net| net.to_string())
			.collect::<Vec<_>>()
			.join(", ");
		self.sections.push(Section {
			kind: SectionKind::Peer,
			header_line: 0,
			leading: if is_empty { Vec::new() } else { vec!["\n".to_string()] },
			lines: vec![
				"[Peer]\n".to_string(),
				format!("PublicKey = {key}\n"),
				format!("AllowedIPs = {allowed}\n"),
			],
			public_key: Some(*key),
		});
		true
	}

	/// Removes the stanza for `key` with its leading trivia. Returns `false`
	/// if no such peer exists.
	pub fn remove_peer(&mut self, key: &PublicKey) -> bool {
		match self
			.sections
			.iter()
			.position(|s| s.public_key.as_ref() == Some(key))
		{
			Some(idx) => {
				self.sections.remove(idx);
				true
			}
			None => false,
		}
	}
}

impl fmt::Display for WgConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for line in &self.preamble {
			f.write_str(line)?;
		}
		for section in &self.sections {
			for line in section.leading.iter().chain(&section.lines) {
				f.write_str(line)?;
			}
		}
		Ok(())
	}
}
