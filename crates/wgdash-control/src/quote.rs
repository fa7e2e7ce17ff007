// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! POSIX shell quoting for commands sent over SSH, where the remote side
//! re-parses the command line.

use std::borrow::Cow;

fn is_safe(c: char) -> bool {
	c.is_ascii_alphanumeric() || matches!(c, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

pub fn quote(arg: &str) -> Cow<'_, str> {
	if !arg.is_empty() && arg.chars().all(is_safe) {
		return Cow::Borrowed(arg);
	}
	Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
}

pub fn join<S: AsRef<str>>(args: &[S]) -> String {
	args
		.iter()
		.map(|a| quote(a.as_ref()))
		.collect::<Vec<_>>()
		.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn safe_words_are_untouched() {
		assert_eq!(quote("wg0"), "wg0");
		assert_eq!(quote("AAAA+/bbb="), "AAAA+/bbb=");
		assert_eq!(quote("10.0.0.2/32,fd00::2/128"), "10.0.0.2/32,fd00::2/128");
	}

	#[test]
	fn unsafe_words_are_single_quoted() {
		assert_eq!(quote(""), "''");
		assert_eq!(quote("a b"), "'a b'");
		assert_eq!(quote("it's"), r"'it'\''s'");
		assert_eq!(quote("$(reboot)"), "'$(reboot)'");
	}

	#[test]
	fn joins_with_spaces() {
		assert_eq!(
			join(&["sh", "-c", "cat > \"$1\""]),
			"sh -c 'cat > \"$1\"'"
		);
	}

	proptest! {
		#[test]
		fn quoted_output_has_no_unquoted_metacharacters(arg in ".*") {
			let quoted = quote(&arg);
			if quoted.as_ref() != arg {
				prop_assert!(quoted.starts_with('\'') && quoted.ends_with('\''));
			}
		}
	}
}
