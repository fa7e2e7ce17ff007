// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Control channel to the WireGuard control plane.
//!
//! Every interaction with `wg` goes through a [`ControlChannel`]. Callers
//! describe *what* to run with a closed [`CommandSpec`]; the channel decides
//! *how* (local process or a multiplexed SSH session). There is no way to
//! pass a free-form command line through this crate.
//!
//! Mutating commands are not guaranteed to run at most once: a timeout or a
//! dropped connection leaves the outcome unknown (see
//! [`ControlChannelError::is_ambiguous`]). Callers must verify with a read
//! instead of retrying.

pub mod channel;
pub mod command;
pub mod error;
pub mod exclusive;
mod exec;
pub mod local;
pub mod quote;
pub mod ssh;

pub use channel::{ControlChannel, RawOutput};
pub use command::{CommandRenderer, CommandSpec, Invocation};
pub use error::{ControlChannelError, Result};
pub use exclusive::ExclusiveChannel;
pub use local::LocalChannel;
pub use ssh::{SshChannel, SshConfig};
