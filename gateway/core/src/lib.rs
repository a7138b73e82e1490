// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! eosgate core
//!
//! Normalizes EOS responses into one stable namespace model and keeps file
//! identity stable across EOS content versions.
//!
//! # Architecture
//!
//! - **domain:** `FileInfo`, attributes, ACLs, quota and recycle records, the
//!   `EosBackend` anti-corruption trait and the `EosError` taxonomy
//! - **infrastructure:** monitoring-format parsers and the CLI, gRPC and HTTP
//!   transports
//! - **application:** `EosClient`, which layers ACL inheritance and
//!   version-folder inode invariance on top of a backend

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
pub use application::client::EosClient;
pub use application::client_factory::create_eos_client;
