// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! eosgate CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Argument parsing, session setup and rendering on top of
//!   `eosgate_core::EosClient`

pub mod commands;
pub mod output;
