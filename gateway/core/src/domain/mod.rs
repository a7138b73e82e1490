// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! EOS namespace model shared by every transport.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Transport-agnostic types, the backend port and errors

pub mod acl;
pub mod attribute;
pub mod auth;
pub mod backend;
pub mod config;
pub mod file_info;
pub mod identity;
pub mod quota;
pub mod recycle;
pub mod version_folder;
