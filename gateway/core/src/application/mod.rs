// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod acl_inheritance;
pub mod client;
pub mod client_factory;
pub mod version_resolver;
