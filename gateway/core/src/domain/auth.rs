// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Caller identity carried into every EOS call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identity EOS executes a request as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub uid: u64,
    pub gid: u64,
}

impl Role {
    pub fn new(uid: u64, gid: u64) -> Self {
        Self { uid, gid }
    }

    /// The EOS superuser
    pub fn root() -> Self {
        Self { uid: 0, gid: 0 }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}

/// Authorization context for one request.
///
/// A bearer `token` takes precedence over `role` when both are present: EOS
/// derives the identity from the token itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub token: Option<String>,
}

impl Authorization {
    pub fn with_role(uid: u64, gid: u64) -> Self {
        Self {
            role: Some(Role::new(uid, gid)),
            token: None,
        }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            role: None,
            token: Some(token.into()),
        }
    }

    /// Token if one is set and non-empty
    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}
