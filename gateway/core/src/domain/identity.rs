// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local uid ↔ username resolution used when translating ACL qualifiers.

use thiserror::Error;

use crate::domain::backend::EosError;

/// Local identity lookup (passwd database or a static table)
///
/// Lookups are synchronous and never touch the network.
pub trait IdentityResolver: Send + Sync {
    fn username_for_uid(&self, uid: u64) -> Result<String, IdentityError>;

    fn uid_for_username(&self, username: &str) -> Result<u64, IdentityError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("no local user with uid {0}")]
    UnknownUid(u64),

    #[error("no local user named '{0}'")]
    UnknownUser(String),

    #[error("identity lookup failed: {0}")]
    Lookup(String),
}

impl From<IdentityError> for EosError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::UnknownUser(_) => EosError::InvalidArgument(err.to_string()),
            _ => EosError::Internal(err.to_string()),
        }
    }
}
