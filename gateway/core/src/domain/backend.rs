// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! EOS Backend Trait - Anti-Corruption Layer for the EOS MGM
//!
//! Provides the one logical operation set every EOS transport implements
//! (the `eos` CLI binary, the MGM gRPC service, XrdHTTP for data). Backends
//! turn raw EOS responses into domain records and EOS failures into
//! [`EosError`]; everything above this trait is transport-agnostic.
//!
//! Backends never apply ACL inheritance or version-folder inode substitution.
//! Those belong to [`crate::application::client::EosClient`].

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::attribute::Attribute;
use crate::domain::auth::{Authorization, Role};
use crate::domain::file_info::FileInfo;
use crate::domain::quota::{QuotaInfo, SetQuotaInfo};
use crate::domain::recycle::DeletedEntry;

/// EOS namespace operations
///
/// Every method takes the caller's [`Authorization`]; the backend decides how
/// to present it to EOS (role switch, authz token).
#[async_trait]
pub trait EosBackend: Send + Sync {
    /// Short transport name used in logs
    fn name(&self) -> &'static str;

    /// Check that the MGM is reachable
    async fn health_check(&self) -> Result<(), EosError>;

    /// Report the MGM version banner
    async fn server_version(&self, auth: &Authorization) -> Result<ServerVersion, EosError>;

    /// Stat a path (file or directory)
    async fn stat_path(&self, auth: &Authorization, path: &str) -> Result<FileInfo, EosError>;

    /// Stat by inode
    async fn stat_inode(&self, auth: &Authorization, inode: u64) -> Result<FileInfo, EosError>;

    /// Stat by hexadecimal file id
    async fn stat_fxid(&self, auth: &Authorization, fxid: &str) -> Result<FileInfo, EosError>;

    /// One-level listing of a directory
    ///
    /// The returned records include the directory itself as well as any
    /// hidden version folders; filtering is up to the caller.
    async fn list_dir(&self, auth: &Authorization, path: &str) -> Result<Vec<FileInfo>, EosError>;

    /// Create a directory and any missing parents
    ///
    /// Succeeds if the directory already exists.
    async fn create_dir(&self, auth: &Authorization, path: &str) -> Result<(), EosError>;

    async fn remove(
        &self,
        auth: &Authorization,
        path: &str,
        recursive: bool,
        no_recycle: bool,
    ) -> Result<(), EosError>;

    async fn rename(&self, auth: &Authorization, from: &str, to: &str) -> Result<(), EosError>;

    async fn touch(&self, auth: &Authorization, path: &str) -> Result<(), EosError>;

    async fn chown(&self, auth: &Authorization, path: &str, owner: &Role) -> Result<(), EosError>;

    async fn chmod(&self, auth: &Authorization, path: &str, mode: u32) -> Result<(), EosError>;

    /// Apply one serialized `sys` ACL rule in place
    ///
    /// The rule is in Citrine short form (`u:1000=rwx`); an empty permission
    /// part removes the entry. Legacy MGMs do not understand this call.
    async fn modify_acl(
        &self,
        auth: &Authorization,
        path: &str,
        rule: &str,
        recursive: bool,
        position: Option<u32>,
    ) -> Result<(), EosError>;

    async fn set_attr(
        &self,
        auth: &Authorization,
        path: &str,
        attr: &Attribute,
        recursive: bool,
        error_if_exists: bool,
    ) -> Result<(), EosError>;

    /// Remove an attribute; a missing attribute is [`EosError::NotFound`]
    async fn unset_attr(
        &self,
        auth: &Authorization,
        path: &str,
        attr: &Attribute,
        recursive: bool,
    ) -> Result<(), EosError>;

    /// Read one attribute by its full key (`sys.acl`, `user.color`)
    async fn get_attr(&self, auth: &Authorization, path: &str, key: &str) -> Result<Attribute, EosError>;

    /// All typed attributes of a path
    async fn get_attrs(&self, auth: &Authorization, path: &str) -> Result<Vec<Attribute>, EosError>;

    async fn get_quota(
        &self,
        auth: &Authorization,
        username: &str,
        path: &str,
    ) -> Result<QuotaInfo, EosError>;

    async fn set_quota(&self, auth: &Authorization, info: &SetQuotaInfo) -> Result<(), EosError>;

    async fn list_deleted_entries(&self, auth: &Authorization) -> Result<Vec<DeletedEntry>, EosError>;

    async fn restore_deleted_entry(&self, auth: &Authorization, key: &str) -> Result<(), EosError>;

    async fn purge_deleted_entries(&self, auth: &Authorization) -> Result<(), EosError>;

    /// Make `version` (a file name inside the version folder) the live content
    async fn rollback_to_version(
        &self,
        auth: &Authorization,
        path: &str,
        version: &str,
    ) -> Result<(), EosError>;

    /// Read a whole file
    async fn read(&self, auth: &Authorization, path: &str) -> Result<Bytes, EosError>;

    /// Replace a file's content
    async fn write(&self, auth: &Authorization, path: &str, data: Bytes) -> Result<(), EosError>;
}

/// Version prefix of the Citrine series
pub const CITRINE_PREFIX: &str = "4.";

/// Parsed `EOS_SERVER_VERSION` banner, e.g. `4.8.26`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerVersion(pub String);

impl ServerVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn major(&self) -> Option<u32> {
        self.0.split('.').next()?.trim().parse().ok()
    }

    /// Citrine is the 4.x series; it speaks uid-qualified ACLs and the
    /// dedicated `acl` command.
    pub fn is_citrine(&self) -> bool {
        self.0.trim().starts_with(CITRINE_PREFIX)
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// EOS error taxonomy
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EosError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout while communicating with EOS")]
    Timeout,

    #[error("Request cancelled")]
    Cancelled,
}

impl EosError {
    /// Map an EOS errno-style code (CLI exit status, namespace response code)
    /// to the taxonomy.
    ///
    /// EOS reports some conditions through codes whose POSIX meaning differs:
    /// `E2BIG` (7) and `EINVAL` (22) are how several deployments signal
    /// "instance access denied", and `ENODATA` (61) is a missing attribute.
    pub fn from_errno(code: i64, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match code.unsigned_abs() {
            2 | 61 => EosError::NotFound(msg),
            1 | 7 | 13 | 22 => EosError::PermissionDenied(msg),
            17 => EosError::AlreadyExists(msg),
            95 => EosError::NotSupported(msg),
            _ => EosError::Internal(msg),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EosError::NotFound(_))
    }
}

impl From<reqwest::Error> for EosError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EosError::Timeout
        } else if err.is_connect() || err.is_request() {
            EosError::Transport(err.to_string())
        } else {
            EosError::Internal(err.to_string())
        }
    }
}

impl From<std::io::Error> for EosError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => EosError::NotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => EosError::PermissionDenied(err.to_string()),
            std::io::ErrorKind::TimedOut => EosError::Timeout,
            _ => EosError::Transport(err.to_string()),
        }
    }
}

impl From<tonic::Status> for EosError {
    fn from(status: tonic::Status) -> Self {
        use tonic::Code;

        let msg = status.message().to_string();
        match status.code() {
            Code::NotFound => EosError::NotFound(msg),
            Code::PermissionDenied | Code::Unauthenticated => EosError::PermissionDenied(msg),
            Code::AlreadyExists => EosError::AlreadyExists(msg),
            Code::InvalidArgument => EosError::InvalidArgument(msg),
            Code::Unimplemented => EosError::NotSupported(msg),
            Code::DeadlineExceeded => EosError::Timeout,
            Code::Cancelled => EosError::Cancelled,
            Code::Unavailable => EosError::Transport(msg),
            _ => EosError::Internal(msg),
        }
    }
}

impl From<tonic::transport::Error> for EosError {
    fn from(err: tonic::transport::Error) -> Self {
        EosError::Transport(err.to_string())
    }
}
