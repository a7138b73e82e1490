// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Canonical metadata record for one EOS namespace entry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::acl::Acls;

/// File checksum as reported by the MGM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    /// Hex digest
    pub xs_sum: String,
    /// Algorithm name (`adler`, `md5`, ...)
    pub xs_type: String,
}

/// Metadata of a file or directory
///
/// Built fresh from every EOS response. Only the ACL merge and version-folder
/// inode substitution touch it afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Externally visible identity; stable across content versions when
    /// version invariance is on
    pub inode: u64,
    /// EOS internal file or container id
    pub fid: u64,
    pub uid: u64,
    pub gid: u64,
    /// Bytes, files only
    pub size: u64,
    /// Recursive size, directories only
    pub tree_size: u64,
    /// `files + containers`, directories only
    pub tree_count: u64,
    pub mtime_sec: u64,
    pub mtime_nanos: u32,
    pub etag: String,
    pub is_dir: bool,
    /// Absolute path without trailing slash
    pub file: String,
    /// MGM the record came from
    pub instance: String,
    pub checksum: Option<Checksum>,
    pub sys_acl: Acls,
    /// Every xattr reported, `user.` prefix stripped (except `user.acl`)
    pub attrs: HashMap<String, String>,
}

impl FileInfo {
    /// Final path component
    pub fn name(&self) -> &str {
        crate::domain::version_folder::basename(&self.file)
    }
}
