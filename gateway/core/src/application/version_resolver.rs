// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Version-Folder Invariant Resolver
//!
//! EOS replaces a file's content by creating a new file id, so the content
//! inode changes on every write. The `.sys.v#.` folder next to the file keeps
//! its inode for the file's whole life; the gateway exposes that inode as the
//! file's identity.
//!
//! Version folders are looked up and created with the gateway's own identity
//! and handed to the live file's owner afterwards, the way EOS itself lays
//! them out when versioning kicks in.

use std::collections::HashMap;

use crate::domain::auth::{Authorization, Role};
use crate::domain::backend::{EosBackend, EosError};
use crate::domain::file_info::FileInfo;
use crate::domain::version_folder::{
    dirname, file_from_version_folder, is_version_folder, version_folder,
};

/// Stat the version folder of `live`, creating it when the stat fails
pub async fn ensure_version_folder(
    backend: &dyn EosBackend,
    root: &Authorization,
    live: &FileInfo,
) -> Result<FileInfo, EosError> {
    let folder = version_folder(&live.file);
    match backend.stat_path(root, &folder).await {
        Ok(info) => return Ok(info),
        Err(e) => {
            tracing::debug!(path = %folder, error = %e, "version folder missing, creating it");
        }
    }

    match backend.create_dir(root, &folder).await {
        Ok(()) => {
            let owner = Role::new(live.uid, live.gid);
            if let Err(e) = backend.chown(root, &folder, &owner).await {
                tracing::warn!(path = %folder, owner = %owner, error = %e, "failed to hand version folder to file owner");
            }
        }
        Err(EosError::AlreadyExists(_)) => {}
        Err(e) => return Err(e),
    }
    backend.stat_path(root, &folder).await
}

/// Carry the version folder's identity over to the live file
///
/// The inode is replaced. User attributes stored on the folder override the
/// file's own; `sys.*` attributes of the folder describe the folder and are
/// left out.
pub fn apply_version_folder(info: &mut FileInfo, folder: &FileInfo) {
    info.inode = folder.inode;
    for (key, val) in &folder.attrs {
        if !key.starts_with("sys.") {
            info.attrs.insert(key.clone(), val.clone());
        }
    }
}

/// Whether a record takes part in inode substitution
///
/// Stored versions (files inside a version folder) never get one of their own.
pub fn needs_version_folder(info: &FileInfo) -> bool {
    !info.is_dir && !is_version_folder(&info.file) && !is_version_folder(dirname(&info.file))
}

/// A one-level listing split into what the caller sees and what backs it
#[derive(Debug, Default)]
pub struct SplitListing {
    /// The listed directory itself, if the backend reported it
    pub dir: Option<FileInfo>,
    /// Children in listing order, version folders excluded
    pub entries: Vec<FileInfo>,
    /// Version folders keyed by the live path they belong to
    pub version_folders: HashMap<String, FileInfo>,
}

impl SplitListing {
    /// Version folders ordered by path
    pub fn into_hidden_entries(self) -> Vec<FileInfo> {
        let mut hidden: Vec<FileInfo> = self.version_folders.into_values().collect();
        hidden.sort_by(|a, b| a.file.cmp(&b.file));
        hidden
    }
}

/// Separate a raw listing of `dir_path`
///
/// Inside a version folder nothing is treated as a version folder: its
/// entries are the stored versions themselves.
pub fn split_listing(dir_path: &str, raw: Vec<FileInfo>) -> SplitListing {
    let inside_version_folder = is_version_folder(dir_path);
    let mut split = SplitListing::default();

    for info in raw {
        if info.file == dir_path {
            split.dir = Some(info);
        } else if !inside_version_folder && info.is_dir && is_version_folder(&info.file) {
            split
                .version_folders
                .insert(file_from_version_folder(&info.file), info);
        } else {
            split.entries.push(info);
        }
    }
    split
}
