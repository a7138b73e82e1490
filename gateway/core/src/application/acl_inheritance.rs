// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Parent-directory ACL inheritance
//!
//! EOS evaluates a file's access against the `sys.acl` of its directory, but
//! reports only the file's own entries. The effective list exposed upward is
//! the file's entries followed by the parent's.

use crate::domain::acl::Acls;
use crate::domain::auth::Authorization;
use crate::domain::backend::EosBackend;
use crate::domain::file_info::FileInfo;
use crate::domain::version_folder::dirname;

/// Append `parent` to the ACL of a file record; directories are left alone.
pub fn merge_parent_acls(info: &mut FileInfo, parent: &Acls) {
    if !info.is_dir {
        info.sys_acl.inherit(parent);
    }
}

/// Look up the parent directory of `info` and merge its ACL
///
/// A failed parent lookup leaves the record with its own entries only.
pub async fn inherit_parent_acls(backend: &dyn EosBackend, auth: &Authorization, info: &mut FileInfo) {
    if info.is_dir {
        return;
    }
    let parent = dirname(&info.file);
    match backend.stat_path(auth, parent).await {
        Ok(dir) => merge_parent_acls(info, &dir.sys_acl),
        Err(e) => {
            tracing::warn!(path = %info.file, parent = %parent, error = %e, "parent ACL lookup failed");
        }
    }
}
