// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Version-folder path convention
//!
//! EOS keeps the previous contents of `/dir/name` as numbered files inside the
//! hidden sibling directory `/dir/.sys.v#.name`. The folder outlives content
//! replacement, so its inode is what the gateway exposes as the file's
//! identity.

/// Base-name prefix of every version folder
pub const VERSION_FOLDER_PREFIX: &str = ".sys.v#.";

/// Version folder of a live file
pub fn version_folder(path: &str) -> String {
    join(dirname(path), &format!("{}{}", VERSION_FOLDER_PREFIX, basename(path)))
}

/// Live file of a version folder; the inverse of [`version_folder`]
pub fn file_from_version_folder(path: &str) -> String {
    let base = basename(path);
    join(
        dirname(path),
        base.strip_prefix(VERSION_FOLDER_PREFIX).unwrap_or(base),
    )
}

pub fn is_version_folder(path: &str) -> bool {
    basename(path).starts_with(VERSION_FOLDER_PREFIX)
}

/// Collapse repeated slashes and drop a trailing slash (root stays `/`).
pub fn clean_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let joined = path
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .collect::<Vec<_>>()
        .join("/");
    match (absolute, joined.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Parent directory of `path`; `/` for top-level entries
pub fn dirname(path: &str) -> &str {
    let trimmed = trim_trailing_slash(path);
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(idx) => &trimmed[..idx],
        None => ".",
    }
}

/// Final component of `path`
pub fn basename(path: &str) -> &str {
    let trimmed = trim_trailing_slash(path);
    if trimmed == "/" {
        return trimmed;
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

pub fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

fn trim_trailing_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}
