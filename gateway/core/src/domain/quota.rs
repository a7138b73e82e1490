// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Quota records
//!
//! A path may sit under several EOS quota nodes (for instance a project node
//! and a user node). The effective quota is the sum of every node whose space
//! contains the path.

use serde::{Deserialize, Serialize};

/// Aggregated quota for one user and path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaInfo {
    pub used_bytes: u64,
    /// Total logical bytes allowed
    pub available_bytes: u64,
    pub used_inodes: u64,
    /// Total files allowed
    pub available_inodes: u64,
}

/// One row of `quota ls -m`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaNode {
    /// Quota node path, e.g. `/eos/scratch/user/`
    pub space: String,
    pub max_logical_bytes: u64,
    pub used_logical_bytes: u64,
    pub max_files: u64,
    pub used_files: u64,
}

impl QuotaNode {
    /// Whether this node's space contains `path`.
    ///
    /// Comparison is per path component, so `/eos/user` does not cover
    /// `/eos/username`.
    pub fn covers(&self, path: &str) -> bool {
        let space = self.space.trim_end_matches('/');
        if space.is_empty() {
            return path.starts_with('/');
        }
        match path.strip_prefix(space) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl QuotaInfo {
    /// Sum every node covering `path`; no match yields the zero record.
    pub fn aggregate<'a>(path: &str, nodes: impl IntoIterator<Item = &'a QuotaNode>) -> Self {
        nodes
            .into_iter()
            .filter(|node| node.covers(path))
            .fold(QuotaInfo::default(), |acc, node| QuotaInfo {
                used_bytes: acc.used_bytes.saturating_add(node.used_logical_bytes),
                available_bytes: acc.available_bytes.saturating_add(node.max_logical_bytes),
                used_inodes: acc.used_inodes.saturating_add(node.used_files),
                available_inodes: acc.available_inodes.saturating_add(node.max_files),
            })
    }
}

/// Parameters of a `quota set`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQuotaInfo {
    pub username: String,
    pub uid: u64,
    pub gid: u64,
    /// Quota node the limits apply to
    pub quota_node: String,
    pub max_bytes: u64,
    pub max_files: u64,
}
