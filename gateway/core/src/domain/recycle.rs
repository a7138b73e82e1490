// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

/// One entry of the EOS recycle bin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedEntry {
    /// Where the entry lived before deletion
    pub restore_path: String,
    /// Opaque token for `recycle restore`
    pub restore_key: String,
    pub size: u64,
    /// Unix seconds
    pub deletion_mtime: u64,
    pub is_dir: bool,
}
