// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Quota commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use eosgate_core::quota::SetQuotaInfo;

use super::GlobalArgs;
use crate::output::{self, human_size};

#[derive(Subcommand)]
pub enum QuotaCommand {
    /// Show the effective quota of a user under a path
    Get {
        #[arg(value_name = "USER")]
        user: String,

        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Set the limits of a user on a quota node
    Set {
        #[arg(value_name = "USER")]
        user: String,

        /// Quota node, e.g. /eos/user/
        #[arg(long, value_name = "PATH")]
        node: String,

        #[arg(long)]
        max_bytes: u64,

        #[arg(long)]
        max_files: u64,

        /// Uid of USER as recorded on the quota node
        #[arg(long = "user-uid", default_value_t = 0)]
        user_uid: u64,

        /// Gid of USER as recorded on the quota node
        #[arg(long = "user-gid", default_value_t = 0)]
        user_gid: u64,
    },
}

pub async fn handle_command(command: QuotaCommand, global: &GlobalArgs) -> Result<()> {
    let session = global.connect().await?;
    let client = &session.client;
    let auth = &session.auth;

    match command {
        QuotaCommand::Get { user, path } => {
            let quota = client.get_quota(auth, &user, &path).await?;
            if session.json {
                return output::print_json(&quota);
            }
            println!("{} on {}", user.bold(), path);
            println!(
                "  Bytes: {} of {}",
                human_size(quota.used_bytes),
                human_size(quota.available_bytes)
            );
            println!("  Files: {} of {}", quota.used_inodes, quota.available_inodes);
        }
        QuotaCommand::Set {
            user,
            node,
            max_bytes,
            max_files,
            user_uid,
            user_gid,
        } => {
            let info = SetQuotaInfo {
                username: user,
                uid: user_uid,
                gid: user_gid,
                quota_node: node,
                max_bytes,
                max_files,
            };
            client.set_quota(auth, &info).await?;
            println!(
                "{}",
                format!("✓ Quota for {} on {} set", info.username, info.quota_node).green()
            );
        }
    }

    Ok(())
}
