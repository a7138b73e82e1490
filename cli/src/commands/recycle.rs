// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Recycle bin commands

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::GlobalArgs;
use crate::output::{self, format_mtime, human_size};

#[derive(Subcommand)]
pub enum RecycleCommand {
    /// List entries in the recycle bin
    Ls,

    /// Restore an entry by its restore key
    Restore {
        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Permanently delete everything in the recycle bin
    Purge {
        /// Confirm the purge
        #[arg(long)]
        yes: bool,
    },
}

pub async fn handle_command(command: RecycleCommand, global: &GlobalArgs) -> Result<()> {
    if let RecycleCommand::Purge { yes: false } = command {
        anyhow::bail!("purge deletes every recycled entry permanently; pass --yes to confirm");
    }

    let session = global.connect().await?;
    let client = &session.client;
    let auth = &session.auth;

    match command {
        RecycleCommand::Ls => {
            let entries = client.list_deleted_entries(auth).await?;
            if session.json {
                return output::print_json(&entries);
            }
            if entries.is_empty() {
                println!("{}", "Recycle bin is empty".yellow());
                return Ok(());
            }
            println!("{:<19} {:>9} {:<40} {}", "DELETED", "SIZE", "KEY", "PATH");
            for entry in &entries {
                let path = if entry.is_dir {
                    format!("{}/", entry.restore_path).blue().bold()
                } else {
                    entry.restore_path.normal()
                };
                println!(
                    "{:<19} {:>9} {:<40} {}",
                    format_mtime(entry.deletion_mtime, 0),
                    human_size(entry.size),
                    entry.restore_key,
                    path
                );
            }
        }
        RecycleCommand::Restore { key } => {
            client.restore_deleted_entry(auth, &key).await?;
            println!("{}", format!("✓ Restored {}", key).green());
        }
        RecycleCommand::Purge { .. } => {
            client.purge_deleted_entries(auth).await?;
            println!("{}", "✓ Recycle bin purged".green());
        }
    }

    Ok(())
}
