// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Namespace commands
//!
//! Commands: health, stat, ls, mkdir, rm, mv, touch, chmod, chown, cat, put

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{ArgGroup, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

use eosgate_core::auth::Role;

use super::GlobalArgs;
use crate::output;

#[derive(Subcommand)]
pub enum NamespaceCommand {
    /// Check that the MGM answers
    Health,

    /// Show metadata of a path, an inode or a hex file id
    #[command(group(ArgGroup::new("target").required(true).args(["path", "inode", "fxid"])))]
    Stat {
        #[arg(value_name = "PATH")]
        path: Option<String>,

        /// Look up by inode
        #[arg(long)]
        inode: Option<u64>,

        /// Look up by hexadecimal file id
        #[arg(long)]
        fxid: Option<String>,
    },

    /// List a directory
    Ls {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Create a directory and missing parents
    Mkdir {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Remove a file or directory
    Rm {
        #[arg(value_name = "PATH")]
        path: String,

        /// Remove directories and their contents
        #[arg(short, long)]
        recursive: bool,

        /// Bypass the recycle bin
        #[arg(long)]
        no_recycle: bool,
    },

    /// Rename or move an entry
    Mv {
        #[arg(value_name = "FROM")]
        from: String,

        #[arg(value_name = "TO")]
        to: String,
    },

    /// Create an empty file or update its modification time
    Touch {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Change the mode bits of an entry
    Chmod {
        /// Octal mode, e.g. 750
        #[arg(value_name = "MODE")]
        mode: String,

        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Change the owner of an entry
    Chown {
        /// Owner as UID:GID
        #[arg(value_name = "UID:GID")]
        owner: String,

        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Write a file's content to stdout
    Cat {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Upload a local file
    Put {
        #[arg(value_name = "LOCAL")]
        local: PathBuf,

        #[arg(value_name = "PATH")]
        path: String,
    },
}

pub async fn handle_command(command: NamespaceCommand, global: &GlobalArgs) -> Result<()> {
    let session = global.connect().await?;
    let client = &session.client;
    let auth = &session.auth;

    match command {
        NamespaceCommand::Health => {
            client.health_check().await.context("EOS health check failed")?;
            println!(
                "{} ({} backend, {} ACLs)",
                "✓ EOS is reachable".green(),
                client.backend_name(),
                client.codec()
            );
        }
        NamespaceCommand::Stat { path, inode, fxid } => {
            let info = match (path, inode, fxid) {
                (Some(path), _, _) => client.get_file_info_by_path(auth, &path).await?,
                (_, Some(inode), _) => client.get_file_info_by_inode(auth, inode).await?,
                (_, _, Some(fxid)) => client.get_file_info_by_fxid(auth, &fxid).await?,
                (None, None, None) => anyhow::bail!("one of PATH, --inode or --fxid is required"),
            };
            if session.json {
                output::print_json(&info)?;
            } else {
                output::print_file_info(&info);
            }
        }
        NamespaceCommand::Ls { path } => {
            let entries = client.list(auth, &path).await?;
            if session.json {
                output::print_json(&entries)?;
            } else {
                output::print_listing(&entries);
            }
        }
        NamespaceCommand::Mkdir { path } => {
            client.create_dir(auth, &path).await?;
            println!("{}", format!("✓ Created {}", path).green());
        }
        NamespaceCommand::Rm {
            path,
            recursive,
            no_recycle,
        } => {
            client.remove(auth, &path, recursive, no_recycle).await?;
            println!("{}", format!("✓ Removed {}", path).green());
        }
        NamespaceCommand::Mv { from, to } => {
            client.rename(auth, &from, &to).await?;
            println!("{}", format!("✓ Moved {} → {}", from, to).green());
        }
        NamespaceCommand::Touch { path } => {
            client.touch(auth, &path).await?;
        }
        NamespaceCommand::Chmod { mode, path } => {
            let mode = parse_mode(&mode)?;
            client.chmod(auth, &path, mode).await?;
        }
        NamespaceCommand::Chown { owner, path } => {
            let owner = parse_role(&owner)?;
            client.chown(auth, &path, &owner).await?;
        }
        NamespaceCommand::Cat { path } => {
            let data = client.read(auth, &path).await?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data).context("Failed to write to stdout")?;
            stdout.flush()?;
        }
        NamespaceCommand::Put { local, path } => {
            let data = tokio::fs::read(&local)
                .await
                .with_context(|| format!("Failed to read {}", local.display()))?;
            let size = data.len();
            client.write(auth, &path, Bytes::from(data)).await?;
            println!(
                "{}",
                format!("✓ Uploaded {} to {}", output::human_size(size as u64), path).green()
            );
        }
    }

    Ok(())
}

/// Octal mode with an optional `0o` prefix
pub fn parse_mode(raw: &str) -> Result<u32> {
    let digits = raw.strip_prefix("0o").unwrap_or(raw);
    u32::from_str_radix(digits, 8).with_context(|| format!("Invalid mode '{}': expected octal digits", raw))
}

/// `uid:gid`
pub fn parse_role(raw: &str) -> Result<Role> {
    let (uid, gid) = raw
        .split_once(':')
        .with_context(|| format!("Invalid owner '{}': expected UID:GID", raw))?;
    Ok(Role::new(
        uid.parse().with_context(|| format!("Invalid uid '{}'", uid))?,
        gid.parse().with_context(|| format!("Invalid gid '{}'", gid))?,
    ))
}
