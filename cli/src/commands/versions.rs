// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File version commands
//!
//! Versions are addressed by their name inside the version folder, as shown
//! by `eosgate versions ls`.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

use super::GlobalArgs;
use crate::output::{self, format_mtime, human_size};

#[derive(Subcommand)]
pub enum VersionsCommand {
    /// List stored versions of a file
    Ls {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Make a stored version the current content
    Rollback {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(id = "revision", value_name = "VERSION")]
        revision: String,
    },

    /// Download a stored version
    Read {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(id = "revision", value_name = "VERSION")]
        revision: String,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

pub async fn handle_command(command: VersionsCommand, global: &GlobalArgs) -> Result<()> {
    let session = global.connect().await?;
    let client = &session.client;
    let auth = &session.auth;

    match command {
        VersionsCommand::Ls { path } => {
            let versions = client.list_versions(auth, &path).await?;
            if session.json {
                return output::print_json(&versions);
            }
            if versions.is_empty() {
                println!("{}", format!("No stored versions of {}", path).yellow());
                return Ok(());
            }
            println!("{:<19} {:>9} {}", "MODIFIED", "SIZE", "VERSION");
            for version in &versions {
                println!(
                    "{:<19} {:>9} {}",
                    format_mtime(version.mtime_sec, version.mtime_nanos),
                    human_size(version.size),
                    version.name()
                );
            }
        }
        VersionsCommand::Rollback { path, revision } => {
            client.rollback_to_version(auth, &path, &revision).await?;
            println!("{}", format!("✓ Rolled {} back to {}", path, revision).green());
        }
        VersionsCommand::Read {
            path,
            revision,
            output,
        } => {
            let data = client.read_version(auth, &path, &revision).await?;
            match output {
                Some(file) => {
                    tokio::fs::write(&file, &data)
                        .await
                        .with_context(|| format!("Failed to write {}", file.display()))?;
                    println!(
                        "{}",
                        format!("✓ Saved {} to {}", human_size(data.len() as u64), file.display()).green()
                    );
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&data).context("Failed to write to stdout")?;
                    stdout.flush()?;
                }
            }
        }
    }

    Ok(())
}
