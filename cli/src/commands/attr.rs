// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Extended attribute commands

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use eosgate_core::attribute::Attribute;

use super::GlobalArgs;
use crate::output;

#[derive(Subcommand)]
pub enum AttrCommand {
    /// List all attributes of a path
    List {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Show one attribute, e.g. user.color
    Get {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(value_name = "KEY")]
        key: String,
    },

    /// Set an attribute from KEY=VALUE
    Set {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(value_name = "KEY=VALUE")]
        assignment: String,

        /// Apply to the whole subtree
        #[arg(short, long)]
        recursive: bool,

        /// Fail if the attribute already exists
        #[arg(long)]
        exclusive: bool,
    },

    /// Remove an attribute
    Rm {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(value_name = "KEY")]
        key: String,

        #[arg(short, long)]
        recursive: bool,
    },
}

pub async fn handle_command(command: AttrCommand, global: &GlobalArgs) -> Result<()> {
    let session = global.connect().await?;
    let client = &session.client;
    let auth = &session.auth;

    match command {
        AttrCommand::List { path } => {
            let mut attrs = client.get_attrs(auth, &path).await?;
            attrs.sort_by_key(|a| a.full_key());
            if session.json {
                return output::print_json(&attrs);
            }
            for attr in &attrs {
                println!("{}={}", attr.full_key().bold(), attr.val);
            }
        }
        AttrCommand::Get { path, key } => {
            let attr = client.get_attr(auth, &path, &key).await?;
            if session.json {
                return output::print_json(&attr);
            }
            println!("{}", attr.val);
        }
        AttrCommand::Set {
            path,
            assignment,
            recursive,
            exclusive,
        } => {
            let attr = parse_assignment(&assignment)?;
            client
                .set_attr(auth, &path, &attr, recursive, exclusive)
                .await?;
            println!("{}", format!("✓ Set {} on {}", attr.full_key(), path).green());
        }
        AttrCommand::Rm {
            path,
            key,
            recursive,
        } => {
            let attr = Attribute::from_full_key(&key, "")?;
            client.unset_attr(auth, &path, &attr, recursive).await?;
            println!("{}", format!("✓ Removed {} from {}", key, path).green());
        }
    }

    Ok(())
}

/// `sys.key=value` or `user.key=value`; the value may be empty
pub fn parse_assignment(raw: &str) -> Result<Attribute> {
    let (key, val) = raw
        .split_once('=')
        .with_context(|| format!("Invalid attribute '{}': expected KEY=VALUE", raw))?;
    Ok(Attribute::from_full_key(key, val)?)
}
