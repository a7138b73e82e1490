// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ACL commands
//!
//! Rules use the short form `TYPE:QUALIFIER=PERMISSIONS` (`u:alice=rwx`,
//! `g:it=rx`, `egroup:my-team=r`). User qualifiers may be given as names or
//! uids; the client converts them to what the MGM expects.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use eosgate_core::acl::{AclEntry, AclType};

use super::GlobalArgs;
use crate::output;

#[derive(Subcommand)]
pub enum AclCommand {
    /// List the rules set on a path
    List {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Show the rule of one TYPE:QUALIFIER
    Get {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(value_name = "TYPE:QUALIFIER")]
        key: String,
    },

    /// Add or replace a rule
    Add {
        #[arg(value_name = "PATH")]
        path: String,

        /// e.g. u:alice=rwx
        #[arg(value_name = "RULE")]
        rule: String,

        /// Insert at this position of the list
        #[arg(long)]
        position: Option<u32>,
    },

    /// Remove the rule of one TYPE:QUALIFIER
    Rm {
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(value_name = "TYPE:QUALIFIER")]
        key: String,
    },
}

pub async fn handle_command(command: AclCommand, global: &GlobalArgs) -> Result<()> {
    let session = global.connect().await?;
    let client = &session.client;
    let auth = &session.auth;

    match command {
        AclCommand::List { path } => {
            let acls = client.list_acls(auth, &path).await?;
            if session.json {
                return output::print_json(&acls);
            }
            if acls.is_empty() {
                println!("{}", "No ACL rules".yellow());
                return Ok(());
            }
            println!("{:<8} {:<24} {}", "TYPE", "QUALIFIER", "PERMISSIONS");
            for entry in &acls.entries {
                println!(
                    "{:<8} {:<24} {}",
                    entry.acl_type.to_string(),
                    entry.qualifier.bold(),
                    entry.permissions
                );
            }
        }
        AclCommand::Get { path, key } => {
            let (acl_type, qualifier) = parse_key(&key)?;
            let entry = client.get_acl(auth, &path, &acl_type, &qualifier).await?;
            if session.json {
                return output::print_json(&entry);
            }
            println!("{}", entry);
        }
        AclCommand::Add { path, rule, position } => {
            let entry = parse_rule(&rule)?;
            client.add_acl(auth, &path, position, &entry).await?;
            println!("{}", format!("✓ Set {} on {}", entry, path).green());
        }
        AclCommand::Rm { path, key } => {
            let (acl_type, qualifier) = parse_key(&key)?;
            let entry = AclEntry::new(acl_type, qualifier, "");
            client.remove_acl(auth, &path, &entry).await?;
            println!(
                "{}",
                format!("✓ Removed {}:{} from {}", entry.acl_type, entry.qualifier, path).green()
            );
        }
    }

    Ok(())
}

/// `TYPE:QUALIFIER=PERMISSIONS`
pub fn parse_rule(raw: &str) -> Result<AclEntry> {
    AclEntry::parse(raw).with_context(|| format!("Invalid ACL rule '{}': expected TYPE:QUALIFIER=PERMISSIONS", raw))
}

/// `TYPE:QUALIFIER`; a trailing `=PERMISSIONS` is ignored
pub fn parse_key(raw: &str) -> Result<(AclType, String)> {
    let key = raw.split_once('=').map_or(raw, |(key, _)| key);
    match key.split_once(':') {
        Some((acl_type, qualifier)) if !acl_type.is_empty() && !qualifier.is_empty() => {
            Ok((AclType::from(acl_type), qualifier.to_string()))
        }
        _ => anyhow::bail!("Invalid ACL key '{}': expected TYPE:QUALIFIER", raw),
    }
}
