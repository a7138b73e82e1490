// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # eosgate CLI
//!
//! The `eosgate` binary drives the EOS adapter against a live instance, the
//! same way a storage provider would: every command goes through
//! `EosClient`, so version-folder inodes, ACL translation and inheritance
//! are applied exactly as in production.
//!
//! ## Commands
//!
//! - `eosgate health|stat|ls|mkdir|rm|mv|touch|chmod|chown|cat|put` - Namespace
//! - `eosgate acl list|get|add|rm` - `sys` ACL rules
//! - `eosgate attr list|get|set|rm` - Extended attributes
//! - `eosgate quota get|set` - Quota
//! - `eosgate recycle ls|restore|purge` - Recycle bin
//! - `eosgate versions ls|rollback|read` - File versions
//! - `eosgate config show|validate` - Configuration management

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use eosgate_cli::commands::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    commands::init_logging(&cli.log_level, cli.log_format)?;

    let result = match cli.command {
        Some(Commands::Namespace(command)) => commands::namespace::handle_command(command, &cli.global).await,
        Some(Commands::Acl { command }) => commands::acl::handle_command(command, &cli.global).await,
        Some(Commands::Attr { command }) => commands::attr::handle_command(command, &cli.global).await,
        Some(Commands::Quota { command }) => commands::quota::handle_command(command, &cli.global).await,
        Some(Commands::Recycle { command }) => commands::recycle::handle_command(command, &cli.global).await,
        Some(Commands::Versions { command }) => commands::versions::handle_command(command, &cli.global).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, &cli.global).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}
