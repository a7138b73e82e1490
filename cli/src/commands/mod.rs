// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the eosgate CLI

pub mod acl;
pub mod attr;
pub mod config;
pub mod namespace;
pub mod quota;
pub mod recycle;
pub mod versions;

pub use self::acl::AclCommand;
pub use self::attr::AttrCommand;
pub use self::config::ConfigCommand;
pub use self::namespace::NamespaceCommand;
pub use self::quota::QuotaCommand;
pub use self::recycle::RecycleCommand;
pub use self::versions::VersionsCommand;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use eosgate_core::auth::{Authorization, Role};
use eosgate_core::config::EosClientConfig;
use eosgate_core::{create_eos_client, EosClient};

/// eosgate - EOS storage adapter CLI
#[derive(Parser)]
#[command(name = "eosgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "EOSGATE_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, env = "EOSGATE_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = "EOSGATE_CONFIG_PATH", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Act as this uid (requires --gid)
    #[arg(long, global = true, env = "EOSGATE_UID", requires = "gid")]
    pub uid: Option<u64>,

    /// Act as this gid (requires --uid)
    #[arg(long, global = true, env = "EOSGATE_GID", requires = "uid")]
    pub gid: Option<u64>,

    /// EOS authorization token; takes precedence over --uid/--gid
    #[arg(long, global = true, env = "EOSGATE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Namespace(NamespaceCommand),

    /// Manage `sys` ACL rules
    #[command(name = "acl")]
    Acl {
        #[command(subcommand)]
        command: AclCommand,
    },

    /// Manage extended attributes
    #[command(name = "attr")]
    Attr {
        #[command(subcommand)]
        command: AttrCommand,
    },

    /// Inspect and set quota
    #[command(name = "quota")]
    Quota {
        #[command(subcommand)]
        command: QuotaCommand,
    },

    /// Recycle bin operations
    #[command(name = "recycle")]
    Recycle {
        #[command(subcommand)]
        command: RecycleCommand,
    },

    /// File versions
    #[command(name = "versions")]
    Versions {
        #[command(subcommand)]
        command: VersionsCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

/// A connected client plus the identity commands run as
pub struct Session {
    pub client: EosClient,
    pub auth: Authorization,
    pub json: bool,
}

impl GlobalArgs {
    pub fn load_config(&self) -> Result<EosClientConfig> {
        let config = EosClientConfig::load_or_default(self.config.clone())
            .context("Failed to load configuration")?;
        config
            .validate()
            .context("Configuration validation failed")?;
        Ok(config)
    }

    pub fn authorization(&self) -> Authorization {
        Authorization {
            role: match (self.uid, self.gid) {
                (Some(uid), Some(gid)) => Some(Role::new(uid, gid)),
                _ => None,
            },
            token: self.token.clone(),
        }
    }

    pub async fn connect(&self) -> Result<Session> {
        let config = self.load_config()?;
        let client = create_eos_client(&config)
            .await
            .with_context(|| format!("Failed to connect to EOS at {}", config.master_url))?;
        tracing::debug!(
            mgm = %config.master_url,
            backend = client.backend_name(),
            codec = %client.codec(),
            "connected"
        );
        Ok(Session {
            client,
            auth: self.authorization(),
            json: self.json,
        })
    }
}

/// Initialize tracing subscriber for logging
///
/// Logs go to stderr so that command output stays pipeable.
pub fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}
