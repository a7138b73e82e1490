// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use eosgate_core::config::{EosClientConfig, CONFIG_PATH_ENV};

use super::GlobalArgs;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Write a configuration file with every default spelled out
    Generate {
        #[arg(short, long, default_value = "./eosgate.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, global: &GlobalArgs) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(global.config.clone(), paths),
        ConfigCommand::Validate { file } => validate(file.or_else(|| global.config.clone())),
        ConfigCommand::Generate { output, force } => generate(&output, force),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = EosClientConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./eosgate.yaml");
        println!("  4. ~/.eosgate/config.yaml");
        println!("  5. /etc/eosgate/config.yaml");
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();
    print!("{}", redacted(&config).to_yaml_string()?);

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = EosClientConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());
    println!("  Backend: {:?}", config.backend);
    println!("  MGM:     {}", config.master_url);

    Ok(())
}

fn generate(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists; pass --force to overwrite", output.display());
    }

    let sample = EosClientConfig::default().to_yaml_string()?;
    std::fs::write(output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

/// Copy of `config` safe to print
fn redacted(config: &EosClientConfig) -> EosClientConfig {
    let mut config = config.clone();
    if config.authkey.is_some() {
        config.authkey = Some("********".to_string());
    }
    config
}
