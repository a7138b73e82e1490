// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! EOS CLI Backend
//!
//! Implements [`EosBackend`] by shelling out to the `eos` console and to
//! `xrdcopy` for data transfers. Metadata commands run with `-m` so that the
//! output is the monitoring format understood by [`super::monitoring`].
//!
//! # Identity
//!
//! - bearer token: exported as `EOSAUTHZ`
//! - role: `eos -r <uid> <gid> ...`
//! - keytab (optional): `XrdSecPROTOCOL` / `XrdSecSSSKT` for the gateway's own
//!   authentication against the MGM

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::exec::{check_exit, CommandInvocation, CommandOutput, CommandRunner, TokioCommandRunner};
use super::monitoring;
use crate::domain::attribute::Attribute;
use crate::domain::auth::{Authorization, Role};
use crate::domain::backend::{EosBackend, EosError, ServerVersion};
use crate::domain::config::EosClientConfig;
use crate::domain::file_info::FileInfo;
use crate::domain::quota::{QuotaInfo, SetQuotaInfo};
use crate::domain::recycle::DeletedEntry;

/// Settings of the CLI backend
#[derive(Debug, Clone)]
pub struct BinaryOptions {
    pub master_url: String,
    pub eos_binary: String,
    pub xrdcopy_binary: String,
    pub cache_directory: PathBuf,
    pub use_keytab: bool,
    pub keytab: Option<String>,
    pub sec_protocol: String,
}

impl From<&EosClientConfig> for BinaryOptions {
    fn from(config: &EosClientConfig) -> Self {
        Self {
            master_url: config.master_url.clone(),
            eos_binary: config.eos_binary.clone(),
            xrdcopy_binary: config.xrdcopy_binary.clone(),
            cache_directory: config.cache_directory.clone(),
            use_keytab: config.use_keytab,
            keytab: config.keytab.clone(),
            sec_protocol: config.sec_protocol.clone(),
        }
    }
}

impl Default for BinaryOptions {
    fn default() -> Self {
        BinaryOptions::from(&EosClientConfig::default())
    }
}

/// `eos` console adapter
pub struct EosBinaryBackend {
    options: BinaryOptions,
    runner: Arc<dyn CommandRunner>,
}

impl EosBinaryBackend {
    pub fn new(options: BinaryOptions, runner: Arc<dyn CommandRunner>) -> Self {
        Self { options, runner }
    }

    /// Backend running real subprocesses bounded by `timeout`
    pub fn with_timeout(options: BinaryOptions, timeout: Duration) -> Self {
        Self::new(options, Arc::new(TokioCommandRunner::new(timeout)))
    }

    fn with_keytab(&self, mut invocation: CommandInvocation) -> CommandInvocation {
        if self.options.use_keytab {
            invocation = invocation.env("XrdSecPROTOCOL", &self.options.sec_protocol);
            if let Some(keytab) = &self.options.keytab {
                invocation = invocation.env("XrdSecSSSKT", keytab);
            }
        }
        invocation
    }

    /// Build an `eos` invocation carrying the caller's identity
    pub fn eos_invocation(&self, auth: &Authorization, args: &[&str]) -> CommandInvocation {
        let mut invocation = CommandInvocation::new(&self.options.eos_binary)
            .env("EOS_MGM_URL", &self.options.master_url);

        if let Some(token) = auth.bearer() {
            invocation = invocation.env("EOSAUTHZ", token);
        } else if let Some(role) = &auth.role {
            invocation = invocation.args(["-r".to_string(), role.uid.to_string(), role.gid.to_string()]);
        }

        self.with_keytab(invocation).args(args.iter().copied())
    }

    async fn exec_eos(&self, auth: &Authorization, args: &[&str]) -> Result<CommandOutput, EosError> {
        let invocation = self.eos_invocation(auth, args);
        tracing::debug!(command = %invocation, "executing eos command");
        let output = self.runner.run(&invocation).await?;
        check_exit(&output)?;
        Ok(output)
    }

    fn xrd_url(&self, path: &str) -> String {
        format!("{}//{}", self.options.master_url, path)
    }

    /// `xrdcopy` invocation. The role travels as opaque data on the remote
    /// side of the copy: `-OS` when EOS is the source, `-OD` when it is the
    /// destination.
    fn xrdcopy_invocation(
        &self,
        auth: &Authorization,
        source: String,
        target: String,
        remote_is_source: bool,
    ) -> CommandInvocation {
        let (mut source, mut target) = (source, target);
        let mut extra = None;
        if let Some(token) = auth.bearer() {
            let remote = if remote_is_source { &mut source } else { &mut target };
            remote.push_str("?authz=");
            remote.push_str(token);
        } else if let Some(Role { uid, gid }) = auth.role {
            let flag = if remote_is_source { "-OS" } else { "-OD" };
            extra = Some(format!("{}eos.ruid={}&eos.rgid={}", flag, uid, gid));
        }

        let invocation = CommandInvocation::new(&self.options.xrdcopy_binary)
            .args(["--nopbar", "--silent", "-f"])
            .arg(source)
            .arg(target)
            .args(extra);
        self.with_keytab(invocation)
    }

    async fn exec_xrdcopy(&self, invocation: CommandInvocation) -> Result<(), EosError> {
        tracing::debug!(command = %invocation, "executing xrdcopy");
        let output = self.runner.run(&invocation).await?;
        check_exit(&output)
    }

    fn scratch_file(&self, purpose: &str) -> ScratchFile {
        ScratchFile(
            self.options
                .cache_directory
                .join(format!("eos{}-{}", purpose, uuid::Uuid::new_v4())),
        )
    }

    fn instance(&self) -> &str {
        &self.options.master_url
    }
}

/// Local transfer file removed when dropped, including on cancellation
struct ScratchFile(PathBuf);

impl ScratchFile {
    fn path_string(&self) -> String {
        self.0.to_string_lossy().to_string()
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = ?self.0, error = %e, "failed to remove scratch file");
            }
        }
    }
}

#[async_trait]
impl EosBackend for EosBinaryBackend {
    fn name(&self) -> &'static str {
        "binary"
    }

    async fn health_check(&self) -> Result<(), EosError> {
        self.server_version(&Authorization::default()).await.map(|_| ())
    }

    async fn server_version(&self, auth: &Authorization) -> Result<ServerVersion, EosError> {
        let output = self.exec_eos(auth, &["version"]).await?;
        monitoring::parse_server_version(&output.stdout)
    }

    async fn stat_path(&self, auth: &Authorization, path: &str) -> Result<FileInfo, EosError> {
        let output = self.exec_eos(auth, &["file", "info", path, "-m"]).await?;
        monitoring::parse_file_info(output.stdout.trim(), self.instance())
    }

    async fn stat_inode(&self, auth: &Authorization, inode: u64) -> Result<FileInfo, EosError> {
        let target = format!("inode:{}", inode);
        let output = self.exec_eos(auth, &["file", "info", &target, "-m"]).await?;
        monitoring::parse_file_info(output.stdout.trim(), self.instance())
    }

    async fn stat_fxid(&self, auth: &Authorization, fxid: &str) -> Result<FileInfo, EosError> {
        let target = format!("fxid:{}", fxid);
        let output = self.exec_eos(auth, &["file", "info", &target, "-m"]).await?;
        monitoring::parse_file_info(output.stdout.trim(), self.instance())
    }

    async fn list_dir(&self, auth: &Authorization, path: &str) -> Result<Vec<FileInfo>, EosError> {
        let output = self
            .exec_eos(auth, &["find", "--fileinfo", "--maxdepth", "1", path])
            .await?;
        monitoring::parse_find(&output.stdout, self.instance())
    }

    async fn create_dir(&self, auth: &Authorization, path: &str) -> Result<(), EosError> {
        self.exec_eos(auth, &["mkdir", "-p", path]).await.map(|_| ())
    }

    async fn remove(
        &self,
        auth: &Authorization,
        path: &str,
        recursive: bool,
        no_recycle: bool,
    ) -> Result<(), EosError> {
        let mut args = vec!["rm"];
        if recursive {
            args.push("-r");
        }
        if no_recycle {
            args.push("--no-recycle-bin");
        }
        args.push(path);
        self.exec_eos(auth, &args).await.map(|_| ())
    }

    async fn rename(&self, auth: &Authorization, from: &str, to: &str) -> Result<(), EosError> {
        self.exec_eos(auth, &["file", "rename", from, to]).await.map(|_| ())
    }

    async fn touch(&self, auth: &Authorization, path: &str) -> Result<(), EosError> {
        self.exec_eos(auth, &["file", "touch", path]).await.map(|_| ())
    }

    async fn chown(&self, auth: &Authorization, path: &str, owner: &Role) -> Result<(), EosError> {
        let owner = owner.to_string();
        self.exec_eos(auth, &["chown", &owner, path]).await.map(|_| ())
    }

    async fn chmod(&self, auth: &Authorization, path: &str, mode: u32) -> Result<(), EosError> {
        let mode = format!("{:o}", mode);
        self.exec_eos(auth, &["chmod", &mode, path]).await.map(|_| ())
    }

    async fn modify_acl(
        &self,
        auth: &Authorization,
        path: &str,
        rule: &str,
        recursive: bool,
        position: Option<u32>,
    ) -> Result<(), EosError> {
        let position = position.map(|p| p.to_string());
        let mut args = vec!["acl", "--sys"];
        if recursive {
            args.push("--recursive");
        }
        if let Some(p) = &position {
            args.extend(["--position", p.as_str()]);
        }
        args.extend([rule, path]);
        self.exec_eos(auth, &args).await.map(|_| ())
    }

    async fn set_attr(
        &self,
        auth: &Authorization,
        path: &str,
        attr: &Attribute,
        recursive: bool,
        error_if_exists: bool,
    ) -> Result<(), EosError> {
        let assignment = attr.serialize();
        let mut args = vec!["attr"];
        if recursive {
            args.push("-r");
        }
        args.push("set");
        if error_if_exists {
            args.push("-c");
        }
        args.extend([assignment.as_str(), path]);
        self.exec_eos(auth, &args).await.map(|_| ())
    }

    async fn unset_attr(
        &self,
        auth: &Authorization,
        path: &str,
        attr: &Attribute,
        recursive: bool,
    ) -> Result<(), EosError> {
        let key = attr.full_key();
        let mut args = vec!["attr"];
        if recursive {
            args.push("-r");
        }
        args.extend(["rm", key.as_str(), path]);
        self.exec_eos(auth, &args).await.map(|_| ())
    }

    async fn get_attr(&self, auth: &Authorization, path: &str, key: &str) -> Result<Attribute, EosError> {
        let output = self.exec_eos(auth, &["attr", "get", key, path]).await?;
        let line = output
            .stdout
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| EosError::NotFound(format!("attribute {} on {}", key, path)))?;
        Attribute::deserialize(line)
    }

    async fn get_attrs(&self, auth: &Authorization, path: &str) -> Result<Vec<Attribute>, EosError> {
        let output = self.exec_eos(auth, &["attr", "ls", path]).await?;
        Ok(monitoring::parse_attr_listing(&output.stdout))
    }

    async fn get_quota(
        &self,
        auth: &Authorization,
        username: &str,
        path: &str,
    ) -> Result<QuotaInfo, EosError> {
        let output = self.exec_eos(auth, &["quota", "ls", "-u", username, "-m"]).await?;
        Ok(monitoring::parse_quota(path, &output.stdout))
    }

    async fn set_quota(&self, auth: &Authorization, info: &SetQuotaInfo) -> Result<(), EosError> {
        let user = if info.username.is_empty() {
            info.uid.to_string()
        } else {
            info.username.clone()
        };
        let max_bytes = info.max_bytes.to_string();
        let max_files = info.max_files.to_string();
        self.exec_eos(
            auth,
            &[
                "quota", "set", "-u", &user, "-v", &max_bytes, "-i", &max_files, "-p",
                &info.quota_node,
            ],
        )
        .await
        .map(|_| ())
    }

    async fn list_deleted_entries(&self, auth: &Authorization) -> Result<Vec<DeletedEntry>, EosError> {
        let output = self.exec_eos(auth, &["recycle", "ls", "-m"]).await?;
        monitoring::parse_recycle_list(&output.stdout)
    }

    async fn restore_deleted_entry(&self, auth: &Authorization, key: &str) -> Result<(), EosError> {
        self.exec_eos(auth, &["recycle", "restore", key]).await.map(|_| ())
    }

    async fn purge_deleted_entries(&self, auth: &Authorization) -> Result<(), EosError> {
        self.exec_eos(auth, &["recycle", "purge"]).await.map(|_| ())
    }

    async fn rollback_to_version(
        &self,
        auth: &Authorization,
        path: &str,
        version: &str,
    ) -> Result<(), EosError> {
        self.exec_eos(auth, &["file", "versions", path, version]).await.map(|_| ())
    }

    async fn read(&self, auth: &Authorization, path: &str) -> Result<Bytes, EosError> {
        let scratch = self.scratch_file("read");
        let invocation = self.xrdcopy_invocation(auth, self.xrd_url(path), scratch.path_string(), true);
        self.exec_xrdcopy(invocation).await?;
        let data = tokio::fs::read(&scratch.0).await?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, auth: &Authorization, path: &str, data: Bytes) -> Result<(), EosError> {
        let scratch = self.scratch_file("write");
        tokio::fs::write(&scratch.0, &data).await?;
        let invocation = self.xrdcopy_invocation(auth, scratch.path_string(), self.xrd_url(path), false);
        self.exec_xrdcopy(invocation).await
    }
}
