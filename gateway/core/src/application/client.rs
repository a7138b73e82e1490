// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! EOS Client Application Service
//!
//! The storage-provider facing surface of the gateway. Coordinates:
//! - Infrastructure: the active [`EosBackend`] (CLI, gRPC)
//! - Domain: ACL codec and identity translation, version-folder convention
//! - Application: version-folder inode substitution, parent ACL inheritance
//!
//! Backends return what EOS reports. Everything that makes EOS look like a
//! stable namespace to the caller happens here.

use bytes::Bytes;
use std::sync::Arc;

use crate::application::{acl_inheritance, version_resolver};
use crate::domain::acl::{AclCodec, AclEntry, AclType, Acls, SYS_ACL_KEY};
use crate::domain::attribute::{AttrType, Attribute};
use crate::domain::auth::{Authorization, Role};
use crate::domain::backend::{EosBackend, EosError};
use crate::domain::config::ClientOptions;
use crate::domain::file_info::FileInfo;
use crate::domain::identity::IdentityResolver;
use crate::domain::quota::{QuotaInfo, SetQuotaInfo};
use crate::domain::recycle::DeletedEntry;
use crate::domain::version_folder::{
    clean_path, file_from_version_folder, is_version_folder, join, version_folder,
};

/// EOS namespace client
///
/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct EosClient {
    backend: Arc<dyn EosBackend>,
    identity: Arc<dyn IdentityResolver>,
    codec: AclCodec,
    options: ClientOptions,
    /// Gateway identity for version-folder bookkeeping
    root: Authorization,
}

impl EosClient {
    pub fn new(
        backend: Arc<dyn EosBackend>,
        identity: Arc<dyn IdentityResolver>,
        codec: AclCodec,
        options: ClientOptions,
        root: Authorization,
    ) -> Self {
        Self {
            backend,
            identity,
            codec,
            options,
            root,
        }
    }

    /// Build a client, asking the MGM for its version unless `codec` is forced
    pub async fn connect(
        backend: Arc<dyn EosBackend>,
        identity: Arc<dyn IdentityResolver>,
        options: ClientOptions,
        root: Authorization,
        codec: Option<AclCodec>,
    ) -> Result<Self, EosError> {
        let codec = match codec {
            Some(codec) => codec,
            None => {
                let version = backend.server_version(&root).await?;
                let codec = AclCodec::from_server_version(&version);
                tracing::info!(
                    backend = backend.name(),
                    server_version = %version,
                    acl_codec = %codec,
                    "detected EOS ACL dialect"
                );
                codec
            }
        };
        Ok(Self::new(backend, identity, codec, options, root))
    }

    pub fn codec(&self) -> AclCodec {
        self.codec
    }

    pub fn options(&self) -> ClientOptions {
        self.options
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn health_check(&self) -> Result<(), EosError> {
        self.backend.health_check().await
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub async fn get_file_info_by_path(&self, auth: &Authorization, path: &str) -> Result<FileInfo, EosError> {
        let path = clean_path(path);
        let info = self.backend.stat_path(auth, &path).await?;
        self.resolve(auth, info).await
    }

    /// Stat by inode
    ///
    /// An inode handed out for a file is its version folder's; such a lookup
    /// answers with the live file, keeping the queried inode.
    pub async fn get_file_info_by_inode(&self, auth: &Authorization, inode: u64) -> Result<FileInfo, EosError> {
        let info = self.backend.stat_inode(auth, inode).await?;
        if self.options.version_invariant && info.is_dir && is_version_folder(&info.file) {
            let live = file_from_version_folder(&info.file);
            tracing::debug!(inode, path = %live, "inode belongs to a version folder, resolving live file");
            let mut resolved = self.get_file_info_by_path(auth, &live).await?;
            resolved.inode = inode;
            return Ok(resolved);
        }
        self.resolve(auth, info).await
    }

    pub async fn get_file_info_by_fxid(&self, auth: &Authorization, fxid: &str) -> Result<FileInfo, EosError> {
        let fxid = fxid.trim_start_matches("0x");
        if fxid.is_empty() || !fxid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(EosError::InvalidArgument(format!("'{}' is not a hexadecimal file id", fxid)));
        }
        let info = self.backend.stat_fxid(auth, fxid).await?;
        self.resolve(auth, info).await
    }

    /// Children of a directory
    ///
    /// Version folders back the inode of their file and are hidden unless
    /// `show_hidden_sys_files` is set.
    pub async fn list(&self, auth: &Authorization, path: &str) -> Result<Vec<FileInfo>, EosError> {
        let path = clean_path(path);
        let raw = self.backend.list_dir(auth, &path).await?;
        let mut split = version_resolver::split_listing(&path, raw);

        let parent_acl = match split.dir.take() {
            Some(dir) => dir.sys_acl,
            None => match self.backend.stat_path(auth, &path).await {
                Ok(dir) => dir.sys_acl,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "parent ACL lookup failed");
                    Acls::default()
                }
            },
        };

        let mut entries = Vec::with_capacity(split.entries.len());
        for mut info in std::mem::take(&mut split.entries) {
            if self.options.version_invariant && version_resolver::needs_version_folder(&info) {
                match split.version_folders.get(&info.file) {
                    Some(folder) => version_resolver::apply_version_folder(&mut info, folder),
                    None => {
                        match version_resolver::ensure_version_folder(self.backend.as_ref(), &self.root, &info)
                            .await
                        {
                            Ok(folder) => version_resolver::apply_version_folder(&mut info, &folder),
                            Err(e) => tracing::warn!(
                                path = %info.file,
                                error = %e,
                                "could not create version folder, keeping content inode"
                            ),
                        }
                    }
                }
            }
            acl_inheritance::merge_parent_acls(&mut info, &parent_acl);
            entries.push(info);
        }

        if self.options.show_hidden_sys_files {
            entries.extend(split.into_hidden_entries());
        }
        Ok(entries)
    }

    async fn resolve(&self, auth: &Authorization, mut info: FileInfo) -> Result<FileInfo, EosError> {
        if self.options.version_invariant && version_resolver::needs_version_folder(&info) {
            let folder = version_resolver::ensure_version_folder(self.backend.as_ref(), &self.root, &info).await?;
            version_resolver::apply_version_folder(&mut info, &folder);
        }
        acl_inheritance::inherit_parent_acls(self.backend.as_ref(), auth, &mut info).await;
        Ok(info)
    }

    // ========================================================================
    // ACLs
    // ========================================================================

    /// Add or replace one `sys` ACL rule
    ///
    /// Directories are updated recursively. `position` is honoured by
    /// Citrine MGMs only.
    pub async fn add_acl(
        &self,
        auth: &Authorization,
        path: &str,
        position: Option<u32>,
        entry: &AclEntry,
    ) -> Result<(), EosError> {
        if entry.acl_type.as_str().is_empty() || entry.qualifier.is_empty() {
            return Err(EosError::InvalidArgument(format!("incomplete ACL entry '{}'", entry)));
        }
        let path = clean_path(path);
        let info = self.backend.stat_path(auth, &path).await?;

        match self.codec {
            AclCodec::Citrine => {
                let eos_entry = self.codec.to_eos_entry(entry, self.identity.as_ref())?;
                tracing::debug!(path = %path, rule = %eos_entry, "modifying ACL");
                self.backend
                    .modify_acl(auth, &path, &eos_entry.serialize(), info.is_dir, position)
                    .await
            }
            AclCodec::Legacy => {
                if position.is_some() {
                    tracing::debug!(path = %path, "legacy MGM ignores ACL position");
                }
                let mut acls = info
                    .attrs
                    .get(SYS_ACL_KEY)
                    .map(|raw| Acls::parse(raw))
                    .unwrap_or_default();
                acls.set_entry(entry.acl_type.clone(), &entry.qualifier, &entry.permissions)?;
                self.write_sys_acl(auth, &path, &acls, info.is_dir).await
            }
        }
    }

    /// Same as [`EosClient::add_acl`]
    pub async fn update_acl(
        &self,
        auth: &Authorization,
        path: &str,
        position: Option<u32>,
        entry: &AclEntry,
    ) -> Result<(), EosError> {
        self.add_acl(auth, path, position, entry).await
    }

    /// Drop the rule for `entry`'s type and qualifier; its permissions are ignored
    pub async fn remove_acl(&self, auth: &Authorization, path: &str, entry: &AclEntry) -> Result<(), EosError> {
        let removal = AclEntry::new(entry.acl_type.clone(), entry.qualifier.clone(), "");
        self.add_acl(auth, path, None, &removal).await
    }

    /// The path's own `sys` ACL with qualifiers in caller-facing form
    pub async fn list_acls(&self, auth: &Authorization, path: &str) -> Result<Acls, EosError> {
        let path = clean_path(path);
        let info = self.backend.stat_path(auth, &path).await?;
        self.codec.from_eos_acls(&info.sys_acl, self.identity.as_ref())
    }

    pub async fn get_acl(
        &self,
        auth: &Authorization,
        path: &str,
        acl_type: &AclType,
        qualifier: &str,
    ) -> Result<AclEntry, EosError> {
        let path = clean_path(path);
        let info = self.backend.stat_path(auth, &path).await?;
        let query = self
            .codec
            .to_eos_entry(&AclEntry::new(acl_type.clone(), qualifier, ""), self.identity.as_ref())?;
        let found = info
            .sys_acl
            .get_entry(&query.acl_type, &query.qualifier)
            .ok_or_else(|| EosError::NotFound(format!("ACL {}:{} on {}", acl_type, qualifier, path)))?;
        self.codec.from_eos_entry(found, self.identity.as_ref())
    }

    async fn write_sys_acl(
        &self,
        auth: &Authorization,
        path: &str,
        acls: &Acls,
        recursive: bool,
    ) -> Result<(), EosError> {
        let attr = Attribute::new(AttrType::System, "acl", self.codec.serialize(acls));
        if acls.is_empty() {
            return match self.backend.unset_attr(auth, path, &attr, recursive).await {
                Err(e) if e.is_not_found() => Ok(()),
                other => other,
            };
        }
        self.backend.set_attr(auth, path, &attr, recursive, false).await
    }

    // ========================================================================
    // Extended attributes
    // ========================================================================
    //
    // EOS drops a file's attributes when its content is replaced. With version
    // invariance on, user attributes of files live on the version folder,
    // which survives writes; system attributes always stay on the path.

    pub async fn set_attr(
        &self,
        auth: &Authorization,
        path: &str,
        attr: &Attribute,
        recursive: bool,
        error_if_exists: bool,
    ) -> Result<(), EosError> {
        attr.validate()?;
        let path = clean_path(path);
        let target = match self.user_attr_file(auth, &path, attr).await? {
            Some(live) => {
                version_resolver::ensure_version_folder(self.backend.as_ref(), &self.root, &live)
                    .await?
                    .file
            }
            None => path,
        };
        tracing::debug!(path = %target, attr = %attr.full_key(), "setting attribute");
        self.backend
            .set_attr(auth, &target, attr, recursive, error_if_exists)
            .await
    }

    pub async fn unset_attr(
        &self,
        auth: &Authorization,
        path: &str,
        attr: &Attribute,
        recursive: bool,
    ) -> Result<(), EosError> {
        attr.validate()?;
        let path = clean_path(path);
        if self.user_attr_file(auth, &path, attr).await?.is_some() {
            match self
                .backend
                .unset_attr(auth, &version_folder(&path), attr, recursive)
                .await
            {
                Err(e) if e.is_not_found() => {}
                other => return other,
            }
        }
        self.backend.unset_attr(auth, &path, attr, recursive).await
    }

    /// Read one attribute by full key, e.g. `user.color`
    pub async fn get_attr(&self, auth: &Authorization, path: &str, key: &str) -> Result<Attribute, EosError> {
        let attr = Attribute::from_full_key(key, "")?;
        let path = clean_path(path);
        if self.user_attr_file(auth, &path, &attr).await?.is_some() {
            match self.backend.get_attr(auth, &version_folder(&path), key).await {
                Err(e) if e.is_not_found() => {}
                other => return other,
            }
        }
        self.backend.get_attr(auth, &path, key).await
    }

    pub async fn get_attrs(&self, auth: &Authorization, path: &str) -> Result<Vec<Attribute>, EosError> {
        let path = clean_path(path);
        let mut attrs = self.backend.get_attrs(auth, &path).await?;
        if !self.options.version_invariant {
            return Ok(attrs);
        }

        let info = self.backend.stat_path(auth, &path).await?;
        if !version_resolver::needs_version_folder(&info) {
            return Ok(attrs);
        }
        let stored = match self.backend.get_attrs(auth, &version_folder(&path)).await {
            Ok(stored) => stored,
            Err(e) if e.is_not_found() => return Ok(attrs),
            Err(e) => return Err(e),
        };
        for attr in stored.into_iter().filter(|a| a.attr_type == AttrType::User) {
            match attrs.iter_mut().find(|a| a.full_key() == attr.full_key()) {
                Some(existing) => *existing = attr,
                None => attrs.push(attr),
            }
        }
        Ok(attrs)
    }

    /// The live file whose version folder holds `attr`, if it is redirected
    async fn user_attr_file(
        &self,
        auth: &Authorization,
        path: &str,
        attr: &Attribute,
    ) -> Result<Option<FileInfo>, EosError> {
        if !self.options.version_invariant || attr.attr_type != AttrType::User {
            return Ok(None);
        }
        let info = self.backend.stat_path(auth, path).await?;
        Ok(version_resolver::needs_version_folder(&info).then_some(info))
    }

    // ========================================================================
    // Quota
    // ========================================================================

    pub async fn get_quota(&self, auth: &Authorization, username: &str, path: &str) -> Result<QuotaInfo, EosError> {
        if username.is_empty() {
            return Err(EosError::InvalidArgument("quota lookup requires a username".to_string()));
        }
        self.backend.get_quota(auth, username, &clean_path(path)).await
    }

    pub async fn set_quota(&self, auth: &Authorization, info: &SetQuotaInfo) -> Result<(), EosError> {
        if info.quota_node.is_empty() {
            return Err(EosError::InvalidArgument("quota node cannot be empty".to_string()));
        }
        tracing::info!(
            user = %info.username,
            node = %info.quota_node,
            max_bytes = info.max_bytes,
            max_files = info.max_files,
            "setting quota"
        );
        self.backend.set_quota(auth, info).await
    }

    // ========================================================================
    // Recycle bin
    // ========================================================================

    pub async fn list_deleted_entries(&self, auth: &Authorization) -> Result<Vec<DeletedEntry>, EosError> {
        self.backend.list_deleted_entries(auth).await
    }

    pub async fn restore_deleted_entry(&self, auth: &Authorization, key: &str) -> Result<(), EosError> {
        if key.is_empty() {
            return Err(EosError::InvalidArgument("restore key cannot be empty".to_string()));
        }
        self.backend.restore_deleted_entry(auth, key).await
    }

    pub async fn purge_deleted_entries(&self, auth: &Authorization) -> Result<(), EosError> {
        self.backend.purge_deleted_entries(auth).await
    }

    // ========================================================================
    // Versions
    // ========================================================================

    /// Stored versions of a file; none when it was never versioned
    pub async fn list_versions(&self, auth: &Authorization, path: &str) -> Result<Vec<FileInfo>, EosError> {
        let folder = version_folder(&clean_path(path));
        match self.backend.list_dir(auth, &folder).await {
            Ok(raw) => Ok(raw
                .into_iter()
                .filter(|info| info.file != folder && !info.is_dir)
                .collect()),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    pub async fn read_version(&self, auth: &Authorization, path: &str, version: &str) -> Result<Bytes, EosError> {
        check_version_name(version)?;
        let stored = join(&version_folder(&clean_path(path)), version);
        self.backend.read(auth, &stored).await
    }

    pub async fn rollback_to_version(&self, auth: &Authorization, path: &str, version: &str) -> Result<(), EosError> {
        check_version_name(version)?;
        let path = clean_path(path);
        tracing::info!(path = %path, version = %version, "rolling back to version");
        self.backend.rollback_to_version(auth, &path, version).await
    }

    // ========================================================================
    // Namespace
    // ========================================================================

    pub async fn create_dir(&self, auth: &Authorization, path: &str) -> Result<(), EosError> {
        self.backend.create_dir(auth, &clean_path(path)).await
    }

    pub async fn remove(
        &self,
        auth: &Authorization,
        path: &str,
        recursive: bool,
        no_recycle: bool,
    ) -> Result<(), EosError> {
        let path = clean_path(path);
        if path == "/" {
            return Err(EosError::InvalidArgument("refusing to remove the namespace root".to_string()));
        }
        self.backend.remove(auth, &path, recursive, no_recycle).await
    }

    pub async fn rename(&self, auth: &Authorization, from: &str, to: &str) -> Result<(), EosError> {
        self.backend
            .rename(auth, &clean_path(from), &clean_path(to))
            .await
    }

    pub async fn touch(&self, auth: &Authorization, path: &str) -> Result<(), EosError> {
        self.backend.touch(auth, &clean_path(path)).await
    }

    pub async fn chown(&self, auth: &Authorization, path: &str, owner: &Role) -> Result<(), EosError> {
        self.backend.chown(auth, &clean_path(path), owner).await
    }

    pub async fn chmod(&self, auth: &Authorization, path: &str, mode: u32) -> Result<(), EosError> {
        if mode > 0o7777 {
            return Err(EosError::InvalidArgument(format!("invalid mode {:o}", mode)));
        }
        self.backend.chmod(auth, &clean_path(path), mode).await
    }

    pub async fn read(&self, auth: &Authorization, path: &str) -> Result<Bytes, EosError> {
        self.backend.read(auth, &clean_path(path)).await
    }

    pub async fn write(&self, auth: &Authorization, path: &str, data: Bytes) -> Result<(), EosError> {
        self.backend.write(auth, &clean_path(path), data).await
    }
}

fn check_version_name(version: &str) -> Result<(), EosError> {
    if version.is_empty() || version.contains('/') {
        return Err(EosError::InvalidArgument(format!("invalid version name '{}'", version)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_version_name() {
        assert!(check_version_name("1700000000.0001a2b3").is_ok());
        assert!(check_version_name("").is_err());
        assert!(check_version_name("../x").is_err());
    }
}
