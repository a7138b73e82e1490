// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! ACL Translator
//!
//! EOS keeps access rules in the `sys.acl` attribute as a comma-separated
//! short-text list. Two dialects exist:
//!
//! - legacy MGMs: `u:alice:rwx,egroup:it-dep:rx` (usernames, colon separated)
//! - Citrine (4.x): `u:1000=rwx,egroup:it-dep=rx` (uids, `=` before permissions)
//!
//! [`Acls::parse`] accepts both, plus lightweight `lw:` entries. Serialization
//! defaults to the Citrine form. An entry with empty permissions is the
//! convention EOS uses to delete a rule.
//!
//! [`AclCodec`] is chosen once per client from the MGM version and owns the
//! qualifier translation between caller-facing usernames and what the MGM
//! stores.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::domain::backend::{EosError, ServerVersion};
use crate::domain::identity::IdentityResolver;

/// Attribute holding the directory ACL
pub const SYS_ACL_KEY: &str = "sys.acl";
/// Attribute holding user-managed ACL entries
pub const USER_ACL_KEY: &str = "user.acl";
/// When `"1"`, EOS evaluates `user.acl` on top of `sys.acl`
pub const EVAL_USER_ACL_KEY: &str = "sys.eval.useracl";

/// Qualifier kind of an ACL rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AclType {
    /// `u`, a user (uid on Citrine, username on legacy)
    User,
    /// `g`, a unix group
    Group,
    /// `egroup`, a CERN e-group
    Egroup,
    /// `lw`, lightweight (public link) account
    Lightweight,
    /// Anything else EOS emits (`z`, `k`, ...), carried through unchanged
    Other(String),
}

impl AclType {
    pub fn as_str(&self) -> &str {
        match self {
            AclType::User => "u",
            AclType::Group => "g",
            AclType::Egroup => "egroup",
            AclType::Lightweight => "lw",
            AclType::Other(s) => s,
        }
    }
}

impl From<&str> for AclType {
    fn from(s: &str) -> Self {
        match s {
            "u" => AclType::User,
            "g" => AclType::Group,
            "egroup" => AclType::Egroup,
            "lw" => AclType::Lightweight,
            other => AclType::Other(other.to_string()),
        }
    }
}

impl From<String> for AclType {
    fn from(s: String) -> Self {
        AclType::from(s.as_str())
    }
}

impl From<AclType> for String {
    fn from(t: AclType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for AclType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ACL rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub acl_type: AclType,
    pub qualifier: String,
    /// Permission letters (`rwx`, `rx+d`, ...); empty means "remove"
    pub permissions: String,
}

impl AclEntry {
    pub fn new(
        acl_type: AclType,
        qualifier: impl Into<String>,
        permissions: impl Into<String>,
    ) -> Self {
        Self {
            acl_type,
            qualifier: qualifier.into(),
            permissions: permissions.into(),
        }
    }

    /// Parse one entry in either dialect.
    ///
    /// Returns `None` for anything that does not split into exactly three
    /// non-empty fields; an empty-permission entry therefore never parses.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let fields: Vec<&str> = raw
            .split([':', '='])
            .filter(|f| !f.is_empty())
            .collect();
        match fields.as_slice() {
            [acl_type, qualifier, permissions] => {
                Some(AclEntry::new((*acl_type).into(), *qualifier, *permissions))
            }
            _ => None,
        }
    }

    pub fn matches(&self, acl_type: &AclType, qualifier: &str) -> bool {
        &self.acl_type == acl_type && self.qualifier == qualifier
    }

    pub fn is_removal(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Citrine form `type:qualifier=perms`
    pub fn serialize(&self) -> String {
        format!("{}:{}={}", self.acl_type, self.qualifier, self.permissions)
    }

    /// Legacy form `type:qualifier:perms`
    pub fn serialize_legacy(&self) -> String {
        format!("{}:{}:{}", self.acl_type, self.qualifier, self.permissions)
    }
}

impl fmt::Display for AclEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Ordered ACL list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acls {
    pub entries: Vec<AclEntry>,
}

impl Acls {
    pub fn new(entries: Vec<AclEntry>) -> Self {
        Self { entries }
    }

    /// Parse a `sys.acl` value.
    ///
    /// Empty tokens and `#` comments are ignored. Malformed entries are
    /// skipped so that trailing garbage never hides the valid rules.
    pub fn parse(raw: &str) -> Self {
        let mut entries = Vec::new();
        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() || token.starts_with('#') {
                continue;
            }
            match AclEntry::parse(token) {
                Some(entry) => entries.push(entry),
                None => tracing::debug!(entry = %token, "skipping malformed ACL entry"),
            }
        }
        Self { entries }
    }

    /// Effective ACL of a record from its attribute bag.
    ///
    /// `sys.acl` is the base. When `sys.eval.useracl` is `1`, the rules in
    /// `user.acl` are applied on top.
    pub fn from_xattrs(attrs: &HashMap<String, String>) -> Self {
        let mut acls = attrs
            .get(SYS_ACL_KEY)
            .map(|raw| Acls::parse(raw))
            .unwrap_or_default();

        if attrs.get(EVAL_USER_ACL_KEY).map(String::as_str) == Some("1") {
            if let Some(user_acl) = attrs.get(USER_ACL_KEY) {
                for entry in Acls::parse(user_acl).entries {
                    // parsed entries always carry a type and qualifier
                    let _ = acls.set_entry(entry.acl_type, &entry.qualifier, &entry.permissions);
                }
            }
        }
        acls
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(AclEntry::serialize)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn serialize_legacy(&self) -> String {
        self.entries
            .iter()
            .map(AclEntry::serialize_legacy)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Set the permissions of `(acl_type, qualifier)`.
    ///
    /// An existing entry is replaced where it stands and any duplicates of it
    /// are dropped; a new key is appended. Empty `permissions` deletes.
    pub fn set_entry(
        &mut self,
        acl_type: AclType,
        qualifier: &str,
        permissions: &str,
    ) -> Result<(), EosError> {
        if acl_type.as_str().is_empty() || qualifier.is_empty() {
            return Err(EosError::InvalidArgument(
                "ACL entry requires a type and a qualifier".to_string(),
            ));
        }
        if permissions.is_empty() {
            self.delete_entry(&acl_type, qualifier);
            return Ok(());
        }

        match self.entries.iter().position(|e| e.matches(&acl_type, qualifier)) {
            Some(idx) => {
                self.entries[idx].permissions = permissions.to_string();
                let mut seen = false;
                self.entries.retain(|e| {
                    if !e.matches(&acl_type, qualifier) {
                        return true;
                    }
                    !std::mem::replace(&mut seen, true)
                });
            }
            None => self
                .entries
                .push(AclEntry::new(acl_type, qualifier, permissions)),
        }
        Ok(())
    }

    /// Remove every entry for `(acl_type, qualifier)`
    pub fn delete_entry(&mut self, acl_type: &AclType, qualifier: &str) {
        self.entries.retain(|e| !e.matches(acl_type, qualifier));
    }

    /// Last matching entry
    pub fn get_entry(&self, acl_type: &AclType, qualifier: &str) -> Option<&AclEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.matches(acl_type, qualifier))
    }

    /// Append the parent directory's entries after this record's own.
    pub fn inherit(&mut self, parent: &Acls) {
        self.entries.extend(parent.entries.iter().cloned());
    }
}

/// ACL dialect spoken by the MGM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclCodec {
    /// 4.x: uid qualifiers, `acl` command for in-place rule edits
    Citrine,
    /// Pre-Citrine: username qualifiers, whole `sys.acl` rewritten
    Legacy,
}

impl AclCodec {
    pub fn from_server_version(version: &ServerVersion) -> Self {
        if version.is_citrine() {
            AclCodec::Citrine
        } else {
            AclCodec::Legacy
        }
    }

    /// Translate a caller-facing entry into what the MGM stores.
    ///
    /// Citrine stores user rules by uid, so a username qualifier is resolved
    /// locally. Numeric qualifiers and non-user rules pass through.
    pub fn to_eos_entry(
        &self,
        entry: &AclEntry,
        identity: &dyn IdentityResolver,
    ) -> Result<AclEntry, EosError> {
        match self {
            AclCodec::Citrine if is_username_qualifier(entry) => {
                let uid = identity.uid_for_username(&entry.qualifier)?;
                Ok(AclEntry::new(
                    entry.acl_type.clone(),
                    uid.to_string(),
                    entry.permissions.clone(),
                ))
            }
            _ => Ok(entry.clone()),
        }
    }

    /// Translate an entry read from the MGM into caller-facing form.
    pub fn from_eos_entry(
        &self,
        entry: &AclEntry,
        identity: &dyn IdentityResolver,
    ) -> Result<AclEntry, EosError> {
        match self {
            AclCodec::Citrine if entry.acl_type == AclType::User => {
                match entry.qualifier.parse::<u64>() {
                    Ok(uid) => Ok(AclEntry::new(
                        AclType::User,
                        identity.username_for_uid(uid)?,
                        entry.permissions.clone(),
                    )),
                    Err(_) => Ok(entry.clone()),
                }
            }
            _ => Ok(entry.clone()),
        }
    }

    pub fn from_eos_acls(
        &self,
        acls: &Acls,
        identity: &dyn IdentityResolver,
    ) -> Result<Acls, EosError> {
        acls.entries
            .iter()
            .map(|e| self.from_eos_entry(e, identity))
            .collect::<Result<Vec<_>, _>>()
            .map(Acls::new)
    }

    /// Serialize a full list for a `sys.acl` write
    pub fn serialize(&self, acls: &Acls) -> String {
        match self {
            AclCodec::Citrine => acls.serialize(),
            AclCodec::Legacy => acls.serialize_legacy(),
        }
    }
}

impl fmt::Display for AclCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclCodec::Citrine => f.write_str("citrine"),
            AclCodec::Legacy => f.write_str("legacy"),
        }
    }
}

fn is_username_qualifier(entry: &AclEntry) -> bool {
    entry.acl_type == AclType::User && entry.qualifier.parse::<u64>().is_err()
}
