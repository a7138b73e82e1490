// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Extended Attribute Model
//!
//! EOS extended attributes live in two namespaces, `sys.*` (administrative,
//! writable only by privileged roles) and `user.*`. Keys are sent to EOS in the
//! form `<type>.<key>` and assignments as `<type>.<key>=<value>`, identically
//! across the CLI, gRPC and HTTP transports.
//!
//! Attributes of any other namespace are never promoted to [`Attribute`]; they
//! stay in the untyped `FileInfo::attrs` bag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::backend::EosError;

/// Attribute namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrType {
    #[serde(rename = "sys")]
    System,
    User,
}

impl AttrType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrType::System => "sys",
            AttrType::User => "user",
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttrType {
    type Err = EosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sys" | "system" => Ok(AttrType::System),
            "user" => Ok(AttrType::User),
            other => Err(EosError::InvalidArgument(format!(
                "unknown attribute type '{}'",
                other
            ))),
        }
    }
}

/// One typed extended attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub attr_type: AttrType,
    pub key: String,
    pub val: String,
}

impl Attribute {
    pub fn new(attr_type: AttrType, key: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            attr_type,
            key: key.into(),
            val: val.into(),
        }
    }

    /// Key as EOS addresses it, e.g. `sys.acl`
    pub fn full_key(&self) -> String {
        format!("{}.{}", self.attr_type, self.key)
    }

    /// Assignment form, e.g. `user.color=blue`
    pub fn serialize(&self) -> String {
        format!("{}={}", self.full_key(), self.val)
    }

    /// Reject attributes EOS would refuse before a round-trip is spent on them.
    pub fn validate(&self) -> Result<(), EosError> {
        if self.key.is_empty() {
            return Err(EosError::InvalidArgument(
                "attribute key cannot be empty".to_string(),
            ));
        }
        if self.key.contains('=') || self.key.contains(char::is_whitespace) {
            return Err(EosError::InvalidArgument(format!(
                "attribute key '{}' contains '=' or whitespace",
                self.key
            )));
        }
        Ok(())
    }

    /// Parse a full key (`sys.acl`, `user.color`) into a typed attribute with
    /// the given value.
    pub fn from_full_key(full_key: &str, val: impl Into<String>) -> Result<Self, EosError> {
        let (prefix, key) = full_key.split_once('.').ok_or_else(|| {
            EosError::InvalidArgument(format!("attribute key '{}' has no namespace", full_key))
        })?;
        let attr = Attribute::new(prefix.parse()?, key, val);
        attr.validate()?;
        Ok(attr)
    }

    /// Parse one line of `attr get`/`attr ls` output: `sys.key="value"`.
    pub fn deserialize(line: &str) -> Result<Self, EosError> {
        let (full_key, raw_val) = line.trim().split_once('=').ok_or_else(|| {
            EosError::Internal(format!("malformed attribute line '{}'", line))
        })?;
        let val = raw_val
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(raw_val);
        Self::from_full_key(full_key, val).map_err(|e| match e {
            EosError::InvalidArgument(msg) => EosError::Internal(msg),
            other => other,
        })
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Key under which an xattr is stored in `FileInfo::attrs`.
///
/// EOS reports user attributes with their namespace; the `user.` prefix is
/// dropped except on `user.acl`, which must stay distinguishable from
/// `sys.acl`.
pub fn normalize_xattr_name(name: &str) -> &str {
    if name == "user.acl" {
        return name;
    }
    name.strip_prefix("user.").unwrap_or(name)
}
