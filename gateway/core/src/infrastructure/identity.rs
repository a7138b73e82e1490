// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Identity resolvers
//!
//! [`SystemIdentityResolver`] reads the host passwd database (NSS, so LDAP
//! or SSSD backed accounts resolve too). [`StaticIdentityResolver`] serves a
//! fixed table for tests and for gateways without the EOS accounts locally.

use std::collections::HashMap;

use crate::domain::identity::{IdentityError, IdentityResolver};

/// Resolver backed by `getpwuid_r` / `getpwnam_r`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentityResolver;

impl SystemIdentityResolver {
    pub fn new() -> Self {
        Self
    }
}

impl IdentityResolver for SystemIdentityResolver {
    fn username_for_uid(&self, uid: u64) -> Result<String, IdentityError> {
        passwd::name_by_uid(uid)
    }

    fn uid_for_username(&self, username: &str) -> Result<u64, IdentityError> {
        passwd::uid_by_name(username)
    }
}

#[cfg(unix)]
mod passwd {
    use std::ffi::{CStr, CString};

    use crate::domain::identity::IdentityError;

    const INITIAL_BUFFER: usize = 1024;
    const MAX_BUFFER: usize = 1 << 20;

    /// Run a reentrant passwd lookup, growing the scratch buffer on ERANGE.
    ///
    /// `lookup` fills `pwd` and sets `result` to it on a hit, or leaves
    /// `result` null when there is no such account.
    fn with_passwd<T>(
        mut lookup: impl FnMut(
            &mut libc::passwd,
            &mut [libc::c_char],
            &mut *mut libc::passwd,
        ) -> libc::c_int,
        extract: impl FnOnce(&libc::passwd) -> T,
    ) -> Result<Option<T>, IdentityError> {
        let mut buf: Vec<libc::c_char> = vec![0; INITIAL_BUFFER];
        loop {
            // SAFETY: passwd is a plain C struct; all-zero is a valid value
            let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::passwd = std::ptr::null_mut();
            let rc = lookup(&mut pwd, &mut buf, &mut result);

            if rc == libc::ERANGE && buf.len() < MAX_BUFFER {
                buf.resize(buf.len() * 2, 0);
                continue;
            }
            if rc != 0 {
                return Err(IdentityError::Lookup(
                    std::io::Error::from_raw_os_error(rc).to_string(),
                ));
            }
            if result.is_null() {
                return Ok(None);
            }
            return Ok(Some(extract(&pwd)));
        }
    }

    pub fn name_by_uid(uid: u64) -> Result<String, IdentityError> {
        let raw_uid = libc::uid_t::try_from(uid).map_err(|_| IdentityError::UnknownUid(uid))?;
        let found = with_passwd(
            |pwd, buf, result| {
                // SAFETY: every pointer refers to a live, correctly sized buffer
                unsafe { libc::getpwuid_r(raw_uid, pwd, buf.as_mut_ptr(), buf.len(), result) }
            },
            // SAFETY: pw_name points into `buf`, which outlives this closure
            |pwd| unsafe { CStr::from_ptr(pwd.pw_name) }.to_string_lossy().into_owned(),
        )?;
        found.ok_or(IdentityError::UnknownUid(uid))
    }

    pub fn uid_by_name(username: &str) -> Result<u64, IdentityError> {
        let name = CString::new(username)
            .map_err(|_| IdentityError::UnknownUser(username.to_string()))?;
        let found = with_passwd(
            |pwd, buf, result| {
                // SAFETY: every pointer refers to a live, correctly sized buffer
                unsafe { libc::getpwnam_r(name.as_ptr(), pwd, buf.as_mut_ptr(), buf.len(), result) }
            },
            |pwd| u64::from(pwd.pw_uid),
        )?;
        found.ok_or_else(|| IdentityError::UnknownUser(username.to_string()))
    }
}

#[cfg(not(unix))]
mod passwd {
    use crate::domain::identity::IdentityError;

    pub fn name_by_uid(_uid: u64) -> Result<String, IdentityError> {
        Err(IdentityError::Lookup("passwd lookups require a unix host".to_string()))
    }

    pub fn uid_by_name(_username: &str) -> Result<u64, IdentityError> {
        Err(IdentityError::Lookup("passwd lookups require a unix host".to_string()))
    }
}

/// Fixed uid ↔ username table
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    by_uid: HashMap<u64, String>,
    by_name: HashMap<String, u64>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, uid: u64, username: impl Into<String>) -> Self {
        let username = username.into();
        self.by_name.insert(username.clone(), uid);
        self.by_uid.insert(uid, username);
        self
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn username_for_uid(&self, uid: u64) -> Result<String, IdentityError> {
        self.by_uid
            .get(&uid)
            .cloned()
            .ok_or(IdentityError::UnknownUid(uid))
    }

    fn uid_for_username(&self, username: &str) -> Result<u64, IdentityError> {
        self.by_name
            .get(username)
            .copied()
            .ok_or_else(|| IdentityError::UnknownUser(username.to_string()))
    }
}
