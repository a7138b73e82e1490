// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! EOS Monitoring-Format Parsers
//!
//! `eos ... -m` prints one record per line as space-separated `key=value`
//! tokens. Two fields break naive tokenizing and are handled by anchor:
//!
//! - `file=` may contain spaces, so `file info`/`find --fileinfo` lines start
//!   with `keylength.file=<L>` and the path is exactly `L` bytes
//! - `restore-path=` in `recycle ls` lines, located between the fixed leading
//!   fields and the trailing `restore-key=`
//!
//! Extended attributes appear as an `xattrn=<name>` token immediately followed
//! by `xattrv=<value>`.

use std::collections::HashMap;

use crate::domain::acl::Acls;
use crate::domain::attribute::{normalize_xattr_name, Attribute};
use crate::domain::backend::{EosError, ServerVersion};
use crate::domain::file_info::{Checksum, FileInfo};
use crate::domain::quota::{QuotaInfo, QuotaNode};
use crate::domain::recycle::DeletedEntry;

const FILE_LENGTH_MARKER: &str = "keylength.file=";
const FILE_KEY: &str = " file=";
const RESTORE_PATH_KEY: &str = " restore-path=";
const RESTORE_KEY_KEY: &str = " restore-key=";
const RECYCLE_FIXED_FIELDS: usize = 8;

/// Parse one `file info -m` / `find --fileinfo` line
pub fn parse_file_info(raw: &str, instance: &str) -> Result<FileInfo, EosError> {
    let line = raw.trim_end_matches(['\r', '\n']);
    let rest = line.strip_prefix(FILE_LENGTH_MARKER).ok_or_else(|| {
        EosError::Internal(format!("monitoring line lacks '{}': {}", FILE_LENGTH_MARKER, line))
    })?;

    let key_idx = rest
        .find(FILE_KEY)
        .ok_or_else(|| EosError::Internal(format!("monitoring line lacks 'file=': {}", line)))?;
    let length: usize = rest[..key_idx]
        .parse()
        .map_err(|_| EosError::Internal(format!("bad keylength.file '{}'", &rest[..key_idx])))?;

    let path_start = key_idx + FILE_KEY.len();
    let path_end = path_start.checked_add(length).ok_or_else(|| {
        EosError::Internal(format!("keylength.file={} overruns the line: {}", length, line))
    })?;
    let raw_path = rest.get(path_start..path_end).ok_or_else(|| {
        EosError::Internal(format!("keylength.file={} overruns the line: {}", length, line))
    })?;
    let file = match raw_path.strip_suffix('/') {
        Some("") | None => raw_path.to_string(),
        Some(stripped) => stripped.to_string(),
    };

    let (kv, attrs) = tokenize(&rest[path_end..]);
    build_file_info(file, &kv, attrs, instance)
}

/// Parse the output of `find --fileinfo`; one record per non-empty line
pub fn parse_find(output: &str, instance: &str) -> Result<Vec<FileInfo>, EosError> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| parse_file_info(l, instance))
        .collect()
}

/// Split the tail of a fileinfo line into plain pairs and xattrs.
fn tokenize(tail: &str) -> (HashMap<String, String>, HashMap<String, String>) {
    let mut kv = HashMap::new();
    let mut attrs = HashMap::new();
    let mut pending: Option<&str> = None;

    for token in tail.split(' ').filter(|t| !t.is_empty()) {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        match key {
            "xattrn" => {
                if let Some(orphan) = pending.replace(value) {
                    tracing::debug!(xattr = %orphan, "xattrn without value, dropped");
                }
            }
            "xattrv" => match pending.take() {
                Some(name) => {
                    attrs.insert(normalize_xattr_name(name).to_string(), value.to_string());
                }
                None => tracing::debug!("xattrv without name, dropped"),
            },
            _ => {
                if let Some(orphan) = pending.take() {
                    tracing::debug!(xattr = %orphan, "xattrn without value, dropped");
                }
                kv.insert(key.to_string(), value.to_string());
            }
        }
    }
    (kv, attrs)
}

fn build_file_info(
    file: String,
    kv: &HashMap<String, String>,
    attrs: HashMap<String, String>,
    instance: &str,
) -> Result<FileInfo, EosError> {
    let inode = required_u64(kv, "ino")?;
    let fid = required_u64(kv, "fid")?;
    let uid = required_u64(kv, "uid")?;
    let gid = required_u64(kv, "gid")?;

    let (mtime_sec, mtime_nanos) = match kv.get("stime").and_then(|s| parse_timespec(s).ok()) {
        Some(ts) => ts,
        None => {
            let mtime = kv
                .get("mtime")
                .ok_or_else(|| EosError::Internal(format!("missing mtime for {}", file)))?;
            parse_timespec(mtime)?
        }
    };

    let is_dir = kv.contains_key("files");
    let (size, tree_size, tree_count, checksum) = if is_dir {
        let files = optional_u64(kv, "files")?;
        let containers = optional_u64(kv, "container")?;
        (
            0,
            optional_u64(kv, "treesize")?,
            files.saturating_add(containers),
            None,
        )
    } else {
        let checksum = kv.get("xs").map(|xs| Checksum {
            xs_sum: xs.clone(),
            xs_type: kv.get("xstype").cloned().unwrap_or_default(),
        });
        (optional_u64(kv, "size")?, 0, 0, checksum)
    };

    let sys_acl = Acls::from_xattrs(&attrs);

    Ok(FileInfo {
        inode,
        fid,
        uid,
        gid,
        size,
        tree_size,
        tree_count,
        mtime_sec,
        mtime_nanos,
        etag: kv.get("etag").cloned().unwrap_or_default(),
        is_dir,
        file,
        instance: instance.to_string(),
        checksum,
        sys_acl,
        attrs,
    })
}

fn required_u64(kv: &HashMap<String, String>, key: &str) -> Result<u64, EosError> {
    let raw = kv
        .get(key)
        .ok_or_else(|| EosError::Internal(format!("missing required field '{}'", key)))?;
    raw.parse()
        .map_err(|_| EosError::Internal(format!("field '{}' is not an unsigned integer: '{}'", key, raw)))
}

fn optional_u64(kv: &HashMap<String, String>, key: &str) -> Result<u64, EosError> {
    match kv.get(key) {
        Some(raw) => raw.parse().map_err(|_| {
            EosError::Internal(format!("field '{}' is not an unsigned integer: '{}'", key, raw))
        }),
        None => Ok(0),
    }
}

/// `seconds.nanoseconds` (nanoseconds optional)
fn parse_timespec(raw: &str) -> Result<(u64, u32), EosError> {
    let bad = || EosError::Internal(format!("malformed timestamp '{}'", raw));
    let (sec, nanos) = raw.split_once('.').unwrap_or((raw, "0"));
    let sec = sec.parse().map_err(|_| bad())?;
    let nanos = if nanos.is_empty() { 0 } else { nanos.parse().map_err(|_| bad())? };
    Ok((sec, nanos))
}

/// Flat `key=value` map of one monitoring line
fn parse_pairs(line: &str) -> HashMap<&str, &str> {
    line.split_whitespace()
        .filter_map(|t| t.split_once('='))
        .collect()
}

/// Parse `quota ls -u <user> -m` into quota nodes
pub fn parse_quota_nodes(output: &str) -> Vec<QuotaNode> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let kv = parse_pairs(line);
            let space = kv.get("space")?;
            let number = |key: &str| kv.get(key).and_then(|v| v.parse().ok()).unwrap_or(0);
            Some(QuotaNode {
                space: space.to_string(),
                max_logical_bytes: number("maxlogicalbytes"),
                used_logical_bytes: number("usedlogicalbytes"),
                max_files: number("maxfiles"),
                used_files: number("usedfiles"),
            })
        })
        .collect()
}

/// Aggregate quota of `path` from `quota ls -m` output
pub fn parse_quota(path: &str, output: &str) -> QuotaInfo {
    QuotaInfo::aggregate(path, &parse_quota_nodes(output))
}

/// Parse `recycle ls -m`; any malformed line fails the whole listing
pub fn parse_recycle_list(output: &str) -> Result<Vec<DeletedEntry>, EosError> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(parse_recycle_entry)
        .collect()
}

/// Parse one `recycle ls -m` line.
///
/// The eight leading fields are whitespace-separated; `restore-key=` is the
/// last token; the path is everything between `restore-path=` and it.
pub fn parse_recycle_entry(line: &str) -> Result<DeletedEntry, EosError> {
    let bad = |why: &str| EosError::Internal(format!("malformed recycle line ({}): {}", why, line));
    let line = line.trim();

    let path_idx = line.find(RESTORE_PATH_KEY).ok_or_else(|| bad("no restore-path"))?;
    let key_idx = line.rfind(RESTORE_KEY_KEY).ok_or_else(|| bad("no restore-key"))?;
    let path_start = path_idx + RESTORE_PATH_KEY.len();
    if key_idx < path_start {
        return Err(bad("restore-key before restore-path"));
    }

    let head = &line[..path_idx];
    if head.split_whitespace().count() != RECYCLE_FIXED_FIELDS {
        return Err(bad("unexpected field count"));
    }
    let kv = parse_pairs(head);

    let restore_path = line[path_start..key_idx].to_string();
    let restore_key = line[key_idx + RESTORE_KEY_KEY.len()..].trim().to_string();
    if restore_path.is_empty() || restore_key.is_empty() {
        return Err(bad("empty restore-path or restore-key"));
    }

    let size = kv
        .get("size")
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| bad("size"))?;
    let deletion_mtime = kv
        .get("deletion-time")
        .and_then(|v| v.split('.').next())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| bad("deletion-time"))?;
    let is_dir = match kv.get("type") {
        Some(&"recursive-dir") => true,
        Some(_) => false,
        None => return Err(bad("type")),
    };

    Ok(DeletedEntry {
        restore_path,
        restore_key,
        size,
        deletion_mtime,
        is_dir,
    })
}

/// Extract `EOS_SERVER_VERSION` from `eos version` output
pub fn parse_server_version(output: &str) -> Result<ServerVersion, EosError> {
    output
        .split_whitespace()
        .find_map(|token| token.strip_prefix("EOS_SERVER_VERSION="))
        .filter(|v| !v.is_empty())
        .map(ServerVersion::new)
        .ok_or_else(|| EosError::Internal("EOS_SERVER_VERSION missing from version output".to_string()))
}

/// Parse `attr ls` output; lines outside the `sys`/`user` namespaces are skipped
pub fn parse_attr_listing(output: &str) -> Vec<Attribute> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| match Attribute::deserialize(line) {
            Ok(attr) => Some(attr),
            Err(e) => {
                tracing::debug!(line = %line, error = %e, "skipping attribute line");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::acl::AclType;

    fn line(path: &str, rest: &str) -> String {
        format!("keylength.file={} file={} {}", path.len(), path, rest)
    }

    const FILE_FIELDS: &str = "size=381038 mtime=1510823151.123456789 ctime=1510823151.0 mode=0644 uid=1000 gid=100 fxid=0000abcd fid=43981 ino=11806539448320 pid=100 xstype=adler xs=aabbccdd etag=\"11806539448320:aabbccdd\" xattrn=sys.eos.btime xattrv=1510823151.0 xattrn=user.color xattrv=blue";

    #[test]
    fn test_parse_file() {
        let info = parse_file_info(&line("/eos/user/b/bob/a b.txt", FILE_FIELDS), "root://mgm").unwrap();
        assert_eq!(info.file, "/eos/user/b/bob/a b.txt");
        assert!(!info.is_dir);
        assert_eq!(info.inode, 11806539448320);
        assert_eq!(info.fid, 43981);
        assert_eq!(info.uid, 1000);
        assert_eq!(info.gid, 100);
        assert_eq!(info.size, 381038);
        assert_eq!(info.mtime_sec, 1510823151);
        assert_eq!(info.mtime_nanos, 123456789);
        assert_eq!(info.etag, "\"11806539448320:aabbccdd\"");
        assert_eq!(info.instance, "root://mgm");
        assert_eq!(
            info.checksum,
            Some(Checksum {
                xs_sum: "aabbccdd".to_string(),
                xs_type: "adler".to_string()
            })
        );
        assert_eq!(info.attrs.get("color").map(String::as_str), Some("blue"));
        assert_eq!(info.attrs.get("sys.eos.btime").map(String::as_str), Some("1510823151.0"));
    }

    #[test]
    fn test_parse_directory() {
        let raw = line(
            "/eos/user/b/bob/",
            "mtime=1.0 stime=1510823999.5 uid=1000 gid=100 fid=7 ino=7 treesize=4096 files=3 container=2 etag=7:0 xattrn=sys.acl xattrv=u:1000=rwx,egroup:it=rx",
        );
        let info = parse_file_info(&raw, "").unwrap();
        assert!(info.is_dir);
        assert_eq!(info.file, "/eos/user/b/bob");
        assert_eq!(info.size, 0);
        assert_eq!(info.tree_size, 4096);
        assert_eq!(info.tree_count, 5);
        assert_eq!(info.mtime_sec, 1510823999);
        assert_eq!(info.mtime_nanos, 5);
        assert!(info.checksum.is_none());
        assert_eq!(info.sys_acl.len(), 2);
        assert_eq!(
            info.sys_acl.get_entry(&AclType::Egroup, "it").unwrap().permissions,
            "rx"
        );
    }

    #[test]
    fn test_files_key_decides_is_dir() {
        let base = "mtime=1.0 uid=1 gid=1 fid=1 ino=1";
        let dir = parse_file_info(&line("/d", &format!("{} files=0", base)), "").unwrap();
        let file = parse_file_info(&line("/f", base), "").unwrap();
        assert!(dir.is_dir);
        assert!(!file.is_dir);
        assert_eq!(dir.tree_size, 0);
    }

    #[test]
    fn test_unparseable_stime_falls_back_to_mtime() {
        let raw = line("/f", "stime=bogus mtime=42.1 uid=1 gid=1 fid=1 ino=1");
        let info = parse_file_info(&raw, "").unwrap();
        assert_eq!((info.mtime_sec, info.mtime_nanos), (42, 1));
    }

    #[test]
    fn test_orphan_xattrn_does_not_leak() {
        let raw = line(
            "/f",
            "xattrn=user.lost uid=1 xattrv=stray gid=1 fid=1 ino=1 mtime=1.0 xattrn=user.kept xattrv=yes xattrn=user.tail",
        );
        let info = parse_file_info(&raw, "").unwrap();
        assert_eq!(info.attrs.len(), 1);
        assert_eq!(info.attrs.get("kept").map(String::as_str), Some("yes"));
        assert!(!info.attrs.contains_key("lost"));
        assert!(!info.attrs.contains_key("tail"));
    }

    #[test]
    fn test_user_acl_keeps_prefix_and_is_evaluated() {
        let raw = line(
            "/d",
            "mtime=1.0 uid=1 gid=1 fid=1 ino=1 files=0 xattrn=sys.acl xattrv=u:100=rwx xattrn=sys.eval.useracl xattrv=1 xattrn=user.acl xattrv=u:200=r",
        );
        let info = parse_file_info(&raw, "").unwrap();
        assert!(info.attrs.contains_key("user.acl"));
        assert_eq!(info.sys_acl.serialize(), "u:100=rwx,u:200=r");
    }

    #[test]
    fn test_required_field_failure_is_fatal() {
        let missing_ino = line("/f", "mtime=1.0 uid=1 gid=1 fid=1");
        assert!(matches!(parse_file_info(&missing_ino, ""), Err(EosError::Internal(_))));

        let bad_uid = line("/f", "mtime=1.0 uid=abc gid=1 fid=1 ino=1");
        assert!(parse_file_info(&bad_uid, "").is_err());

        let bad_mtime = line("/f", "mtime=x.y uid=1 gid=1 fid=1 ino=1");
        assert!(parse_file_info(&bad_mtime, "").is_err());

        let bad_files = line("/d", "mtime=1.0 uid=1 gid=1 fid=1 ino=1 files=many");
        assert!(parse_file_info(&bad_files, "").is_err());
    }

    #[test]
    fn test_malformed_prefix() {
        assert!(parse_file_info("file=/x ino=1", "").is_err());
        assert!(parse_file_info("keylength.file=99 file=/short ino=1", "").is_err());
        assert!(parse_file_info("keylength.file=abc file=/x ino=1", "").is_err());
        assert!(matches!(
            parse_file_info("keylength.file=18446744073709551615 file=/x ino=1", ""),
            Err(EosError::Internal(_))
        ));
    }

    #[test]
    fn test_root_keeps_its_slash() {
        let raw = line("/", "mtime=1.0 uid=0 gid=0 fid=1 ino=1 files=4 container=1");
        let info = parse_file_info(&raw, "").unwrap();
        assert!(info.is_dir);
        assert_eq!(info.file, "/");
        assert_eq!(info.name(), "/");
    }

    #[test]
    fn test_parse_find() {
        let output = format!(
            "{}\n{}\n\n",
            line("/eos/d/", "mtime=1.0 uid=1 gid=1 fid=1 ino=1 files=1 container=0"),
            line("/eos/d/f", "mtime=1.0 uid=1 gid=1 fid=2 ino=2 size=3"),
        );
        let infos = parse_find(&output, "").unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].file, "/eos/d/f");
    }

    #[test]
    fn test_quota_sums_matching_rows() {
        let output = "quota=node uid=bob space=/eos/scratch/user/ usedbytes=0 usedlogicalbytes=100 usedfiles=1 maxbytes=0 maxlogicalbytes=1000 maxfiles=10 percentageusedbytes=0 statusbytes=ok statusfiles=ok\n\
quota=node uid=bob space=/eos/scratch/user/ usedlogicalbytes=50 usedfiles=2 maxlogicalbytes=500 maxfiles=20\n\
quota=node uid=bob space=/eos/project/ usedlogicalbytes=9 usedfiles=9 maxlogicalbytes=9 maxfiles=9\n";
        let quota = parse_quota("/eos/scratch/user/b/bob", output);
        assert_eq!(quota.used_bytes, 150);
        assert_eq!(quota.available_bytes, 1500);
        assert_eq!(quota.used_inodes, 3);
        assert_eq!(quota.available_inodes, 30);
    }

    #[test]
    fn test_quota_unparseable_is_zero_and_no_match_is_empty() {
        let output = "space=/eos/a/ usedlogicalbytes=lots maxlogicalbytes=10\n";
        assert_eq!(parse_quota("/eos/a/x", output).used_bytes, 0);
        assert_eq!(parse_quota("/eos/a/x", output).available_bytes, 10);
        assert_eq!(parse_quota("/eos/b", output), QuotaInfo::default());
    }

    #[test]
    fn test_recycle_embedded_space() {
        let line = "recycle=ls recycle-bin=/eos/backup/proc/recycle/ uid=bob gid=it size=381038 deletion-time=1510823151 type=file keylength.restore-path=20 restore-path=/eos/scratch/bob/a b.txt restore-key=0000000001";
        let entry = parse_recycle_entry(line).unwrap();
        assert_eq!(entry.restore_path, "/eos/scratch/bob/a b.txt");
        assert_eq!(entry.restore_key, "0000000001");
        assert_eq!(entry.size, 381038);
        assert_eq!(entry.deletion_mtime, 1510823151);
        assert!(!entry.is_dir);
    }

    #[test]
    fn test_recycle_dir_with_equals_and_fraction() {
        let line = "recycle=ls recycle-bin=/eos/recycle/ uid=1000 gid=100 size=0 deletion-time=1510823151.982 type=recursive-dir keylength.restore-path=17 restore-path=/eos/a=b/x  y.d restore-key=00000000000abc";
        let entry = parse_recycle_entry(line).unwrap();
        assert_eq!(entry.restore_path, "/eos/a=b/x  y.d");
        assert!(entry.is_dir);
        assert_eq!(entry.deletion_mtime, 1510823151);
    }

    #[test]
    fn test_recycle_bad_line_aborts_list() {
        let good = "recycle=ls recycle-bin=/r/ uid=1 gid=1 size=1 deletion-time=1 type=file keylength.restore-path=2 restore-path=/a restore-key=1";
        let output = format!("{}\nrecycle=ls size=oops restore-path=/b restore-key=2\n", good);
        assert!(parse_recycle_list(&format!("{}\n", good)).unwrap().len() == 1);
        assert!(matches!(parse_recycle_list(&output), Err(EosError::Internal(_))));
    }

    #[test]
    fn test_server_version() {
        let out = "EOS_INSTANCE=eosdev\nEOS_SERVER_VERSION=4.8.26 EOS_SERVER_RELEASE=1\nEOS_CLIENT_VERSION=4.8.26\n";
        let version = parse_server_version(out).unwrap();
        assert_eq!(version.0, "4.8.26");
        assert!(version.is_citrine());
        assert!(parse_server_version("nothing here").is_err());
    }

    #[test]
    fn test_attr_listing() {
        let out = "sys.acl=\"u:1000=rwx\"\nuser.color=\"blue\"\ntrusted.odd=\"x\"\n";
        let attrs = parse_attr_listing(out);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[1].full_key(), "user.color");
    }
}
