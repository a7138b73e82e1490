// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for `EosClient` over the CLI backend.
//!
//! A scripted `CommandRunner` stands in for the `eos` binary: each command
//! line (without the `-r uid gid` role switch) maps to a queue of outputs.
//! The last output of a queue repeats; unscripted commands fail with ENOENT.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use eosgate_core::acl::{AclCodec, AclEntry, AclType};
use eosgate_core::attribute::{AttrType, Attribute};
use eosgate_core::auth::Authorization;
use eosgate_core::backend::EosError;
use eosgate_core::config::ClientOptions;
use eosgate_core::infrastructure::eos::binary::{BinaryOptions, EosBinaryBackend};
use eosgate_core::infrastructure::eos::exec::{CommandInvocation, CommandOutput, CommandRunner};
use eosgate_core::infrastructure::identity::StaticIdentityResolver;
use eosgate_core::EosClient;

#[derive(Default)]
struct ScriptedRunner {
    responses: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<CommandInvocation>>,
}

impl ScriptedRunner {
    fn on(&self, command: &str, output: CommandOutput) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(command.to_string())
            .or_default()
            .push_back(output);
        self
    }

    fn commands(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(command_key).collect()
    }

    fn invocation(&self, command: &str) -> Option<CommandInvocation> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|inv| command_key(inv) == command)
            .cloned()
    }
}

fn command_key(invocation: &CommandInvocation) -> String {
    let args = match invocation.args.first().map(String::as_str) {
        Some("-r") => &invocation.args[3..],
        _ => &invocation.args[..],
    };
    args.join(" ")
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &CommandInvocation) -> Result<CommandOutput, EosError> {
        self.calls.lock().unwrap().push(invocation.clone());
        let mut responses = self.responses.lock().unwrap();
        let output = match responses.get_mut(&command_key(invocation)) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(output.unwrap_or_else(|| CommandOutput::failure(2, "error: No such file or directory")))
    }
}

fn file_line(path: &str, ino: u64, fid: u64, extra: &str) -> String {
    format!(
        "keylength.file={} file={} ino={} fid={} uid=1000 gid=100 size=5 mtime=1700000000.5 etag=\"{}:1\" xs=a1b2c3d4 xstype=adler {}",
        path.len(),
        path,
        ino,
        fid,
        fid,
        extra
    )
}

fn dir_line(path: &str, ino: u64, extra: &str) -> String {
    format!(
        "keylength.file={} file={}/ ino={} fid={} uid=1000 gid=100 mtime=1700000000.0 files=1 container=0 treesize=5 {}",
        path.len() + 1,
        path,
        ino,
        ino,
        extra
    )
}

fn ok(stdout: impl Into<String>) -> CommandOutput {
    CommandOutput::success(stdout)
}

fn identities() -> Arc<StaticIdentityResolver> {
    Arc::new(
        StaticIdentityResolver::new()
            .with_user(1000, "alice")
            .with_user(1001, "bob"),
    )
}

fn backend(runner: &Arc<ScriptedRunner>) -> Arc<EosBinaryBackend> {
    let options = BinaryOptions {
        master_url: "root://mgm".to_string(),
        eos_binary: "eos".to_string(),
        ..Default::default()
    };
    Arc::new(EosBinaryBackend::new(options, runner.clone()))
}

fn client(runner: &Arc<ScriptedRunner>, codec: AclCodec, options: ClientOptions) -> EosClient {
    EosClient::new(
        backend(runner),
        identities(),
        codec,
        options,
        Authorization::with_role(0, 0),
    )
}

fn user() -> Authorization {
    Authorization::with_role(1000, 100)
}

const DIR: &str = "/eos/user/a";
const FILE: &str = "/eos/user/a/f.txt";
const FOLDER: &str = "/eos/user/a/.sys.v#.f.txt";

// ============================================================================
// Version invariance
// ============================================================================

#[tokio::test]
async fn test_inode_is_invariant_across_content_change() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(&format!("file info {} -m", FILE), ok(file_line(FILE, 100, 100, "")))
        .on(&format!("file info {} -m", FILE), ok(file_line(FILE, 200, 200, "")))
        .on(&format!("file info {} -m", FOLDER), ok(dir_line(FOLDER, 900, "")))
        .on(&format!("file info {} -m", DIR), ok(dir_line(DIR, 50, "")));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let before = client.get_file_info_by_path(&user(), FILE).await.unwrap();
    let after = client.get_file_info_by_path(&user(), FILE).await.unwrap();

    assert_eq!(before.inode, 900);
    assert_eq!(after.inode, 900);
    assert_ne!(before.fid, after.fid);
    assert!(!before.is_dir);
    assert_eq!(before.checksum.as_ref().map(|c| c.xs_type.as_str()), Some("adler"));
}

#[tokio::test]
async fn test_content_inode_without_version_invariance() {
    let runner = Arc::new(ScriptedRunner::default());
    runner.on(&format!("file info {} -m", FILE), ok(file_line(FILE, 100, 100, "")));
    let options = ClientOptions {
        version_invariant: false,
        ..Default::default()
    };
    let client = client(&runner, AclCodec::Citrine, options);

    let info = client.get_file_info_by_path(&user(), FILE).await.unwrap();
    assert_eq!(info.inode, 100);
    assert!(!runner.commands().iter().any(|c| c.contains(".sys.v#.")));
}

#[tokio::test]
async fn test_missing_version_folder_is_created_as_root_and_handed_to_owner() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(&format!("file info {} -m", FILE), ok(file_line(FILE, 100, 100, "")))
        .on(
            &format!("file info {} -m", FOLDER),
            CommandOutput::failure(2, "error: No such file or directory"),
        )
        .on(&format!("file info {} -m", FOLDER), ok(dir_line(FOLDER, 900, "")))
        .on(&format!("mkdir -p {}", FOLDER), ok(""))
        .on(&format!("chown 1000:100 {}", FOLDER), ok(""));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let info = client.get_file_info_by_path(&user(), FILE).await.unwrap();
    assert_eq!(info.inode, 900);

    let mkdir = runner.invocation(&format!("mkdir -p {}", FOLDER)).unwrap();
    assert_eq!(&mkdir.args[..3], &["-r", "0", "0"]);
    assert!(runner
        .commands()
        .contains(&format!("chown 1000:100 {}", FOLDER)));
}

#[tokio::test]
async fn test_version_folder_created_concurrently_is_reused() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(&format!("file info {} -m", FILE), ok(file_line(FILE, 100, 100, "")))
        .on(
            &format!("file info {} -m", FOLDER),
            CommandOutput::failure(2, "error: No such file or directory"),
        )
        .on(&format!("file info {} -m", FOLDER), ok(dir_line(FOLDER, 900, "")))
        .on(
            &format!("mkdir -p {}", FOLDER),
            CommandOutput::failure(17, "error: File exists"),
        );
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let info = client.get_file_info_by_path(&user(), FILE).await.unwrap();
    assert_eq!(info.inode, 900);
    assert_eq!(info.file, FILE);

    let commands = runner.commands();
    assert!(commands.contains(&format!("mkdir -p {}", FOLDER)));
    assert_eq!(
        commands
            .iter()
            .filter(|c| **c == format!("file info {} -m", FOLDER))
            .count(),
        2
    );
    assert!(!commands.iter().any(|c| c.starts_with("chown")));
}

#[tokio::test]
async fn test_version_folder_creation_failure_fails_stat() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(&format!("file info {} -m", FILE), ok(file_line(FILE, 100, 100, "")))
        .on(
            &format!("mkdir -p {}", FOLDER),
            CommandOutput::failure(1, "error: Operation not permitted"),
        );
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let result = client.get_file_info_by_path(&user(), FILE).await;
    assert!(matches!(result, Err(EosError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_stat_of_version_folder_and_directory_is_untouched() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(&format!("file info {} -m", DIR), ok(dir_line(DIR, 50, "")))
        .on(&format!("file info {} -m", FOLDER), ok(dir_line(FOLDER, 900, "")));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    assert_eq!(client.get_file_info_by_path(&user(), DIR).await.unwrap().inode, 50);
    assert_eq!(client.get_file_info_by_path(&user(), FOLDER).await.unwrap().inode, 900);
    assert!(!runner.commands().iter().any(|c| c.starts_with("mkdir")));
}

#[tokio::test]
async fn test_inode_lookup_resolves_version_folder_to_live_file() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on("file info inode:900 -m", ok(dir_line(FOLDER, 900, "")))
        .on(&format!("file info {} -m", FILE), ok(file_line(FILE, 200, 200, "")))
        .on(&format!("file info {} -m", FOLDER), ok(dir_line(FOLDER, 900, "")));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let info = client.get_file_info_by_inode(&user(), 900).await.unwrap();
    assert_eq!(info.file, FILE);
    assert_eq!(info.inode, 900);
    assert_eq!(info.fid, 200);
    assert!(!info.is_dir);
}

#[tokio::test]
async fn test_listing_substitutes_and_hides_version_folders() {
    let runner = Arc::new(ScriptedRunner::default());
    let g = "/eos/user/a/g.txt";
    let g_folder = "/eos/user/a/.sys.v#.g.txt";
    let listing = [
        dir_line(DIR, 50, "xattrn=sys.acl xattrv=g:99=rx"),
        file_line(FILE, 100, 100, ""),
        dir_line(FOLDER, 900, "xattrn=user.color xattrv=blue"),
        file_line(g, 101, 101, ""),
        dir_line("/eos/user/a/sub", 60, ""),
    ]
    .join("\n");
    runner
        .on(&format!("find --fileinfo --maxdepth 1 {}", DIR), ok(listing))
        .on(&format!("mkdir -p {}", g_folder), ok(""))
        .on(&format!("chown 1000:100 {}", g_folder), ok(""))
        .on(&format!("file info {} -m", g_folder), CommandOutput::failure(2, "no such file"))
        .on(&format!("file info {} -m", g_folder), ok(dir_line(g_folder, 901, "")));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let entries = client.list(&user(), DIR).await.unwrap();
    let names: Vec<&str> = entries.iter().map(|e| e.file.as_str()).collect();
    assert_eq!(names, vec![FILE, g, "/eos/user/a/sub"]);
    assert_eq!(entries[0].inode, 900);
    assert_eq!(entries[0].attrs["color"], "blue");
    assert_eq!(entries[1].inode, 901);
    assert_eq!(entries[0].sys_acl.serialize(), "g:99=rx");
    assert!(entries[2].sys_acl.is_empty());

    // f.txt already had its folder in the listing
    assert!(!runner.commands().contains(&format!("mkdir -p {}", FOLDER)));
}

#[tokio::test]
async fn test_listing_shows_version_folders_when_asked() {
    let runner = Arc::new(ScriptedRunner::default());
    let listing = [
        dir_line(DIR, 50, ""),
        file_line(FILE, 100, 100, ""),
        dir_line(FOLDER, 900, ""),
    ]
    .join("\n");
    runner.on(&format!("find --fileinfo --maxdepth 1 {}", DIR), ok(listing));
    let options = ClientOptions {
        version_invariant: true,
        show_hidden_sys_files: true,
    };
    let client = client(&runner, AclCodec::Citrine, options);

    let entries = client.list(&user(), DIR).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].file, FOLDER);
}

#[tokio::test]
async fn test_listing_tolerates_version_folder_failure() {
    let runner = Arc::new(ScriptedRunner::default());
    let listing = [dir_line(DIR, 50, ""), file_line(FILE, 100, 100, "")].join("\n");
    runner
        .on(&format!("find --fileinfo --maxdepth 1 {}", DIR), ok(listing))
        .on(&format!("mkdir -p {}", FOLDER), CommandOutput::failure(5, "I/O error"));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let entries = client.list(&user(), DIR).await.unwrap();
    assert_eq!(entries[0].inode, 100);
}

#[tokio::test]
async fn test_versions() {
    let runner = Arc::new(ScriptedRunner::default());
    let stored = format!("{}/1700000000.00000064", FOLDER);
    runner
        .on(
            &format!("find --fileinfo --maxdepth 1 {}", FOLDER),
            ok([dir_line(FOLDER, 900, ""), file_line(&stored, 100, 100, "")].join("\n")),
        )
        .on(&format!("file versions {} 1700000000.00000064", FILE), ok(""));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let versions = client.list_versions(&user(), FILE).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].file, stored);

    client
        .rollback_to_version(&user(), FILE, "1700000000.00000064")
        .await
        .unwrap();
    assert!(client.read_version(&user(), FILE, "../../etc").await.is_err());

    let never_versioned = client.list_versions(&user(), "/eos/user/a/new.txt").await.unwrap();
    assert!(never_versioned.is_empty());
}

// ============================================================================
// ACLs
// ============================================================================

#[tokio::test]
async fn test_citrine_acl_uses_uid_qualifiers() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(&format!("file info {} -m", FILE), ok(file_line(FILE, 100, 100, "")))
        .on(&format!("acl --sys u:1000=rwx {}", FILE), ok(""))
        .on(&format!("acl --sys u:1001= {}", FILE), ok(""));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let alice = AclEntry::new(AclType::User, "alice", "rwx");
    client.add_acl(&user(), FILE, None, &alice).await.unwrap();
    let bob = AclEntry::new(AclType::User, "bob", "rx");
    client.remove_acl(&user(), FILE, &bob).await.unwrap();

    let commands = runner.commands();
    assert!(commands.contains(&format!("acl --sys u:1000=rwx {}", FILE)));
    assert!(commands.contains(&format!("acl --sys u:1001= {}", FILE)));
}

#[tokio::test]
async fn test_citrine_acl_on_directory_is_recursive() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(&format!("file info {} -m", DIR), ok(dir_line(DIR, 50, "")))
        .on(&format!("acl --sys --recursive --position 1 egroup:it-dep=rx {}", DIR), ok(""));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let entry = AclEntry::new(AclType::Egroup, "it-dep", "rx");
    client.update_acl(&user(), DIR, Some(1), &entry).await.unwrap();
    assert_eq!(
        runner.commands().last().unwrap(),
        &format!("acl --sys --recursive --position 1 egroup:it-dep=rx {}", DIR)
    );
}

#[tokio::test]
async fn test_citrine_acl_unknown_user_is_rejected() {
    let runner = Arc::new(ScriptedRunner::default());
    runner.on(&format!("file info {} -m", FILE), ok(file_line(FILE, 100, 100, "")));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let entry = AclEntry::new(AclType::User, "mallory", "rwx");
    let result = client.add_acl(&user(), FILE, None, &entry).await;
    assert!(matches!(result, Err(EosError::InvalidArgument(_))));
    assert!(!runner.commands().iter().any(|c| c.starts_with("acl")));
}

#[tokio::test]
async fn test_legacy_acl_rewrites_sys_acl() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(
            &format!("file info {} -m", FILE),
            ok(file_line(FILE, 100, 100, "xattrn=sys.acl xattrv=u:bob:rwx")),
        )
        .on(&format!("attr set sys.acl=u:bob:rwx,u:alice:rw {}", FILE), ok(""))
        .on(&format!("attr rm sys.acl {}", FILE), ok(""));
    let client = client(&runner, AclCodec::Legacy, ClientOptions::default());

    let alice = AclEntry::new(AclType::User, "alice", "rw");
    client.add_acl(&user(), FILE, Some(3), &alice).await.unwrap();
    let bob = AclEntry::new(AclType::User, "bob", "");
    client.remove_acl(&user(), FILE, &bob).await.unwrap();

    let commands = runner.commands();
    assert!(commands.contains(&format!("attr set sys.acl=u:bob:rwx,u:alice:rw {}", FILE)));
    assert!(commands.contains(&format!("attr rm sys.acl {}", FILE)));
    assert!(!commands.iter().any(|c| c.starts_with("acl")));
}

#[tokio::test]
async fn test_legacy_acl_on_directory_is_recursive() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(
            &format!("file info {} -m", DIR),
            ok(dir_line(DIR, 50, "xattrn=sys.acl xattrv=g:it:rx")),
        )
        .on(&format!("attr -r set sys.acl=g:it:rwx {}", DIR), ok(""));
    let client = client(&runner, AclCodec::Legacy, ClientOptions::default());

    let entry = AclEntry::new(AclType::Group, "it", "rwx");
    client.add_acl(&user(), DIR, None, &entry).await.unwrap();
    assert!(runner
        .commands()
        .contains(&format!("attr -r set sys.acl=g:it:rwx {}", DIR)));
}

#[tokio::test]
async fn test_list_and_get_acl_translate_uids() {
    let runner = Arc::new(ScriptedRunner::default());
    runner.on(
        &format!("file info {} -m", DIR),
        ok(dir_line(DIR, 50, "xattrn=sys.acl xattrv=u:1000=rwx,g:99=rx,u:1001=r")),
    );
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let acls = client.list_acls(&user(), DIR).await.unwrap();
    assert_eq!(acls.serialize(), "u:alice=rwx,g:99=rx,u:bob=r");

    let entry = client.get_acl(&user(), DIR, &AclType::User, "bob").await.unwrap();
    assert_eq!(entry.permissions, "r");
    let by_uid = client.get_acl(&user(), DIR, &AclType::User, "1000").await.unwrap();
    assert_eq!(by_uid.qualifier, "alice");

    let missing = client.get_acl(&user(), DIR, &AclType::Group, "100").await;
    assert!(matches!(missing, Err(EosError::NotFound(_))));
}

#[tokio::test]
async fn test_file_inherits_parent_acl_and_tolerates_parent_failure() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(
            &format!("file info {} -m", FILE),
            ok(file_line(FILE, 100, 100, "xattrn=sys.acl xattrv=u:1000=rw")),
        )
        .on(&format!("file info {} -m", DIR), ok(dir_line(DIR, 50, "xattrn=sys.acl xattrv=g:99=rx")))
        .on(&format!("file info {} -m", DIR), CommandOutput::failure(22, "access denied"));
    let options = ClientOptions {
        version_invariant: false,
        ..Default::default()
    };
    let client = client(&runner, AclCodec::Citrine, options);

    let merged = client.get_file_info_by_path(&user(), FILE).await.unwrap();
    assert_eq!(merged.sys_acl.serialize(), "u:1000=rw,g:99=rx");

    let own_only = client.get_file_info_by_path(&user(), FILE).await.unwrap();
    assert_eq!(own_only.sys_acl.serialize(), "u:1000=rw");
}

// ============================================================================
// Attributes
// ============================================================================

#[tokio::test]
async fn test_user_attribute_of_file_lives_on_version_folder() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(&format!("file info {} -m", FILE), ok(file_line(FILE, 100, 100, "")))
        .on(&format!("file info {} -m", FOLDER), ok(dir_line(FOLDER, 900, "")))
        .on(&format!("attr set user.color=blue {}", FOLDER), ok(""))
        .on(&format!("attr set sys.eval.useracl=1 {}", FILE), ok(""))
        .on(&format!("attr get user.color {}", FOLDER), ok("user.color=\"blue\"\n"));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let color = Attribute::new(AttrType::User, "color", "blue");
    client.set_attr(&user(), FILE, &color, false, false).await.unwrap();
    let eval = Attribute::new(AttrType::System, "eval.useracl", "1");
    client.set_attr(&user(), FILE, &eval, false, false).await.unwrap();

    let read = client.get_attr(&user(), FILE, "user.color").await.unwrap();
    assert_eq!(read.val, "blue");

    let commands = runner.commands();
    assert!(commands.contains(&format!("attr set user.color=blue {}", FOLDER)));
    assert!(commands.contains(&format!("attr set sys.eval.useracl=1 {}", FILE)));
}

#[tokio::test]
async fn test_invalid_attributes_never_reach_eos() {
    let runner = Arc::new(ScriptedRunner::default());
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let empty = Attribute::new(AttrType::User, "", "x");
    assert!(matches!(
        client.set_attr(&user(), FILE, &empty, false, false).await,
        Err(EosError::InvalidArgument(_))
    ));
    assert!(matches!(
        client.get_attr(&user(), FILE, "trusted.x").await,
        Err(EosError::InvalidArgument(_))
    ));
    assert!(runner.commands().is_empty());
}

#[tokio::test]
async fn test_get_attrs_merges_version_folder() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(&format!("file info {} -m", FILE), ok(file_line(FILE, 100, 100, "")))
        .on(
            &format!("attr ls {}", FILE),
            ok("sys.eos.btime=\"1700000000.0\"\nuser.color=\"red\"\n"),
        )
        .on(
            &format!("attr ls {}", FOLDER),
            ok("sys.acl=\"u:1=r\"\nuser.color=\"blue\"\nuser.tag=\"x\"\n"),
        );
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let attrs = client.get_attrs(&user(), FILE).await.unwrap();
    let keys: Vec<String> = attrs.iter().map(|a| a.serialize()).collect();
    assert_eq!(
        keys,
        vec!["sys.eos.btime=1700000000.0", "user.color=blue", "user.tag=x"]
    );
}

// ============================================================================
// Quota, recycle bin, connection
// ============================================================================

#[tokio::test]
async fn test_quota_sums_matching_nodes() {
    let runner = Arc::new(ScriptedRunner::default());
    runner.on(
        "quota ls -u bob -m",
        ok("quota=node uid=bob space=/eos/scratch/user/ usedlogicalbytes=100 usedfiles=1 maxlogicalbytes=1000 maxfiles=10\n\
quota=node uid=bob space=/eos/scratch/user/ usedlogicalbytes=50 usedfiles=2 maxlogicalbytes=500 maxfiles=20\n\
quota=node uid=bob space=/eos/project/ usedlogicalbytes=9 usedfiles=9 maxlogicalbytes=9 maxfiles=9\n"),
    );
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let quota = client
        .get_quota(&Authorization::with_role(0, 0), "bob", "/eos/scratch/user/b/bob")
        .await
        .unwrap();
    assert_eq!(quota.used_bytes, 150);
    assert_eq!(quota.available_bytes, 1500);
    assert_eq!(quota.used_inodes, 3);
    assert_eq!(quota.available_inodes, 30);

    let none = client
        .get_quota(&Authorization::with_role(0, 0), "bob", "/eos/other")
        .await
        .unwrap();
    assert_eq!(none.available_bytes, 0);
}

#[tokio::test]
async fn test_recycle_bin() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on(
            "recycle ls -m",
            ok("recycle=ls recycle-bin=/eos/backup/proc/recycle/ uid=bob gid=it size=381038 deletion-time=1510823151 type=file keylength.restore-path=24 restore-path=/eos/scratch/bob/a b.txt restore-key=0000000001\n"),
        )
        .on("recycle restore 0000000001", ok(""))
        .on("recycle purge", ok(""));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    let entries = client.list_deleted_entries(&user()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].restore_path, "/eos/scratch/bob/a b.txt");
    assert_eq!(entries[0].restore_key, "0000000001");
    assert_eq!(entries[0].size, 381038);
    assert_eq!(entries[0].deletion_mtime, 1510823151);
    assert!(!entries[0].is_dir);

    client.restore_deleted_entry(&user(), "0000000001").await.unwrap();
    client.purge_deleted_entries(&user()).await.unwrap();
    assert!(client.restore_deleted_entry(&user(), "").await.is_err());
}

#[tokio::test]
async fn test_connect_detects_acl_codec() {
    let citrine = Arc::new(ScriptedRunner::default());
    citrine.on("version", ok("EOS_INSTANCE=eosdev\nEOS_SERVER_VERSION=4.8.26 EOS_SERVER_RELEASE=1\n"));
    let client = EosClient::connect(
        backend(&citrine),
        identities(),
        ClientOptions::default(),
        Authorization::with_role(0, 0),
        None,
    )
    .await
    .unwrap();
    assert_eq!(client.codec(), AclCodec::Citrine);

    let legacy = Arc::new(ScriptedRunner::default());
    legacy.on("version", ok("EOS_SERVER_VERSION=0.3.268 EOS_SERVER_RELEASE=1\n"));
    let client = EosClient::connect(
        backend(&legacy),
        identities(),
        ClientOptions::default(),
        Authorization::with_role(0, 0),
        None,
    )
    .await
    .unwrap();
    assert_eq!(client.codec(), AclCodec::Legacy);
}

#[tokio::test]
async fn test_connect_with_forced_codec_skips_version_probe() {
    let runner = Arc::new(ScriptedRunner::default());
    let client = EosClient::connect(
        backend(&runner),
        identities(),
        ClientOptions::default(),
        Authorization::with_role(0, 0),
        Some(AclCodec::Legacy),
    )
    .await
    .unwrap();
    assert_eq!(client.codec(), AclCodec::Legacy);
    assert!(runner.commands().is_empty());
}

#[tokio::test]
async fn test_namespace_operations() {
    let runner = Arc::new(ScriptedRunner::default());
    runner
        .on("mkdir -p /eos/user/a/new", ok(""))
        .on("rm -r --no-recycle-bin /eos/user/a/new", ok(""))
        .on("file rename /eos/user/a/x /eos/user/a/y", ok(""))
        .on("chmod 750 /eos/user/a/y", ok(""))
        .on("file touch /eos/user/a/z", CommandOutput::failure(17, "exists"));
    let client = client(&runner, AclCodec::Citrine, ClientOptions::default());

    client.create_dir(&user(), "/eos/user/a//new/").await.unwrap();
    client.remove(&user(), "/eos/user/a/new", true, true).await.unwrap();
    client.rename(&user(), "/eos/user/a/x", "/eos/user/a/y").await.unwrap();
    client.chmod(&user(), "/eos/user/a/y", 0o750).await.unwrap();
    assert!(matches!(
        client.touch(&user(), "/eos/user/a/z").await,
        Err(EosError::AlreadyExists(_))
    ));
    assert!(client.remove(&user(), "/", true, false).await.is_err());
}
