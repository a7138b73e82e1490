// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Terminal rendering of namespace records

use anyhow::Result;
use chrono::DateTime;
use colored::Colorize;
use serde::Serialize;

use eosgate_core::file_info::FileInfo;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `YYYY-MM-DD HH:MM:SS` in UTC, or the raw seconds if out of range
pub fn format_mtime(sec: u64, nanos: u32) -> String {
    i64::try_from(sec)
        .ok()
        .and_then(|sec| DateTime::from_timestamp(sec, nanos))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| sec.to_string())
}

pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "K", "M", "G", "T", "P"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}{}", bytes, UNITS[0])
    } else {
        format!("{:.1}{}", size, UNITS[unit])
    }
}

pub fn print_file_info(info: &FileInfo) {
    let kind = if info.is_dir { "directory" } else { "file" };
    println!("{} {}", info.file.bold(), format!("({})", kind).dimmed());
    println!("  Inode:    {}", info.inode);
    println!("  Fid:      {} (fxid {:08x})", info.fid, info.fid);
    println!("  Owner:    {}:{}", info.uid, info.gid);
    if info.is_dir {
        println!("  Tree:     {} in {} entries", human_size(info.tree_size), info.tree_count);
    } else {
        println!("  Size:     {} ({} bytes)", human_size(info.size), info.size);
    }
    println!("  Modified: {}", format_mtime(info.mtime_sec, info.mtime_nanos));
    println!("  ETag:     {}", info.etag);
    if let Some(xs) = &info.checksum {
        println!("  Checksum: {}:{}", xs.xs_type, xs.xs_sum);
    }
    if !info.sys_acl.is_empty() {
        println!("  ACL:      {}", info.sys_acl.serialize());
    }
    if !info.attrs.is_empty() {
        println!("  Attributes:");
        let mut keys: Vec<&String> = info.attrs.keys().collect();
        keys.sort();
        for key in keys {
            println!("    {} = {}", key, info.attrs[key]);
        }
    }
}

pub fn print_listing(entries: &[FileInfo]) {
    if entries.is_empty() {
        println!("{}", "(empty)".dimmed());
        return;
    }
    println!("{:<20} {:>9} {:<11} {:<19} {}", "INODE", "SIZE", "OWNER", "MODIFIED", "NAME");
    for info in entries {
        let (size, name) = if info.is_dir {
            (human_size(info.tree_size), format!("{}/", info.name()).blue().bold())
        } else {
            (human_size(info.size), info.name().normal())
        };
        println!(
            "{:<20} {:>9} {:<11} {:<19} {}",
            info.inode,
            size,
            format!("{}:{}", info.uid, info.gid),
            format_mtime(info.mtime_sec, info.mtime_nanos),
            name
        );
    }
}
