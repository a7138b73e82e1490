// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! EOS gRPC Backend
//!
//! Implements [`EosBackend`] on top of the MGM gRPC service. Metadata comes
//! from the streaming `MD`/`Find` calls, mutations go through `Exec`, and
//! file contents through the XrdHTTP client since the namespace service
//! carries no data.
//!
//! # Negative lookups
//!
//! An `MD` stream that ends without a message is a legitimate "not found".
//! A stream that fails with a status is reported by that status (transport
//! failures stay transport failures).

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tonic::transport::Channel;

use super::http::EosHttpClient;
use super::proto::{
    eos_client::EosClient as EosRpcClient, ns_request, ns_response, ContainerMdProto, FileMdProto,
    FindRequest, MdId, MdRequest, MdResponse, NsRequest, NsResponse, PingRequest, RoleId, Type,
};
use crate::domain::acl::Acls;
use crate::domain::attribute::{normalize_xattr_name, Attribute};
use crate::domain::auth::{Authorization, Role};
use crate::domain::backend::{EosBackend, EosError, ServerVersion};
use crate::domain::file_info::{Checksum, FileInfo};
use crate::domain::quota::{QuotaInfo, QuotaNode, SetQuotaInfo};
use crate::domain::recycle::DeletedEntry;

/// The MGM gRPC service only exists from the Citrine series on
const GRPC_SERVER_SERIES: &str = "4.0";

/// Settings of the gRPC backend
#[derive(Debug, Clone)]
pub struct GrpcOptions {
    /// `http://host:port` of the MGM gRPC endpoint
    pub uri: String,
    /// Shared secret configured on the MGM
    pub authkey: Option<String>,
    pub timeout: Duration,
    /// Reported as `FileInfo::instance`
    pub instance: String,
}

/// MGM gRPC adapter
pub struct EosGrpcBackend {
    client: EosRpcClient<Channel>,
    http: Option<Arc<EosHttpClient>>,
    options: GrpcOptions,
}

impl EosGrpcBackend {
    /// Create the backend; the channel connects on first use.
    pub fn new(options: GrpcOptions, http: Option<Arc<EosHttpClient>>) -> Result<Self, EosError> {
        let uri = if options.uri.contains("://") {
            options.uri.clone()
        } else {
            format!("http://{}", options.uri)
        };
        let endpoint = Channel::from_shared(uri)
            .map_err(|e| EosError::InvalidArgument(format!("invalid gRPC uri '{}': {}", options.uri, e)))?
            .timeout(options.timeout);

        Ok(Self {
            client: EosRpcClient::new(endpoint.connect_lazy()),
            http,
            options,
        })
    }

    fn authkey(&self) -> String {
        self.options.authkey.clone().unwrap_or_default()
    }

    fn request<T>(&self, auth: &Authorization, message: T) -> Result<tonic::Request<T>, EosError> {
        let mut request = tonic::Request::new(message);
        if let Some(token) = auth.bearer() {
            let value = tonic::metadata::MetadataValue::try_from(token)
                .map_err(|_| EosError::InvalidArgument("authorization token is not valid ASCII".to_string()))?;
            request.metadata_mut().insert("authz", value);
        }
        Ok(request)
    }

    fn http(&self) -> Result<&EosHttpClient, EosError> {
        self.http.as_deref().ok_or_else(|| {
            EosError::NotSupported("file transfer requires an EOS HTTP endpoint (http.url)".to_string())
        })
    }

    async fn md(&self, auth: &Authorization, id: MdId, what: &str) -> Result<MdResponse, EosError> {
        let request = self.request(
            auth,
            MdRequest {
                md_type: Type::Stat as i32,
                id: Some(id),
                authkey: self.authkey(),
                role: role_id(auth),
            },
        )?;

        tracing::debug!(target_id = %what, "grpc MD");
        let mut stream = self.client.clone().md(request).await?.into_inner();
        match stream.message().await? {
            Some(response) => Ok(response),
            None => Err(EosError::NotFound(what.to_string())),
        }
    }

    async fn exec(&self, auth: &Authorization, command: ns_request::Command) -> Result<NsResponse, EosError> {
        let request = self.request(
            auth,
            NsRequest {
                authkey: self.authkey(),
                role: role_id(auth),
                command: Some(command),
            },
        )?;
        let response = self.client.clone().exec(request).await?.into_inner();
        check_ns_response(&response)?;
        Ok(response)
    }

    async fn raw_xattrs(&self, auth: &Authorization, path: &str) -> Result<HashMap<String, Vec<u8>>, EosError> {
        let response = self.md(auth, path_id(path), path).await?;
        let is_container = response.md_type == Type::Container as i32;
        match (response.fmd, response.cmd) {
            (_, Some(cmd)) if is_container => Ok(cmd.xattrs),
            (Some(fmd), _) => Ok(fmd.xattrs),
            (None, Some(cmd)) => Ok(cmd.xattrs),
            (None, None) => Err(EosError::Internal(format!("empty metadata response for {}", path))),
        }
    }
}

fn role_id(auth: &Authorization) -> Option<RoleId> {
    auth.role.map(|Role { uid, gid }| RoleId {
        uid,
        gid,
        ..Default::default()
    })
}

fn path_id(path: &str) -> MdId {
    MdId {
        path: path.as_bytes().to_vec(),
        ..Default::default()
    }
}

/// Map the namespace-level status of an `Exec` answer
pub fn check_ns_response(response: &NsResponse) -> Result<(), EosError> {
    let codes = [
        response.error.as_ref().map(|e| (e.code, e.msg.as_str())),
        response.acl.as_ref().map(|r| (r.code, r.msg.as_str())),
        response.quota.as_ref().map(|r| (r.code, r.msg.as_str())),
        response.recycle.as_ref().map(|r| (r.code, r.msg.as_str())),
        response.version.as_ref().map(|r| (r.code, r.msg.as_str())),
    ];
    match codes.into_iter().flatten().find(|(code, _)| *code != 0) {
        Some((code, msg)) => Err(EosError::from_errno(code, msg)),
        None => Ok(()),
    }
}

fn decode_xattrs(raw: HashMap<String, Vec<u8>>) -> HashMap<String, String> {
    raw.into_iter()
        .map(|(k, v)| {
            (
                normalize_xattr_name(&k).to_string(),
                String::from_utf8_lossy(&v).to_string(),
            )
        })
        .collect()
}

fn decode_path(raw: &[u8]) -> String {
    let path = String::from_utf8_lossy(raw);
    match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => path.to_string(),
    }
}

fn file_to_info(fmd: FileMdProto, instance: &str) -> FileInfo {
    let attrs = decode_xattrs(fmd.xattrs);
    let (mtime_sec, mtime_nanos) = fmd
        .mtime
        .map(|t| (t.sec, t.n_sec as u32))
        .unwrap_or_default();
    let checksum = fmd.checksum.map(|xs| Checksum {
        xs_sum: hex::encode(xs.value),
        xs_type: xs.xs_type,
    });

    FileInfo {
        inode: fmd.inode,
        fid: fmd.id,
        uid: fmd.uid,
        gid: fmd.gid,
        size: fmd.size,
        mtime_sec,
        mtime_nanos,
        etag: fmd.etag,
        is_dir: false,
        file: decode_path(&fmd.path),
        instance: instance.to_string(),
        checksum,
        sys_acl: Acls::from_xattrs(&attrs),
        attrs,
        ..Default::default()
    }
}

fn container_to_info(cmd: ContainerMdProto, instance: &str) -> FileInfo {
    let attrs = decode_xattrs(cmd.xattrs);
    let (mtime_sec, mtime_nanos) = cmd
        .stime
        .filter(|t| t.sec != 0)
        .or(cmd.mtime)
        .map(|t| (t.sec, t.n_sec as u32))
        .unwrap_or_default();

    FileInfo {
        inode: cmd.inode,
        fid: cmd.id,
        uid: cmd.uid,
        gid: cmd.gid,
        tree_size: cmd.tree_size.max(0) as u64,
        tree_count: cmd.files.saturating_add(cmd.containers),
        mtime_sec,
        mtime_nanos,
        etag: cmd.etag,
        is_dir: true,
        file: decode_path(&cmd.path),
        instance: instance.to_string(),
        sys_acl: Acls::from_xattrs(&attrs),
        attrs,
        ..Default::default()
    }
}

/// Convert one metadata message into a [`FileInfo`]
pub fn md_response_to_file_info(response: MdResponse, instance: &str) -> Result<FileInfo, EosError> {
    let is_container = response.md_type == Type::Container as i32;
    match (response.fmd, response.cmd) {
        (_, Some(cmd)) if is_container => Ok(container_to_info(cmd, instance)),
        (Some(fmd), _) => Ok(file_to_info(fmd, instance)),
        (None, Some(cmd)) => Ok(container_to_info(cmd, instance)),
        (None, None) => Err(EosError::Internal(
            "metadata response carries neither file nor container".to_string(),
        )),
    }
}

#[async_trait]
impl EosBackend for EosGrpcBackend {
    fn name(&self) -> &'static str {
        "grpc"
    }

    async fn health_check(&self) -> Result<(), EosError> {
        let request = tonic::Request::new(PingRequest {
            authkey: self.authkey(),
            message: b"ping".to_vec(),
        });
        self.client.clone().ping(request).await?;
        Ok(())
    }

    async fn server_version(&self, _auth: &Authorization) -> Result<ServerVersion, EosError> {
        Ok(ServerVersion::new(GRPC_SERVER_SERIES))
    }

    async fn stat_path(&self, auth: &Authorization, path: &str) -> Result<FileInfo, EosError> {
        let response = self.md(auth, path_id(path), path).await?;
        md_response_to_file_info(response, &self.options.instance)
    }

    async fn stat_inode(&self, auth: &Authorization, inode: u64) -> Result<FileInfo, EosError> {
        let id = MdId {
            ino: inode,
            ..Default::default()
        };
        let response = self.md(auth, id, &format!("inode:{}", inode)).await?;
        md_response_to_file_info(response, &self.options.instance)
    }

    async fn stat_fxid(&self, auth: &Authorization, fxid: &str) -> Result<FileInfo, EosError> {
        let fid = u64::from_str_radix(fxid, 16)
            .map_err(|_| EosError::InvalidArgument(format!("invalid fxid '{}'", fxid)))?;
        let id = MdId {
            id: fid,
            md_type: Type::File as i32,
            ..Default::default()
        };
        let response = self.md(auth, id, &format!("fxid:{}", fxid)).await?;
        md_response_to_file_info(response, &self.options.instance)
    }

    async fn list_dir(&self, auth: &Authorization, path: &str) -> Result<Vec<FileInfo>, EosError> {
        let request = self.request(
            auth,
            FindRequest {
                md_type: Type::Listing as i32,
                id: Some(path_id(path)),
                role: role_id(auth),
                authkey: self.authkey(),
                maxdepth: 1,
            },
        )?;

        tracing::debug!(path = %path, "grpc Find");
        let mut stream = self.client.clone().find(request).await?.into_inner();
        let mut entries = Vec::new();
        while let Some(response) = stream.message().await? {
            entries.push(md_response_to_file_info(response, &self.options.instance)?);
        }
        if entries.is_empty() {
            return Err(EosError::NotFound(path.to_string()));
        }
        Ok(entries)
    }

    async fn create_dir(&self, auth: &Authorization, path: &str) -> Result<(), EosError> {
        let command = ns_request::Command::Mkdir(ns_request::MkdirRequest {
            id: Some(path_id(path)),
            recursive: true,
            mode: 0o755,
        });
        match self.exec(auth, command).await {
            Err(EosError::AlreadyExists(_)) => Ok(()),
            other => other.map(|_| ()),
        }
    }

    async fn remove(
        &self,
        auth: &Authorization,
        path: &str,
        recursive: bool,
        no_recycle: bool,
    ) -> Result<(), EosError> {
        let command = if recursive {
            ns_request::Command::Rm(ns_request::RmRequest {
                id: Some(path_id(path)),
                recursive: true,
                norecycle: no_recycle,
            })
        } else {
            ns_request::Command::Unlink(ns_request::UnlinkRequest {
                id: Some(path_id(path)),
                norecycle: no_recycle,
            })
        };
        self.exec(auth, command).await.map(|_| ())
    }

    async fn rename(&self, auth: &Authorization, from: &str, to: &str) -> Result<(), EosError> {
        let command = ns_request::Command::Rename(ns_request::RenameRequest {
            id: Some(path_id(from)),
            target: to.as_bytes().to_vec(),
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn touch(&self, auth: &Authorization, path: &str) -> Result<(), EosError> {
        let command = ns_request::Command::Touch(ns_request::TouchRequest {
            id: Some(path_id(path)),
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn chown(&self, auth: &Authorization, path: &str, owner: &Role) -> Result<(), EosError> {
        let command = ns_request::Command::Chown(ns_request::ChownRequest {
            id: Some(path_id(path)),
            owner: Some(RoleId {
                uid: owner.uid,
                gid: owner.gid,
                ..Default::default()
            }),
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn chmod(&self, auth: &Authorization, path: &str, mode: u32) -> Result<(), EosError> {
        let command = ns_request::Command::Chmod(ns_request::ChmodRequest {
            id: Some(path_id(path)),
            mode: mode as i64,
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn modify_acl(
        &self,
        auth: &Authorization,
        path: &str,
        rule: &str,
        recursive: bool,
        position: Option<u32>,
    ) -> Result<(), EosError> {
        use ns_request::acl_request::{AclCommand, AclType};

        let command = ns_request::Command::Acl(ns_request::AclRequest {
            id: Some(path_id(path)),
            cmd: AclCommand::Modify as i32,
            recursive,
            acl_type: AclType::SysAcl as i32,
            rule: rule.to_string(),
            position: position.unwrap_or(0),
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn set_attr(
        &self,
        auth: &Authorization,
        path: &str,
        attr: &Attribute,
        recursive: bool,
        error_if_exists: bool,
    ) -> Result<(), EosError> {
        let command = ns_request::Command::Xattr(ns_request::SetXAttrRequest {
            id: Some(path_id(path)),
            xattrs: HashMap::from([(attr.full_key(), attr.val.as_bytes().to_vec())]),
            recursive,
            keystodelete: Vec::new(),
            create: error_if_exists,
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn unset_attr(
        &self,
        auth: &Authorization,
        path: &str,
        attr: &Attribute,
        recursive: bool,
    ) -> Result<(), EosError> {
        let command = ns_request::Command::Xattr(ns_request::SetXAttrRequest {
            id: Some(path_id(path)),
            xattrs: HashMap::new(),
            recursive,
            keystodelete: vec![attr.full_key()],
            create: false,
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn get_attr(&self, auth: &Authorization, path: &str, key: &str) -> Result<Attribute, EosError> {
        let xattrs = self.raw_xattrs(auth, path).await?;
        let value = xattrs
            .get(key)
            .ok_or_else(|| EosError::NotFound(format!("attribute {} on {}", key, path)))?;
        Attribute::from_full_key(key, String::from_utf8_lossy(value))
    }

    async fn get_attrs(&self, auth: &Authorization, path: &str) -> Result<Vec<Attribute>, EosError> {
        let xattrs = self.raw_xattrs(auth, path).await?;
        let mut attrs: Vec<Attribute> = xattrs
            .iter()
            .filter_map(|(k, v)| Attribute::from_full_key(k, String::from_utf8_lossy(v)).ok())
            .collect();
        attrs.sort_by_key(|a| a.full_key());
        Ok(attrs)
    }

    async fn get_quota(
        &self,
        auth: &Authorization,
        username: &str,
        path: &str,
    ) -> Result<QuotaInfo, EosError> {
        use ns_request::quota_request::QuotaOp;

        let command = ns_request::Command::Quota(ns_request::QuotaRequest {
            path: path.as_bytes().to_vec(),
            id: Some(RoleId {
                uid: username.parse().unwrap_or_default(),
                username: username.to_string(),
                ..Default::default()
            }),
            op: QuotaOp::Get as i32,
            ..Default::default()
        });
        let response = self.exec(auth, command).await?;
        let nodes: Vec<QuotaNode> = response
            .quota
            .map(|q| q.quotanode)
            .unwrap_or_default()
            .into_iter()
            .map(|node| QuotaNode {
                space: String::from_utf8_lossy(&node.path).to_string(),
                max_logical_bytes: node.maxlogicalbytes,
                used_logical_bytes: node.usedlogicalbytes,
                max_files: node.maxfiles,
                used_files: node.usedfiles,
            })
            .collect();
        Ok(QuotaInfo::aggregate(path, &nodes))
    }

    async fn set_quota(&self, auth: &Authorization, info: &SetQuotaInfo) -> Result<(), EosError> {
        use ns_request::quota_request::QuotaOp;

        let command = ns_request::Command::Quota(ns_request::QuotaRequest {
            path: info.quota_node.as_bytes().to_vec(),
            id: Some(RoleId {
                uid: info.uid,
                gid: info.gid,
                username: info.username.clone(),
                ..Default::default()
            }),
            op: QuotaOp::Set as i32,
            maxfiles: info.max_files,
            maxbytes: info.max_bytes,
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn list_deleted_entries(&self, auth: &Authorization) -> Result<Vec<DeletedEntry>, EosError> {
        use ns_request::recycle_request::RecycleCmd;
        use ns_response::recycle_response::recycle_info::DeletionType;

        let command = ns_request::Command::Recycle(ns_request::RecycleRequest {
            key: String::new(),
            cmd: RecycleCmd::List as i32,
        });
        let response = self.exec(auth, command).await?;
        let recycles = response.recycle.map(|r| r.recycles).unwrap_or_default();
        recycles
            .into_iter()
            .map(|info| -> Result<DeletedEntry, EosError> {
                let restore_path = info
                    .id
                    .as_ref()
                    .map(|id| String::from_utf8_lossy(&id.path).to_string())
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| EosError::Internal(format!("recycle entry {} has no path", info.key)))?;
                Ok(DeletedEntry {
                    restore_path,
                    is_dir: info.deletion_type() == DeletionType::Tree,
                    restore_key: info.key,
                    size: info.size,
                    deletion_mtime: info.dtime.map(|t| t.sec).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn restore_deleted_entry(&self, auth: &Authorization, key: &str) -> Result<(), EosError> {
        use ns_request::recycle_request::RecycleCmd;

        let command = ns_request::Command::Recycle(ns_request::RecycleRequest {
            key: key.to_string(),
            cmd: RecycleCmd::Restore as i32,
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn purge_deleted_entries(&self, auth: &Authorization) -> Result<(), EosError> {
        use ns_request::recycle_request::RecycleCmd;

        let command = ns_request::Command::Recycle(ns_request::RecycleRequest {
            key: String::new(),
            cmd: RecycleCmd::Purge as i32,
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn rollback_to_version(
        &self,
        auth: &Authorization,
        path: &str,
        version: &str,
    ) -> Result<(), EosError> {
        use ns_request::version_request::VersionCmd;

        let command = ns_request::Command::Version(ns_request::VersionRequest {
            id: Some(path_id(path)),
            cmd: VersionCmd::Grab as i32,
            maxversion: 0,
            grabversion: version.to_string(),
        });
        self.exec(auth, command).await.map(|_| ())
    }

    async fn read(&self, auth: &Authorization, path: &str) -> Result<Bytes, EosError> {
        self.http()?.get_file(auth, path).await
    }

    async fn write(&self, auth: &Authorization, path: &str, data: Bytes) -> Result<(), EosError> {
        self.http()?.put_file(auth, path, data).await
    }
}
