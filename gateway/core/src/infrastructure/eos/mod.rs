// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! EOS transports
//!
//! - [`binary`]: `eos` console and `xrdcopy` subprocesses
//! - [`grpc`]: MGM gRPC namespace service
//! - [`http`]: XrdHTTP data client, used by the gRPC backend for contents
//! - [`monitoring`]: parsers for the `-m` text output of the console

pub mod binary;
pub mod exec;
pub mod grpc;
pub mod http;
pub mod monitoring;
pub mod proto;

use std::sync::Arc;

use crate::domain::backend::{EosBackend, EosError};
use crate::domain::config::{EosClientConfig, TransportKind};

use self::binary::{BinaryOptions, EosBinaryBackend};
use self::grpc::{EosGrpcBackend, GrpcOptions};
use self::http::{EosHttpClient, HttpOptions};

/// Build the backend selected by `config.backend`
pub fn create_eos_backend(config: &EosClientConfig) -> Result<Arc<dyn EosBackend>, EosError> {
    match config.backend {
        TransportKind::Binary => Ok(Arc::new(EosBinaryBackend::with_timeout(
            BinaryOptions::from(config),
            config.command_timeout(),
        ))),
        TransportKind::Grpc => {
            let uri = config.grpc_uri.clone().ok_or_else(|| {
                EosError::InvalidArgument("gRPC backend requires grpc_uri".to_string())
            })?;
            let http = HttpOptions::from_config(&config.http)
                .map(EosHttpClient::new)
                .transpose()?
                .map(Arc::new);
            let backend = EosGrpcBackend::new(
                GrpcOptions {
                    uri,
                    authkey: config.authkey.clone(),
                    timeout: config.command_timeout(),
                    instance: config.master_url.clone(),
                },
                http,
            )?;
            Ok(Arc::new(backend))
        }
    }
}
