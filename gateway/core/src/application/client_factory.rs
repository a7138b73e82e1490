// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Wires an [`EosClient`] from configuration.

use std::sync::Arc;

use crate::application::client::EosClient;
use crate::domain::backend::EosError;
use crate::domain::config::EosClientConfig;
use crate::domain::identity::IdentityResolver;
use crate::infrastructure::eos::create_eos_backend;
use crate::infrastructure::identity::SystemIdentityResolver;

/// Client over the configured transport, resolving identities through the
/// host passwd database
pub async fn create_eos_client(config: &EosClientConfig) -> Result<EosClient, EosError> {
    create_eos_client_with_identity(config, Arc::new(SystemIdentityResolver::new())).await
}

pub async fn create_eos_client_with_identity(
    config: &EosClientConfig,
    identity: Arc<dyn IdentityResolver>,
) -> Result<EosClient, EosError> {
    let backend = create_eos_backend(config)?;
    tracing::debug!(
        backend = backend.name(),
        master_url = %config.master_url,
        version_invariant = config.version_invariant,
        "creating EOS client"
    );
    EosClient::connect(
        backend,
        identity,
        config.client_options(),
        config.root_authorization(),
        config.acl_codec.forced(),
    )
    .await
}
