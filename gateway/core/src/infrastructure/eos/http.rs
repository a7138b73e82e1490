// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! XrdHTTP Data Client
//!
//! Moves file contents in and out of EOS over HTTP. The MGM answers data
//! requests with a redirect to the FST holding the replica, so redirects are
//! followed here by hand (the request body has to be replayed on PUT and the
//! hop count is bounded by configuration).
//!
//! The client owns its connection pool. It is built once per gateway and
//! shared with whichever backend needs data access.
//!
//! # Identity
//!
//! Passed as query parameters: `eos.ruid`/`eos.rgid` for a role, `authz`
//! for a bearer token.

use bytes::Bytes;
use reqwest::{Client, Method, StatusCode, Url};
use std::time::Duration;

use crate::domain::auth::Authorization;
use crate::domain::backend::EosError;
use crate::domain::config::HttpConfig;

/// Settings of the HTTP data client
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts after a timed-out request
    pub max_retries: u32,
    pub max_redirects: u32,
}

impl HttpOptions {
    pub fn from_config(config: &HttpConfig) -> Option<Self> {
        config.url.as_ref().map(|url| Self {
            base_url: url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            max_redirects: config.max_redirects,
        })
    }
}

/// HTTP client for EOS data transfers
pub struct EosHttpClient {
    client: Client,
    options: HttpOptions,
    base_url: Url,
}

impl EosHttpClient {
    pub fn new(options: HttpOptions) -> Result<Self, EosError> {
        let base_url = Url::parse(&options.base_url).map_err(|e| {
            EosError::InvalidArgument(format!("invalid EOS HTTP url '{}': {}", options.base_url, e))
        })?;
        let client = Client::builder()
            .timeout(options.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| EosError::Internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            options,
            base_url,
        })
    }

    /// URL of `path` with the caller's identity attached
    pub fn build_url(&self, path: &str, auth: &Authorization) -> Result<Url, EosError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                EosError::InvalidArgument(format!("EOS HTTP url '{}' cannot be a base", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()));
        }

        if let Some(role) = &auth.role {
            url.query_pairs_mut()
                .append_pair("eos.ruid", &role.uid.to_string())
                .append_pair("eos.rgid", &role.gid.to_string());
        }
        if let Some(token) = auth.bearer() {
            url.query_pairs_mut().append_pair("authz", token);
        }
        Ok(url)
    }

    /// Download a whole file
    pub async fn get_file(&self, auth: &Authorization, path: &str) -> Result<Bytes, EosError> {
        let url = self.build_url(path, auth)?;
        let response = self.send_following_redirects(Method::GET, url, None).await?;
        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?),
            status => Err(status_error(status, path, response).await),
        }
    }

    /// Upload a whole file
    pub async fn put_file(&self, auth: &Authorization, path: &str, data: Bytes) -> Result<(), EosError> {
        let url = self.build_url(path, auth)?;
        let response = self.send_following_redirects(Method::PUT, url, Some(data)).await?;
        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(()),
            status => Err(status_error(status, path, response).await),
        }
    }

    /// HEAD on the base URL; any answer short of a server error is healthy
    pub async fn health_check(&self) -> Result<(), EosError> {
        let response = self
            .client
            .head(self.base_url.clone())
            .timeout(Duration::from_secs(5))
            .send()
            .await?;
        if response.status().is_server_error() {
            return Err(EosError::Transport(format!(
                "EOS HTTP endpoint returned status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn send_following_redirects(
        &self,
        method: Method,
        mut url: Url,
        body: Option<Bytes>,
    ) -> Result<reqwest::Response, EosError> {
        let mut redirects = 0;
        let mut retries = 0;

        loop {
            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(body) = &body {
                request = request.body(body.clone());
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() && retries < self.options.max_retries => {
                    retries += 1;
                    tracing::warn!(url = %redact(&url), attempt = retries, "EOS HTTP request timed out, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if !is_redirect(response.status()) {
                return Ok(response);
            }

            redirects += 1;
            if redirects > self.options.max_redirects {
                return Err(EosError::Transport(format!(
                    "too many redirects for {}",
                    redact(&url)
                )));
            }
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| EosError::Internal("redirect without Location header".to_string()))?;
            url = url
                .join(location)
                .map_err(|e| EosError::Internal(format!("invalid redirect location '{}': {}", location, e)))?;
            tracing::debug!(url = %redact(&url), "following EOS redirect");
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

async fn status_error(status: StatusCode, path: &str, response: reqwest::Response) -> EosError {
    match status {
        StatusCode::NOT_FOUND => EosError::NotFound(path.to_string()),
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => EosError::PermissionDenied(path.to_string()),
        StatusCode::CONFLICT => EosError::AlreadyExists(path.to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => EosError::Timeout,
        status => {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| format!("HTTP {}", status));
            EosError::Internal(format!("EOS HTTP request for {} failed: {} {}", path, status, error_msg))
        }
    }
}

/// URL without its query, which may hold a token
fn redact(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}
