// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! GitHub-style release repository.
//!
//! Provider URLs have the form
//! `https://<host>/<owner>/<repo>/releases/{latest|download/<version>}/<file>`.
//! Release tags are listed through the REST API (`api.github.com` for github.com,
//! `<host>/api/v3` otherwise) and assets are downloaded from
//! `/<owner>/<repo>/releases/download/<version>/<file>`.

use super::{parse_version, Repository, RepositoryError};
use crate::constants::{GITHUB_API_URL, GITHUB_HOST, GITHUB_RELEASES_PER_PAGE};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
}

/// Repository reading release assets over HTTP.
#[derive(Clone, Debug)]
pub struct RemoteRepository {
    http: HttpClient,
    token: Option<String>,
    base_url: String,
    api_url: String,
    owner: String,
    repo: String,
    components_path: String,
    default_version: String,
}

/// Pieces of a provider release URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseUrl {
    pub base_url: String,
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    /// Pinned version, `None` for `latest`.
    pub version: Option<String>,
    pub file: String,
}

impl ReleaseUrl {
    /// Split a provider release URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not point at a release asset.
    pub fn parse(raw: &str) -> Result<Self, RepositoryError> {
        let invalid = |reason: &str| RepositoryError::InvalidUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let base_url = format!("{}://{authority}", url.scheme());
        let api_url = if host == GITHUB_HOST {
            GITHUB_API_URL.to_string()
        } else {
            format!("{base_url}/api/v3")
        };

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        let (owner, repo, rest) = match segments.as_slice() {
            [owner, repo, "releases", rest @ ..] => (*owner, *repo, rest),
            _ => return Err(invalid("expected /<owner>/<repo>/releases/...")),
        };

        let (version, file) = match rest {
            ["latest", file @ ..] if !file.is_empty() => (None, file.join("/")),
            ["download", version, file @ ..] if !file.is_empty() => {
                (Some((*version).to_string()), file.join("/"))
            }
            [version, file @ ..] if !file.is_empty() => {
                (Some((*version).to_string()), file.join("/"))
            }
            _ => return Err(invalid("missing release version or file")),
        };

        Ok(Self {
            base_url,
            api_url,
            owner: owner.to_string(),
            repo: repo.to_string(),
            version,
            file,
        })
    }
}

impl RemoteRepository {
    /// Build a repository for `url`, resolving `latest` through the releases API.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed, or if the latest release cannot be
    /// determined.
    pub async fn new(
        http: HttpClient,
        url: &str,
        token: Option<String>,
    ) -> Result<Self, RepositoryError> {
        let release = ReleaseUrl::parse(url)?;

        let mut repository = Self {
            http,
            token,
            base_url: release.base_url,
            api_url: release.api_url,
            owner: release.owner,
            repo: release.repo,
            components_path: release.file,
            default_version: String::new(),
        };

        repository.default_version = match release.version {
            Some(version) => version,
            None => repository.fetch_latest_release().await?,
        };

        info!(
            owner = %repository.owner,
            repo = %repository.repo,
            default_version = %repository.default_version,
            "Resolved remote provider repository"
        );
        Ok(repository)
    }

    /// Highest published, non-prerelease semver tag.
    async fn fetch_latest_release(&self) -> Result<String, RepositoryError> {
        let url = format!(
            "{}/repos/{}/{}/releases?per_page={GITHUB_RELEASES_PER_PAGE}",
            self.api_url, self.owner, self.repo
        );
        let response = self.send(&url).await?;
        let releases: Vec<GithubRelease> =
            response
                .json()
                .await
                .map_err(|source| RepositoryError::Http {
                    url: url.clone(),
                    source,
                })?;

        releases
            .into_iter()
            .filter(|r| !r.prerelease && !r.draft)
            .filter_map(|r| {
                parse_version(&r.tag_name)
                    .ok()
                    .filter(|v| v.pre.is_empty())
                    .map(|v| (v, r.tag_name))
            })
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, tag)| tag)
            .ok_or(RepositoryError::NoVersions)
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, RepositoryError> {
        let mut request = self.http.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|source| RepositoryError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RepositoryError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Repository for RemoteRepository {
    fn components_path(&self) -> &str {
        &self.components_path
    }

    fn default_version(&self) -> &str {
        &self.default_version
    }

    async fn get_file(&self, version: &str, path: &str) -> Result<Vec<u8>, RepositoryError> {
        let version = if version.is_empty() {
            self.default_version.as_str()
        } else {
            version
        };
        let url = format!(
            "{}/{}/{}/releases/download/{version}/{path}",
            self.base_url, self.owner, self.repo
        );
        debug!(url = %url, "Downloading release asset");

        let response = self.send(&url).await.map_err(|err| match err {
            RepositoryError::HttpStatus { status, .. } if status == StatusCode::NOT_FOUND.as_u16() => {
                RepositoryError::FileNotFound {
                    version: version.to_string(),
                    path: path.to_string(),
                }
            }
            other => other,
        })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|source| RepositoryError::Http {
                url: url.clone(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod remote_tests;
