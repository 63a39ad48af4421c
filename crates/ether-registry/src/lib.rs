//! Swift package catalog client.
//!
//! Search and name lookup run against the Swift Package Index package list
//! (a JSON array of repository URLs), fetched fresh on every call. Product
//! names come from the package's own `Package.swift`, fetched from GitHub
//! and read with the manifest extractor.

use ether_types::{package_identity, Product};
use reqwest::Client;
use thiserror::Error;

pub const DEFAULT_PACKAGE_LIST_URL: &str =
    "https://raw.githubusercontent.com/SwiftPackageIndex/PackageList/main/packages.json";

const RAW_CONTENT_URL: &str = "https://raw.githubusercontent.com";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Package not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A package known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPackage {
    /// Repository name
    pub name: String,
    /// GitHub organization or user
    pub owner: String,
    /// Full git URL
    pub url: String,
}

impl CatalogPackage {
    /// Interpret a user-supplied reference that needs no catalog lookup:
    /// a repository URL or `owner/repo`.
    pub fn from_reference(reference: &str) -> Option<Self> {
        let reference = reference.trim();
        if reference.contains("://") || reference.starts_with("git@") {
            let (owner, name) = parse_github_url(reference)
                .unwrap_or_else(|| (String::new(), package_identity(reference)));
            return Some(Self {
                name,
                owner,
                url: reference.to_string(),
            });
        }

        let (owner, name) = reference.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        let name = name.trim_end_matches(".git");
        Some(Self {
            name: name.to_string(),
            owner: owner.to_string(),
            url: format!("https://github.com/{}/{}.git", owner, name),
        })
    }

    pub fn is_github(&self) -> bool {
        self.url.contains("github.com")
    }
}

/// Client for the package catalog.
pub struct CatalogClient {
    package_list_url: String,
    raw_base_url: String,
    client: Client,
}

impl Default for CatalogClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogClient {
    /// Create a client for the Swift Package Index list.
    pub fn new() -> Self {
        Self::with_urls(DEFAULT_PACKAGE_LIST_URL, RAW_CONTENT_URL)
    }

    /// Create a client for a custom package list and raw-content host.
    pub fn with_urls(package_list_url: impl Into<String>, raw_base_url: impl Into<String>) -> Self {
        Self {
            package_list_url: package_list_url.into(),
            raw_base_url: raw_base_url.into(),
            client: Client::new(),
        }
    }

    /// Read the package list from another source.
    pub fn with_package_list(mut self, url: impl Into<String>) -> Self {
        self.package_list_url = url.into();
        self
    }

    /// Fetch the list of package URLs.
    pub async fn package_list(&self) -> Result<Vec<String>, RegistryError> {
        tracing::debug!("Fetching {}", self.package_list_url);
        let resp = self.client.get(&self.package_list_url).send().await?;
        if !resp.status().is_success() {
            return Err(RegistryError::InvalidResponse(format!(
                "HTTP {} from {}",
                resp.status(),
                self.package_list_url
            )));
        }

        let body = resp.text().await?;
        let packages: Vec<String> = serde_json::from_str(&body)
            .map_err(|e| RegistryError::InvalidResponse(format!("package list: {}", e)))?;
        tracing::debug!("Package list has {} entries", packages.len());
        Ok(packages)
    }

    /// Search the catalog by repository name or owner.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<CatalogPackage>, RegistryError> {
        let packages = self.package_list().await?;
        Ok(rank_matches(&packages, query, limit))
    }

    /// Find the repository for a package reference.
    ///
    /// URLs and `owner/repo` need no network; bare names must match a
    /// repository name in the catalog exactly (case-insensitive).
    pub async fn lookup(&self, reference: &str) -> Result<CatalogPackage, RegistryError> {
        if let Some(package) = CatalogPackage::from_reference(reference) {
            return Ok(package);
        }

        let packages = self.package_list().await?;
        let mut exact = rank_matches(&packages, reference, usize::MAX)
            .into_iter()
            .filter(|p| p.name.eq_ignore_ascii_case(reference));

        let found = exact
            .next()
            .ok_or_else(|| RegistryError::NotFound(reference.to_string()))?;
        let others: Vec<_> = exact.map(|p| format!("{}/{}", p.owner, p.name)).collect();
        if !others.is_empty() {
            tracing::info!(
                "'{}' is ambiguous, using {}/{} (also: {})",
                reference,
                found.owner,
                found.name,
                others.join(", ")
            );
        }
        Ok(found)
    }

    /// Products declared by the package's default-branch manifest.
    ///
    /// Only GitHub repositories can be inspected; others yield no products.
    pub async fn products(&self, package: &CatalogPackage) -> Result<Vec<Product>, RegistryError> {
        if !package.is_github() || package.owner.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/{}/{}/HEAD/Package.swift",
            self.raw_base_url, package.owner, package.name
        );
        tracing::debug!("Fetching {}", url);
        let resp = self.client.get(&url).send().await?;

        if resp.status() == 404 {
            return Err(RegistryError::NotFound(format!(
                "{}/{} has no Package.swift",
                package.owner, package.name
            )));
        }
        if !resp.status().is_success() {
            return Err(RegistryError::InvalidResponse(format!(
                "HTTP {} from {}",
                resp.status(),
                url
            )));
        }

        let manifest = resp.text().await?;
        Ok(ether_manifest::extract_products(&manifest))
    }
}

/// Parse a GitHub URL into owner and name.
pub fn parse_github_url(url: &str) -> Option<(String, String)> {
    // Format: https://github.com/owner/repo.git or git@github.com:owner/repo.git
    let url = url.trim().trim_end_matches('/').trim_end_matches(".git");
    let path = url
        .split_once("github.com")
        .map(|(_, rest)| rest.trim_start_matches([':', '/']))?;

    let mut parts = path.split('/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let name = parts.next().filter(|s| !s.is_empty())?;
    Some((owner.to_string(), name.to_string()))
}

/// Filter and order catalog URLs for a query: exact name matches first, then
/// names starting with the query, then alphabetical.
pub fn rank_matches(urls: &[String], query: &str, limit: usize) -> Vec<CatalogPackage> {
    let query_lower = query.to_lowercase();

    let mut matches: Vec<CatalogPackage> = urls
        .iter()
        .filter_map(|url| {
            let (owner, name) = parse_github_url(url)?;
            if name.to_lowercase().contains(&query_lower)
                || owner.to_lowercase().contains(&query_lower)
            {
                Some(CatalogPackage {
                    name,
                    owner,
                    url: url.clone(),
                })
            } else {
                None
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        let a_name = a.name.to_lowercase();
        let b_name = b.name.to_lowercase();

        let a_exact = a_name == query_lower;
        let b_exact = b_name == query_lower;
        if a_exact != b_exact {
            return b_exact.cmp(&a_exact);
        }

        let a_starts = a_name.starts_with(&query_lower);
        let b_starts = b_name.starts_with(&query_lower);
        if a_starts != b_starts {
            return b_starts.cmp(&a_starts);
        }

        a_name.cmp(&b_name).then_with(|| a.owner.cmp(&b.owner))
    });

    matches.truncate(limit);
    matches
}
