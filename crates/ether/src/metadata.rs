//! What `install` needs to know about a package before touching the manifest.

use crate::process::{self, ProcessError};
use ether_registry::{CatalogClient, CatalogPackage, RegistryError};
use ether_types::{package_identity, select_release, ReleasePolicy};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    /// Package identity, the last path component of the url
    pub name: String,
    pub url: String,
    /// Newest tag allowed by the release policy
    pub latest_version: Option<String>,
    pub product_names: Vec<String>,
}

/// Resolve `reference` to a repository, then read its tags and its products
/// concurrently.
///
/// Product discovery is best effort: a failure leaves the list empty and the
/// caller falls back to the package name.
pub async fn fetch_package_metadata(
    catalog: &CatalogClient,
    reference: &str,
    url_override: Option<&str>,
    policy: ReleasePolicy,
) -> Result<PackageMetadata, MetadataError> {
    let package = match url_override {
        Some(url) => CatalogPackage::from_reference(url).unwrap_or_else(|| CatalogPackage {
            name: package_identity(url),
            owner: String::new(),
            url: url.to_string(),
        }),
        None => catalog.lookup(reference).await?,
    };
    tracing::debug!("{} resolved to {}", reference, package.url);

    let (tags, products) = futures::join!(
        process::remote_tags(&package.url),
        catalog.products(&package)
    );

    let tags = tags?;
    let product_names = match products {
        Ok(products) => products.into_iter().map(|p| p.name).collect(),
        Err(e) => {
            tracing::warn!("Could not read the products of {}: {}", package.url, e);
            Vec::new()
        }
    };

    Ok(PackageMetadata {
        name: package_identity(&package.url),
        latest_version: select_release(&tags, policy).map(String::from),
        url: package.url,
        product_names,
    })
}
