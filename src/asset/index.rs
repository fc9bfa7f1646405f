//! The asset dependency index contract.
//!
//! The reference graph never owns asset data; it asks an [`AssetIndex`]
//! implementation. Queries are synchronous, read-only lookups.

use std::collections::HashMap;

use super::types::{AssetData, AssetIdentifier, DependencyCategory, PackageData, RawDependency};

/// Errors reported while querying the index.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// The index is still scanning assets; the caller should defer.
    #[error("asset index is still loading")]
    NotReady,
}

/// Result type alias for index queries.
pub type IndexResult<T> = Result<T, IndexError>;

/// Read-only view of an asset dependency index.
///
/// Implementations answer "who depends on X" and "what does X depend on",
/// and resolve package metadata. No method mutates the index.
pub trait AssetIndex {
    /// Returns true while the initial asset scan is still running.
    fn is_loading(&self) -> bool;

    /// Returns the records of every asset that references `id`, restricted to `categories`.
    fn referencers(&self, id: &AssetIdentifier, categories: &[DependencyCategory]) -> Vec<RawDependency>;

    /// Returns the records of every asset `id` references, restricted to `categories`.
    fn dependencies(&self, id: &AssetIdentifier, categories: &[DependencyCategory]) -> Vec<RawDependency>;

    /// Returns the on-disk data of a package, if the index knows it.
    fn package_data(&self, package_name: &str) -> Option<PackageData>;

    /// Returns every asset stored in a package (redirectors included).
    fn assets_by_package(&self, package_name: &str) -> Vec<AssetData>;

    /// Resolves the main asset of each package in one batched query.
    ///
    /// Packages the index cannot resolve are absent from the result.
    fn assets_for_packages(&self, package_names: &[String]) -> HashMap<String, AssetData>;
}
