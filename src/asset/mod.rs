//! Asset module for refscope.
//!
//! Models asset identifiers and raw dependency records, defines the
//! [`AssetIndex`] contract the reference graph queries, and provides an
//! in-memory [`SnapshotIndex`] loaded from JSON.
//!
//! # Example
//!
//! ```
//! use refscope::asset::{AssetIdentifier, DependencyCategory, DependencyProperty, QueryAdapter, SnapshotIndex};
//!
//! let mut index = SnapshotIndex::new();
//! index.add_dependency(
//!     AssetIdentifier::package("/Game/Maps/Arena"),
//!     AssetIdentifier::package("/Game/Props/Crate"),
//!     DependencyCategory::Package,
//!     DependencyProperty::HARD,
//! );
//!
//! let adapter = QueryAdapter::new(&index);
//! let refs = adapter.referencers(&AssetIdentifier::package("/Game/Props/Crate")).unwrap();
//! assert_eq!(refs.len(), 1);
//! ```

pub mod index;
pub mod query;
pub mod snapshot;
pub mod types;

pub use index::{AssetIndex, IndexError, IndexResult};
pub use query::{LinkDirection, QueryAdapter, DEFAULT_QUERY_CATEGORIES};
pub use snapshot::{SnapshotError, SnapshotIndex};
pub use types::{
    AssetData, AssetIdentifier, DependencyCategory, DependencyProperty, DependencyQuery,
    PackageData, ParseIdentifierError, RawDependency,
};
