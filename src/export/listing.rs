//! Plain-text reference listings.
//!
//! Lists the hard and soft package links of selected packages, one block per
//! package:
//!
//! ```text
//! [/Game/Props/Crate - Referencers]
//!   [HARD]
//!     /Game/Maps/Arena.Arena
//!   [SOFT]
//!     /Game/BP/Spawner.Spawner
//! ```
//!
//! Empty sections are left out.

use std::fmt::Write;

use crate::asset::types::long_package_asset_name;
use crate::asset::{AssetIndex, DependencyQuery, IndexResult, LinkDirection, QueryAdapter};

/// Builds the listing for `packages` in the given direction.
///
/// # Example
///
/// ```rust
/// use refscope::asset::{AssetIdentifier, DependencyCategory, DependencyProperty, LinkDirection, QueryAdapter, SnapshotIndex};
/// use refscope::export::listing::reference_listing;
///
/// let mut index = SnapshotIndex::new();
/// index.add_dependency(
///     AssetIdentifier::package("/Game/Maps/Arena"),
///     AssetIdentifier::package("/Game/Props/Crate"),
///     DependencyCategory::Package,
///     DependencyProperty::HARD,
/// );
///
/// let text = reference_listing(&QueryAdapter::new(&index), &["/Game/Props/Crate"], LinkDirection::Referencers).unwrap();
/// assert_eq!(text, "[/Game/Props/Crate - Referencers]\n  [HARD]\n    /Game/Maps/Arena.Arena\n");
/// ```
pub fn reference_listing<I: AssetIndex + ?Sized, S: AsRef<str>>(
    adapter: &QueryAdapter<'_, I>,
    packages: &[S],
    direction: LinkDirection,
) -> IndexResult<String> {
    let mut listing = String::new();

    for package in packages {
        let package = package.as_ref();
        // Writing to a String cannot fail
        let _ = writeln!(listing, "[{} - {}]", package, direction);

        for query in [DependencyQuery::Hard, DependencyQuery::Soft] {
            let links = adapter.package_links(package, direction, query)?;
            if links.is_empty() {
                continue;
            }
            let _ = writeln!(listing, "  {}", query.header());
            for link in &links {
                let _ = writeln!(listing, "    {}.{}", link, long_package_asset_name(link));
            }
        }
    }

    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetIdentifier, DependencyCategory, DependencyProperty, IndexError, SnapshotIndex};

    fn create_test_index() -> SnapshotIndex {
        let mut index = SnapshotIndex::new();
        let crate_id = AssetIdentifier::package("/Game/Props/Crate");
        for (referencer, properties) in [
            ("/Game/Maps/Arena", DependencyProperty::HARD | DependencyProperty::GAME),
            ("/Game/BP/Spawner", DependencyProperty::GAME),
            ("/Game/Maps/Dock", DependencyProperty::HARD),
        ] {
            index.add_dependency(
                AssetIdentifier::package(referencer),
                crate_id.clone(),
                DependencyCategory::Package,
                properties,
            );
        }
        index.add_dependency(
            crate_id,
            AssetIdentifier::package("/Game/Textures/Wood"),
            DependencyCategory::Package,
            DependencyProperty::HARD,
        );
        index
    }

    #[test]
    fn test_referencer_listing() {
        let index = create_test_index();
        let text = reference_listing(&QueryAdapter::new(&index), &["/Game/Props/Crate"], LinkDirection::Referencers)
            .unwrap();

        assert_eq!(
            text,
            "[/Game/Props/Crate - Referencers]\n\
             \x20 [HARD]\n\
             \x20   /Game/Maps/Arena.Arena\n\
             \x20   /Game/Maps/Dock.Dock\n\
             \x20 [SOFT]\n\
             \x20   /Game/BP/Spawner.Spawner\n"
        );
    }

    #[test]
    fn test_dependency_listing_omits_empty_sections() {
        let index = create_test_index();
        let text = reference_listing(
            &QueryAdapter::new(&index),
            &["/Game/Props/Crate", "/Game/Maps/Arena"],
            LinkDirection::Dependencies,
        )
        .unwrap();

        assert_eq!(
            text,
            "[/Game/Props/Crate - Dependencies]\n  [HARD]\n    /Game/Textures/Wood.Wood\n\
             [/Game/Maps/Arena - Dependencies]\n  [HARD]\n    /Game/Props/Crate.Crate\n"
        );
    }

    #[test]
    fn test_listing_not_ready() {
        let mut index = create_test_index();
        index.set_loading(true);
        let result = reference_listing(&QueryAdapter::new(&index), &["/Game/Props/Crate"], LinkDirection::Referencers);
        assert_eq!(result, Err(IndexError::NotReady));
    }
}
