//! Shared types for the asset dependency index.
//!
//! This module defines the identifiers, raw dependency records and asset
//! metadata exchanged between the index and the reference graph.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Package name reserved for primary asset identifiers.
pub const PRIMARY_ASSET_PACKAGE: &str = "PrimaryAssetId";

/// Prefix shared by all native code packages.
pub const SCRIPT_PACKAGE_PREFIX: &str = "/Script/";

/// Names an asset, an object inside a package, or a searchable value.
///
/// An empty string in any of the three parts means "none". Two identifiers
/// are equal when all three parts are equal.
///
/// # Example
///
/// ```
/// use refscope::asset::AssetIdentifier;
///
/// let id: AssetIdentifier = "/Game/Maps/Arena".parse().unwrap();
/// assert!(id.is_package());
/// assert_eq!(id.to_string(), "/Game/Maps/Arena");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetIdentifier {
    /// Long package name (e.g. "/Game/Props/Crate")
    pub package_name: String,
    /// Object inside the package, or the primary asset type
    pub object_name: String,
    /// Searchable value name, or the primary asset name
    pub value_name: String,
}

impl AssetIdentifier {
    /// Creates an identifier for a whole package.
    pub fn package(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            object_name: String::new(),
            value_name: String::new(),
        }
    }

    /// Creates an identifier for an object inside a package.
    pub fn object(package_name: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            object_name: object_name.into(),
            value_name: String::new(),
        }
    }

    /// Creates an identifier for a searchable value (gameplay tag, row handle...).
    pub fn value(
        package_name: impl Into<String>,
        object_name: impl Into<String>,
        value_name: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            object_name: object_name.into(),
            value_name: value_name.into(),
        }
    }

    /// Creates an identifier for a primary asset (management reference).
    pub fn primary_asset(asset_type: impl Into<String>, asset_name: impl Into<String>) -> Self {
        Self {
            package_name: PRIMARY_ASSET_PACKAGE.to_string(),
            object_name: asset_type.into(),
            value_name: asset_name.into(),
        }
    }

    /// Returns true if this identifies a primary asset.
    pub fn is_primary_asset(&self) -> bool {
        self.package_name == PRIMARY_ASSET_PACKAGE
    }

    /// Returns true if this identifies a whole package.
    pub fn is_package(&self) -> bool {
        !self.package_name.is_empty()
            && !self.is_primary_asset()
            && self.object_name.is_empty()
            && self.value_name.is_empty()
    }

    /// Returns true if this identifies a searchable value.
    pub fn is_value(&self) -> bool {
        !self.value_name.is_empty() && !self.is_primary_asset()
    }

    /// Returns the package name when this identifier refers to on-disk data.
    ///
    /// Primary assets and values have no package of their own to resolve.
    pub fn resolvable_package(&self) -> Option<&str> {
        if self.package_name.is_empty() || self.is_primary_asset() || self.is_value() {
            None
        } else {
            Some(&self.package_name)
        }
    }
}

impl fmt::Display for AssetIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_primary_asset() {
            return write!(f, "{}:{}", self.object_name, self.value_name);
        }
        write!(f, "{}", self.package_name)?;
        if !self.object_name.is_empty() {
            write!(f, ".{}", self.object_name)?;
        }
        if !self.value_name.is_empty() {
            write!(f, "::{}", self.value_name)?;
        }
        Ok(())
    }
}

/// Error returned when an identifier string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdentifierError {
    /// The input was empty.
    #[error("asset identifier is empty")]
    Empty,

    /// A `Type:Name` primary asset id is missing one side.
    #[error("invalid primary asset id: '{0}'")]
    InvalidPrimaryAsset(String),
}

impl FromStr for AssetIdentifier {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseIdentifierError::Empty);
        }

        // Package paths always start with '/'; anything else with a colon is Type:Name
        if !s.starts_with('/') {
            if let Some((asset_type, asset_name)) = s.split_once(':') {
                if asset_type.is_empty() || asset_name.is_empty() {
                    return Err(ParseIdentifierError::InvalidPrimaryAsset(s.to_string()));
                }
                return Ok(Self::primary_asset(asset_type, asset_name));
            }
        }

        let (path, value) = match s.split_once("::") {
            Some((path, value)) => (path, value),
            None => (s, ""),
        };

        let name_start = path.rfind('/').map_or(0, |i| i + 1);
        let (package, object) = match path[name_start..].find('.') {
            Some(dot) => (&path[..name_start + dot], &path[name_start + dot + 1..]),
            None => (path, ""),
        };

        Ok(Self::value(package, object, value))
    }
}

impl TryFrom<String> for AssetIdentifier {
    type Error = ParseIdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetIdentifier> for String {
    fn from(id: AssetIdentifier) -> Self {
        id.to_string()
    }
}

/// Returns the asset name of a long package name (its last path segment).
///
/// ```
/// use refscope::asset::types::long_package_asset_name;
///
/// assert_eq!(long_package_asset_name("/Game/Props/Crate"), "Crate");
/// ```
pub fn long_package_asset_name(package_name: &str) -> &str {
    package_name
        .rsplit_once('/')
        .map_or(package_name, |(_, name)| name)
}

/// The kind of dependency recorded by the index.
///
/// The set is closed; every variant has an explicit sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyCategory {
    /// Package-to-package load dependency
    Package,
    /// Management reference from a primary asset
    Manage,
    /// Reference to a searchable name (tag, row handle)
    SearchableName,
}

impl DependencyCategory {
    /// Sort position, most important first.
    pub fn order(&self) -> u8 {
        match self {
            DependencyCategory::Package => 0,
            DependencyCategory::Manage => 1,
            DependencyCategory::SearchableName => 2,
        }
    }

    /// Returns a short label for the category.
    pub fn label(&self) -> &'static str {
        match self {
            DependencyCategory::Package => "package",
            DependencyCategory::Manage => "manage",
            DependencyCategory::SearchableName => "searchable_name",
        }
    }
}

impl fmt::Display for DependencyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for DependencyCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "package" => Ok(DependencyCategory::Package),
            "manage" => Ok(DependencyCategory::Manage),
            "searchable_name" | "searchablename" => Ok(DependencyCategory::SearchableName),
            _ => Err(format!(
                "Unknown dependency category: '{}'. Valid categories: package, manage, searchable_name",
                s
            )),
        }
    }
}

bitflags! {
    /// Properties attached to a raw dependency record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DependencyProperty: u8 {
        /// Required at load time
        const HARD = 1 << 0;
        /// Needed in the running game, not only in the editor
        const GAME = 1 << 1;
        /// Needed when cooking/building
        const BUILD = 1 << 2;
        /// Direct management reference
        const DIRECT = 1 << 3;
    }
}

impl Default for DependencyProperty {
    fn default() -> Self {
        Self::empty()
    }
}

impl DependencyProperty {
    /// Returns true if the record counts as a hard link (`HARD` or `DIRECT`).
    pub fn is_hard(&self) -> bool {
        self.intersects(DependencyProperty::HARD | DependencyProperty::DIRECT)
    }
}

/// One dependency record as reported by the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDependency {
    /// The asset at the other end of the link
    pub asset_id: AssetIdentifier,
    /// Kind of link
    pub category: DependencyCategory,
    /// Link properties
    #[serde(default)]
    pub properties: DependencyProperty,
}

impl RawDependency {
    /// Creates a new raw dependency record.
    pub fn new(
        asset_id: AssetIdentifier,
        category: DependencyCategory,
        properties: DependencyProperty,
    ) -> Self {
        Self {
            asset_id,
            category,
            properties,
        }
    }

    /// Returns true if the link is hard.
    pub fn is_hard(&self) -> bool {
        self.properties.is_hard()
    }

    /// Returns true if the link matters in the running game.
    pub fn is_used_in_game(&self) -> bool {
        self.category != DependencyCategory::Package
            || self.properties.contains(DependencyProperty::GAME)
    }
}

/// Selects the hard or soft side of a package's links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyQuery {
    /// Links required at load time
    Hard,
    /// Optional / lazily loaded links
    Soft,
}

impl DependencyQuery {
    /// Returns true if the record satisfies this query.
    pub fn matches(&self, dependency: &RawDependency) -> bool {
        match self {
            DependencyQuery::Hard => dependency.properties.contains(DependencyProperty::HARD),
            DependencyQuery::Soft => !dependency.properties.contains(DependencyProperty::HARD),
        }
    }

    /// Section header used in reference listings.
    pub fn header(&self) -> &'static str {
        match self {
            DependencyQuery::Hard => "[HARD]",
            DependencyQuery::Soft => "[SOFT]",
        }
    }
}

/// Metadata describing the main asset of a package.
///
/// A default value is "invalid": the index could not resolve the asset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetData {
    /// Package that contains the asset
    #[serde(default)]
    pub package_name: String,
    /// Asset name (e.g. "Crate")
    #[serde(default)]
    pub asset_name: String,
    /// Short class name (e.g. "StaticMesh")
    #[serde(default)]
    pub asset_class: String,
    /// Whether the asset only forwards to another location
    #[serde(default)]
    pub is_redirector: bool,
    /// Free-form asset registry tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl AssetData {
    /// Creates asset data for a package's main asset.
    pub fn new(
        package_name: impl Into<String>,
        asset_name: impl Into<String>,
        asset_class: impl Into<String>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            asset_name: asset_name.into(),
            asset_class: asset_class.into(),
            is_redirector: false,
            tags: BTreeMap::new(),
        }
    }

    /// Creates asset data for a redirector stub.
    pub fn redirector(package_name: impl Into<String>) -> Self {
        let package_name = package_name.into();
        let asset_name = long_package_asset_name(&package_name).to_string();
        Self {
            package_name,
            asset_name,
            asset_class: "ObjectRedirector".to_string(),
            is_redirector: true,
            tags: BTreeMap::new(),
        }
    }

    /// Adds a tag, builder style.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Returns true if the asset was resolved.
    pub fn is_valid(&self) -> bool {
        !self.asset_name.is_empty()
    }

    /// Looks up a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// On-disk information about a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageData {
    /// Size in bytes; negative when the package data is broken
    pub disk_size: i64,
}

impl PackageData {
    /// Returns true if the package has usable on-disk data.
    pub fn is_valid(&self) -> bool {
        self.disk_size >= 0
    }
}
