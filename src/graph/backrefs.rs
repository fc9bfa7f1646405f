//! Back-reference lookup.
//!
//! Answers "which fields of this object point at that asset". The lookup is
//! pluggable through [`BackReferenceProvider`]; [`FieldRegistry`] is an
//! implementation over explicit field records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::asset::AssetIdentifier;

/// Category reported for fields that carry none.
pub const DEFAULT_FIELD_CATEGORY: &str = "Default";

/// A field of one object that references a target asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackReference {
    /// Display name of the field
    pub field: String,
    /// Editor category of the field
    pub category: String,
}

/// Finds the fields of `object` that reference `target`.
pub trait BackReferenceProvider {
    /// Returns the referencing fields, in declaration order.
    fn find_back_references(&self, object: &AssetIdentifier, target: &AssetIdentifier) -> Vec<BackReference>;
}

/// The value held by a field record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Reference to another asset (or nothing)
    Reference(Option<AssetIdentifier>),
    /// Nested struct with its own fields
    Struct(Vec<FieldRecord>),
}

/// One field of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Display name
    pub name: String,
    /// Editor category
    #[serde(default)]
    pub category: Option<String>,
    /// Field value
    pub value: FieldValue,
}

impl FieldRecord {
    /// Creates a reference field.
    pub fn reference(name: impl Into<String>, target: Option<AssetIdentifier>) -> Self {
        Self {
            name: name.into(),
            category: None,
            value: FieldValue::Reference(target),
        }
    }

    /// Creates a struct field.
    pub fn structure(name: impl Into<String>, fields: Vec<FieldRecord>) -> Self {
        Self {
            name: name.into(),
            category: None,
            value: FieldValue::Struct(fields),
        }
    }

    /// Sets the editor category, builder style.
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    fn back_reference(&self) -> BackReference {
        BackReference {
            field: self.name.clone(),
            category: self
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_FIELD_CATEGORY.to_string()),
        }
    }
}

/// The field records of one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFields {
    /// The object the fields belong to
    pub object: AssetIdentifier,
    /// Class generated by this object, which also counts as a reference to it
    #[serde(default)]
    pub generated_class: Option<AssetIdentifier>,
    /// Top-level fields
    #[serde(default)]
    pub fields: Vec<FieldRecord>,
}

/// Explicit registry of object fields.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    objects: HashMap<AssetIdentifier, ObjectFields>,
}

impl FieldRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from object records. Later records replace earlier ones.
    pub fn from_objects(objects: impl IntoIterator<Item = ObjectFields>) -> Self {
        let mut registry = Self::new();
        for object in objects {
            registry.insert(object);
        }
        registry
    }

    /// Registers the fields of one object.
    pub fn insert(&mut self, object: ObjectFields) {
        self.objects.insert(object.object.clone(), object);
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if no object is registered.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn target_aliases<'a>(&'a self, target: &'a AssetIdentifier) -> Vec<&'a AssetIdentifier> {
        let mut aliases = vec![target];
        if let Some(class) = self
            .objects
            .get(target)
            .and_then(|o| o.generated_class.as_ref())
        {
            aliases.push(class);
        }
        aliases
    }
}

fn holds_reference(fields: &[FieldRecord], aliases: &[&AssetIdentifier]) -> bool {
    fields.iter().any(|field| match &field.value {
        FieldValue::Reference(Some(id)) => aliases.contains(&id),
        FieldValue::Reference(None) => false,
        FieldValue::Struct(inner) => holds_reference(inner, aliases),
    })
}

/// Reference fields count only at the top level; nested matches surface as
/// the name of every struct on the path down to them.
fn collect(fields: &[FieldRecord], aliases: &[&AssetIdentifier], top_level: bool, out: &mut Vec<BackReference>) {
    for field in fields {
        match &field.value {
            FieldValue::Reference(Some(id)) if top_level && aliases.contains(&id) => {
                out.push(field.back_reference());
            }
            FieldValue::Reference(_) => {}
            FieldValue::Struct(inner) => {
                if holds_reference(inner, aliases) {
                    out.push(field.back_reference());
                    collect(inner, aliases, false, out);
                }
            }
        }
    }
}

impl BackReferenceProvider for FieldRegistry {
    fn find_back_references(&self, object: &AssetIdentifier, target: &AssetIdentifier) -> Vec<BackReference> {
        if object == target {
            return Vec::new();
        }
        let Some(record) = self.objects.get(object) else {
            return Vec::new();
        };

        let aliases = self.target_aliases(target);
        let mut found = Vec::new();
        collect(&record.fields, &aliases, true, &mut found);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> AssetIdentifier {
        AssetIdentifier::package(name)
    }

    fn create_registry() -> FieldRegistry {
        FieldRegistry::from_objects(vec![
            ObjectFields {
                object: id("/Game/Weapons/BP_Rifle"),
                generated_class: Some(AssetIdentifier::object("/Game/Weapons/BP_Rifle", "BP_Rifle_C")),
                fields: vec![],
            },
            ObjectFields {
                object: id("/Game/Characters/BP_Soldier"),
                generated_class: None,
                fields: vec![
                    FieldRecord::reference("PrimaryWeapon", Some(id("/Game/Weapons/BP_Rifle")))
                        .in_category("Loadout"),
                    FieldRecord::reference("Sidearm", None),
                    FieldRecord::reference(
                        "WeaponClass",
                        Some(AssetIdentifier::object("/Game/Weapons/BP_Rifle", "BP_Rifle_C")),
                    ),
                    FieldRecord::structure(
                        "Inventory",
                        vec![
                            FieldRecord::reference("Slot0", Some(id("/Game/Weapons/BP_Rifle"))),
                            FieldRecord::structure(
                                "Backpack",
                                vec![FieldRecord::reference("Spare", Some(id("/Game/Weapons/BP_Rifle")))],
                            )
                            .in_category("Storage"),
                        ],
                    ),
                    FieldRecord::reference("Helmet", Some(id("/Game/Gear/Helmet"))),
                ],
            },
        ])
    }

    #[test]
    fn test_direct_and_generated_class_references() {
        let registry = create_registry();
        let found = registry.find_back_references(&id("/Game/Characters/BP_Soldier"), &id("/Game/Weapons/BP_Rifle"));
        let names: Vec<_> = found.iter().map(|r| r.field.as_str()).collect();

        assert_eq!(names, vec!["PrimaryWeapon", "WeaponClass", "Inventory", "Backpack"]);
        assert_eq!(found[0].category, "Loadout");
        assert_eq!(found[1].category, DEFAULT_FIELD_CATEGORY);
        assert_eq!(found[3].category, "Storage");
    }

    #[test]
    fn test_unrelated_target() {
        let registry = create_registry();
        let found = registry.find_back_references(&id("/Game/Characters/BP_Soldier"), &id("/Game/Gear/Helmet"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].field, "Helmet");

        assert!(registry
            .find_back_references(&id("/Game/Characters/BP_Soldier"), &id("/Game/Other"))
            .is_empty());
    }

    #[test]
    fn test_unknown_object_and_self() {
        let registry = create_registry();
        assert!(registry
            .find_back_references(&id("/Game/Unknown"), &id("/Game/Weapons/BP_Rifle"))
            .is_empty());
        assert!(registry
            .find_back_references(&id("/Game/Weapons/BP_Rifle"), &id("/Game/Weapons/BP_Rifle"))
            .is_empty());
    }

    #[test]
    fn test_object_fields_deserialize() {
        let json = r#"{
            "object": "/Game/A",
            "fields": [
                { "name": "Target", "value": { "reference": "/Game/B" } },
                { "name": "Group", "category": "Setup",
                  "value": { "struct": [ { "name": "Inner", "value": { "reference": null } } ] } }
            ]
        }"#;
        let object: ObjectFields = serde_json::from_str(json).unwrap();
        assert_eq!(object.fields.len(), 2);
        assert_eq!(object.fields[0].value, FieldValue::Reference(Some(id("/Game/B"))));
        assert_eq!(object.fields[1].category.as_deref(), Some("Setup"));
    }
}
