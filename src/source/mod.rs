//! Source object model: the editor-side entities the generator documents.
//!
//! The host editor is reached only through [`ObjectModel`] (lookups by
//! canonical name) and [`catalog::SourceCatalog`] (what to visit). The
//! payload types double as the on-disk form of a [`snapshot::ModelSnapshot`].

pub mod catalog;
pub mod snapshot;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// String-keyed metadata attached to types, functions and fields.
pub type MetadataMap = BTreeMap<String, String>;

/// Which lookup table a type name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    Class,
    Struct,
    Enum,
}

/// A type addressed by kind and canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    pub kind: TypeKind,
    pub name: String,
}

impl TypeKey {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::Class,
            name: name.into(),
        }
    }

    pub fn script_struct(name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::Struct,
            name: name.into(),
        }
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self {
            kind: TypeKind::Enum,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
    Private,
    #[default]
    Unspecified,
}

/// The asset a generated class was produced from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorDef {
    pub name: String,
    /// Widget blueprints contribute their own metadata to the class.
    pub widget: bool,
    pub metadata: MetadataMap,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDef {
    pub name: String,
    pub path: String,
    pub super_class: Option<String>,
    pub generated_by: Option<GeneratorDef>,
    pub metadata: MetadataMap,
    /// Declared fields only; inherited ones come from the ancestor chain.
    pub fields: Vec<FieldDef>,
    pub is_abstract: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructDef {
    pub name: String,
    pub path: String,
    pub super_struct: Option<String>,
    pub metadata: MetadataMap,
    pub fields: Vec<FieldDef>,
    /// Archetype and default objects are never documented.
    pub archetype: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumValueDef {
    pub name: String,
    pub display_name: String,
    pub tooltip: String,
    pub hidden: bool,
    pub spacer: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumDef {
    pub name: String,
    pub path: String,
    pub metadata: MetadataMap,
    pub values: Vec<EnumValueDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamDef {
    pub name: String,
    pub cpp_type: String,
    pub is_return: bool,
    /// Signature name when the parameter is a delegate.
    pub delegate: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionDef {
    pub name: String,
    /// Declaring class.
    pub owner: String,
    pub access: Access,
    pub is_static: bool,
    pub blueprint_event: bool,
    pub is_const: bool,
    pub metadata: MetadataMap,
    pub params: Vec<ParamDef>,
}

impl FunctionDef {
    /// Lookup key used by source items: `Owner::Name`.
    pub fn key(&self) -> String {
        format!("{}::{}", self.owner, self.name)
    }

    pub fn comment(&self) -> &str {
        self.metadata.get("Comment").map(String::as_str).unwrap_or("")
    }

    pub fn param(&self, name: &str) -> Option<&ParamDef> {
        self.params.iter().find(|p| !p.is_return && p.name == name)
    }
}

/// A delegate signature function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureDef {
    pub name: String,
    pub params: Vec<ParamDef>,
    pub is_const: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDef {
    pub name: String,
    pub cpp_type: String,
    pub blueprint_visible: bool,
    pub deprecated: bool,
    pub disable_edit_on_instance: bool,
    pub native_access: Access,
    pub metadata: MetadataMap,
    /// Signature name when the field is a multicast delegate.
    pub multicast_delegate: Option<String>,
}

impl FieldDef {
    pub fn comment(&self) -> &str {
        self.metadata.get("Comment").map(String::as_str).unwrap_or("")
    }

    pub fn is_documentable(&self) -> bool {
        self.blueprint_visible || self.deprecated || self.multicast_delegate.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Class,
    Blueprint,
    AnimBlueprint,
    Struct,
    Enum,
}

/// One object handed out by a catalog, with the items it can spawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceObject {
    pub name: String,
    pub path: String,
    pub kind: SourceKind,
    /// Class a blueprint generates.
    pub generated_class: Option<String>,
    pub items: Vec<SourceItem>,
}

impl SourceObject {
    /// The class nodes fall back to when they are not function-backed.
    pub fn own_class(&self) -> Option<&str> {
        match self.kind {
            SourceKind::Class => Some(&self.name),
            SourceKind::Blueprint | SourceKind::AnimBlueprint => self.generated_class.as_deref(),
            SourceKind::Struct | SourceKind::Enum => None,
        }
    }

    /// The type whose members should be documented alongside the items.
    pub fn member_type(&self) -> Option<TypeKey> {
        match self.kind {
            SourceKind::Struct => Some(TypeKey::script_struct(&self.name)),
            SourceKind::Enum => Some(TypeKey::enumeration(&self.name)),
            _ => self.own_class().map(TypeKey::class),
        }
    }
}

/// What kind of construct an item spawns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructKind {
    Function,
    Variable,
    DelegateBinding,
    Component,
    BoundObject,
    Event,
    #[default]
    Other,
}

/// The node type an item produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    CallFunction,
    DynamicCast,
    Message,
    AnimGraph,
    Event,
    #[default]
    Generic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    #[default]
    Input,
    Output,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pin {
    /// Internal name, matched against declared parameter names.
    pub name: String,
    pub display_name: String,
    pub direction: PinDirection,
    pub type_text: String,
    pub tooltip: String,
    pub hidden: bool,
    pub is_self: bool,
    pub is_exec: bool,
    /// Object type of a self pin.
    pub object_type: Option<String>,
}

/// What the editor shows for a spawned node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePresentation {
    pub doc_id: String,
    pub list_title: String,
    pub full_title: String,
    pub tooltip: String,
    pub category: String,
    pub pins: Vec<Pin>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceItem {
    pub construct: ConstructKind,
    pub node_kind: NodeKind,
    /// Backing function as `Owner::Name`.
    pub function: Option<String>,
    pub node: NodePresentation,
}

/// Read access to the editor's object model.
pub trait ObjectModel: Sync {
    fn class(&self, name: &str) -> Option<&ClassDef>;
    fn script_struct(&self, name: &str) -> Option<&StructDef>;
    fn enumeration(&self, name: &str) -> Option<&EnumDef>;
    /// Function by `Owner::Name`.
    fn function(&self, key: &str) -> Option<&FunctionDef>;
    fn signature(&self, name: &str) -> Option<&SignatureDef>;

    /// Direct super type, if any. Enums have none.
    fn ancestor(&self, key: &TypeKey) -> Option<TypeKey> {
        match key.kind {
            TypeKind::Class => self
                .class(&key.name)?
                .super_class
                .as_ref()
                .map(TypeKey::class),
            TypeKind::Struct => self
                .script_struct(&key.name)?
                .super_struct
                .as_ref()
                .map(TypeKey::script_struct),
            TypeKind::Enum => None,
        }
    }

    /// A type's own metadata layer. A class generated by a widget blueprint
    /// carries the blueprint's metadata on top of its own.
    fn metadata(&self, key: &TypeKey) -> MetadataMap {
        match key.kind {
            TypeKind::Class => match self.class(&key.name) {
                Some(class) => {
                    let mut map = class.metadata.clone();
                    if let Some(generator) = class.generated_by.as_ref().filter(|g| g.widget) {
                        map.extend(generator.metadata.clone());
                    }
                    map
                }
                None => MetadataMap::new(),
            },
            TypeKind::Struct => self
                .script_struct(&key.name)
                .map(|s| s.metadata.clone())
                .unwrap_or_default(),
            TypeKind::Enum => self
                .enumeration(&key.name)
                .map(|e| e.metadata.clone())
                .unwrap_or_default(),
        }
    }
}
