//! Documented entities: kinds, identities and the documents built for them.

pub mod cache;
pub mod metadata;

use crate::source::{ClassDef, EnumDef, ObjectModel, SignatureDef, SourceItem, StructDef};
use crate::tree::DocTree;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Class,
    Struct,
    Enum,
    Delegate,
    Node,
}

impl EntityKind {
    /// Index group and row names, `None` for nodes (they are listed per class).
    pub fn index_group(self) -> Option<(&'static str, &'static str)> {
        match self {
            EntityKind::Class => Some(("classes", "class")),
            EntityKind::Struct => Some(("structs", "struct")),
            EntityKind::Enum => Some(("enums", "enum")),
            EntityKind::Delegate => Some(("delegates", "delegate")),
            EntityKind::Node => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Class => "class",
            EntityKind::Struct => "struct",
            EntityKind::Enum => "enum",
            EntityKind::Delegate => "delegate",
            EntityKind::Node => "node",
        })
    }
}

/// Stable string key an entity is addressed by for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A built document plus what it documents.
#[derive(Debug, Clone)]
pub struct EntityDocument {
    pub kind: EntityKind,
    pub identity: Identity,
    pub tree: DocTree,
}

/// Borrowed view of any documentable entity.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'m> {
    Class(&'m ClassDef),
    Struct(&'m StructDef),
    Enum(&'m EnumDef),
    Delegate(&'m SignatureDef),
    Node(&'m SourceItem),
}

impl EntityRef<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityRef::Class(_) => EntityKind::Class,
            EntityRef::Struct(_) => EntityKind::Struct,
            EntityRef::Enum(_) => EntityKind::Enum,
            EntityRef::Delegate(_) => EntityKind::Delegate,
            EntityRef::Node(_) => EntityKind::Node,
        }
    }

    pub fn identity(&self) -> Identity {
        match self {
            EntityRef::Class(class) => class_def_identity(class),
            EntityRef::Struct(s) => Identity::new(&s.name),
            EntityRef::Enum(e) => Identity::new(&e.name),
            EntityRef::Delegate(sig) => delegate_identity(&sig.name),
            EntityRef::Node(item) => Identity::new(&item.node.doc_id),
        }
    }
}

/// Generated classes are addressed by the asset that generated them.
pub fn class_def_identity(class: &ClassDef) -> Identity {
    match &class.generated_by {
        Some(generator) => Identity::new(&generator.name),
        None => Identity::new(&class.name),
    }
}

/// Identity of a class known only by name; unknown classes keep their name.
pub fn class_identity(model: &dyn ObjectModel, name: &str) -> Identity {
    model
        .class(name)
        .map(class_def_identity)
        .unwrap_or_else(|| Identity::new(name))
}

/// `OnHitMulticast__DelegateSignature` and `OnHit__DelegateSignature` both become `OnHit`.
pub fn delegate_identity(signature_name: &str) -> Identity {
    let name = signature_name
        .strip_suffix("__DelegateSignature")
        .unwrap_or(signature_name);
    let name = name.strip_suffix("Multicast").unwrap_or(name);
    Identity::new(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::GeneratorDef;

    #[test]
    fn generated_class_collapses_onto_generator() {
        let mut class = ClassDef {
            name: "BP_Door_C".to_string(),
            ..Default::default()
        };
        assert_eq!(class_def_identity(&class).as_str(), "BP_Door_C");

        class.generated_by = Some(GeneratorDef {
            name: "BP_Door".to_string(),
            ..Default::default()
        });
        assert_eq!(EntityRef::Class(&class).identity().as_str(), "BP_Door");

        let skeleton = ClassDef {
            name: "SKEL_BP_Door_C".to_string(),
            generated_by: class.generated_by.clone(),
            ..Default::default()
        };
        assert_eq!(class_def_identity(&skeleton), class_def_identity(&class));
    }

    #[test]
    fn delegate_identity_strips_decorations() {
        assert_eq!(delegate_identity("OnHit__DelegateSignature").as_str(), "OnHit");
        assert_eq!(
            delegate_identity("OnHitMulticast__DelegateSignature").as_str(),
            "OnHit"
        );
        assert_eq!(delegate_identity("OnHit").as_str(), "OnHit");
    }

    #[test]
    fn index_groups_exclude_nodes() {
        assert_eq!(EntityKind::Enum.index_group(), Some(("enums", "enum")));
        assert_eq!(EntityKind::Node.index_group(), None);
    }
}
