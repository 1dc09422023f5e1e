//! Owner documents (class, struct, enum, delegate) and their member lists.

use crate::entity::metadata::MetadataResolver;
use crate::entity::{delegate_identity, Identity};
use crate::generate::diagnostics::Diagnostics;
use crate::generate::node::signature_string;
use crate::generate::{append_meta, doxygen};
use crate::source::{Access, FieldDef, ObjectModel, TypeKey, TypeKind};
use crate::tree::DocTree;
use tracing::debug;

/// Everything an owner document needs besides the type itself.
pub struct DocContext<'a, 'm> {
    pub model: &'m dyn ObjectModel,
    pub resolver: &'a MetadataResolver<'m>,
    pub docs_title: &'a str,
    pub context_string: &'a str,
}

impl DocContext<'_, '_> {
    pub fn class_doc(&self, name: &str) -> DocTree {
        let key = TypeKey::class(name);
        let class = self.model.class(name);
        let generator = class.and_then(|c| c.generated_by.as_ref());

        let mut tree = DocTree::new();
        tree.append_escaped("docs_name", self.docs_title);
        tree.append_escaped("id", self.resolver.identity(&key).as_str());
        tree.append_escaped("display_name", self.resolver.display_name(&key));
        self.resolver.append_parent_chain(&mut tree, &key);
        tree.append_flag("blueprint_generated", generator.is_some());
        tree.append_flag("widget_blueprint", generator.is_some_and(|g| g.widget));
        append_meta(&mut tree, &self.resolver.resolve(&key));
        tree.append_value("class_path", class.map_or("", |c| c.path.as_str()));
        tree.append_value("context_string", self.context_string);
        tree.append_child("nodes");
        tree.append_child("fields");
        tree
    }

    pub fn struct_doc(&self, name: &str) -> DocTree {
        let key = TypeKey::script_struct(name);
        let path = self
            .model
            .script_struct(name)
            .map_or("", |s| s.path.as_str());

        let mut tree = DocTree::new();
        tree.append_escaped("docs_name", self.docs_title);
        tree.append_escaped("id", name);
        tree.append_escaped("display_name", self.resolver.display_name(&key));
        self.resolver.append_parent_chain(&mut tree, &key);
        append_meta(&mut tree, &self.resolver.resolve(&key));
        tree.append_value("context_string", self.context_string);
        tree.append_value("class_path", path);
        tree.append_child("fields");
        tree
    }

    pub fn enum_doc(&self, name: &str) -> DocTree {
        let key = TypeKey::enumeration(name);
        let enumeration = self.model.enumeration(name);

        let mut tree = DocTree::new();
        tree.append_escaped("docs_name", self.docs_title);
        tree.append_escaped("id", name);
        tree.append_escaped("display_name", self.resolver.display_name(&key));
        tree.append_value("context_string", self.context_string);
        tree.append_value("class_path", enumeration.map_or("", |e| e.path.as_str()));
        let values = tree.append_child("values");
        for value in enumeration
            .into_iter()
            .flat_map(|e| &e.values)
            .filter(|v| !v.hidden && !v.spacer)
        {
            let entry = values.append_child("value");
            entry.append_escaped("name", value.name.as_str());
            entry.append_escaped("displayname", value.display_name.as_str());
            entry.append_escaped("description", value.tooltip.as_str());
        }
        append_meta(&mut tree, &self.resolver.resolve(&key));
        tree
    }

    pub fn delegate_doc(&self, signature_name: &str) -> DocTree {
        let id = delegate_identity(signature_name);
        let mut tree = DocTree::new();
        tree.append_escaped("id", id.as_str());
        tree.append_escaped("display_name", id.as_str());
        tree.append_value("context_string", self.context_string);
        if let Some(signature) = self.model.signature(signature_name) {
            tree.append_escaped(
                "signature",
                signature_string(&signature.name, &signature.params, signature.is_const, true),
            );
        }
        tree
    }

    /// Append the documentable fields of `key` and its ancestors to `fields`.
    /// Returns whether anything was appended.
    pub fn append_fields(
        &self,
        fields: &mut DocTree,
        key: &TypeKey,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        let mut any = false;
        let owners = std::iter::once(key.clone()).chain(self.resolver.ancestors(key));
        for (depth, owner) in owners.enumerate() {
            let inherited = depth > 0;
            for field in self.declared_fields(&owner) {
                if !field.is_documentable() {
                    debug!("skipping member : {}", field.name);
                    continue;
                }
                debug!("member found : {}::{}", owner.name, field.name);
                any = true;
                let documented = append_field(fields, field, inherited, self.model);
                // Inherited members are reported where they are declared.
                if !documented && !inherited {
                    diagnostics.report(format!(
                        "No doc for {} member: {}::{}",
                        kind_label(key.kind),
                        key.name,
                        field.name
                    ));
                }
            }
        }
        any
    }

    fn declared_fields(&self, key: &TypeKey) -> &[FieldDef] {
        let fields = match key.kind {
            TypeKind::Class => self.model.class(&key.name).map(|c| c.fields.as_slice()),
            TypeKind::Struct => self
                .model
                .script_struct(&key.name)
                .map(|s| s.fields.as_slice()),
            TypeKind::Enum => None,
        };
        fields.unwrap_or(&[])
    }
}

fn kind_label(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Class => "class",
        TypeKind::Struct => "struct",
        TypeKind::Enum => "enum",
    }
}

fn is_true(value: Option<&String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Native access flags, overridden by blueprint access metadata.
pub fn field_access(field: &FieldDef) -> &'static str {
    let mut access = match field.native_access {
        Access::Private => "private",
        Access::Protected => "protected",
        Access::Public | Access::Unspecified => "public",
    };
    if is_true(field.metadata.get("BlueprintPrivate")) {
        access = "private";
    } else if is_true(field.metadata.get("BlueprintProtected")) {
        access = "protected";
    }
    access
}

/// Append one `field` entry. Returns whether the field carries a doc comment.
fn append_field(fields: &mut DocTree, field: &FieldDef, inherited: bool, model: &dyn ObjectModel) -> bool {
    let entry = fields.append_child("field");
    entry.append_escaped("name", field.name.as_str());
    entry.append_escaped("type", field.cpp_type.as_str());
    if field.deprecated {
        let message = field
            .metadata
            .get("DeprecationMessage")
            .map_or("", String::as_str);
        entry.append_escaped("deprecated", message);
    }
    append_meta(entry, &field.metadata);
    entry.append_flag("inherited", inherited);
    entry.append_flag("instance_editable", !field.disable_edit_on_instance);
    entry.append_value("access_specifier", field_access(field));
    entry.append_flag("blueprint_visible", field.blueprint_visible);
    if let Some(signature) = field
        .multicast_delegate
        .as_deref()
        .and_then(|s| model.signature(s))
    {
        entry.append_escaped(
            "delegate_signature",
            signature_string(&signature.name, &signature.params, signature.is_const, true),
        );
    }
    doxygen::append_doxygen(entry, field.comment()) || !field.comment().is_empty()
}

/// Index row for a newly registered owner.
pub fn index_row(id: &Identity, display_name: &str) -> DocTree {
    let mut row = DocTree::new();
    row.append_escaped("id", id.as_str());
    row.append_escaped("display_name", display_name);
    row
}
