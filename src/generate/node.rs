//! Node documents: one per accepted source item.

use crate::entity::metadata::MetadataResolver;
use crate::entity::{delegate_identity, Identity};
use crate::generate::{append_meta, doxygen};
use crate::source::{
    Access, FunctionDef, ObjectModel, ParamDef, Pin, PinDirection, SourceItem, TypeKey,
};
use crate::tree::DocTree;
use tracing::warn;

/// Where a node is documented and what its document should point at.
pub struct NodeContext<'a> {
    pub docs_title: &'a str,
    pub class_id: &'a Identity,
    pub class_name: &'a str,
    /// Canonical name of the owning class, used for untyped self pins.
    pub owner_class: &'a str,
    /// `img/<file>` when a snapshot was rendered.
    pub imgpath: Option<&'a str>,
}

/// A built node document and the delegate signatures its parameters refer to.
#[derive(Debug)]
pub struct NodeDoc {
    pub tree: DocTree,
    pub delegates: Vec<String>,
}

/// Drop a trailing "Target is ..." clause, which only restates the owner.
pub fn strip_target_clause(text: &str) -> &str {
    match text.find("Target is ") {
        Some(idx) => text[..idx].trim_end(),
        None => text,
    }
}

pub fn access_specifier(access: Access) -> &'static str {
    match access {
        Access::Private => "private",
        Access::Protected => "protected",
        Access::Public => "public",
        Access::Unspecified => "unknown",
    }
}

/// `Ret Name(T a, U b) const`, or `Ret(T a, U b)` in function-pointer style.
pub fn signature_string(name: &str, params: &[ParamDef], is_const: bool, fn_ptr_style: bool) -> String {
    let ret = params
        .iter()
        .find(|p| p.is_return)
        .map_or("void", |p| p.cpp_type.as_str());
    let args = params
        .iter()
        .filter(|p| !p.is_return)
        .map(|p| format!("{} {}", p.cpp_type, p.name))
        .collect::<Vec<_>>()
        .join(", ");
    if fn_ptr_style {
        format!("{}({})", ret, args)
    } else {
        format!("{} {}({}){}", ret, name, args, if is_const { " const" } else { "" })
    }
}

/// A blueprint-generated class's function that its parent class already declares.
fn is_inherited(model: &dyn ObjectModel, resolver: &MetadataResolver, function: &FunctionDef) -> bool {
    let generated = model
        .class(&function.owner)
        .is_some_and(|c| c.generated_by.is_some());
    generated
        && resolver
            .ancestors(&TypeKey::class(&function.owner))
            .iter()
            .any(|a| model.function(&format!("{}::{}", a.name, function.name)).is_some())
}

fn pin_name(pin: &Pin) -> String {
    if !pin.display_name.is_empty() {
        return pin.display_name.clone();
    }
    if pin.is_exec {
        return match pin.direction {
            PinDirection::Input => "In".to_string(),
            PinDirection::Output => "Out".to_string(),
        };
    }
    pin.name.clone()
}

fn append_param(list: &mut DocTree, name: &str, type_name: &str, description: &str) {
    let param = list.append_child("param");
    param.append_escaped("name", name);
    param.append_escaped("type", type_name);
    param.append_escaped("description", description);
}

pub fn build_node_doc(
    model: &dyn ObjectModel,
    resolver: &MetadataResolver,
    item: &SourceItem,
    function: Option<&FunctionDef>,
    ctx: &NodeContext,
) -> NodeDoc {
    let node = &item.node;
    let mut tree = DocTree::new();
    let mut delegates = Vec::new();

    let full_title = strip_target_clause(&node.full_title);
    tree.append_escaped("docs_name", ctx.docs_title);
    tree.append_escaped("class_id", ctx.class_id.as_str());
    tree.append_escaped("class_name", ctx.class_name);
    tree.append_escaped("shorttitle", node.list_title.trim_end());
    tree.append_escaped("fulltitle", full_title);
    tree.append_escaped("description", strip_target_clause(&node.tooltip));
    if let Some(imgpath) = ctx.imgpath {
        tree.append_escaped("imgpath", imgpath);
    }
    tree.append_escaped("category", node.category.as_str());

    match function {
        Some(f) => {
            tree.append_escaped("funcname", f.name.as_str());
            tree.append_escaped("rawcomment", f.comment());
            tree.append_flag("inherited", is_inherited(model, resolver, f));
            tree.append_flag("static", f.is_static);
            tree.append_flag("blueprint_implementable", f.blueprint_event);
            tree.append_value("access_specifier", access_specifier(f.access));
            append_meta(&mut tree, &f.metadata);
            tree.append_flag("autocast", f.metadata.contains_key("BlueprintAutocast"));
            tree.append_escaped(
                "rawsignature",
                signature_string(&f.name, &f.params, f.is_const, false),
            );
            doxygen::append_doxygen(&mut tree, f.comment());
        }
        None if item.function.is_some() => {
            warn!("Failed to get target function for node {}", full_title);
        }
        None => {}
    }

    let inputs = tree.append_child("inputs");
    for pin in node
        .pins
        .iter()
        .filter(|p| p.direction == PinDirection::Input && !p.hidden)
    {
        let name = pin_name(pin);
        match function.and_then(|f| f.param(&pin.name)) {
            Some(ParamDef {
                delegate: Some(signature),
                ..
            }) => {
                let id = delegate_identity(signature);
                append_param(inputs, &name, id.as_str(), &pin.tooltip);
                delegates.push(signature.clone());
            }
            Some(param) => append_param(inputs, &param.name, &param.cpp_type, &pin.tooltip),
            None if pin.is_self => {
                let target = pin.object_type.as_deref().unwrap_or(ctx.owner_class);
                append_param(inputs, &name, target, "");
            }
            None => append_param(inputs, &name, &pin.type_text, &pin.tooltip),
        }
    }

    let outputs = tree.append_child("outputs");
    for pin in node
        .pins
        .iter()
        .filter(|p| p.direction == PinDirection::Output && !p.hidden)
    {
        append_param(outputs, &pin_name(pin), &pin.type_text, &pin.tooltip);
    }

    NodeDoc { tree, delegates }
}
