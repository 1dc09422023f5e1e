//! Metadata inheritance and display-name resolution over the ancestor chain.

use crate::entity::{class_identity, Identity};
use crate::source::{MetadataMap, ObjectModel, TypeKey, TypeKind};
use crate::tree::DocTree;
use std::collections::HashSet;

const DISPLAY_NAME: &str = "DisplayName";

pub struct MetadataResolver<'m> {
    model: &'m dyn ObjectModel,
}

impl<'m> MetadataResolver<'m> {
    pub fn new(model: &'m dyn ObjectModel) -> Self {
        Self { model }
    }

    /// Ancestors of `key`, nearest first. Stops on the first repeated type.
    pub fn ancestors(&self, key: &TypeKey) -> Vec<TypeKey> {
        let mut seen = HashSet::from([key.clone()]);
        let mut chain = Vec::new();
        let mut current = self.model.ancestor(key);
        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                break;
            }
            current = self.model.ancestor(&parent);
            chain.push(parent);
        }
        chain
    }

    /// Own metadata, then each ancestor's filling only keys not yet present.
    pub fn resolve(&self, key: &TypeKey) -> MetadataMap {
        let mut resolved = self.model.metadata(key);
        for ancestor in self.ancestors(key) {
            for (name, value) in self.model.metadata(&ancestor) {
                resolved.entry(name).or_insert(value);
            }
        }
        resolved
    }

    /// Identity a type is documented under.
    pub fn identity(&self, key: &TypeKey) -> Identity {
        match key.kind {
            TypeKind::Class => class_identity(self.model, &key.name),
            TypeKind::Struct | TypeKind::Enum => Identity::new(&key.name),
        }
    }

    /// Explicit `DisplayName` metadata, else a name cleaned up per kind.
    pub fn display_name(&self, key: &TypeKey) -> String {
        if let Some(name) = self
            .model
            .metadata(key)
            .remove(DISPLAY_NAME)
            .filter(|n| !n.is_empty())
        {
            return name;
        }
        match key.kind {
            TypeKind::Class => clean_class_name(&key.name).to_string(),
            TypeKind::Struct => display_string(&key.name),
            TypeKind::Enum => key.name.clone(),
        }
    }

    /// Append a nested `parent_class` chain to `tree`, one level per ancestor,
    /// each with its own `id` and `display_name`.
    pub fn append_parent_chain(&self, tree: &mut DocTree, key: &TypeKey) {
        let mut level = tree;
        for ancestor in self.ancestors(key) {
            level = level.append_child("parent_class");
            level.append_escaped("id", self.identity(&ancestor).as_str());
            level.append_escaped("display_name", self.display_name(&ancestor));
        }
    }
}

/// Strip the generated-class suffix and skeleton prefix.
pub fn clean_class_name(name: &str) -> &str {
    let name = name.strip_suffix("_C").unwrap_or(name);
    name.strip_prefix("SKEL_").unwrap_or(name)
}

/// `MyHTTPRequest2` becomes `My HTTP Request 2`.
pub fn display_string(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !out.ends_with(' ') && !out.is_empty() {
                out.push(' ');
            }
            continue;
        }
        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next = chars.get(i + 1).copied();
            let boundary = (c.is_uppercase() && prev.is_lowercase())
                || (c.is_uppercase()
                    && prev.is_uppercase()
                    && next.is_some_and(char::is_lowercase))
                || (c.is_ascii_digit() && prev.is_alphabetic());
            if boundary && !out.ends_with(' ') {
                out.push(' ');
            }
        }
        if out.is_empty() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out.trim_end().to_string()
}
