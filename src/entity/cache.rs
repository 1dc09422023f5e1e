//! Identity-keyed arena of entity documents, owned by one generation run.

use crate::entity::{EntityDocument, EntityKind, Identity};
use crate::tree::DocTree;
use std::collections::HashMap;

/// At most one document per `(kind, identity)`, kept in discovery order.
#[derive(Debug, Default)]
pub struct EntityCache {
    documents: Vec<EntityDocument>,
    slots: HashMap<(EntityKind, Identity), usize>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached document, building it with `build` on first request.
    ///
    /// The flag is `true` when this call inserted the document. `build` runs
    /// at most once per key for the lifetime of the cache.
    pub fn get_or_build(
        &mut self,
        kind: EntityKind,
        identity: &Identity,
        build: impl FnOnce() -> DocTree,
    ) -> (&mut EntityDocument, bool) {
        let key = (kind, identity.clone());
        if let Some(&slot) = self.slots.get(&key) {
            return (&mut self.documents[slot], false);
        }

        let slot = self.documents.len();
        self.documents.push(EntityDocument {
            kind,
            identity: identity.clone(),
            tree: build(),
        });
        self.slots.insert(key, slot);
        (&mut self.documents[slot], true)
    }

    /// Insert an already-built document. Returns `false`, leaving the cache
    /// unchanged, if the key is taken.
    pub fn insert(&mut self, document: EntityDocument) -> bool {
        let key = (document.kind, document.identity.clone());
        if self.slots.contains_key(&key) {
            return false;
        }
        self.slots.insert(key, self.documents.len());
        self.documents.push(document);
        true
    }

    pub fn get(&self, kind: EntityKind, identity: &Identity) -> Option<&EntityDocument> {
        self.slots
            .get(&(kind, identity.clone()))
            .map(|&slot| &self.documents[slot])
    }

    pub fn get_mut(&mut self, kind: EntityKind, identity: &Identity) -> Option<&mut EntityDocument> {
        let slot = *self.slots.get(&(kind, identity.clone()))?;
        Some(&mut self.documents[slot])
    }

    pub fn contains(&self, kind: EntityKind, identity: &Identity) -> bool {
        self.slots.contains_key(&(kind, identity.clone()))
    }

    /// Every document in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityDocument> {
        self.documents.iter()
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntityDocument> {
        self.documents.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> DocTree {
        let mut tree = DocTree::new();
        tree.append_value("id", id);
        tree
    }

    #[test]
    fn builder_runs_once_per_identity() {
        let mut cache = EntityCache::new();
        let id = Identity::new("Foo");
        let mut calls = 0;

        for _ in 0..5 {
            let (document, _) = cache.get_or_build(EntityKind::Class, &id, || {
                calls += 1;
                doc("Foo")
            });
            assert_eq!(document.tree.value_of("id"), Some("Foo"));
        }

        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn insertion_flag_marks_first_build() {
        let mut cache = EntityCache::new();
        let id = Identity::new("Foo");
        assert!(cache.get_or_build(EntityKind::Class, &id, || doc("Foo")).1);
        assert!(!cache.get_or_build(EntityKind::Class, &id, || doc("Foo")).1);
    }

    #[test]
    fn cached_document_is_returned_unchanged() {
        let mut cache = EntityCache::new();
        let id = Identity::new("Foo");
        cache
            .get_or_build(EntityKind::Class, &id, || doc("Foo"))
            .0
            .tree
            .append_child("nodes");

        let (document, built) =
            cache.get_or_build(EntityKind::Class, &id, || doc("Replacement"));
        assert!(!built);
        assert_eq!(document.tree.value_of("id"), Some("Foo"));
        assert_eq!(document.tree.len(), 2);
    }

    #[test]
    fn same_identity_different_kind_is_distinct() {
        let mut cache = EntityCache::new();
        let id = Identity::new("Hit");
        cache.get_or_build(EntityKind::Struct, &id, || doc("Hit"));
        cache.get_or_build(EntityKind::Delegate, &id, || doc("Hit"));
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(EntityKind::Delegate, &id));
        assert!(!cache.contains(EntityKind::Class, &id));
    }

    #[test]
    fn iteration_follows_discovery_order() {
        let mut cache = EntityCache::new();
        for name in ["Zed", "Alpha", "Mid"] {
            cache.get_or_build(EntityKind::Enum, &Identity::new(name), || doc(name));
        }
        cache.get_or_build(EntityKind::Class, &Identity::new("Other"), || doc("Other"));
        let ids: Vec<&str> = cache
            .of_kind(EntityKind::Enum)
            .map(|d| d.identity.as_str())
            .collect();
        assert_eq!(ids, ["Zed", "Alpha", "Mid"]);
    }

    #[test]
    fn insert_refuses_duplicates() {
        let mut cache = EntityCache::new();
        let document = EntityDocument {
            kind: EntityKind::Struct,
            identity: Identity::new("Vec"),
            tree: doc("Vec"),
        };
        assert!(cache.insert(document.clone()));
        assert!(!cache.insert(document));
        assert_eq!(cache.len(), 1);
    }
}
