//! Generic document tree: the in-memory form of every emitted document.
//!
//! A [`DocTree`] is an ordered list of named child slots. A name may appear
//! once (object semantics) or repeat (array semantics); serializers decide
//! which by counting occurrences, see [`DocTree::shape`]. A slot holds either a
//! nested container or a scalar leaf, never both, so the leaf/container
//! invariant is carried by the types. Construction is append-only.

use crate::error::{DocGenError, Result};
use crate::serialize::DocSerializer;

/// An ordered container of named children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocTree {
    children: Vec<(String, DocNode)>,
}

/// One child slot: either a nested container or a scalar leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Tree(DocTree),
    Value(Scalar),
}

/// A leaf value plus whether it must be escaped by the serializer.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub text: String,
    pub escape: bool,
}

/// How a container maps onto an encoding with objects and arrays.
#[derive(Debug)]
pub enum Shape<'a> {
    /// No children at all.
    Empty,
    /// One distinct name, repeated: the elements, in insertion order.
    Array(Vec<&'a DocNode>),
    /// Distinct names in first-occurrence order, each with every node bearing it.
    Object(Vec<(&'a str, Vec<&'a DocNode>)>),
}

impl DocTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty container named `name` and return it for filling.
    pub fn append_child(&mut self, name: impl Into<String>) -> &mut DocTree {
        self.children
            .push((name.into(), DocNode::Tree(DocTree::default())));
        match self.children.last_mut() {
            Some((_, DocNode::Tree(tree))) => tree,
            _ => unreachable!("a container was just appended"),
        }
    }

    /// Append a scalar leaf.
    pub fn append_child_with_value(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        escape: bool,
    ) -> &Scalar {
        self.children.push((
            name.into(),
            DocNode::Value(Scalar {
                text: value.into(),
                escape,
            }),
        ));
        match self.children.last() {
            Some((_, DocNode::Value(scalar))) => scalar,
            _ => unreachable!("a scalar was just appended"),
        }
    }

    /// Append a leaf that needs no escaping (flags, paths, identifiers).
    pub fn append_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.append_child_with_value(name, value, false);
    }

    /// Append a leaf holding free text that must be escaped.
    pub fn append_escaped(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.append_child_with_value(name, value, true);
    }

    /// Append a `"true"`/`"false"` leaf.
    pub fn append_flag(&mut self, name: impl Into<String>, flag: bool) {
        self.append_value(name, if flag { "true" } else { "false" });
    }

    /// Append an already-built subtree.
    pub fn append_tree(&mut self, name: impl Into<String>, tree: DocTree) {
        self.children.push((name.into(), DocNode::Tree(tree)));
    }

    /// Move every child of `other` to the end of this container.
    pub fn extend(&mut self, other: DocTree) {
        self.children.extend(other.children);
    }

    /// First child named `name`, by insertion order.
    pub fn find_child(&self, name: &str) -> Option<&DocNode> {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node)
    }

    /// Every child named `name`, in insertion order.
    pub fn find_all(&self, name: &str) -> Vec<&DocNode> {
        self.children
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, node)| node)
            .collect()
    }

    /// First container child named `name`, for appending into it.
    pub fn find_tree_mut(&mut self, name: &str) -> Option<&mut DocTree> {
        self.children.iter_mut().find_map(|(n, node)| match node {
            DocNode::Tree(tree) if *n == name => Some(tree),
            _ => None,
        })
    }

    /// Text of the first scalar child named `name`.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        match self.find_child(name)? {
            DocNode::Value(scalar) => Some(&scalar.text),
            DocNode::Tree(_) => None,
        }
    }

    /// Like [`value_of`](Self::value_of), for children the caller itself put there.
    pub fn require_value(&self, name: &str) -> Result<&str> {
        self.value_of(name)
            .ok_or_else(|| DocGenError::MissingChild(name.to_string()))
    }

    /// Like [`find_tree_mut`](Self::find_tree_mut), for containers the caller itself put there.
    pub fn require_tree_mut(&mut self, name: &str) -> Result<&mut DocTree> {
        self.find_tree_mut(name)
            .ok_or_else(|| DocGenError::MissingChild(name.to_string()))
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &DocNode)> {
        self.children.iter().map(|(n, node)| (n.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Group children by name for encodings that distinguish objects from arrays.
    ///
    /// A container with exactly one distinct name appearing more than once is an
    /// array; anything else is an object whose repeated names become arrays.
    pub fn shape(&self) -> Shape<'_> {
        let mut groups: Vec<(&str, Vec<&DocNode>)> = Vec::new();
        for (name, node) in &self.children {
            match groups.iter_mut().find(|(n, _)| *n == name.as_str()) {
                Some((_, nodes)) => nodes.push(node),
                None => groups.push((name.as_str(), vec![node])),
            }
        }

        match groups.len() {
            0 => Shape::Empty,
            1 if groups[0].1.len() > 1 => {
                let (_, nodes) = groups.remove(0);
                Shape::Array(nodes)
            }
            _ => Shape::Object(groups),
        }
    }

    pub fn serialize_with(&self, serializer: &mut dyn DocSerializer) {
        serializer.serialize_object(self);
    }
}

impl DocNode {
    pub fn as_tree(&self) -> Option<&DocTree> {
        match self {
            DocNode::Tree(tree) => Some(tree),
            DocNode::Value(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DocNode::Value(scalar) => Some(&scalar.text),
            DocNode::Tree(_) => None,
        }
    }

    pub fn serialize_with(&self, serializer: &mut dyn DocSerializer) {
        match self {
            DocNode::Tree(tree) => serializer.serialize_object(tree),
            DocNode::Value(scalar) => serializer.serialize_scalar(&scalar.text, scalar.escape),
        }
    }
}
