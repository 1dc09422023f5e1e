//! Inclusion policy applied to every source item before any document work.

use crate::source::{Access, ConstructKind, NodeKind, ObjectModel, SourceItem};

/// What the items being enumerated are scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every item reachable from a whole class.
    WholeClass,
    /// Items owned by one source object (a blueprint asset).
    SourceObject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Include,
    Exclude(&'static str),
}

/// Function metadata that marks an implicit conversion.
const EXCLUDED_FUNCTION_META: &[&str] = &["BlueprintAutocast"];

pub fn classify(item: &SourceItem, scope: Scope, model: &dyn ObjectModel) -> Verdict {
    match item.construct {
        ConstructKind::Variable => return Verdict::Exclude("variable accessor"),
        ConstructKind::DelegateBinding => return Verdict::Exclude("delegate binding"),
        ConstructKind::Component => return Verdict::Exclude("component spawner"),
        ConstructKind::BoundObject => return Verdict::Exclude("bound object"),
        ConstructKind::Event if scope == Scope::SourceObject => {
            return Verdict::Exclude("event in source-object scope")
        }
        _ => {}
    }

    match item.node_kind {
        NodeKind::DynamicCast => return Verdict::Exclude("dynamic cast"),
        NodeKind::Message => return Verdict::Exclude("message dispatch"),
        NodeKind::AnimGraph => return Verdict::Exclude("anim graph node"),
        _ => {}
    }

    if item.construct == ConstructKind::Function {
        // An unresolved function is not excluded here; the node is emitted
        // with best-effort fields and a warning.
        if let Some(function) = item.function.as_deref().and_then(|f| model.function(f)) {
            let public_facing = matches!(function.access, Access::Public | Access::Protected);
            if !function.blueprint_event && !public_facing {
                return Verdict::Exclude("not public or protected");
            }
            if EXCLUDED_FUNCTION_META
                .iter()
                .any(|meta| function.metadata.contains_key(*meta))
            {
                return Verdict::Exclude("implicit conversion");
            }
        }
    }

    Verdict::Include
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::snapshot::ModelSnapshot;
    use std::path::PathBuf;

    fn model() -> ModelSnapshot {
        ModelSnapshot::from_json_str(
            r#"{ "functions": [
                { "name": "Add", "owner": "Math", "access": "public" },
                { "name": "Helper", "owner": "Math", "access": "private" },
                { "name": "OnTick", "owner": "Actor", "blueprint_event": true },
                { "name": "ToText", "owner": "Math", "access": "public",
                  "metadata": { "BlueprintAutocast": "" } }
            ] }"#,
            &PathBuf::from("model.json"),
        )
        .unwrap()
    }

    fn item(construct: ConstructKind, node_kind: NodeKind, function: Option<&str>) -> SourceItem {
        SourceItem {
            construct,
            node_kind,
            function: function.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn structural_constructs_are_excluded() {
        let model = model();
        for construct in [
            ConstructKind::Variable,
            ConstructKind::DelegateBinding,
            ConstructKind::Component,
            ConstructKind::BoundObject,
        ] {
            let verdict = classify(
                &item(construct, NodeKind::Generic, None),
                Scope::WholeClass,
                &model,
            );
            assert!(matches!(verdict, Verdict::Exclude(_)), "{construct:?}");
        }
    }

    #[test]
    fn events_excluded_only_in_source_object_scope() {
        let model = model();
        let event = item(ConstructKind::Event, NodeKind::Event, None);
        assert_eq!(classify(&event, Scope::WholeClass, &model), Verdict::Include);
        assert!(matches!(
            classify(&event, Scope::SourceObject, &model),
            Verdict::Exclude(_)
        ));
    }

    #[test]
    fn excluded_node_kinds() {
        let model = model();
        for kind in [NodeKind::DynamicCast, NodeKind::Message, NodeKind::AnimGraph] {
            let verdict = classify(&item(ConstructKind::Other, kind, None), Scope::WholeClass, &model);
            assert!(matches!(verdict, Verdict::Exclude(_)), "{kind:?}");
        }
    }

    #[test]
    fn function_access_rules() {
        let model = model();
        let check = |f: &str| {
            classify(
                &item(ConstructKind::Function, NodeKind::CallFunction, Some(f)),
                Scope::WholeClass,
                &model,
            )
        };
        assert_eq!(check("Math::Add"), Verdict::Include);
        assert_eq!(check("Math::Helper"), Verdict::Exclude("not public or protected"));
        assert_eq!(check("Actor::OnTick"), Verdict::Include);
        assert_eq!(check("Math::ToText"), Verdict::Exclude("implicit conversion"));
        assert_eq!(check("Math::Missing"), Verdict::Include);
    }
}
