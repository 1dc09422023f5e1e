//! Consolidation phase: resolve the index and the intermediate documents into
//! one aggregate and collect node images into the output tree.

use crate::error::{DocGenError, Result, Stage};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const NODE_KEYS: &[&str] = &[
    "inputs",
    "outputs",
    "rawsignature",
    "class_id",
    "doxygen",
    "imgpath",
    "shorttitle",
    "fulltitle",
    "description",
    "static",
    "autocast",
    "funcname",
    "access_specifier",
    "meta",
];

/// Header keys kept for classes and structs.
const OWNER_KEYS: &[&str] = &[
    "doxygen",
    "display_name",
    "parent_class",
    "meta",
    "blueprint_generated",
    "widget_blueprint",
    "class_path",
    "context_string",
];

const ENUM_KEYS: &[&str] = &["id", "doxygen", "display_name", "meta"];

/// Rows of a repeated-child container, whatever shape the serializer gave it:
/// `null` when empty, `{row: {...}}` for a single row, an array otherwise.
fn entries<'v>(value: Option<&'v Value>, row: &str) -> Vec<&'v Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) if map.contains_key(row) => entries(map.get(row), row),
        Some(other) => vec![other],
    }
}

/// Like [`entries`], cloned into an array value.
fn array_of(value: Option<&Value>, row: &str) -> Value {
    Value::Array(entries(value, row).into_iter().cloned().collect())
}

fn is_true(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

fn project(source: &Value, keys: &[&str]) -> Map<String, Value> {
    keys.iter()
        .filter_map(|&key| Some((key.to_string(), source.get(key)?.clone())))
        .collect()
}

struct Consolidator<'p> {
    stage: &'p Path,
    image_dir: PathBuf,
}

impl Consolidator<'_> {
    fn read(&self, path: &Path) -> Result<Value> {
        let text = fs::read_to_string(path).map_err(|source| DocGenError::Read {
            stage: Stage::Consolidate,
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| DocGenError::Parse {
            stage: Stage::Consolidate,
            path: path.to_path_buf(),
            source,
        })
    }

    fn id_of<'v>(&self, row: &'v Value, path: &Path) -> Result<&'v str> {
        row.get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DocGenError::Malformed {
                stage: Stage::Consolidate,
                path: path.to_path_buf(),
                reason: "entry without an id".to_string(),
            })
    }

    fn entity(&self, id: &str) -> Result<Value> {
        self.read(&self.stage.join(id).join(format!("{}.json", id)))
    }

    fn copy_image(&self, class_id: &str, imgpath: &str) -> Result<()> {
        let from = self.stage.join(class_id).join(imgpath);
        let file = Path::new(imgpath).file_name().unwrap_or_default();
        let to = self.image_dir.join(file);
        debug!("copying {} to {}", from.display(), to.display());
        fs::copy(&from, &to).map_err(|source| DocGenError::Copy {
            stage: Stage::Consolidate,
            from,
            to: to.clone(),
            source,
        })?;
        Ok(())
    }

    /// Resolve one class. Returns the class object and its static nodes.
    fn class(&self, id: &str) -> Result<(Value, Vec<Value>)> {
        let doc = self.entity(id)?;
        let doc_path = self.stage.join(id).join(format!("{}.json", id));
        let mut functions = Vec::new();
        let mut statics = Vec::new();

        for row in entries(doc.get("nodes"), "node") {
            let node_id = self.id_of(row, &doc_path)?;
            let node = self.read(&self.stage.join(id).join("nodes").join(format!("{}.json", node_id)))?;
            if let Some(imgpath) = node.get("imgpath").and_then(Value::as_str).filter(|p| !p.is_empty()) {
                self.copy_image(id, imgpath)?;
            }
            let projected = Value::Object(project(&node, NODE_KEYS));
            if is_true(node.get("static")) {
                statics.push(projected);
            } else {
                functions.push(projected);
            }
        }

        let mut class = Map::new();
        class.insert("functions".to_string(), Value::Array(functions));
        class.insert("class_id".to_string(), Value::String(id.to_string()));
        class.extend(project(&doc, OWNER_KEYS));
        class.insert("fields".to_string(), array_of(doc.get("fields"), "field"));
        Ok((Value::Object(class), statics))
    }

    fn script_struct(&self, id: &str) -> Result<Value> {
        let doc = self.entity(id)?;
        let mut projected = Map::new();
        projected.insert("class_id".to_string(), Value::String(id.to_string()));
        projected.extend(project(&doc, OWNER_KEYS));
        projected.insert("fields".to_string(), array_of(doc.get("fields"), "field"));
        Ok(Value::Object(projected))
    }

    fn enumeration(&self, id: &str) -> Result<Value> {
        let doc = self.entity(id)?;
        let mut projected = project(&doc, ENUM_KEYS);
        projected.insert("values".to_string(), array_of(doc.get("values"), "value"));
        Ok(Value::Object(projected))
    }
}

/// Build `<stage>/consolidated.json` from the index and intermediate files
/// under `stage`, copying node images into `<output>/img`.
///
/// Any unreadable document or failed copy aborts the whole phase.
pub fn consolidate(stage: &Path, output: &Path) -> Result<Value> {
    let index_path = stage.join("index.json");
    let cx = Consolidator {
        stage,
        image_dir: output.join("img"),
    };
    let index = cx.read(&index_path)?;
    fs::create_dir_all(&cx.image_dir).map_err(|source| DocGenError::Write {
        stage: Stage::Consolidate,
        path: cx.image_dir.clone(),
        source,
    })?;

    let group = |name: &str| {
        index.get(name).ok_or_else(|| DocGenError::Malformed {
            stage: Stage::Consolidate,
            path: index_path.clone(),
            reason: format!("missing `{}`", name),
        })
    };
    let (class_rows, struct_rows, enum_rows) = (group("classes")?, group("structs")?, group("enums")?);

    let mut functions = Vec::new();
    let mut classes = Map::new();
    for row in entries(Some(class_rows), "class") {
        let id = cx.id_of(row, &index_path)?;
        let (class, statics) = cx.class(id)?;
        functions.extend(statics);
        classes.insert(id.to_string(), class);
    }

    let structs = entries(Some(struct_rows), "struct")
        .into_iter()
        .map(|row| cx.script_struct(cx.id_of(row, &index_path)?))
        .collect::<Result<Vec<_>>>()?;
    let enums = entries(Some(enum_rows), "enum")
        .into_iter()
        .map(|row| cx.enumeration(cx.id_of(row, &index_path)?))
        .collect::<Result<Vec<_>>>()?;

    let mut consolidated = Map::new();
    if let Some(display_name) = index.get("display_name") {
        consolidated.insert("display_name".to_string(), display_name.clone());
    }
    info!(
        "Consolidated {} classes, {} structs, {} enums, {} static functions",
        classes.len(),
        structs.len(),
        enums.len(),
        functions.len()
    );
    consolidated.insert("functions".to_string(), Value::Array(functions));
    consolidated.insert("classes".to_string(), Value::Object(classes));
    consolidated.insert("structs".to_string(), Value::Array(structs));
    consolidated.insert("enums".to_string(), Value::Array(enums));
    let consolidated = Value::Object(consolidated);

    let path = stage.join("consolidated.json");
    let mut text = serde_json::to_string_pretty(&consolidated).map_err(|source| DocGenError::Write {
        stage: Stage::Consolidate,
        path: path.clone(),
        source: source.into(),
    })?;
    text.push('\n');
    fs::write(&path, text).map_err(|source| DocGenError::Write {
        stage: Stage::Consolidate,
        path,
        source,
    })?;
    Ok(consolidated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_json(path: &Path, value: Value) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    /// Stage with class Foo holding an instance node Add and a static node Negate.
    fn stage() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_json(
            &root.join("index.json"),
            json!({
                "display_name": "Docs",
                "classes": { "class": { "id": "Foo", "display_name": "Foo" } },
                "structs": null,
                "enums": [
                    { "id": "EA", "display_name": "EA" },
                    { "id": "EB", "display_name": "EB" }
                ],
                "delegates": null
            }),
        );
        write_json(
            &root.join("Foo/Foo.json"),
            json!({
                "id": "Foo",
                "docs_name": "Docs",
                "display_name": "Foo",
                "blueprint_generated": "true",
                "widget_blueprint": "false",
                "meta": null,
                "class_path": "/Game/Foo.Foo_C",
                "context_string": "/Game",
                "nodes": [
                    { "id": "Add", "shorttitle": "Add" },
                    { "id": "Negate", "shorttitle": "Negate" }
                ],
                "fields": { "field": { "name": "Width" } }
            }),
        );
        write_json(
            &root.join("Foo/nodes/Add.json"),
            json!({ "class_id": "Foo", "shorttitle": "Add", "static": "false", "category": "Math" }),
        );
        write_json(
            &root.join("Foo/nodes/Negate.json"),
            json!({ "class_id": "Foo", "shorttitle": "Negate", "static": "true" }),
        );
        write_json(&root.join("EA/EA.json"), json!({ "id": "EA", "values": null }));
        write_json(
            &root.join("EB/EB.json"),
            json!({ "id": "EB", "values": { "value": { "name": "One" } } }),
        );
        dir
    }

    #[test]
    fn static_nodes_are_lifted_to_top_level() {
        let stage = stage();
        let out = TempDir::new().unwrap();
        let doc = consolidate(stage.path(), out.path()).unwrap();

        assert_eq!(doc["display_name"], "Docs");
        assert_eq!(doc["functions"].as_array().unwrap().len(), 1);
        assert_eq!(doc["functions"][0]["shorttitle"], "Negate");
        let foo = &doc["classes"]["Foo"];
        assert_eq!(foo["functions"].as_array().unwrap().len(), 1);
        assert_eq!(foo["functions"][0]["shorttitle"], "Add");
        assert!(foo["functions"][0].get("category").is_none());
        assert_eq!(foo["fields"], json!([{ "name": "Width" }]));
        assert_eq!(doc["structs"], json!([]));
    }

    #[test]
    fn class_header_keys_survive() {
        let stage = stage();
        let out = TempDir::new().unwrap();
        let doc = consolidate(stage.path(), out.path()).unwrap();
        let foo = &doc["classes"]["Foo"];
        assert_eq!(foo["class_id"], "Foo");
        assert_eq!(foo["blueprint_generated"], "true");
        assert_eq!(foo["widget_blueprint"], "false");
        assert_eq!(foo["class_path"], "/Game/Foo.Foo_C");
        assert_eq!(foo["context_string"], "/Game");
        assert!(foo["meta"].is_null());
        assert!(foo.get("docs_name").is_none());
        assert!(foo.get("nodes").is_none());
    }

    #[test]
    fn enum_order_and_values_follow_index() {
        let stage = stage();
        let out = TempDir::new().unwrap();
        let doc = consolidate(stage.path(), out.path()).unwrap();
        assert_eq!(doc["enums"][0]["id"], "EA");
        assert_eq!(doc["enums"][0]["values"], json!([]));
        assert_eq!(doc["enums"][1]["values"], json!([{ "name": "One" }]));
    }

    #[test]
    fn output_is_deterministic() {
        let stage = stage();
        let out = TempDir::new().unwrap();
        consolidate(stage.path(), out.path()).unwrap();
        let first = fs::read(stage.path().join("consolidated.json")).unwrap();
        consolidate(stage.path(), out.path()).unwrap();
        let second = fs::read(stage.path().join("consolidated.json")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn images_are_copied_and_missing_ones_fail() {
        let stage = stage();
        let out = TempDir::new().unwrap();
        write_json(
            &stage.path().join("Foo/nodes/Add.json"),
            json!({ "class_id": "Foo", "imgpath": "img/nd_img_Foo_Add.png", "static": false }),
        );
        let err = consolidate(stage.path(), out.path()).unwrap_err();
        assert!(matches!(err, DocGenError::Copy { .. }));

        fs::create_dir_all(stage.path().join("Foo/img")).unwrap();
        fs::write(stage.path().join("Foo/img/nd_img_Foo_Add.png"), b"png").unwrap();
        consolidate(stage.path(), out.path()).unwrap();
        assert_eq!(fs::read(out.path().join("img/nd_img_Foo_Add.png")).unwrap(), b"png");
    }

    #[test]
    fn unreadable_node_aborts() {
        let stage = stage();
        let out = TempDir::new().unwrap();
        fs::write(stage.path().join("Foo/nodes/Add.json"), "{ not json").unwrap();
        let err = consolidate(stage.path(), out.path()).unwrap_err();
        assert!(matches!(err, DocGenError::Parse { stage: Stage::Consolidate, .. }));
    }

    #[test]
    fn rows_without_id_are_malformed() {
        let stage = stage();
        let out = TempDir::new().unwrap();
        write_json(
            &stage.path().join("index.json"),
            json!({ "classes": [{ "display_name": "Nameless" }, { "id": "Foo" }], "structs": null, "enums": null }),
        );
        let err = consolidate(stage.path(), out.path()).unwrap_err();
        assert!(matches!(err, DocGenError::Malformed { .. }));
    }

    #[test]
    fn missing_group_is_malformed() {
        let stage = stage();
        let out = TempDir::new().unwrap();
        write_json(&stage.path().join("index.json"), json!({ "classes": null }));
        assert!(matches!(
            consolidate(stage.path(), out.path()),
            Err(DocGenError::Malformed { reason, .. }) if reason == "missing `structs`"
        ));
    }
}
