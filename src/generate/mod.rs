//! Generation phase: source items in, intermediate documents out.
//!
//! Items of one source object are classified and built in parallel on a
//! rayon pool; every cache, index and disk mutation happens afterwards on
//! the calling thread, one item at a time and in item order.

pub mod diagnostics;
pub mod doxygen;
pub mod filter;
pub mod members;
pub mod node;

use crate::entity::cache::EntityCache;
use crate::entity::metadata::MetadataResolver;
use crate::entity::{delegate_identity, EntityDocument, EntityKind, EntityRef, Identity};
use crate::error::{DocGenError, Result, Stage};
use crate::render::RenderHandle;
use crate::serialize::{write_document, OutputFormat};
use crate::source::catalog::SourceCatalog;
use crate::source::{
    ConstructKind, MetadataMap, NodeKind, ObjectModel, SourceItem, SourceKind, SourceObject,
    TypeKey, TypeKind,
};
use crate::tree::DocTree;
use diagnostics::Diagnostics;
use filter::{Scope, Verdict};
use members::DocContext;
use node::{NodeContext, NodeDoc};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Append a `meta` container with one escaped child per entry.
pub(crate) fn append_meta(tree: &mut DocTree, metadata: &MetadataMap) {
    let meta = tree.append_child("meta");
    for (key, value) in metadata {
        meta.append_escaped(key.as_str(), value.as_str());
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Documentation title, recorded as `docs_name` and the index display name.
    pub title: String,
    pub formats: Vec<OutputFormat>,
    /// Worker threads; 0 lets rayon decide.
    pub threads: usize,
    /// Largest accepted snapshot edge in pixels; 0 disables the check.
    pub max_image_size: u32,
    pub teamcity: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            title: "Node Reference".to_string(),
            formats: vec![OutputFormat::Json],
            threads: 0,
            max_image_size: 1024,
            teamcity: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Skipped(&'static str),
    Produced(Identity),
}

#[derive(Debug)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    pub nodes: usize,
    pub skipped: usize,
    pub classes: usize,
    pub structs: usize,
    pub enums: usize,
    pub delegates: usize,
    pub diagnostics: Vec<String>,
}

/// A node built off-thread, waiting to be committed.
struct PreparedNode {
    owner: String,
    class_id: Identity,
    identity: Identity,
    short_title: String,
    doc: NodeDoc,
    image: Option<(String, Vec<u8>)>,
}

enum Prepared {
    Skip(&'static str),
    /// An event: only its owning class is documented.
    Owner { owner: String, class_id: Identity },
    Node(Box<PreparedNode>),
}

pub struct Generator<'m> {
    model: &'m dyn ObjectModel,
    resolver: MetadataResolver<'m>,
    options: GeneratorOptions,
    stage_dir: PathBuf,
    context: String,
    cache: EntityCache,
    index: DocTree,
    emitted: HashSet<(Identity, Identity)>,
    members_done: HashSet<TypeKey>,
    renderer: Option<RenderHandle>,
    pool: rayon::ThreadPool,
    diagnostics: Diagnostics,
    nodes: usize,
    skipped: usize,
}

/// Insert a document on first request and give it an index row.
fn register<'c>(
    cache: &'c mut EntityCache,
    index: &mut DocTree,
    kind: EntityKind,
    identity: &Identity,
    build: impl FnOnce() -> DocTree,
) -> Result<&'c mut EntityDocument> {
    let (document, inserted) = cache.get_or_build(kind, identity, build);
    if inserted {
        debug!("registered {} {}", kind, identity);
        if let Some((group, row)) = kind.index_group() {
            let display_name = document
                .tree
                .value_of("display_name")
                .unwrap_or(identity.as_str());
            index
                .require_tree_mut(group)?
                .append_tree(row, members::index_row(identity, display_name));
        }
    }
    Ok(document)
}

fn scope_of(source: &SourceObject) -> Scope {
    match source.kind {
        SourceKind::Class | SourceKind::Struct | SourceKind::Enum => Scope::WholeClass,
        SourceKind::Blueprint | SourceKind::AnimBlueprint => Scope::SourceObject,
    }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_err = |source| DocGenError::Write {
        stage: Stage::Generate,
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, bytes).map_err(write_err)
}

impl<'m> Generator<'m> {
    /// Start a run writing node documents under `stage_dir`.
    pub fn init(
        model: &'m dyn ObjectModel,
        stage_dir: impl Into<PathBuf>,
        mut options: GeneratorOptions,
    ) -> Result<Self> {
        if !options.formats.contains(&OutputFormat::Json) {
            warn!("json output is required for consolidation; adding it");
            options.formats.insert(0, OutputFormat::Json);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads)
            .thread_name(|i| format!("nodedocs-worker-{}", i))
            .build()?;

        let mut index = DocTree::new();
        index.append_escaped("display_name", options.title.as_str());
        for kind in [
            EntityKind::Class,
            EntityKind::Struct,
            EntityKind::Enum,
            EntityKind::Delegate,
        ] {
            if let Some((group, _)) = kind.index_group() {
                index.append_child(group);
            }
        }

        Ok(Self {
            model,
            resolver: MetadataResolver::new(model),
            diagnostics: Diagnostics::new(options.teamcity),
            options,
            stage_dir: stage_dir.into(),
            context: String::new(),
            cache: EntityCache::new(),
            index,
            emitted: HashSet::new(),
            members_done: HashSet::new(),
            renderer: None,
            pool,
            nodes: 0,
            skipped: 0,
        })
    }

    pub fn with_renderer(mut self, renderer: RenderHandle) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn index(&self) -> &DocTree {
        &self.index
    }

    /// Drain `catalog`, processing every object it hands out.
    pub fn run(&mut self, catalog: &mut dyn SourceCatalog) -> Result<()> {
        self.context = catalog.context_string();
        info!(
            "Generating node docs for {} objects in '{}'",
            catalog.estimated_size(),
            self.context
        );
        while let Some(object) = catalog.next() {
            self.process_object(&object)?;
            debug!(
                "processed {} ({:.0}%)",
                object.name,
                catalog.progress() * 100.0
            );
        }
        info!(
            "Generated {} nodes, skipped {} items",
            self.nodes, self.skipped
        );
        Ok(())
    }

    /// Process every item of `source`, then document its own type's members.
    pub fn process_object(&mut self, source: &SourceObject) -> Result<()> {
        let scope = scope_of(source);
        let prepared: Vec<Prepared> = {
            let this = &*self;
            this.pool.install(|| {
                source
                    .items
                    .par_iter()
                    .map(|item| this.prepare(item, source, scope))
                    .collect()
            })
        };
        for prepared in prepared {
            self.commit(prepared)?;
        }

        if let Some(key) = source.member_type() {
            self.generate_type_members(&key)?;
        }
        Ok(())
    }

    /// Process a single item of `source`.
    pub fn process_item(&mut self, item: &SourceItem, source: &SourceObject) -> Result<ItemOutcome> {
        let prepared = self.prepare(item, source, scope_of(source));
        self.commit(prepared)
    }

    /// Classification and document construction. Touches no shared state
    /// beyond the render handle.
    fn prepare(&self, item: &SourceItem, source: &SourceObject, scope: Scope) -> Prepared {
        if let Verdict::Exclude(reason) = filter::classify(item, scope, self.model) {
            return Prepared::Skip(reason);
        }
        let is_event = item.construct == ConstructKind::Event || item.node_kind == NodeKind::Event;
        if !is_event && item.node.doc_id.is_empty() {
            return Prepared::Skip("no documentation id");
        }

        let function = item.function.as_deref().and_then(|f| self.model.function(f));
        let owner = match function.map(|f| f.owner.as_str()).or_else(|| source.own_class()) {
            Some(owner) => owner.to_string(),
            None => return Prepared::Skip("no owning class"),
        };
        let key = TypeKey::class(&owner);
        let class_id = self.resolver.identity(&key);
        if is_event {
            return Prepared::Owner { owner, class_id };
        }
        let class_name = self.resolver.display_name(&key);
        let identity = Identity::new(&item.node.doc_id);

        let image = self.render_image(&class_id, &identity);
        let imgpath = image.as_ref().map(|(file, _)| format!("img/{}", file));
        let ctx = NodeContext {
            docs_title: &self.options.title,
            class_id: &class_id,
            class_name: &class_name,
            owner_class: &owner,
            imgpath: imgpath.as_deref(),
        };
        let doc = node::build_node_doc(self.model, &self.resolver, item, function, &ctx);

        Prepared::Node(Box::new(PreparedNode {
            short_title: item.node.list_title.trim_end().to_string(),
            owner,
            class_id,
            identity,
            doc,
            image,
        }))
    }

    /// Snapshot for a node; a failed render only costs the image.
    fn render_image(&self, class_id: &Identity, node: &Identity) -> Option<(String, Vec<u8>)> {
        let renderer = self.renderer.as_ref()?;
        let handle = format!("{}/{}", class_id, node);
        match renderer.render(&handle, self.options.max_image_size) {
            Ok(bytes) => Some((format!("nd_img_{}_{}.png", class_id, node), bytes)),
            Err(e) => {
                warn!("Failed to save snapshot image for node {}: {}", handle, e);
                None
            }
        }
    }

    fn doc_context(&self) -> DocContext<'_, 'm> {
        DocContext {
            model: self.model,
            resolver: &self.resolver,
            docs_title: &self.options.title,
            context_string: &self.context,
        }
    }

    fn commit(&mut self, prepared: Prepared) -> Result<ItemOutcome> {
        let node = match prepared {
            Prepared::Skip(reason) => {
                self.skipped += 1;
                debug!("skipping item: {}", reason);
                return Ok(ItemOutcome::Skipped(reason));
            }
            Prepared::Owner { owner, class_id } => {
                let cx = DocContext {
                    model: self.model,
                    resolver: &self.resolver,
                    docs_title: &self.options.title,
                    context_string: &self.context,
                };
                register(
                    &mut self.cache,
                    &mut self.index,
                    EntityKind::Class,
                    &class_id,
                    || cx.class_doc(&owner),
                )?;
                self.skipped += 1;
                return Ok(ItemOutcome::Skipped("event node"));
            }
            Prepared::Node(node) => *node,
        };
        if !self
            .emitted
            .insert((node.class_id.clone(), node.identity.clone()))
        {
            self.skipped += 1;
            return Ok(ItemOutcome::Skipped("already documented"));
        }

        let cx = DocContext {
            model: self.model,
            resolver: &self.resolver,
            docs_title: &self.options.title,
            context_string: &self.context,
        };
        let class_doc = register(
            &mut self.cache,
            &mut self.index,
            EntityKind::Class,
            &node.class_id,
            || cx.class_doc(&node.owner),
        )?;
        let row = class_doc.tree.require_tree_mut("nodes")?.append_child("node");
        row.append_escaped("id", node.identity.as_str());
        row.append_escaped("shorttitle", node.short_title.as_str());

        for signature in &node.doc.delegates {
            let id = delegate_identity(signature);
            register(
                &mut self.cache,
                &mut self.index,
                EntityKind::Delegate,
                &id,
                || cx.delegate_doc(signature),
            )?;
        }

        let class_dir = self.stage_dir.join(node.class_id.as_str());
        if let Some((file, bytes)) = &node.image {
            write_bytes(&class_dir.join("img").join(file), bytes)?;
        }
        write_document(
            &node.doc.tree,
            &class_dir.join("nodes"),
            node.identity.as_str(),
            &self.options.formats,
        )?;

        self.nodes += 1;
        Ok(ItemOutcome::Produced(node.identity))
    }

    /// Document the fields of a class, struct or enum. Returns whether a
    /// document was registered or extended. Each type is handled once per run.
    pub fn generate_type_members(&mut self, key: &TypeKey) -> Result<bool> {
        if !self.members_done.insert(key.clone()) {
            return Ok(false);
        }
        debug!("generating type members for : {}", key.name);
        match key.kind {
            TypeKind::Class => self.class_members(key),
            TypeKind::Struct => self.struct_members(key),
            TypeKind::Enum => self.enum_members(key),
        }
    }

    fn class_members(&mut self, key: &TypeKey) -> Result<bool> {
        let Some(class) = self.model.class(&key.name) else {
            return Ok(false);
        };
        let comment = class.metadata.get("Comment").cloned().unwrap_or_default();
        let entity = EntityRef::Class(class);
        let id = entity.identity();

        let cx = DocContext {
            model: self.model,
            resolver: &self.resolver,
            docs_title: &self.options.title,
            context_string: &self.context,
        };
        let mut fields = DocTree::new();
        let documentable = cx.append_fields(&mut fields, key, &mut self.diagnostics);
        // A class only enters the index through its members if it has some.
        if !documentable && !self.cache.contains(entity.kind(), &id) {
            return Ok(false);
        }

        let document = register(
            &mut self.cache,
            &mut self.index,
            entity.kind(),
            &id,
            || cx.class_doc(&key.name),
        )?;
        document.tree.require_tree_mut("fields")?.extend(fields);
        doxygen::append_doxygen(&mut document.tree, &comment);
        if documentable && comment.is_empty() {
            self.diagnostics
                .report(format!("No doc for class: {}", key.name));
        }
        Ok(true)
    }

    fn struct_members(&mut self, key: &TypeKey) -> Result<bool> {
        let Some(def) = self.model.script_struct(&key.name) else {
            return Ok(false);
        };
        let entity = EntityRef::Struct(def);
        let id = entity.identity();
        if def.archetype || self.cache.contains(entity.kind(), &id) {
            return Ok(false);
        }

        let cx = DocContext {
            model: self.model,
            resolver: &self.resolver,
            docs_title: &self.options.title,
            context_string: &self.context,
        };
        let mut tree = cx.struct_doc(&key.name);
        let comment = def.metadata.get("Comment").map_or("", String::as_str);
        doxygen::append_doxygen(&mut tree, comment);
        if comment.is_empty() {
            self.diagnostics
                .report(format!("No doc for struct: {}", key.name));
        }
        let mut fields = DocTree::new();
        cx.append_fields(&mut fields, key, &mut self.diagnostics);
        tree.require_tree_mut("fields")?.extend(fields);

        register(&mut self.cache, &mut self.index, entity.kind(), &id, || tree)?;
        Ok(true)
    }

    fn enum_members(&mut self, key: &TypeKey) -> Result<bool> {
        let Some(def) = self.model.enumeration(&key.name) else {
            return Ok(false);
        };
        let entity = EntityRef::Enum(def);
        let id = entity.identity();
        if self.cache.contains(entity.kind(), &id) {
            return Ok(false);
        }

        let mut tree = self.doc_context().enum_doc(&key.name);
        let comment = def.metadata.get("Comment").map_or("", String::as_str);
        doxygen::append_doxygen(&mut tree, comment);
        if comment.is_empty() {
            self.diagnostics
                .report(format!("No doc for enum: {}", key.name));
        }
        register(&mut self.cache, &mut self.index, entity.kind(), &id, || tree)?;
        Ok(true)
    }

    /// Write every owner document and the index under `output_path`.
    pub fn finalize(self, output_path: &Path) -> Result<GenerationReport> {
        for document in self.cache.iter() {
            let dir = output_path.join(document.identity.as_str());
            if document.kind != EntityKind::Delegate {
                let img = dir.join("img");
                fs::create_dir_all(&img).map_err(|source| DocGenError::Write {
                    stage: Stage::Generate,
                    path: img.clone(),
                    source,
                })?;
            }
            write_document(
                &document.tree,
                &dir,
                document.identity.as_str(),
                &self.options.formats,
            )?;
        }
        write_document(&self.index, output_path, "index", &self.options.formats)?;

        let count = |kind| self.cache.of_kind(kind).count();
        let report = GenerationReport {
            output_dir: output_path.to_path_buf(),
            nodes: self.nodes,
            skipped: self.skipped,
            classes: count(EntityKind::Class),
            structs: count(EntityKind::Struct),
            enums: count(EntityKind::Enum),
            delegates: count(EntityKind::Delegate),
            diagnostics: self.diagnostics.into_messages(),
        };
        info!(
            "Wrote {} classes, {} structs, {} enums, {} delegates to {}",
            report.classes,
            report.structs,
            report.enums,
            report.delegates,
            output_path.display()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::fake_png;
    use crate::render::{RenderError, RenderService, Renderer};
    use crate::source::snapshot::ModelSnapshot;
    use crate::tree::DocNode;
    use tempfile::TempDir;

    const MODEL: &str = r#"{
        "classes": [
            { "name": "Object" },
            { "name": "Math", "super_class": "Object", "path": "/Script/Core.Math",
              "metadata": { "Comment": "Math helpers." } },
            { "name": "Door", "super_class": "Object",
              "fields": [ { "name": "Width", "cpp_type": "float", "blueprint_visible": true } ] }
        ],
        "structs": [
            { "name": "Vector2D", "fields": [ { "name": "X", "cpp_type": "double", "blueprint_visible": true } ] }
        ],
        "enums": [ { "name": "EDoorState", "values": [ { "name": "Open" } ] } ],
        "functions": [
            { "name": "Add", "owner": "Math", "access": "public",
              "params": [ { "name": "A", "cpp_type": "int32" },
                          { "name": "Done", "cpp_type": "FOnDone", "delegate": "OnDone__DelegateSignature" } ] },
            { "name": "Negate", "owner": "Math", "access": "public", "is_static": true },
            { "name": "Helper", "owner": "Math", "access": "private" }
        ],
        "signatures": [ { "name": "OnDone__DelegateSignature" } ],
        "objects": [
            { "name": "Math", "kind": "class", "items": [
                { "construct": "function", "node_kind": "call_function", "function": "Math::Add",
                  "node": { "doc_id": "Add", "list_title": "Add ", "full_title": "Add",
                            "pins": [ { "name": "A" }, { "name": "Done" } ] } },
                { "construct": "function", "node_kind": "call_function", "function": "Math::Negate",
                  "node": { "doc_id": "Negate", "list_title": "Negate" } },
                { "construct": "function", "node_kind": "call_function", "function": "Math::Helper",
                  "node": { "doc_id": "Helper" } },
                { "construct": "variable", "node": { "doc_id": "GetPi" } },
                { "construct": "function", "node_kind": "call_function", "function": "Math::Add",
                  "node": { "doc_id": "Add" } }
            ] },
            { "name": "Door", "kind": "class", "items": [
                { "construct": "event", "node_kind": "event", "node": { "doc_id": "ReceiveTick" } }
            ] }
        ]
    }"#;

    fn model() -> ModelSnapshot {
        ModelSnapshot::from_json_str(MODEL, Path::new("model.json")).unwrap()
    }

    fn options() -> GeneratorOptions {
        GeneratorOptions {
            title: "Docs".to_string(),
            threads: 2,
            ..Default::default()
        }
    }

    fn index_ids(generator: &Generator, group: &str) -> Vec<String> {
        let group = generator
            .index()
            .find_child(group)
            .and_then(DocNode::as_tree)
            .unwrap();
        group
            .children()
            .filter_map(|(_, row)| row.as_tree())
            .filter_map(|row| row.value_of("id"))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn excluded_item_touches_nothing() {
        let model = model();
        let stage = TempDir::new().unwrap();
        let mut generator = Generator::init(&model, stage.path(), options()).unwrap();
        let source = &model.objects[0];

        let outcome = generator.process_item(&source.items[3], source).unwrap();
        assert!(matches!(outcome, ItemOutcome::Skipped(_)));
        assert!(generator.cache().is_empty());
        assert!(index_ids(&generator, "classes").is_empty());
        assert!(!stage.path().join("Math").exists());
    }

    #[test]
    fn event_items_only_register_their_owner() {
        let model = model();
        let stage = TempDir::new().unwrap();
        let service = RenderService::spawn(OnlyAdd);
        let mut generator = Generator::init(&model, stage.path(), options())
            .unwrap()
            .with_renderer(service.handle());
        let source = &model.objects[1];

        let outcome = generator.process_item(&source.items[0], source).unwrap();
        assert_eq!(outcome, ItemOutcome::Skipped("event node"));
        assert_eq!(index_ids(&generator, "classes"), ["Door"]);
        let door = generator
            .cache()
            .get(EntityKind::Class, &Identity::new("Door"))
            .unwrap();
        let nodes = door.tree.find_child("nodes").and_then(DocNode::as_tree).unwrap();
        assert!(nodes.is_empty());
        assert!(!stage.path().join("Door/nodes").exists());
        assert!(!stage.path().join("Door/img").exists());

        // A second event for the same owner adds no index row.
        generator.process_item(&source.items[0], source).unwrap();
        assert_eq!(index_ids(&generator, "classes"), ["Door"]);

        let report = generator.finalize(stage.path()).unwrap();
        assert_eq!((report.nodes, report.classes), (0, 1));
        let door: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(stage.path().join("Door/Door.json")).unwrap(),
        )
        .unwrap();
        assert!(door["nodes"].is_null());
    }

    #[test]
    fn object_items_produce_nodes_and_owners() {
        let model = model();
        let stage = TempDir::new().unwrap();
        let mut generator = Generator::init(&model, stage.path(), options()).unwrap();
        generator.process_object(&model.objects[0]).unwrap();

        assert_eq!(index_ids(&generator, "classes"), ["Math"]);
        assert_eq!(index_ids(&generator, "delegates"), ["OnDone"]);
        assert!(stage.path().join("Math/nodes/Add.json").is_file());
        assert!(stage.path().join("Math/nodes/Negate.json").is_file());
        assert!(!stage.path().join("Math/nodes/Helper.json").exists());

        let math = generator
            .cache()
            .get(EntityKind::Class, &Identity::new("Math"))
            .unwrap();
        let nodes = math.tree.find_child("nodes").and_then(DocNode::as_tree).unwrap();
        let rows: Vec<_> = nodes
            .find_all("node")
            .into_iter()
            .filter_map(DocNode::as_tree)
            .map(|n| (n.value_of("id").unwrap(), n.value_of("shorttitle").unwrap()))
            .collect();
        // The repeated Add item is not documented twice.
        assert_eq!(rows, [("Add", "Add"), ("Negate", "Negate")]);
        let doxygen = math.tree.find_child("doxygen").and_then(DocNode::as_tree).unwrap();
        assert_eq!(doxygen.value_of("description"), Some("Math helpers."));

        let add: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(stage.path().join("Math/nodes/Add.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(add["inputs"][1]["type"], "OnDone");
    }

    #[test]
    fn type_members_register_once() {
        let model = model();
        let stage = TempDir::new().unwrap();
        let mut generator = Generator::init(&model, stage.path(), options()).unwrap();

        assert!(generator.generate_type_members(&TypeKey::class("Door")).unwrap());
        assert!(!generator.generate_type_members(&TypeKey::class("Door")).unwrap());
        assert!(!generator.generate_type_members(&TypeKey::class("Object")).unwrap());
        assert!(generator.generate_type_members(&TypeKey::script_struct("Vector2D")).unwrap());
        assert!(generator.generate_type_members(&TypeKey::enumeration("EDoorState")).unwrap());

        assert_eq!(index_ids(&generator, "classes"), ["Door"]);
        assert_eq!(index_ids(&generator, "structs"), ["Vector2D"]);
        assert_eq!(index_ids(&generator, "enums"), ["EDoorState"]);

        let report = generator.finalize(stage.path()).unwrap();
        assert_eq!((report.classes, report.structs, report.enums), (1, 1, 1));
        assert!(report
            .diagnostics
            .iter()
            .any(|m| m == "No doc for class member: Door::Width"));
        assert!(stage.path().join("Door/Door.json").is_file());
        assert!(stage.path().join("Door/img").is_dir());
        assert!(stage.path().join("index.json").is_file());
    }

    #[test]
    fn json_is_always_written() {
        let model = model();
        let stage = TempDir::new().unwrap();
        let options = GeneratorOptions {
            formats: vec![OutputFormat::Xml],
            ..options()
        };
        let mut generator = Generator::init(&model, stage.path(), options).unwrap();
        generator.process_object(&model.objects[0]).unwrap();
        assert!(stage.path().join("Math/nodes/Add.json").is_file());
        assert!(stage.path().join("Math/nodes/Add.xml").is_file());
    }

    struct OnlyAdd;

    impl Renderer for OnlyAdd {
        fn render(&mut self, handle: &str, _max_size: u32) -> Result<Vec<u8>, RenderError> {
            match handle {
                "Math/Add" => Ok(fake_png(8, 8)),
                other => Err(RenderError::Missing(other.to_string())),
            }
        }
    }

    #[test]
    fn rendered_images_are_staged_and_failures_degrade() {
        let model = model();
        let stage = TempDir::new().unwrap();
        let service = RenderService::spawn(OnlyAdd);
        {
            let mut generator = Generator::init(&model, stage.path(), options())
                .unwrap()
                .with_renderer(service.handle());
            generator.process_object(&model.objects[0]).unwrap();
        }

        let image = stage.path().join("Math/img/nd_img_Math_Add.png");
        assert_eq!(fs::read(image).unwrap(), fake_png(8, 8));
        let negate: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(stage.path().join("Math/nodes/Negate.json")).unwrap(),
        )
        .unwrap();
        assert!(negate.get("imgpath").is_none());
    }
}
