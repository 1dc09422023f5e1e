//! Paged enumeration of the source objects a run visits.

use crate::source::snapshot::ModelSnapshot;
use crate::source::{SourceKind, SourceObject};
use tracing::{debug, info};

/// Hands out source objects one at a time.
pub trait SourceCatalog {
    fn next(&mut self) -> Option<SourceObject>;
    fn estimated_size(&self) -> usize;
    /// Fraction of objects handed out so far, in `[0, 1]`.
    fn progress(&self) -> f32;
    /// Short description of what is being enumerated, recorded on every class document.
    fn context_string(&self) -> String;
}

/// Catalog over the objects of a [`ModelSnapshot`] under one content path.
pub struct SnapshotCatalog<'m> {
    content_path: String,
    objects: Vec<&'m SourceObject>,
    cursor: usize,
}

impl<'m> SnapshotCatalog<'m> {
    /// Run the prepass: keep objects under `content_path` and drop animation
    /// blueprints. An empty path keeps everything.
    pub fn new(model: &'m ModelSnapshot, content_path: &str) -> Self {
        let found: Vec<&SourceObject> = model
            .objects
            .iter()
            .filter(|o| o.path.starts_with(content_path))
            .collect();
        info!("Found {} objects at '{}'", found.len(), content_path);

        let objects: Vec<&SourceObject> = found
            .into_iter()
            .filter(|o| o.kind != SourceKind::AnimBlueprint)
            .collect();
        info!("{} objects passed filtering", objects.len());

        Self {
            content_path: content_path.to_string(),
            objects,
            cursor: 0,
        }
    }
}

impl SourceCatalog for SnapshotCatalog<'_> {
    fn next(&mut self) -> Option<SourceObject> {
        let object = self.objects.get(self.cursor)?;
        self.cursor += 1;
        debug!("Enumerating object '{}' at '{}'", object.name, object.path);
        Some((*object).clone())
    }

    fn estimated_size(&self) -> usize {
        self.objects.len()
    }

    fn progress(&self) -> f32 {
        if self.objects.is_empty() {
            return 1.0;
        }
        self.cursor as f32 / self.objects.len() as f32
    }

    fn context_string(&self) -> String {
        self.content_path.clone()
    }
}
