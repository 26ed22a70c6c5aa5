use lopdf::{Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised while merging artifacts
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: String,
        source: walkdir::Error,
    },

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("No {0} object in any artifact")]
    MissingObject(&'static str),
}

/// Outcome of a merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Artifacts whose pages made it into the combined file
    pub merged: usize,
    /// Artifacts that could not be opened
    pub skipped: Vec<PathBuf>,
    pub pages: usize,
}

/// Lists every `.pdf` under `root`, sorted lexicographically by path
pub fn collect_artifacts(root: &Path) -> Result<Vec<PathBuf>, MergeError> {
    let mut artifacts = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| MergeError::Walk {
            path: root.display().to_string(),
            source,
        })?;
        let is_pdf = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if entry.file_type().is_file() && is_pdf {
            artifacts.push(entry.into_path());
        }
    }

    artifacts.sort_by_key(|path| path.to_string_lossy().into_owned());
    Ok(artifacts)
}

/// Concatenates every artifact under `root` into `output`
///
/// Artifacts that fail to open are logged and skipped. When nothing can be
/// merged, no output file is written.
pub fn merge_artifacts(root: &Path, output: &Path) -> Result<MergeReport, MergeError> {
    let artifacts: Vec<PathBuf> = collect_artifacts(root)?
        .into_iter()
        .filter(|path| path != output)
        .collect();

    let mut report = MergeReport::default();
    if artifacts.is_empty() {
        tracing::info!("No artifacts under {}; nothing to merge", root.display());
        return Ok(report);
    }

    tracing::info!(
        "Merging {} artifacts into {}",
        artifacts.len(),
        output.display()
    );

    let mut documents = Vec::with_capacity(artifacts.len());
    for path in &artifacts {
        match Document::load(path) {
            Ok(document) => documents.push(document),
            Err(e) => {
                tracing::warn!("Skipping unreadable artifact {}: {}", path.display(), e);
                report.skipped.push(path.clone());
            }
        }
    }

    if documents.is_empty() {
        tracing::warn!("None of the artifacts under {} could be read", root.display());
        return Ok(report);
    }

    report.merged = documents.len();
    let mut combined = combine(documents)?;
    report.pages = combined.get_pages().len();
    combined.save(output)?;

    tracing::info!(
        "Created combined document {} ({} pages)",
        output.display(),
        report.pages
    );
    Ok(report)
}

fn object_type(object: &Object) -> Option<&[u8]> {
    object.as_dict().ok()?.get(b"Type").ok()?.as_name().ok()
}

/// Joins documents page-for-page in the given order
fn combine(documents: Vec<Document>) -> Result<Document, MergeError> {
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Object)> = Vec::new();
    let mut objects = std::collections::BTreeMap::new();

    for mut document in documents {
        document.renumber_objects_with(max_id);
        max_id = document.max_id + 1;

        // get_pages is keyed by page number, so values come out in reading order
        for object_id in document.get_pages().into_values() {
            if let Ok(page) = document.get_object(object_id) {
                pages.push((object_id, page.clone()));
            }
        }
        objects.extend(document.objects);
    }

    let mut combined = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Object)> = None;
    let mut page_tree: Option<(ObjectId, Object)> = None;

    for (object_id, object) in objects {
        match object_type(&object) {
            Some(b"Catalog") => {
                let id = catalog.as_ref().map_or(object_id, |(id, _)| *id);
                catalog = Some((id, object));
            }
            Some(b"Pages") => {
                let Ok(dictionary) = object.as_dict() else {
                    continue;
                };
                let mut dictionary = dictionary.clone();
                if let Some((_, Object::Dictionary(previous))) = &page_tree {
                    dictionary.extend(previous);
                }
                let id = page_tree.as_ref().map_or(object_id, |(id, _)| *id);
                page_tree = Some((id, Object::Dictionary(dictionary)));
            }
            Some(b"Page") | Some(b"Outlines") | Some(b"Outline") => {}
            _ => {
                combined.objects.insert(object_id, object);
            }
        }
    }

    let (catalog_id, catalog) = catalog.ok_or(MergeError::MissingObject("Catalog"))?;
    let (pages_id, page_tree) = page_tree.ok_or(MergeError::MissingObject("Pages"))?;

    let mut kids = Vec::with_capacity(pages.len());
    for (object_id, page) in &pages {
        if let Ok(dictionary) = page.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_id);
            combined
                .objects
                .insert(*object_id, Object::Dictionary(dictionary));
            kids.push(Object::Reference(*object_id));
        }
    }

    if let Ok(dictionary) = page_tree.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", kids.len() as i64);
        dictionary.set("Kids", kids);
        combined
            .objects
            .insert(pages_id, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_id);
        dictionary.remove(b"Outlines");
        combined
            .objects
            .insert(catalog_id, Object::Dictionary(dictionary));
    }

    combined.trailer.set("Root", catalog_id);
    combined.max_id = combined.objects.len() as u32;
    combined.renumber_objects();
    combined.compress();

    Ok(combined)
}
