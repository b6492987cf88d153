//! Loading documents from a folder on disk.
//!
//! [`DirectoryLoader`] reads every supported file directly inside a folder
//! (no recursion) in file-name order: PDFs through `pdf-extract`, plain text
//! and markdown as-is. A file that cannot be read is skipped with a warning,
//! including a PDF whose parser panics; a folder that cannot be listed is a
//! [`RagError::CorpusLoadFailure`].

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::document::Document;
use crate::error::{RagError, Result};

/// Produces documents from a folder.
pub trait DocumentLoader: Send + Sync {
    /// Load all documents found in `folder`.
    fn load(&self, folder: &Path) -> Result<Vec<Document>>;
}

/// Page filtering heuristic applied to each extracted PDF page.
///
/// A page is dropped when it is shorter than `min_chars` or mentions any of
/// the `exclude_markers` (case-insensitive), which removes cover pages and
/// tables of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFilter {
    /// Minimum page length in characters.
    pub min_chars: usize,
    /// Lower-cased phrases that mark a page for exclusion.
    pub exclude_markers: Vec<String>,
}

impl Default for PageFilter {
    fn default() -> Self {
        Self {
            min_chars: 250,
            exclude_markers: vec![
                "table of contents".to_string(),
                "contents".to_string(),
                "pages".to_string(),
            ],
        }
    }
}

impl PageFilter {
    /// `true` if `page` should be kept.
    pub fn keep(&self, page: &str) -> bool {
        if page.chars().count() < self.min_chars {
            return false;
        }
        let lower = page.to_lowercase();
        !self.exclude_markers.iter().any(|marker| lower.contains(marker.as_str()))
    }
}

/// Loads `.pdf`, `.txt` and `.md` files from a single folder.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{DirectoryLoader, DocumentLoader, PageFilter};
///
/// let loader = DirectoryLoader::new().with_page_filter(PageFilter::default());
/// let documents = loader.load(Path::new("./policies"))?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct DirectoryLoader {
    page_filter: Option<PageFilter>,
}

impl DirectoryLoader {
    /// Create a loader with page filtering disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable page filtering for PDFs.
    pub fn with_page_filter(mut self, filter: PageFilter) -> Self {
        self.page_filter = Some(filter);
        self
    }

    fn read_file(&self, path: &Path) -> std::result::Result<(String, usize), String> {
        let extension =
            path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(self.join_pages(extract_pdf_pages(path)?)),
            "txt" | "md" => fs::read_to_string(path).map(|text| (text, 1)).map_err(|e| e.to_string()),
            other => Err(format!("unsupported file type '{other}'")),
        }
    }

    /// Drop blank and filtered pages; returns the kept text, one page per
    /// line block, and the number of kept pages.
    fn join_pages(&self, pages: Vec<String>) -> (String, usize) {
        let kept: Vec<String> = pages
            .into_iter()
            .filter(|page| !page.trim().is_empty())
            .filter(|page| self.page_filter.as_ref().is_none_or(|filter| filter.keep(page)))
            .collect();
        (kept.join("\n"), kept.len())
    }
}

fn extract_pdf_pages(path: &Path) -> std::result::Result<Vec<String>, String> {
    let extracted =
        panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path)));
    match extracted {
        Ok(pages) => pages.map_err(|e| e.to_string()),
        Err(payload) => Err(format!("pdf parser panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "pdf" | "txt" | "md"))
        .unwrap_or(false)
}

impl DocumentLoader for DirectoryLoader {
    fn load(&self, folder: &Path) -> Result<Vec<Document>> {
        let started = Instant::now();
        let failure = |message: String| RagError::CorpusLoadFailure {
            path: folder.display().to_string(),
            message,
        };

        let entries = fs::read_dir(folder).map_err(|e| failure(e.to_string()))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_supported(path))
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in &paths {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            match self.read_file(path) {
                Ok((text, page_count)) => {
                    debug!(file = %name, chars = text.len(), page_count, "loaded document");
                    documents.push(
                        Document::new(name, text)
                            .with_metadata("source", path.display().to_string())
                            .with_metadata("page_count", page_count.to_string()),
                    );
                }
                Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable file"),
            }
        }

        info!(
            folder = %folder.display(),
            document_count = documents.len(),
            skipped = paths.len() - documents.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded documents"
        );
        Ok(documents)
    }
}
