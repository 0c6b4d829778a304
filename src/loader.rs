//! Corpus bootstrap loader.
//!
//! Walks a directory of plain-text files and turns each into ingestable
//! [`Document`]s before the server starts taking requests. A form feed
//! inside a file marks a page break; each non-blank page becomes its own
//! document with a 1-based `page` number so passages keep a citable
//! position in the source.

use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use ragline_protocols::Document;

/// File extensions picked up by the corpus walk.
const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Load every text file under `dir` as page-split documents.
///
/// A missing directory yields an empty corpus. Files are visited in
/// sorted order so passage ids stay stable across restarts.
pub fn load_corpus(dir: &Path) -> io::Result<Vec<Document>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !has_text_extension(entry.path()) {
            continue;
        }

        let text = match std::fs::read_to_string(entry.path()) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "skipping unreadable file");
                continue;
            }
        };

        let source = entry
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pages = split_pages(&source, &text);
        debug!(path = %entry.path().display(), pages = pages.len(), "corpus file loaded");
        documents.extend(pages);
    }

    Ok(documents)
}

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Split file content into page documents on form-feed markers.
///
/// Blank pages are dropped, but page numbers still count them so the
/// surviving numbers match the source layout.
fn split_pages(source: &str, text: &str) -> Vec<Document> {
    text.split('\u{c}')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(index, page)| {
            Document::new(page)
                .with_metadata("source", source)
                .with_metadata("page", (index + 1).to_string())
        })
        .collect()
}
