//! Sliding-window text chunker.

use ragline_protocols::{Chunk, Document, StoreError};

/// Splits documents into overlapping fixed-size windows.
///
/// Window positions are counted in characters rather than bytes, so a
/// boundary never lands inside a multi-byte character. Deterministic
/// and stateless: the same document always produces the same chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker with the given window size and overlap.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, StoreError> {
        if chunk_size == 0 {
            return Err(StoreError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(StoreError::InvalidConfig(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split a document into chunks, copying its metadata verbatim
    /// onto every chunk.
    ///
    /// Windows advance by `chunk_size - overlap` characters; the final
    /// window may be shorter than `chunk_size`. Text shorter than one
    /// window yields a single chunk holding the whole text.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        // Char boundary byte offsets, with the total length appended so
        // that boundaries[i]..boundaries[j] is always a valid slice.
        let boundaries: Vec<usize> = document
            .text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(document.text.len()))
            .collect();
        let char_len = boundaries.len() - 1;

        if char_len == 0 {
            return vec![Chunk::new("", document.metadata.clone())];
        }

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < char_len {
            let end = usize::min(start + self.chunk_size, char_len);
            let text = &document.text[boundaries[start]..boundaries[end]];
            chunks.push(Chunk::new(text, document.metadata.clone()));
            start += step;
        }
        chunks
    }
}
