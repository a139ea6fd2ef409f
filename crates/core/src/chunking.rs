use crate::error::IndexError;
use crate::extractor::PageText;
use crate::models::{Chunk, ChunkingOptions, DocumentFingerprint};
use sha2::{Digest, Sha256};

/// Fixed-size character windows: each window holds at most `chunk_size`
/// characters and starts `chunk_size - overlap` characters after its
/// predecessor. The final window may be shorter.
pub fn split_text(text: &str, options: ChunkingOptions) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let stride = options.chunk_size.saturating_sub(options.overlap).max(1);
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + options.chunk_size).min(chars.len());
        pieces.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += stride;
    }

    pieces
}

pub fn chunk_pages(
    document: &DocumentFingerprint,
    pages: &[PageText],
    options: ChunkingOptions,
) -> Result<Vec<Chunk>, IndexError> {
    options.validate()?;

    let mut chunks = Vec::new();
    let mut cursor = 0u64;

    for page in pages {
        let text = page.text.trim();
        if text.is_empty() {
            continue;
        }

        for piece in split_text(text, options) {
            let chunk_id = make_chunk_id(&document.document_id, page.number, cursor, &piece);
            chunks.push(Chunk {
                chunk_id,
                document_id: document.document_id.clone(),
                page: page.number,
                chunk_index: cursor,
                text: piece,
            });
            cursor = cursor.saturating_add(1);
        }
    }

    Ok(chunks)
}

fn make_chunk_id(document_id: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
