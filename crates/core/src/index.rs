use crate::chunking::chunk_pages;
use crate::embeddings::Embedder;
use crate::error::IndexError;
use crate::extractor::PageText;
use crate::models::{Chunk, ChunkingOptions, DocumentFingerprint, ScoredChunk};

struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// In-memory nearest-neighbor index over one document's chunks. Built once
/// per upload and replaced wholesale when a new file is loaded.
pub struct VectorIndex {
    document: DocumentFingerprint,
    entries: Vec<IndexedChunk>,
    dimensions: usize,
}

impl VectorIndex {
    pub async fn build<E>(
        document: DocumentFingerprint,
        pages: &[PageText],
        embedder: &E,
        options: ChunkingOptions,
    ) -> Result<Self, IndexError>
    where
        E: Embedder + Send + Sync,
    {
        let chunks = chunk_pages(&document, pages, options)?;
        if chunks.is_empty() {
            return Err(IndexError::EmptyDocument(document.title.clone()));
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(IndexError::CountMismatch {
                got: embeddings.len(),
                want: chunks.len(),
            });
        }

        let dimensions = embedder.dimensions();
        for embedding in &embeddings {
            if embedding.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    got: embedding.len(),
                    want: dimensions,
                });
            }
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        Ok(Self {
            document,
            entries,
            dimensions,
        })
    }

    pub fn document(&self) -> &DocumentFingerprint {
        &self.document
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_k(&self, query_vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_vector, &entry.embedding),
            })
            .collect();

        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(k);
        scored
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}
