pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod responder;
pub mod session;
pub mod stream;

pub use chunking::{chunk_pages, split_text};
pub use embeddings::{
    Embedder, GeminiEmbedder, HashedNgramEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_EMBEDDING_MODEL, GEMINI_API_BASE,
};
pub use error::{IndexError, IngestError, ProviderError, QueryError};
pub use extractor::{LopdfExtractor, PageText, PdfExtractor};
pub use index::VectorIndex;
pub use ingest::{digest_bytes, ParsedDocument, PdfIngestor};
pub use llm::{ChatModel, GeminiChatModel, DEFAULT_CHAT_MODEL};
pub use models::{
    Chunk, ChunkingOptions, ConversationTurn, DocumentFingerprint, ScoredChunk, UploadedDocument,
};
pub use responder::{ChatResponder, DEFAULT_TOP_K};
pub use session::{ConversationSession, MemoryWindow, DEFAULT_MEMORY_TURNS};
pub use stream::{
    format_answer, AnswerStream, FormatPolicy, StreamState, DEFAULT_CHAR_DELAY, DEFAULT_WORD_DELAY,
};
