use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a pdf upload: {0}")]
    NotPdf(String),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("upload has no file name: {0}")]
    MissingFileName(String),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{provider} returned {status}: {details}")]
    Api {
        provider: &'static str,
        status: reqwest::StatusCode,
        details: String,
    },

    #[error("invalid response from {provider}: {details}")]
    InvalidResponse {
        provider: &'static str,
        details: String,
    },
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("document has no indexable text: {0}")]
    EmptyDocument(String),

    #[error("embedding count {got} does not match chunk count {want}")]
    CountMismatch { got: usize, want: usize },

    #[error("embedding dimension {got} does not match expected {want}")]
    DimensionMismatch { got: usize, want: usize },

    #[error("embedding provider failed: {0}")]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("no document has been indexed yet")]
    IndexNotReady,

    #[error("model returned an empty answer")]
    EmptyAnswer,

    #[error("llm provider failed: {0}")]
    Provider(#[from] ProviderError),
}
